//! Element locators, one module per page.

/// Landing page cards and the sidebar menu shared by every section page
pub mod home {
    use crate::locator::Locator;

    /// Category card heading, matched by contained text
    #[must_use]
    pub fn card(name: &str) -> Locator {
        Locator::css("div.card h5").containing(name.to_string())
    }

    /// Sidebar entry with exactly this label
    #[must_use]
    pub fn menu_item(name: &str) -> Locator {
        Locator::css("div.element-list li span.text").with_text(name.to_string())
    }

    /// Sidebar entry whose label contains `fragment`
    #[must_use]
    pub fn menu_item_containing(fragment: &str) -> Locator {
        Locator::css("div.element-list li span.text").containing(fragment.to_string())
    }
}

/// Check Box page
pub mod checkbox {
    use crate::locator::Locator;

    /// "Expand all" option button
    pub const EXPAND_ALL: Locator = Locator::css("button[title='Expand all']");
    /// "Collapse all" option button
    pub const COLLAPSE_ALL: Locator = Locator::css("button[title='Collapse all']");
    /// Per-node expand/collapse toggles
    pub const TOGGLE_BUTTONS: Locator = Locator::css("button.rct-collapse");
    /// Toggle icon of a collapsed node
    pub const CLOSED_ICONS: Locator = Locator::css(".rct-icon-expand-close");
    /// Toggle icon of an expanded node
    pub const OPEN_ICONS: Locator = Locator::css(".rct-icon-expand-open");
    /// "You have selected :" panel
    pub const RESULT: Locator = Locator::id("result");
}

/// Book Store page (react-table)
pub mod book_store {
    use crate::locator::Locator;

    /// Table container
    pub const TABLE: Locator = Locator::css(".rt-table");
    /// Row groups, including empty padding rows
    pub const ROWS: Locator = Locator::css(".rt-tr-group");
    /// "No rows found" placeholder
    pub const NO_DATA: Locator = Locator::css(".rt-noData");
    /// Title cell of the first row
    pub const FIRST_TITLE: Locator = Locator::css(".rt-tr-group div.rt-td:nth-child(2)");
    /// Search box above the table
    pub const SEARCH_INPUT: Locator =
        Locator::css("div.mb-3.input-group input#searchBox[placeholder='Type to search']");

    // Cells, relative to one row group
    /// Cover image
    pub const IMAGE_CELL: Locator = Locator::css("div.rt-td:nth-child(1) img");
    /// Title
    pub const TITLE_CELL: Locator = Locator::css("div.rt-td:nth-child(2)");
    /// Author
    pub const AUTHOR_CELL: Locator = Locator::css("div.rt-td:nth-child(3)");
    /// Publisher
    pub const PUBLISHER_CELL: Locator = Locator::css("div.rt-td:nth-child(4)");
}

/// Practice Form page
pub mod practice_form {
    use crate::locator::Locator;

    /// First name input
    pub static FIRST_NAME: Locator = Locator::css("input[placeholder='First Name']");
    /// Last name input
    pub static LAST_NAME: Locator = Locator::css("input[placeholder='Last Name']");
    /// Email input
    pub static EMAIL: Locator = Locator::css("input[placeholder='name@example.com']");
    /// Mobile number input
    pub static MOBILE: Locator = Locator::css("input[placeholder='Mobile Number']");
    /// Date of birth input
    pub const DATE_OF_BIRTH: Locator = Locator::css("input#dateOfBirthInput");
    /// Address textarea
    pub static CURRENT_ADDRESS: Locator = Locator::css("textarea[placeholder='Current Address']");
    /// Container of the gender radios
    pub const GENDER_WRAPPER: Locator = Locator::css("#genterWrapper");
    /// Submit button
    pub const SUBMIT: Locator = Locator::css_containing("button", "Submit");

    /// Confirmation modal
    pub const SUCCESS_MODAL: Locator = Locator::css("div.modal-content");
    /// Confirmation modal heading
    pub const SUCCESS_MODAL_TITLE: Locator =
        Locator::css_containing("div.modal-content div", "Thanks for submitting the form");
    /// Modal close button
    pub const MODAL_CLOSE: Locator = Locator::css("button#closeLargeModal");
    /// Label and value cells of the submitted data
    pub const MODAL_CELLS: Locator = Locator::css("div.modal-content td");

    /// Radio label
    pub static MALE_LABEL: Locator = Locator::css("label[for='gender-radio-1']");
    /// Radio label
    pub static FEMALE_LABEL: Locator = Locator::css("label[for='gender-radio-2']");
    /// Radio label
    pub static OTHER_LABEL: Locator = Locator::css("label[for='gender-radio-3']");
    /// Radio input
    pub static MALE_RADIO: Locator = Locator::css("input[value='Male']");
    /// Radio input
    pub static FEMALE_RADIO: Locator = Locator::css("input[value='Female']");
    /// Radio input
    pub static OTHER_RADIO: Locator = Locator::css("input[value='Other']");
}

/// Dynamic Properties page
pub mod dynamic_properties {
    use crate::locator::Locator;

    /// "Visible After 5 Seconds" button
    pub const VISIBLE_AFTER: Locator = Locator::css("button#visibleAfter");
    /// "Color Change" button
    pub const COLOR_CHANGE: Locator = Locator::css("button#colorChange");
    /// "Will enable 5 seconds" button
    pub const ENABLE_AFTER: Locator = Locator::css("button#enableAfter");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_locators_render_for_logs() {
        assert_eq!(home::card("Forms").value(), "div.card h5");
        assert!(home::menu_item("Check Box").to_string().contains("Check Box"));
        assert!(home::menu_item_containing("Broken Links").to_string().contains("Broken Links"));
    }
}
