//! Practice Form page.
//!
//! Field error detection mirrors the tree state detection: a
//! [`FieldSnapshot`] is read once from the page and run through ordered pure
//! checks, and the first check that fires names the [`FieldError`].
//!
//! 1. the browser's constraint validation (`:invalid`)
//! 2. numeric fields only: non-digit content, or shorter than `minlength`
//! 3. an error colour in the border or box shadow
//! 4. a required field left empty

use super::base::{BasePage, PageObject};
use super::locators::practice_form::{
    CURRENT_ADDRESS, DATE_OF_BIRTH, EMAIL, FEMALE_LABEL, FEMALE_RADIO, FIRST_NAME, GENDER_WRAPPER,
    LAST_NAME, MALE_LABEL, MALE_RADIO, MOBILE, MODAL_CELLS, MODAL_CLOSE, OTHER_LABEL, OTHER_RADIO,
    SUBMIT, SUCCESS_MODAL, SUCCESS_MODAL_TITLE,
};
use crate::driver::Key;
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Colours the site uses to flag an invalid control
pub const ERROR_COLOURS: [&str; 3] = ["rgb(220, 53, 69)", "rgb(255, 0, 0)", "#dc3545"];

/// Lower bound for the wait on a field before inspecting it
const FIELD_TIMEOUT_FLOOR: Duration = Duration::from_secs(5);

/// Date format used in scenarios (`15 Jan 1990`)
pub const SCENARIO_DATE_FORMAT: &str = "%d %b %Y";

/// Date format the date picker accepts when typed (`01/15/1990`)
pub const INPUT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Convert a scenario date to the picker's input format
///
/// Input that does not parse is returned unchanged.
#[must_use]
pub fn format_date_of_birth(date: &str) -> String {
    NaiveDate::parse_from_str(date.trim(), SCENARIO_DATE_FORMAT)
        .map_or_else(|_| date.to_string(), |d| d.format(INPUT_DATE_FORMAT).to_string())
}

// =============================================================================
// FIELDS
// =============================================================================

/// Text controls of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FormField {
    /// First name
    FirstName,
    /// Last name
    LastName,
    /// Email
    Email,
    /// Mobile number
    Mobile,
    /// Current address
    CurrentAddress,
}

impl FormField {
    /// Placeholder text identifying the control
    #[must_use]
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Email => "name@example.com",
            Self::Mobile => "Mobile Number",
            Self::CurrentAddress => "Current Address",
        }
    }

    /// Locator of the control
    #[must_use]
    pub fn locator(&self) -> &'static Locator {
        match self {
            Self::FirstName => &FIRST_NAME,
            Self::LastName => &LAST_NAME,
            Self::Email => &EMAIL,
            Self::Mobile => &MOBILE,
            Self::CurrentAddress => &CURRENT_ADDRESS,
        }
    }

    /// Whether the field only accepts digits
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Mobile)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.placeholder())
    }
}

impl FromStr for FormField {
    type Err = HarnessError;

    /// Accepts scenario wording (`first name`, `Mobile Number`) or the placeholder
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "first name" | "firstname" => Ok(Self::FirstName),
            "last name" | "lastname" => Ok(Self::LastName),
            "email" | "name@example.com" => Ok(Self::Email),
            "mobile" | "mobile number" => Ok(Self::Mobile),
            "address" | "current address" => Ok(Self::CurrentAddress),
            _ => Err(HarnessError::assertion(format!("unknown form field '{}'", s.trim()))),
        }
    }
}

/// Gender radio options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Other
    Other,
}

impl Gender {
    /// All options, in display order
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    fn label(self) -> &'static Locator {
        match self {
            Self::Male => &MALE_LABEL,
            Self::Female => &FEMALE_LABEL,
            Self::Other => &OTHER_LABEL,
        }
    }

    fn radio(self) -> &'static Locator {
        match self {
            Self::Male => &MALE_RADIO,
            Self::Female => &FEMALE_RADIO,
            Self::Other => &OTHER_RADIO,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
            Self::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for Gender {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            other => Err(HarnessError::assertion(format!("unsupported gender '{other}'"))),
        }
    }
}

// =============================================================================
// FIELD ERRORS
// =============================================================================

/// What a control looked like when inspected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    /// Current value
    pub value: String,
    /// `required` attribute present
    pub required: bool,
    /// `minlength` attribute
    pub min_length: Option<usize>,
    /// `maxlength` attribute
    pub max_length: Option<usize>,
    /// Matches `:invalid`
    pub invalid: bool,
    /// Field only accepts digits
    pub numeric: bool,
    /// Computed `border-color`
    pub border_color: String,
    /// Computed `box-shadow`
    pub box_shadow: String,
}

/// Why a control reads as being in error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldError {
    /// Browser constraint validation failed
    InvalidState,
    /// Numeric field holds other characters
    NonDigit,
    /// Value shorter than `minlength`
    TooShort {
        /// Required length
        min: usize,
        /// Actual length
        len: usize,
    },
    /// Border or shadow painted in an error colour
    ErrorColour {
        /// The offending style value
        style: String,
    },
    /// Required field left empty
    RequiredEmpty,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState => write!(f, "field matches :invalid"),
            Self::NonDigit => write!(f, "field contains non-digit characters"),
            Self::TooShort { min, len } => {
                write!(f, "value has {len} characters, minimum is {min}")
            }
            Self::ErrorColour { style } => {
                write!(f, "field is painted in an error colour ({style})")
            }
            Self::RequiredEmpty => write!(f, "required field is empty"),
        }
    }
}

/// Browser constraint validation
#[must_use]
pub fn check_validity(snapshot: &FieldSnapshot) -> Option<FieldError> {
    snapshot.invalid.then_some(FieldError::InvalidState)
}

/// Length and digit rules of numeric fields; empty values are left to [`check_required`]
#[must_use]
pub fn check_numeric(snapshot: &FieldSnapshot) -> Option<FieldError> {
    let value = snapshot.value.as_str();
    if !snapshot.numeric || value.is_empty() {
        return None;
    }
    let len = value.chars().count();
    if let Some(min) = snapshot.min_length.filter(|min| len < *min) {
        return Some(FieldError::TooShort { min, len });
    }
    (!value.chars().all(|c| c.is_ascii_digit())).then_some(FieldError::NonDigit)
}

/// Error colour in the border or box shadow
#[must_use]
pub fn check_colour(snapshot: &FieldSnapshot) -> Option<FieldError> {
    [&snapshot.border_color, &snapshot.box_shadow]
        .into_iter()
        .find(|style| {
            let style = style.to_ascii_lowercase();
            ERROR_COLOURS.iter().any(|colour| style.contains(colour))
        })
        .map(|style| FieldError::ErrorColour {
            style: style.clone(),
        })
}

/// Required and empty
#[must_use]
pub fn check_required(snapshot: &FieldSnapshot) -> Option<FieldError> {
    (snapshot.required && snapshot.value.trim().is_empty()).then_some(FieldError::RequiredEmpty)
}

/// Field checks in priority order
pub const FIELD_CHECKS: [fn(&FieldSnapshot) -> Option<FieldError>; 4] =
    [check_validity, check_numeric, check_colour, check_required];

/// First check that fires, if any
#[must_use]
pub fn detect_field_error(snapshot: &FieldSnapshot) -> Option<FieldError> {
    FIELD_CHECKS.iter().find_map(|check| check(snapshot))
}

// =============================================================================
// PAGE
// =============================================================================

/// Practice Form page
#[derive(Debug, Clone, Copy)]
pub struct PracticeFormPage<'d> {
    base: BasePage<'d>,
}

impl PageObject for PracticeFormPage<'_> {
    fn url_path(&self) -> &'static str {
        "automation-practice-form"
    }

    fn base(&self) -> &BasePage<'_> {
        &self.base
    }
}

impl<'d> PracticeFormPage<'d> {
    /// Bind to a session
    #[must_use]
    pub const fn new(base: BasePage<'d>) -> Self {
        Self { base }
    }

    /// Load the page
    ///
    /// # Errors
    ///
    /// Returns an error if navigation fails after retries.
    pub async fn open(&self) -> HarnessResult<()> {
        self.base.navigate_to(&self.url()).await
    }

    /// Replace the content of a text control
    ///
    /// # Errors
    ///
    /// Returns an error if the control is missing or rejects input.
    pub async fn fill(&self, field: FormField, text: &str) -> HarnessResult<()> {
        self.base.enter_text(field.locator(), text).await?;
        info!(field = %field, value = text, "Entered field value");
        Ok(())
    }

    /// Enter the first name
    ///
    /// # Errors
    ///
    /// Returns an error if the control is missing or rejects input.
    pub async fn enter_first_name(&self, text: &str) -> HarnessResult<()> {
        self.fill(FormField::FirstName, text).await
    }

    /// Enter the last name
    ///
    /// # Errors
    ///
    /// Returns an error if the control is missing or rejects input.
    pub async fn enter_last_name(&self, text: &str) -> HarnessResult<()> {
        self.fill(FormField::LastName, text).await
    }

    /// Enter the email
    ///
    /// # Errors
    ///
    /// Returns an error if the control is missing or rejects input.
    pub async fn enter_email(&self, text: &str) -> HarnessResult<()> {
        self.fill(FormField::Email, text).await
    }

    /// Enter the mobile number
    ///
    /// # Errors
    ///
    /// Returns an error if the control is missing or rejects input.
    pub async fn enter_mobile(&self, text: &str) -> HarnessResult<()> {
        self.fill(FormField::Mobile, text).await
    }

    /// Enter the current address
    ///
    /// # Errors
    ///
    /// Returns an error if the control is missing or rejects input.
    pub async fn enter_current_address(&self, text: &str) -> HarnessResult<()> {
        self.fill(FormField::CurrentAddress, text).await
    }

    /// Type a date of birth into the picker input
    ///
    /// `15 Jan 1990` is typed as `01/15/1990`; anything else is typed as given.
    /// The input's content is selected first so the typed date replaces it.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is missing or rejects input.
    pub async fn enter_date_of_birth(&self, date: &str) -> HarnessResult<()> {
        let formatted = format_date_of_birth(date);
        let driver = self.base.driver();
        let result = async {
            let input = self.base.find_element(&DATE_OF_BIRTH).await?;
            driver.scroll_into_view(&input).await?;
            let input = self.base.waiter().wait_for_clickable(&DATE_OF_BIRTH).await?;
            driver.js_click(&input).await?;
            driver.press_key(&input, Key::SelectAll).await?;
            driver.send_keys(&input, &formatted).await?;
            driver.press_key(&input, Key::Enter).await
        }
        .await;
        result.map_err(|e| {
            error!(date, error = %e, "Could not enter date of birth");
            e
        })?;
        info!(date, formatted = %formatted, "Entered date of birth");
        Ok(())
    }

    /// Select a gender
    ///
    /// The radio inputs are covered by their labels, so the label is clicked
    /// programmatically; the radio itself is the fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the label nor the radio can be clicked.
    pub async fn select_gender(&self, gender: Gender) -> HarnessResult<()> {
        let driver = self.base.driver();
        let by_label = async {
            let label = self.base.waiter().wait_for_clickable(gender.label()).await?;
            driver.js_click(&label).await
        }
        .await;
        match by_label {
            Ok(()) => {}
            Err(e) if e.is_session_failure() => return Err(e),
            Err(e) => {
                warn!(gender = %gender, error = %e, "Label click failed, clicking radio directly");
                self.base.js_click(gender.radio()).await?;
            }
        }
        info!(gender = %gender, "Selected gender");
        Ok(())
    }

    /// Click Submit
    ///
    /// # Errors
    ///
    /// Returns an error if the button cannot be clicked.
    pub async fn submit(&self) -> HarnessResult<()> {
        self.base.click_element(&SUBMIT).await?;
        info!("Form submitted");
        Ok(())
    }

    /// Whether the confirmation modal appears within the explicit wait
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn is_success_modal_displayed(&self) -> HarnessResult<bool> {
        self.base.is_visible(&SUCCESS_MODAL_TITLE).await
    }

    /// Label to value pairs listed in the confirmation modal
    ///
    /// # Errors
    ///
    /// Returns an error if the modal does not appear.
    pub async fn submitted_data(&self) -> HarnessResult<BTreeMap<String, String>> {
        self.base.wait_for_visible(&SUCCESS_MODAL, None).await?;
        let driver = self.base.driver();
        let cells = self.base.find_all(&MODAL_CELLS).await?;
        let mut data = BTreeMap::new();
        for pair in cells.chunks_exact(2) {
            let label = driver.text(&pair[0]).await?.trim().to_string();
            let value = driver.text(&pair[1]).await?.trim().to_string();
            data.insert(label, value);
        }
        info!(data = ?data, "Retrieved submitted data");
        Ok(data)
    }

    /// Current value of a control, empty if it cannot be read
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn field_value(&self, field: FormField) -> HarnessResult<String> {
        let driver = self.base.driver();
        let read = async {
            let Some(element) = driver.find_all(field.locator()).await?.into_iter().next() else {
                return Ok(String::new());
            };
            let value = driver.property(&element, "value").await?;
            Ok::<_, HarnessError>(value.as_str().unwrap_or_default().to_string())
        }
        .await;
        match read {
            Ok(value) => {
                debug!(field = %field, value = %value, "Field value");
                Ok(value)
            }
            Err(e) if e.is_session_failure() => Err(e),
            Err(e) => {
                error!(field = %field, error = %e, "Could not read field value");
                Ok(String::new())
            }
        }
    }

    /// Read the state of a control for error detection
    ///
    /// # Errors
    ///
    /// Returns an error if the control is not present.
    pub async fn field_snapshot(&self, field: FormField) -> HarnessResult<FieldSnapshot> {
        let driver = self.base.driver();
        let timeout = (self.base.config().explicit_wait / 3).max(FIELD_TIMEOUT_FLOOR);
        let element = self
            .base
            .waiter_for(Some(timeout))
            .wait_for_present(field.locator())
            .await?;

        let attr_len = |value: Option<String>| value.and_then(|v| v.trim().parse::<usize>().ok());
        Ok(FieldSnapshot {
            value: driver
                .property(&element, "value")
                .await?
                .as_str()
                .unwrap_or_default()
                .to_string(),
            required: driver.attribute(&element, "required").await?.is_some(),
            min_length: attr_len(driver.attribute(&element, "minlength").await?),
            max_length: attr_len(driver.attribute(&element, "maxlength").await?),
            invalid: driver.is_invalid(&element).await?,
            numeric: field.is_numeric(),
            border_color: driver.css_value(&element, "border-color").await?,
            box_shadow: driver.css_value(&element, "box-shadow").await?,
        })
    }

    /// Why a control reads as being in error, `None` when it looks valid
    ///
    /// # Errors
    ///
    /// Returns an error if the control cannot be inspected.
    pub async fn verify_field_error(&self, field: FormField) -> HarnessResult<Option<FieldError>> {
        let snapshot = self.field_snapshot(field).await.map_err(|e| {
            error!(field = %field, error = %e, "Could not inspect field");
            e
        })?;
        let found = detect_field_error(&snapshot);
        match &found {
            Some(reason) => info!(field = %field, reason = %reason, "Field shows an error"),
            None => info!(field = %field, value = %snapshot.value, "Field shows no error"),
        }
        Ok(found)
    }

    /// Whether no gender is selected
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn verify_gender_error(&self) -> HarnessResult<bool> {
        let driver = self.base.driver();
        for gender in Gender::ALL {
            for radio in driver.find_all(gender.radio()).await? {
                if driver.is_selected(&radio).await? {
                    info!(gender = %gender, "A gender is selected, no error");
                    return Ok(false);
                }
            }
        }
        if let Some(wrapper) = driver.find_all(&GENDER_WRAPPER).await?.first() {
            let border = driver.css_value(wrapper, "border-color").await?;
            debug!(border = %border, "Gender wrapper style");
        }
        info!("No gender selected");
        Ok(true)
    }

    /// Close the confirmation modal if it is open; failures are only logged
    pub async fn close_success_modal(&self) {
        match self.base.is_visible_now(&MODAL_CLOSE).await {
            Ok(true) => match self.base.click_element(&MODAL_CLOSE).await {
                Ok(()) => info!("Success modal closed"),
                Err(e) => warn!(error = %e, "Failed to close success modal"),
            },
            Ok(false) => debug!("No success modal open"),
            Err(e) => warn!(error = %e, "Could not check for success modal"),
        }
    }

    /// Reload the form; failures are only logged
    pub async fn refresh_form(&self) {
        match self.base.refresh_page().await {
            Ok(()) => info!("Form page refreshed"),
            Err(e) => warn!(error = %e, "Failed to refresh form"),
        }
    }
}
