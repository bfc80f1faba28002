//! DemoQA page emulation for [`MockDriver`].
//!
//! Renders the markup the page objects rely on (cards, sidebar menu,
//! react-checkbox-tree, react-table book list, practice form, dynamic
//! properties) and reproduces the widgets' behaviour through hooks and
//! timers. Markup is rebuilt from a small model on every change, so element
//! handles taken before a change go stale just as they may on the real site.

use super::{is_invalid_control, MockDom, MockDriver, MockEvent, MockPage, NodeId};
use crate::api::Book;
use crate::locator::Locator;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Bootstrap danger red used for invalid controls
pub const ERROR_RED: &str = "rgb(220, 53, 69)";
/// Bootstrap success green used for valid controls
pub const VALID_GREEN: &str = "rgb(40, 167, 69)";

const ELEMENTS: &str = "Elements";
const FORMS: &str = "Forms";
const BOOK_STORE: &str = "Book Store Application";

const MENU: &[(&str, &[(&str, &str)])] = &[
    (
        ELEMENTS,
        &[
            ("Text Box", "/text-box"),
            ("Check Box", "/checkbox"),
            ("Radio Button", "/radio-button"),
            ("Web Tables", "/webtables"),
            ("Buttons", "/buttons"),
            ("Links", "/links"),
            ("Broken Links - Images", "/broken"),
            ("Upload and Download", "/upload-download"),
            ("Dynamic Properties", "/dynamic-properties"),
        ],
    ),
    (FORMS, &[("Practice Form", "/automation-practice-form")]),
    (
        BOOK_STORE,
        &[
            ("Login", "/login"),
            ("Book Store", "/books"),
            ("Profile", "/profile"),
            ("Book Store API", "/swagger"),
        ],
    ),
];

/// Behaviour knobs for the emulated site
#[derive(Debug, Clone)]
pub struct SiteOptions {
    /// Catalogue rendered in the book table
    pub books: Vec<Book>,
    /// Delay before the book table is populated
    pub table_load_delay: Duration,
    /// Delay before the "Visible After 5 Seconds" button appears
    pub visible_after: Duration,
    /// Delay before the "Color Change" button turns red
    pub color_change_after: Duration,
    /// Delay before the "Will enable 5 seconds" button is enabled
    pub enable_after: Duration,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            books: catalogue(),
            table_load_delay: Duration::from_millis(100),
            visible_after: Duration::from_millis(400),
            color_change_after: Duration::from_millis(400),
            enable_after: Duration::from_millis(400),
        }
    }
}

impl SiteOptions {
    /// Use a specific catalogue
    #[must_use]
    pub fn with_books(mut self, books: Vec<Book>) -> Self {
        self.books = books;
        self
    }

    /// Delay the book table's population
    #[must_use]
    pub fn with_table_load_delay(mut self, delay: Duration) -> Self {
        self.table_load_delay = delay;
        self
    }

    /// Set every dynamic-properties delay
    #[must_use]
    pub fn with_dynamic_delay(mut self, delay: Duration) -> Self {
        self.visible_after = delay;
        self.color_change_after = delay;
        self.enable_after = delay;
        self
    }
}

/// The Book Store catalogue served by demoqa.com
#[must_use]
pub fn catalogue() -> Vec<Book> {
    let book = |isbn: &str,
                title: &str,
                sub_title: &str,
                author: &str,
                publisher: &str,
                pages: u32,
                website: &str| Book {
        isbn: isbn.to_string(),
        title: title.to_string(),
        sub_title: sub_title.to_string(),
        author: author.to_string(),
        publish_date: "2020-06-04T08:48:39.000Z".to_string(),
        publisher: publisher.to_string(),
        pages,
        description: String::new(),
        website: website.to_string(),
    };
    vec![
        book(
            "9781449325862",
            "Git Pocket Guide",
            "A Working Introduction",
            "Richard E. Silverman",
            "O'Reilly Media",
            234,
            "http://chimera.labs.oreilly.com/books/1230000000561/index.html",
        ),
        book(
            "9781449331818",
            "Learning JavaScript Design Patterns",
            "A JavaScript and jQuery Developer's Guide",
            "Addy Osmani",
            "O'Reilly Media",
            254,
            "http://www.addyosmani.com/resources/essentialjsdesignpatterns/book/",
        ),
        book(
            "9781449337711",
            "Designing Evolvable Web APIs with ASP.NET",
            "Harnessing the Power of the Web",
            "Glenn Block et al.",
            "O'Reilly Media",
            238,
            "http://chimera.labs.oreilly.com/books/1234000001708/index.html",
        ),
        book(
            "9781449365035",
            "Speaking JavaScript",
            "An In-Depth Guide for Programmers",
            "Axel Rauschmayer",
            "O'Reilly Media",
            460,
            "http://speakingjs.com/",
        ),
        book(
            "9781491904244",
            "You Don't Know JS",
            "ES6 & Beyond",
            "Kyle Simpson",
            "O'Reilly Media",
            278,
            "https://github.com/getify/You-Dont-Know-JS/tree/master/es6%20&%20beyond",
        ),
        book(
            "9781491950296",
            "Programming JavaScript Applications",
            "Robust Web Architecture with Node, HTML5, and Modern JS Libraries",
            "Eric Elliott",
            "O'Reilly Media",
            254,
            "http://chimera.labs.oreilly.com/books/1234000000262/index.html",
        ),
        book(
            "9781593275846",
            "Eloquent JavaScript, Second Edition",
            "A Modern Introduction to Programming",
            "Marijn Haverbeke",
            "No Starch Press",
            472,
            "http://eloquentjavascript.net/",
        ),
        book(
            "9781593277574",
            "Understanding ECMAScript 6",
            "The Definitive Guide for JavaScript Developers",
            "Nicholas C. Zakas",
            "No Starch Press",
            352,
            "https://leanpub.com/understandinges6/read",
        ),
    ]
}

/// Register every DemoQA route on `driver`
pub fn install_demoqa(driver: &MockDriver, options: &SiteOptions) {
    driver.route("/", home_page);
    for (group, items) in MENU {
        let group: &'static str = *group;
        let slug = format!("/{}", group.to_lowercase().replace(' ', "-"));
        match group {
            BOOK_STORE => {}
            _ => driver.route(&slug, move || section_page(group, group)),
        }
        for (label, href) in *items {
            let label: &'static str = *label;
            driver.route(href, move || section_page(label, group));
        }
    }
    driver.route("/checkbox", checkbox_page);
    driver.route("/automation-practice-form", practice_form_page);

    let books = options.clone();
    driver.route("/books", move || book_store_page(&books));
    let dynamic = options.clone();
    driver.route("/dynamic-properties", move || dynamic_properties_page(&dynamic));
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clicked node and its ancestors, nearest first
fn click_chain(dom: &MockDom, event: &MockEvent) -> Option<Vec<NodeId>> {
    match *event {
        MockEvent::Click(target) => Some(
            std::iter::once(target)
                .chain(dom.ancestors(target))
                .collect(),
        ),
        _ => None,
    }
}

// ============================================================================
// Page shell
// ============================================================================

/// Document with header, ad overlays and (optionally) the sidebar; returns the main column
fn shell(title: &str, group: Option<&str>) -> (MockDom, NodeId) {
    let mut dom = MockDom::new();
    let body = dom.body();
    let app = dom.append(body, "div", &[("id", "app")]);
    let header = dom.append(app, "header", &[]);
    dom.append_text(header, "a", &[("href", "https://demoqa.com")], "");

    let container = dom.append(app, "div", &[("class", "body-height")]);
    let row = dom.append(container, "div", &[("class", "container playgound-body")]);
    if let Some(active) = group {
        sidebar(&mut dom, row, active);
    }
    let main = dom.append(row, "div", &[("class", "col-12 mt-4 col-md-6")]);
    if !title.is_empty() {
        dom.append_text(main, "h1", &[("class", "text-center")], title);
    }

    dom.append(body, "div", &[("id", "fixedban"), ("style", "position: fixed")]);
    dom.append(body, "div", &[("id", "adplus-anchor")]);
    (dom, main)
}

fn sidebar(dom: &mut MockDom, parent: NodeId, active: &str) {
    let panel = dom.append(parent, "div", &[("class", "left-pannel")]);
    let accordion = dom.append(panel, "div", &[("class", "accordion")]);
    for (group, items) in MENU {
        let element_group = dom.append(accordion, "div", &[("class", "element-group")]);
        let header = dom.append(element_group, "span", &[("class", "group-header")]);
        let wrapper = dom.append(header, "div", &[("class", "header-wrapper")]);
        dom.append_text(wrapper, "div", &[("class", "header-text")], group);

        let shown = *group == active;
        let class = if shown {
            "element-list collapse show"
        } else {
            "element-list collapse"
        };
        let list = dom.append(element_group, "div", &[("class", class)]);
        dom.set_hidden(list, !shown);
        let ul = dom.append(list, "ul", &[("class", "menu-list")]);
        for (i, (label, href)) in items.iter().enumerate() {
            let id = format!("item-{i}");
            let li = dom.append(
                ul,
                "li",
                &[("class", "btn btn-light "), ("id", &id), ("data-href", href)],
            );
            dom.append_text(li, "span", &[("class", "text")], label);
        }
    }
}

fn section_page(title: &'static str, group: &'static str) -> MockPage {
    let (dom, _) = shell(title, Some(group));
    MockPage::new(dom)
}

// ============================================================================
// Home
// ============================================================================

fn home_page() -> MockPage {
    let (mut dom, main) = shell("", None);
    let cards = dom.append(main, "div", &[("class", "category-cards")]);
    let names = [
        ELEMENTS,
        FORMS,
        "Alerts, Frame & Windows",
        "Widgets",
        "Interactions",
        BOOK_STORE,
    ];
    for card in names {
        let href = format!("/{}", card.to_lowercase().replace(' ', "-"));
        let href = if card == BOOK_STORE { "/books".to_string() } else { href };
        let wrapper = dom.append(
            cards,
            "div",
            &[
                ("class", "card mt-4 top-card"),
                ("data-href", &href),
                ("data-obscured-by", "fixedban"),
            ],
        );
        let body = dom.append(wrapper, "div", &[("class", "card-body")]);
        dom.append_text(body, "h5", &[], card);
    }
    MockPage::new(dom)
}

// ============================================================================
// Check box tree
// ============================================================================

struct TreeDef {
    value: &'static str,
    label: &'static str,
    children: &'static [TreeDef],
}

const fn leaf(value: &'static str, label: &'static str) -> TreeDef {
    TreeDef {
        value,
        label,
        children: &[],
    }
}

static TREE: TreeDef = TreeDef {
    value: "home",
    label: "Home",
    children: &[
        TreeDef {
            value: "desktop",
            label: "Desktop",
            children: &[leaf("notes", "Notes"), leaf("commands", "Commands")],
        },
        TreeDef {
            value: "documents",
            label: "Documents",
            children: &[
                TreeDef {
                    value: "workspace",
                    label: "WorkSpace",
                    children: &[
                        leaf("react", "React"),
                        leaf("angular", "Angular"),
                        leaf("veu", "Veu"),
                    ],
                },
                TreeDef {
                    value: "office",
                    label: "Office",
                    children: &[
                        leaf("public", "Public"),
                        leaf("private", "Private"),
                        leaf("classified", "Classified"),
                        leaf("general", "General"),
                    ],
                },
            ],
        },
        TreeDef {
            value: "downloads",
            label: "Downloads",
            children: &[
                leaf("wordFile", "Word File.doc"),
                leaf("excelFile", "Excel File.doc"),
            ],
        },
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tri {
    On,
    Off,
    Half,
}

impl TreeDef {
    fn find(&self, value: &str) -> Option<&Self> {
        if self.value == value {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(value))
    }

    fn leaves(&self) -> Vec<&'static str> {
        if self.children.is_empty() {
            return vec![self.value];
        }
        self.children.iter().flat_map(TreeDef::leaves).collect()
    }

    fn parents(&self) -> Vec<&'static str> {
        if self.children.is_empty() {
            return Vec::new();
        }
        std::iter::once(self.value)
            .chain(self.children.iter().flat_map(TreeDef::parents))
            .collect()
    }

    fn state(&self, checked: &BTreeSet<&'static str>) -> Tri {
        let leaves = self.leaves();
        let on = leaves.iter().filter(|l| checked.contains(*l)).count();
        if on == 0 {
            Tri::Off
        } else if on == leaves.len() {
            Tri::On
        } else {
            Tri::Half
        }
    }

    fn checked_values(&self, checked: &BTreeSet<&'static str>, out: &mut Vec<&'static str>) {
        if self.state(checked) == Tri::On {
            out.push(self.value);
        }
        for child in self.children {
            child.checked_values(checked, out);
        }
    }
}

#[derive(Debug, Default)]
struct TreeModel {
    checked: BTreeSet<&'static str>,
    expanded: BTreeSet<&'static str>,
}

impl TreeModel {
    fn toggle_check(&mut self, value: &str) {
        let Some(node) = TREE.find(value) else {
            return;
        };
        let leaves = node.leaves();
        if node.state(&self.checked) == Tri::On {
            for l in leaves {
                self.checked.remove(l);
            }
        } else {
            self.checked.extend(leaves);
        }
    }

    fn toggle_expand(&mut self, value: &str) {
        let Some(node) = TREE.find(value) else {
            return;
        };
        if !self.expanded.remove(node.value) {
            self.expanded.insert(node.value);
        }
    }
}

fn checkbox_page() -> MockPage {
    let (mut dom, main) = shell("Check Box", Some(ELEMENTS));
    let host = dom.append(main, "div", &[]);
    let model = Arc::new(Mutex::new(TreeModel::default()));
    render_tree(&mut dom, host, &lock(&model));

    MockPage::new(dom).with_hook(move |dom, event| {
        let Some(chain) = click_chain(dom, event) else {
            return;
        };
        let mut model = lock(&model);
        let title_of = |n: &NodeId| dom.attr(*n, "title").map(str::to_string);
        let changed = if chain.iter().any(|n| title_of(n).as_deref() == Some("Expand all")) {
            model.expanded = TREE.parents().into_iter().collect();
            true
        } else if chain.iter().any(|n| title_of(n).as_deref() == Some("Collapse all")) {
            model.expanded.clear();
            true
        } else if let Some(value) = chain
            .iter()
            .find_map(|n| dom.attr(*n, "for").and_then(|f| f.strip_prefix("tree-node-")))
            .map(str::to_string)
        {
            model.toggle_check(&value);
            true
        } else if chain.iter().any(|n| dom.has_class(*n, "rct-collapse-btn")) {
            let value = chain
                .iter()
                .find(|n| dom.has_class(**n, "rct-node"))
                .and_then(|li| dom.find(*li, &Locator::css("label")).ok())
                .and_then(|labels| labels.first().copied())
                .and_then(|label| dom.attr(label, "for"))
                .and_then(|f| f.strip_prefix("tree-node-"))
                .map(str::to_string);
            if let Some(value) = value {
                model.toggle_expand(&value);
            }
            true
        } else {
            false
        };
        if changed {
            render_tree(dom, host, &model);
        }
    })
}

fn render_tree(dom: &mut MockDom, host: NodeId, model: &TreeModel) {
    dom.clear_children(host);
    let wrapper = dom.append(host, "div", &[("class", "check-box-tree-wrapper")]);
    let tree = dom.append(wrapper, "div", &[("class", "react-checkbox-tree rct-icons-fa4")]);
    let options = dom.append(tree, "div", &[("class", "rct-options")]);
    for (title, class) in [
        ("Expand all", "rct-option rct-option-expand-all"),
        ("Collapse all", "rct-option rct-option-collapse-all"),
    ] {
        dom.append(
            options,
            "button",
            &[("aria-label", title), ("title", title), ("type", "button"), ("class", class)],
        );
    }
    let ol = dom.append(tree, "ol", &[]);
    render_node(dom, ol, &TREE, model);

    let mut selected = Vec::new();
    TREE.checked_values(&model.checked, &mut selected);
    if !selected.is_empty() {
        let result = dom.append(host, "div", &[("id", "result"), ("class", "display-result mt-4")]);
        dom.append_text(result, "span", &[], "You have selected :");
        for value in selected {
            dom.append_text(result, "span", &[("class", "text-success")], value);
        }
    }
}

fn render_node(dom: &mut MockDom, ol: NodeId, def: &TreeDef, model: &TreeModel) {
    let is_parent = !def.children.is_empty();
    let expanded = is_parent && model.expanded.contains(def.value);
    let class = match (is_parent, expanded) {
        (false, _) => "rct-node rct-node-leaf",
        (true, true) => "rct-node rct-node-parent rct-node-expanded",
        (true, false) => "rct-node rct-node-parent rct-node-collapsed",
    };
    let li = dom.append(ol, "li", &[("class", class)]);
    let text = dom.append(li, "span", &[("class", "rct-text")]);
    if is_parent {
        let button = dom.append(
            text,
            "button",
            &[
                ("aria-label", "Toggle"),
                ("title", "Toggle"),
                ("type", "button"),
                ("class", "rct-collapse rct-collapse-btn"),
            ],
        );
        let icon = if expanded {
            "rct-icon rct-icon-expand-open"
        } else {
            "rct-icon rct-icon-expand-close"
        };
        dom.append(button, "span", &[("class", icon)]);
    } else {
        dom.append(text, "span", &[("class", "rct-collapse")]);
    }

    let id = format!("tree-node-{}", def.value);
    let label = dom.append(text, "label", &[("for", &id)]);
    let input = dom.append(label, "input", &[("id", &id), ("type", "checkbox")]);
    dom.set_hidden(input, true);
    let state = def.state(&model.checked);
    dom.set_prop(input, "checked", state == Tri::On);
    dom.set_prop(input, "indeterminate", state == Tri::Half);
    let checkbox = dom.append(label, "span", &[("class", "rct-checkbox")]);
    let icon = match state {
        Tri::On => "rct-icon rct-icon-check",
        Tri::Off => "rct-icon rct-icon-uncheck",
        Tri::Half => "rct-icon rct-icon-half-check",
    };
    dom.append(checkbox, "span", &[("class", icon)]);
    dom.append(label, "span", &[("class", "rct-node-icon")]);
    dom.append_text(label, "span", &[("class", "rct-title")], def.label);

    if expanded {
        let children = dom.append(li, "ol", &[]);
        for child in def.children {
            render_node(dom, children, child, model);
        }
    }
}

// ============================================================================
// Book store
// ============================================================================

const TABLE_PAGE_SIZE: usize = 10;
const GRID_CELL: &[(&str, &str)] = &[("class", "rt-td"), ("role", "gridcell")];

#[derive(Debug, Default)]
struct BookTable {
    loaded: bool,
    query: String,
}

struct BookTableNodes {
    tbody: NodeId,
    no_data: NodeId,
}

fn book_store_page(options: &SiteOptions) -> MockPage {
    let (mut dom, main) = shell("Book Store", Some(BOOK_STORE));
    let wrapper = dom.append(main, "div", &[("class", "books-wrapper")]);
    let search = dom.append(wrapper, "div", &[("class", "mb-3 input-group")]);
    dom.append(
        search,
        "input",
        &[
            ("id", "searchBox"),
            ("type", "text"),
            ("placeholder", "Type to search"),
            ("class", "form-control"),
        ],
    );

    let react_table = dom.append(wrapper, "div", &[("class", "ReactTable -striped -highlight")]);
    let table = dom.append(react_table, "div", &[("class", "rt-table"), ("role", "grid")]);
    let thead = dom.append(table, "div", &[("class", "rt-thead -header")]);
    let head_row = dom.append(thead, "div", &[("class", "rt-tr"), ("role", "row")]);
    for heading in ["Image", "Title", "Author", "Publisher"] {
        dom.append_text(head_row, "div", &[("class", "rt-th"), ("role", "columnheader")], heading);
    }
    let tbody = dom.append(table, "div", &[("class", "rt-tbody")]);
    let no_data = dom.append_text(react_table, "div", &[("class", "rt-noData")], "No rows found");
    dom.set_hidden(no_data, true);

    let nodes = Arc::new(BookTableNodes { tbody, no_data });
    let state = Arc::new(Mutex::new(BookTable::default()));
    let books = Arc::new(options.books.clone());
    render_rows(&mut dom, &nodes, &lock(&state), &books);

    let (timer_state, timer_nodes, timer_books) =
        (Arc::clone(&state), Arc::clone(&nodes), Arc::clone(&books));
    MockPage::new(dom)
        .with_timer(options.table_load_delay, move |dom| {
            let mut table = lock(&timer_state);
            table.loaded = true;
            render_rows(dom, &timer_nodes, &table, &timer_books);
        })
        .with_hook(move |dom, event| {
            let MockEvent::Input(node) = *event else {
                return;
            };
            if dom.attr(node, "id") != Some("searchBox") {
                return;
            }
            let mut table = lock(&state);
            table.query = dom.attr(node, "value").unwrap_or("").to_string();
            render_rows(dom, &nodes, &table, &books);
        })
}

fn render_rows(dom: &mut MockDom, nodes: &BookTableNodes, table: &BookTable, books: &[Book]) {
    dom.clear_children(nodes.tbody);
    let query = table.query.to_lowercase();
    let visible: Vec<(usize, &Book)> = if table.loaded {
        books
            .iter()
            .enumerate()
            .filter(|(_, b)| {
                query.is_empty()
                    || b.title.to_lowercase().contains(&query)
                    || b.author.to_lowercase().contains(&query)
                    || b.publisher.to_lowercase().contains(&query)
            })
            .collect()
    } else {
        Vec::new()
    };
    dom.set_hidden(nodes.no_data, !(table.loaded && visible.is_empty()));

    let rows = visible.len().max(TABLE_PAGE_SIZE);
    for i in 0..rows {
        let group = dom.append(
            nodes.tbody,
            "div",
            &[("class", "rt-tr-group"), ("role", "rowgroup")],
        );
        let parity = if i % 2 == 0 { "rt-tr -odd" } else { "rt-tr -even" };
        let tr = dom.append(group, "div", &[("class", parity), ("role", "row")]);
        match visible.get(i) {
            Some((index, book)) => {
                let image = dom.append(tr, "div", GRID_CELL);
                let src = format!("https://demoqa.com/images/bookimage{index}.jpg");
                dom.append(image, "img", &[("src", &src), ("alt", "image")]);
                let title = dom.append(tr, "div", GRID_CELL);
                let holder = dom.append(title, "div", &[("class", "action-buttons")]);
                let see = format!("see-book-{}", book.title);
                let span = dom.append(holder, "span", &[("id", &see)]);
                let href = format!("/books?book={}", book.isbn);
                dom.append_text(span, "a", &[("href", &href)], &book.title);
                dom.append_text(tr, "div", GRID_CELL, &book.author);
                dom.append_text(tr, "div", GRID_CELL, &book.publisher);
            }
            None => {
                for _ in 0..4 {
                    dom.append_text(tr, "div", GRID_CELL, "\u{a0}");
                }
            }
        }
    }
}

// ============================================================================
// Practice form
// ============================================================================

const FORM_CONTROLS: &[&str] = &["firstName", "lastName", "userEmail", "userNumber"];

fn practice_form_page() -> MockPage {
    let (mut dom, main) = shell("Practice Form", Some(FORMS));
    let form = dom.append(main, "form", &[("id", "userForm")]);

    let text_input = |dom: &mut MockDom, attrs: &[(&str, &str)]| {
        let wrapper = dom.append(form, "div", &[("class", "mt-2 row")]);
        let input = dom.append(wrapper, "input", attrs);
        dom.set_style(input, "border-color", "rgb(206, 212, 218)");
        dom.set_style(input, "box-shadow", "none");
        input
    };
    text_input(
        &mut dom,
        &[
            ("id", "firstName"),
            ("type", "text"),
            ("placeholder", "First Name"),
            ("required", ""),
            ("class", "mr-sm-2 form-control"),
        ],
    );
    text_input(
        &mut dom,
        &[
            ("id", "lastName"),
            ("type", "text"),
            ("placeholder", "Last Name"),
            ("required", ""),
            ("class", "mr-sm-2 form-control"),
        ],
    );
    text_input(
        &mut dom,
        &[
            ("id", "userEmail"),
            ("type", "email"),
            ("placeholder", "name@example.com"),
            ("pattern", "[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\\.[a-zA-Z]{2,}"),
            ("class", "mr-sm-2 form-control"),
        ],
    );

    let genders = dom.append(form, "div", &[("class", "mt-2 row")]);
    let wrapper = dom.append(
        genders,
        "div",
        &[("id", "genterWrapper"), ("class", "col-md-9 col-sm-12")],
    );
    dom.set_style(wrapper, "border-color", "rgb(33, 37, 41)");
    dom.set_style(wrapper, "box-shadow", "none");
    for (i, gender) in ["Male", "Female", "Other"].into_iter().enumerate() {
        let id = format!("gender-radio-{}", i + 1);
        let holder = dom.append(
            wrapper,
            "div",
            &[("class", "custom-control custom-radio custom-control-inline")],
        );
        dom.append(
            holder,
            "input",
            &[
                ("id", &id),
                ("type", "radio"),
                ("name", "gender"),
                ("value", gender),
                ("required", ""),
                ("class", "custom-control-input"),
            ],
        );
        dom.append_text(
            holder,
            "label",
            &[("for", &id), ("class", "custom-control-label")],
            gender,
        );
    }

    text_input(
        &mut dom,
        &[
            ("id", "userNumber"),
            ("type", "text"),
            ("placeholder", "Mobile Number"),
            ("required", ""),
            ("minlength", "10"),
            ("maxlength", "10"),
            ("pattern", "\\d*"),
            ("class", " mr-sm-2 form-control"),
        ],
    );
    let today = chrono::Local::now().format("%d %b %Y").to_string();
    text_input(
        &mut dom,
        &[
            ("id", "dateOfBirthInput"),
            ("type", "text"),
            ("value", &today),
            ("class", "form-control"),
        ],
    );
    let address = dom.append(form, "div", &[("class", "mt-2 row")]);
    dom.append(
        address,
        "textarea",
        &[
            ("id", "currentAddress"),
            ("placeholder", "Current Address"),
            ("rows", "5"),
            ("class", "form-control"),
        ],
    );
    let submit_row = dom.append(form, "div", &[("class", "mt-4 justify-content-end row")]);
    dom.append_text(
        submit_row,
        "button",
        &[
            ("id", "submit"),
            ("type", "submit"),
            ("class", "btn btn-primary"),
            ("data-obscured-by", "adplus-anchor"),
        ],
        "Submit",
    );

    MockPage::new(dom).with_hook(|dom, event| match *event {
        MockEvent::Key(node, crate::driver::Key::Enter)
            if dom.attr(node, "id") == Some("dateOfBirthInput") =>
        {
            let typed = dom.attr(node, "value").unwrap_or("").to_string();
            if let Ok(date) = chrono::NaiveDate::parse_from_str(&typed, "%m/%d/%Y") {
                dom.set_attr(node, "value", &date.format("%d %b %Y").to_string());
            }
        }
        MockEvent::Click(_) => {
            let Some(chain) = click_chain(dom, event) else {
                return;
            };
            if chain.iter().any(|n| dom.attr(*n, "id") == Some("submit")) {
                submit_form(dom);
            } else if chain.iter().any(|n| dom.attr(*n, "id") == Some("closeLargeModal")) {
                if let Ok(modals) = dom.find(dom.root(), &Locator::css("div.modal")) {
                    for modal in modals {
                        dom.detach(modal);
                    }
                }
            }
        }
        _ => {}
    })
}

fn submit_form(dom: &mut MockDom) {
    if let Some(form) = dom.by_id("userForm") {
        dom.add_class(form, "was-validated");
    }
    let mut valid = true;
    for id in FORM_CONTROLS {
        let Some(node) = dom.by_id(id) else {
            continue;
        };
        let invalid = is_invalid_control(dom, node);
        let colour = if invalid { ERROR_RED } else { VALID_GREEN };
        dom.set_style(node, "border-color", colour);
        valid &= !invalid;
    }

    let radios = dom
        .find(dom.root(), &Locator::css("input[name='gender']"))
        .unwrap_or_default();
    let gender = radios
        .iter()
        .find(|r| dom.prop_bool(**r, "checked"))
        .and_then(|r| dom.attr(*r, "value"))
        .map(str::to_string);
    if let Some(wrapper) = dom.by_id("genterWrapper") {
        let colour = if gender.is_some() { VALID_GREEN } else { ERROR_RED };
        dom.set_style(wrapper, "border-color", colour);
    }
    if !valid || gender.is_none() {
        return;
    }

    let dob = field_value(dom, "dateOfBirthInput");
    let dob = chrono::NaiveDate::parse_from_str(&dob, "%d %b %Y")
        .map_or(dob, |d| d.format("%d %B,%Y").to_string());
    let rows = [
        (
            "Student Name",
            format!("{} {}", field_value(dom, "firstName"), field_value(dom, "lastName")),
        ),
        ("Student Email", field_value(dom, "userEmail")),
        ("Gender", gender.unwrap_or_default()),
        ("Mobile", field_value(dom, "userNumber")),
        ("Date of Birth", dob),
        ("Subjects", String::new()),
        ("Hobbies", String::new()),
        ("Picture", String::new()),
        ("Address", field_value(dom, "currentAddress")),
        ("State and City", String::new()),
    ];

    let body = dom.body();
    let modal = dom.append(body, "div", &[("class", "fade modal show"), ("role", "dialog")]);
    let dialog = dom.append(modal, "div", &[("class", "modal-dialog modal-lg")]);
    let content = dom.append(dialog, "div", &[("class", "modal-content")]);
    let header = dom.append(content, "div", &[("class", "modal-header")]);
    dom.append_text(
        header,
        "div",
        &[("id", "example-modal-sizes-title-lg"), ("class", "modal-title h4")],
        "Thanks for submitting the form",
    );
    let modal_body = dom.append(content, "div", &[("class", "modal-body")]);
    let table = dom.append(modal_body, "table", &[("class", "table table-dark table-striped")]);
    let tbody = dom.append(table, "tbody", &[]);
    for (label, value) in rows {
        let tr = dom.append(tbody, "tr", &[]);
        dom.append_text(tr, "td", &[], label);
        dom.append_text(tr, "td", &[], &value);
    }
    let footer = dom.append(content, "div", &[("class", "modal-footer")]);
    dom.append_text(
        footer,
        "button",
        &[("id", "closeLargeModal"), ("type", "button"), ("class", "btn btn-primary")],
        "Close",
    );
}

fn field_value(dom: &MockDom, id: &str) -> String {
    dom.by_id(id)
        .and_then(|n| dom.attr(n, "value"))
        .unwrap_or("")
        .trim()
        .to_string()
}

// ============================================================================
// Dynamic properties
// ============================================================================

fn dynamic_properties_page(options: &SiteOptions) -> MockPage {
    let (mut dom, main) = shell("Dynamic Properties", Some(ELEMENTS));
    let column = dom.append(main, "div", &[]);
    dom.append_text(column, "p", &[("id", "3Uxm9")], "This text has random Id");
    dom.append_text(
        column,
        "button",
        &[
            ("id", "enableAfter"),
            ("type", "button"),
            ("disabled", ""),
            ("class", "mt-4 btn btn-primary"),
        ],
        "Will enable 5 seconds",
    );
    let color = dom.append_text(
        column,
        "button",
        &[("id", "colorChange"), ("type", "button"), ("class", "mt-4 btn btn-primary")],
        "Color Change",
    );
    dom.set_style(color, "color", "rgb(255, 255, 255)");
    dom.set_style(color, "background-color", "rgb(0, 123, 255)");

    MockPage::new(dom)
        .with_timer(options.enable_after, |dom| {
            if let Some(button) = dom.by_id("enableAfter") {
                dom.remove_attr(button, "disabled");
            }
        })
        .with_timer(options.color_change_after, |dom| {
            if let Some(button) = dom.by_id("colorChange") {
                dom.add_class(button, "text-danger");
                dom.set_style(button, "color", ERROR_RED);
            }
        })
        .with_timer(options.visible_after, move |dom| {
            dom.append_text(
                column,
                "button",
                &[("id", "visibleAfter"), ("type", "button"), ("class", "mt-4 btn btn-primary")],
                "Visible After 5 Seconds",
            );
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::Driver;

    async fn titles(driver: &MockDriver) -> Vec<String> {
        let cells = driver
            .find_all(&Locator::css(".rt-tr-group .rt-td:nth-child(2)"))
            .await
            .unwrap();
        let mut out = Vec::new();
        for cell in cells {
            let text = driver.text(&cell).await.unwrap();
            if !text.trim().is_empty() {
                out.push(text.trim().to_string());
            }
        }
        out
    }

    async fn click(driver: &MockDriver, locator: &Locator) {
        let el = driver.find_all(locator).await.unwrap().remove(0);
        driver.js_click(&el).await.unwrap();
    }

    mod tree_model {
        use super::*;

        #[test]
        fn test_leaves_and_parents() {
            assert_eq!(TREE.leaves().len(), 11);
            assert_eq!(
                TREE.parents(),
                vec!["home", "desktop", "documents", "workspace", "office", "downloads"]
            );
            assert_eq!(
                TREE.find("office").map(TreeDef::leaves),
                Some(vec!["public", "private", "classified", "general"])
            );
        }

        #[test]
        fn test_cascade() {
            let mut model = TreeModel::default();
            model.toggle_check("desktop");
            assert_eq!(TREE.state(&model.checked), Tri::Half);
            assert_eq!(TREE.find("desktop").map(|d| d.state(&model.checked)), Some(Tri::On));

            let mut selected = Vec::new();
            TREE.checked_values(&model.checked, &mut selected);
            assert_eq!(selected, vec!["desktop", "notes", "commands"]);

            model.toggle_check("desktop");
            assert!(model.checked.is_empty());
        }
    }

    mod pages {
        use super::*;

        #[tokio::test]
        async fn test_expand_all_renders_every_node() {
            let driver = MockDriver::demoqa();
            driver.navigate("https://demoqa.com/checkbox").await.unwrap();
            assert_eq!(driver.find_all(&Locator::css("span.rct-title")).await.unwrap().len(), 1);

            click(&driver, &Locator::css("button[title='Expand all']")).await;
            assert_eq!(driver.find_all(&Locator::css("span.rct-title")).await.unwrap().len(), 17);
        }

        #[tokio::test]
        async fn test_checking_branch_updates_result() {
            let driver = MockDriver::demoqa();
            driver.navigate("https://demoqa.com/checkbox").await.unwrap();
            click(&driver, &Locator::css("button[title='Expand all']")).await;
            click(&driver, &Locator::css("label[for='tree-node-desktop'] span.rct-checkbox")).await;

            let result = driver.find_all(&Locator::id("result")).await.unwrap().remove(0);
            let text = driver.text(&result).await.unwrap();
            assert_eq!(text, "You have selected :\ndesktop\nnotes\ncommands");

            let home = driver.find_all(&Locator::id("tree-node-home")).await.unwrap().remove(0);
            assert_eq!(driver.property(&home, "indeterminate").await.unwrap(), true);
        }

        #[tokio::test]
        async fn test_book_table_loads_then_filters() {
            let driver = MockDriver::demoqa();
            driver.navigate("https://demoqa.com/books").await.unwrap();
            assert!(titles(&driver).await.is_empty());

            tokio::time::sleep(Duration::from_millis(150)).await;
            assert_eq!(titles(&driver).await.len(), 8);

            let search = driver.find_all(&Locator::id("searchBox")).await.unwrap().remove(0);
            driver.send_keys(&search, "git").await.unwrap();
            assert_eq!(titles(&driver).await, vec!["Git Pocket Guide"]);

            driver.clear(&search).await.unwrap();
            driver.send_keys(&search, "zzz").await.unwrap();
            assert!(titles(&driver).await.is_empty());
            let no_data = driver.find_all(&Locator::css(".rt-noData")).await.unwrap().remove(0);
            assert!(driver.is_displayed(&no_data).await.unwrap());
        }

        #[tokio::test]
        async fn test_form_submission_opens_modal() {
            let driver = MockDriver::demoqa();
            driver.navigate("https://demoqa.com/automation-practice-form").await.unwrap();
            let values = [("firstName", "Jane"), ("lastName", "Doe"), ("userNumber", "0123456789")];
            for (id, value) in values {
                let input = driver.find_all(&Locator::id(id)).await.unwrap().remove(0);
                driver.send_keys(&input, value).await.unwrap();
            }
            click(&driver, &Locator::css("label[for='gender-radio-2']")).await;
            click(&driver, &Locator::id("submit")).await;

            let cells = driver.find_all(&Locator::css("div.modal-content td")).await.unwrap();
            assert_eq!(cells.len(), 20);
            assert_eq!(driver.text(&cells[1]).await.unwrap(), "Jane Doe");
            assert_eq!(driver.text(&cells[5]).await.unwrap(), "Female");

            click(&driver, &Locator::id("closeLargeModal")).await;
            assert!(driver.find_all(&Locator::css("div.modal-content")).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_invalid_submission_marks_fields() {
            let driver = MockDriver::demoqa();
            driver.navigate("https://demoqa.com/automation-practice-form").await.unwrap();
            click(&driver, &Locator::id("submit")).await;

            let mobile = driver.find_all(&Locator::id("userNumber")).await.unwrap().remove(0);
            assert_eq!(driver.css_value(&mobile, "border-color").await.unwrap(), ERROR_RED);
            assert!(driver.find_all(&Locator::css("div.modal-content")).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_sidebar_shows_active_group_only() {
            let driver = MockDriver::demoqa();
            driver.navigate("https://demoqa.com/elements").await.unwrap();
            let text_box = driver
                .find_all(&Locator::css("span.text").with_text("Text Box"))
                .await
                .unwrap()
                .remove(0);
            let login = driver
                .find_all(&Locator::css("span.text").with_text("Login"))
                .await
                .unwrap()
                .remove(0);
            assert!(driver.is_displayed(&text_box).await.unwrap());
            assert!(!driver.is_displayed(&login).await.unwrap());
        }
    }
}
