//! Page objects for the DemoQA application areas.
//!
//! Every page wraps a [`BasePage`] bound to one driver session and exposes
//! domain operations. Pages hold no state of their own and are cheap to
//! rebuild per step.

pub mod base;
pub mod bookstore;
pub mod checkbox;
pub mod dynamic_properties;
pub mod home;
pub mod locators;
pub mod practice_form;

pub use base::{BasePage, PageObject, OVERLAY_IDS};
pub use bookstore::{BookStorePage, UiBook};
pub use checkbox::CheckboxPage;
pub use dynamic_properties::DynamicPropertiesPage;
pub use home::HomePage;
pub use practice_form::{FieldError, FieldSnapshot, FormField, Gender, PracticeFormPage};
