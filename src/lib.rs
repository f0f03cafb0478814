//! Storefront page glue over an in-memory document.
//!
//! A [`Storefront`] parses product-listing markup, wires the page behaviors
//! (live product search, category navigation, quantity steppers, tooltips and
//! alert auto-dismissal) through an explicit registration table, and exposes
//! user actions plus deterministic mocks for the browser services the glue
//! talks to.
//!
//! The live search itself is a pure function in [`search`] and can be used
//! without a page.

use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error as StdError;
use std::fmt;

mod alerts;
mod bindings;
pub mod cart;
pub mod category;
mod dom;
mod html;
mod location;
mod numeric;
pub mod price;
pub mod quantity;
mod scheduler;
pub mod search;
mod selector;
mod storefront;
mod tooltip;
mod trace;

pub use alerts::{ALERT_DISMISS_DELAY_MS, ALERT_SELECTOR};
pub use bindings::{BINDINGS, Binding, ElementRole, EventKind, Handler};
pub use price::{Price, format_price};
pub use scheduler::PendingTimer;
pub use search::{Item, SearchView};
pub use storefront::{
    DEFAULT_DELETE_MESSAGE, DEFAULT_DOCUMENT_URL, FormSubmission, LocationNavigation,
    LocationNavigationKind, PRODUCT_CARD_SELECTOR, Storefront,
};
pub use tooltip::TOOLTIP_SELECTOR;

use dom::{Dom, NodeId};
use selector::{SelectorAttrCondition, SelectorCombinator, SelectorPart, SelectorStep};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    UnsupportedSelector(String),
    SelectorNotFound(String),
    InvalidPrice(String),
    Runtime(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::InvalidPrice(raw) => write!(f, "invalid price: {raw}"),
            Self::Runtime(msg) => write!(f, "storefront runtime error: {msg}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut it = value.chars();
    let mut out = String::new();
    for _ in 0..max_chars {
        let Some(ch) = it.next() else {
            return out;
        };
        out.push(ch);
    }
    if it.next().is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests;
