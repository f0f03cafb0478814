//! Page wiring table.
//!
//! Every page behavior that reacts to user input is listed in [`BINDINGS`]:
//! which element it attaches to, which event it listens for, and which
//! handler runs. The storefront registers the table at load time, skipping
//! roles whose elements are absent from the page.

use super::*;

/// Path fragment of the cart page, which wires its own quantity controls.
pub(crate) const CART_PATH_MARKER: &str = "/cart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRole {
    SearchInput,
    CategorySelect,
    QuantityDecrement,
    QuantityIncrement,
}

impl ElementRole {
    pub const fn selector(self) -> &'static str {
        match self {
            Self::SearchInput => "#productSearch",
            Self::CategorySelect => "#categoryFilter",
            Self::QuantityDecrement => ".quantity-decrement",
            Self::QuantityIncrement => ".quantity-increment",
        }
    }

    /// Roles looked up by id bind to the first matching element only.
    pub const fn is_unique(self) -> bool {
        matches!(self, Self::SearchInput | Self::CategorySelect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Input,
    Change,
    Click,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
            Self::Click => "click",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "input" => Some(Self::Input),
            "change" => Some(Self::Change),
            "click" => Some(Self::Click),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    FilterProducts,
    NavigateCategory,
    DecrementQuantity,
    IncrementQuantity,
}

impl Handler {
    pub const fn name(self) -> &'static str {
        match self {
            Self::FilterProducts => "filter_products",
            Self::NavigateCategory => "navigate_category",
            Self::DecrementQuantity => "decrement_quantity",
            Self::IncrementQuantity => "increment_quantity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub role: ElementRole,
    pub event: EventKind,
    pub handler: Handler,
}

impl Binding {
    /// Whether this binding is wired on a page at `pathname`.
    pub fn applies_to(&self, pathname: &str) -> bool {
        match self.role {
            ElementRole::QuantityDecrement | ElementRole::QuantityIncrement => {
                !pathname.contains(CART_PATH_MARKER)
            }
            ElementRole::SearchInput | ElementRole::CategorySelect => true,
        }
    }
}

pub const BINDINGS: &[Binding] = &[
    Binding {
        role: ElementRole::SearchInput,
        event: EventKind::Input,
        handler: Handler::FilterProducts,
    },
    Binding {
        role: ElementRole::CategorySelect,
        event: EventKind::Change,
        handler: Handler::NavigateCategory,
    },
    Binding {
        role: ElementRole::QuantityDecrement,
        event: EventKind::Click,
        handler: Handler::DecrementQuantity,
    },
    Binding {
        role: ElementRole::QuantityIncrement,
        event: EventKind::Click,
        handler: Handler::IncrementQuantity,
    },
];

/// Handlers attached to document nodes, in registration order per event.
#[derive(Debug, Default)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<EventKind, Vec<Handler>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node: NodeId, event: EventKind, handler: Handler) {
        self.map
            .entry(node)
            .or_default()
            .entry(event)
            .or_default()
            .push(handler);
    }

    pub(crate) fn handlers(&self, node: NodeId, event: EventKind) -> Vec<Handler> {
        self.map
            .get(&node)
            .and_then(|events| events.get(&event))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.map
            .values()
            .flat_map(|events| events.values())
            .map(Vec::len)
            .sum()
    }
}
