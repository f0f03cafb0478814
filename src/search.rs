//! Live product search.
//!
//! The engine is a pure function of a query and the items currently rendered
//! on the page. It decides visibility only; the caller owns the presentation
//! and applies the decisions (see [`crate::Storefront`]).
//!
//! An item is visible iff the query, compared case-insensitively, is a
//! substring of its title or of its description. The empty query matches every
//! item. Whitespace is significant: a query of `" "` only matches text that
//! contains a space.

/// A rendered product entry as seen by the search box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub description: Option<String>,
}

impl Item {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The description, or the empty string when the item has none.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// Visibility of every item for one query, in item order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchView {
    pub query: String,
    pub visibility: Vec<bool>,
}

impl SearchView {
    pub fn is_visible(&self, index: usize) -> bool {
        self.visibility.get(index).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.visibility.iter().filter(|visible| **visible).count()
    }

    pub fn hidden_count(&self) -> usize {
        self.visibility.len() - self.visible_count()
    }

    /// Indices of visible items, ascending.
    pub fn visible_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.visibility
            .iter()
            .enumerate()
            .filter_map(|(index, visible)| visible.then_some(index))
    }
}

/// Case folding applied to both the query and item text before comparison.
/// Combining marks are kept as written, so `e` followed by U+0300 still
/// contains a plain `e`.
pub fn normalize_for_search(text: &str) -> String {
    text.to_lowercase()
}

fn matches_normalized(normalized_query: &str, item: &Item) -> bool {
    if normalized_query.is_empty() {
        return true;
    }
    normalize_for_search(&item.title).contains(normalized_query)
        || normalize_for_search(item.description_or_empty()).contains(normalized_query)
}

/// Whether a single item is visible for `query`.
pub fn matches(query: &str, item: &Item) -> bool {
    matches_normalized(&normalize_for_search(query), item)
}

/// Pairs each item with its visibility for `query`. Order and length of the
/// output equal those of `items`.
pub fn filter<'a>(query: &str, items: &'a [Item]) -> Vec<(&'a Item, bool)> {
    let normalized_query = normalize_for_search(query);
    items
        .iter()
        .map(|item| (item, matches_normalized(&normalized_query, item)))
        .collect()
}

/// Recomputes the whole view for `query`. Nothing from a previous view is
/// consulted.
pub fn evaluate(query: &str, items: &[Item]) -> SearchView {
    SearchView {
        query: query.to_string(),
        visibility: filter(query, items)
            .into_iter()
            .map(|(_, visible)| visible)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grocery() -> Vec<Item> {
        vec![
            Item::new("Red Apple").with_description("Fresh fruit"),
            Item::new("Milk").with_description("Dairy, 1L"),
        ]
    }

    #[test]
    fn substring_of_description_makes_item_visible() {
        let view = evaluate("fr", &grocery());
        assert_eq!(view.visibility, vec![true, false]);
        assert_eq!(view.visible_count(), 1);
        assert_eq!(view.hidden_count(), 1);
    }

    #[test]
    fn empty_query_shows_everything() {
        let view = evaluate("", &grocery());
        assert_eq!(view.visibility, vec![true, true]);
    }

    #[test]
    fn empty_item_list_is_a_no_op() {
        assert!(filter("apple", &[]).is_empty());
        assert_eq!(evaluate("apple", &[]).visible_count(), 0);
    }

    #[test]
    fn comparison_ignores_case_on_both_sides() {
        let items = grocery();
        assert!(matches("APPLE", &items[0]));
        assert!(matches("dAiRy", &items[1]));
        assert!(!matches("banana", &items[0]));
    }

    #[test]
    fn missing_description_is_searched_as_empty_text() {
        let items = vec![Item::new("Carrot"), Item::new("Leek")];
        let view = evaluate("car", &items);
        assert_eq!(view.visibility, vec![true, false]);
        assert!(!matches("fresh", &items[0]));
    }

    #[test]
    fn whitespace_query_is_not_trimmed() {
        let items = vec![
            Item::new("Red Apple"),
            Item::new("Milk").with_description("Dairy,1L"),
        ];
        assert_eq!(evaluate(" ", &items).visibility, vec![true, false]);
        assert_eq!(evaluate(" milk", &items).visibility, vec![false, false]);
    }

    #[test]
    fn matches_substrings_not_words() {
        let items = vec![Item::new("Pineapple")];
        assert!(matches("apple", &items[0]));
        assert!(matches("neap", &items[0]));
        assert!(!matches("apple pine", &items[0]));
    }

    #[test]
    fn decomposed_accents_are_compared_code_point_by_code_point() {
        let items = vec![Item::new("Cre\u{0300}me fraîche")];
        assert_eq!(evaluate("cre", &items).visibility, vec![true]);
        assert!(matches("CRE\u{0300}ME", &items[0]));
        assert!(!matches("crème", &items[0]));
        assert!(matches("fraîche", &items[0]));
        assert!(!matches("frai\u{0302}che", &items[0]));
    }

    #[test]
    fn visible_indices_follow_item_order() {
        let items = vec![
            Item::new("Green Apple"),
            Item::new("Milk"),
            Item::new("Apple Juice"),
        ];
        let view = evaluate("apple", &items);
        assert_eq!(view.visible_indices().collect::<Vec<_>>(), vec![0, 2]);
        assert!(view.is_visible(2));
        assert!(!view.is_visible(1));
        assert!(!view.is_visible(99));
    }

    #[test]
    fn filter_pairs_items_with_decisions_without_reordering() {
        let items = grocery();
        let decisions = filter("milk", &items);
        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].0.title, "Red Apple");
        assert!(!decisions[0].1);
        assert_eq!(decisions[1].0.title, "Milk");
        assert!(decisions[1].1);
    }
}
