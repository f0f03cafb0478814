//! Add-to-cart stock validation.

use crate::numeric::parse_int_prefix;

/// Selector of the quantity control inside an add-to-cart form.
pub const QUANTITY_INPUT_SELECTOR: &str = r#"input[name="quantity"]"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddToCartOutcome {
    Submit,
    Rejected { message: String },
}

impl AddToCartOutcome {
    pub fn is_submit(&self) -> bool {
        matches!(self, Self::Submit)
    }
}

/// Message shown when a shopper asks for more units than are in stock.
pub fn stock_message(max_stock: i64, product_name: &str) -> String {
    format!("Sorry, only {max_stock} units of \"{product_name}\" are available.")
}

/// Checks a requested quantity against the stock declared on the input.
///
/// A missing or empty `max` means nothing is in stock. When either side is
/// not a number the request is not compared and passes through to the server.
pub fn validate_add_to_cart(
    quantity_raw: &str,
    max_attr: Option<&str>,
    product_name: &str,
) -> AddToCartOutcome {
    let max_stock = match max_attr.filter(|raw| !raw.is_empty()) {
        None => Some(0),
        Some(raw) => parse_int_prefix(raw),
    };
    match (parse_int_prefix(quantity_raw), max_stock) {
        (Some(quantity), Some(max_stock)) if quantity > max_stock => AddToCartOutcome::Rejected {
            message: stock_message(max_stock, product_name),
        },
        _ => AddToCartOutcome::Submit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_quantity_above_stock_with_named_message() {
        let outcome = validate_add_to_cart("5", Some("3"), "Honeycrisp Apple");
        assert_eq!(
            outcome,
            AddToCartOutcome::Rejected {
                message: "Sorry, only 3 units of \"Honeycrisp Apple\" are available.".into(),
            }
        );
        assert!(!outcome.is_submit());
    }

    #[test]
    fn accepts_quantity_up_to_stock() {
        assert!(validate_add_to_cart("3", Some("3"), "Milk").is_submit());
        assert!(validate_add_to_cart("1", Some("3"), "Milk").is_submit());
    }

    #[test]
    fn missing_stock_means_none_available() {
        let outcome = validate_add_to_cart("1", None, "Milk");
        assert_eq!(
            outcome,
            AddToCartOutcome::Rejected {
                message: stock_message(0, "Milk"),
            }
        );
    }

    #[test]
    fn empty_stock_attribute_counts_as_zero() {
        assert!(!validate_add_to_cart("1", Some(""), "Milk").is_submit());
    }

    #[test]
    fn non_numeric_stock_is_not_compared() {
        assert!(validate_add_to_cart("500", Some("plenty"), "Milk").is_submit());
    }

    #[test]
    fn non_numeric_quantity_is_not_compared() {
        assert!(validate_add_to_cart("", Some("3"), "Milk").is_submit());
        assert!(validate_add_to_cart("many", Some("3"), "Milk").is_submit());
        assert!(validate_add_to_cart("\u{0663}", Some("3"), "Milk").is_submit());
        assert!(validate_add_to_cart("9", Some("\u{0663}"), "Milk").is_submit());
    }
}
