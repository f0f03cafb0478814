//! Category filter navigation.

pub const PRODUCTS_PATH: &str = "/products";

/// Listing URL for a category choice. An empty choice means "all products".
pub fn category_listing_url(category: &str) -> String {
    if category.is_empty() {
        return PRODUCTS_PATH.to_string();
    }
    format!(
        "{PRODUCTS_PATH}?category={}",
        encode_query_component(category)
    )
}

fn encode_query_component(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for b in src.bytes() {
        if is_unescaped_component_byte(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(to_hex_upper(b >> 4));
            out.push(to_hex_upper(b & 0x0F));
        }
    }
    out
}

fn is_unescaped_component_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')'
        )
}

fn to_hex_upper(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + (nibble - 10)) as char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chosen_category_becomes_query_parameter() {
        assert_eq!(category_listing_url("Produce"), "/products?category=Produce");
        assert_eq!(category_listing_url("FRUIT"), "/products?category=FRUIT");
    }

    #[test]
    fn cleared_category_returns_to_full_listing() {
        assert_eq!(category_listing_url(""), "/products");
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        assert_eq!(
            category_listing_url("Fruit & Veg"),
            "/products?category=Fruit%20%26%20Veg"
        );
        assert_eq!(category_listing_url("Café"), "/products?category=Caf%C3%A9");
        assert_eq!(category_listing_url("a=b?c"), "/products?category=a%3Db%3Fc");
    }
}
