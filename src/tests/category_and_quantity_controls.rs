use super::*;

const CATEGORY_FILTER: &str = r#"
    <select id="categoryFilter" class="form-select">
      <option value="">All categories</option>
      <option value="FRUIT">Fruit</option>
      <option value="VEGETABLE">Vegetable</option>
      <option value="Fruit &amp; Veg">Mixed boxes</option>
    </select>
    "#;

const QUANTITY_STEPPER: &str = r#"
    <div class="input-group">
      <button type="button" class="btn quantity-decrement" id="minus">-</button>
      <input type="number" id="qty" name="quantity" value="2" min="1" max="5">
      <button type="button" class="btn quantity-increment" id="plus">+</button>
    </div>
    "#;

#[test]
fn choosing_a_category_navigates_to_its_listing() -> Result<()> {
    let mut page = Storefront::from_html_with_url("http://localhost/products", CATEGORY_FILTER)?;
    page.select_option("#categoryFilter", "FRUIT")?;

    assert_eq!(
        page.take_location_navigations(),
        vec![LocationNavigation {
            kind: LocationNavigationKind::HrefSet,
            from: "http://localhost/products".into(),
            to: "http://localhost/products?category=FRUIT".into(),
        }]
    );
    assert_eq!(page.location(), "http://localhost/products?category=FRUIT");
    Ok(())
}

#[test]
fn clearing_the_category_returns_to_all_products() -> Result<()> {
    let mut page = Storefront::from_html_with_url(
        "https://shop.example/products?category=FRUIT",
        CATEGORY_FILTER,
    )?;
    page.select_option("#categoryFilter", "")?;

    let navigations = page.take_location_navigations();
    assert_eq!(navigations.len(), 1);
    assert_eq!(navigations[0].to, "https://shop.example/products");
    assert_eq!(page.location(), "https://shop.example/products");
    Ok(())
}

#[test]
fn category_value_is_percent_encoded() -> Result<()> {
    let mut page = Storefront::from_html(CATEGORY_FILTER)?;
    page.select_option("#categoryFilter", "Fruit & Veg")?;
    assert_eq!(
        page.location(),
        "http://localhost/products?category=Fruit%20%26%20Veg"
    );
    Ok(())
}

#[test]
fn unknown_category_option_is_rejected() -> Result<()> {
    let mut page = Storefront::from_html(CATEGORY_FILTER)?;
    assert!(matches!(
        page.select_option("#categoryFilter", "DAIRY"),
        Err(Error::Runtime(_))
    ));
    assert!(page.take_location_navigations().is_empty());
    Ok(())
}

#[test]
fn select_option_requires_a_select_element() -> Result<()> {
    let mut page = Storefront::from_html(QUANTITY_STEPPER)?;
    assert!(matches!(
        page.select_option("#qty", "3"),
        Err(Error::TypeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn change_event_without_a_new_choice_still_navigates() -> Result<()> {
    let mut page = Storefront::from_html(CATEGORY_FILTER)?;
    page.dispatch("#categoryFilter", "change")?;
    assert_eq!(page.location(), "http://localhost/products");
    Ok(())
}

#[test]
fn decrement_stops_at_one() -> Result<()> {
    let mut page = Storefront::from_html(QUANTITY_STEPPER)?;
    page.click("#minus")?;
    page.assert_value("#qty", "1")?;
    page.click("#minus")?;
    page.assert_value("#qty", "1")?;
    Ok(())
}

#[test]
fn increment_stops_at_declared_max() -> Result<()> {
    let mut page = Storefront::from_html(QUANTITY_STEPPER)?;
    for _ in 0..6 {
        page.click("#plus")?;
    }
    page.assert_value("#qty", "5")?;
    Ok(())
}

#[test]
fn value_at_ninety_nine_stays_there() -> Result<()> {
    let html = r#"
        <button class="quantity-decrement">-</button>
        <input id="qty" value="99" max="99">
        <button class="quantity-increment" id="plus">+</button>
        "#;
    let mut page = Storefront::from_html(html)?;
    page.click("#plus")?;
    page.assert_value("#qty", "99")?;
    Ok(())
}

#[test]
fn missing_max_caps_at_ninety_nine() -> Result<()> {
    let html = r#"
        <input id="qty" value="98">
        <button class="quantity-increment" id="plus">+</button>
        "#;
    let mut page = Storefront::from_html(html)?;
    page.click("#plus")?;
    page.assert_value("#qty", "99")?;
    page.click("#plus")?;
    page.assert_value("#qty", "99")?;
    Ok(())
}

#[test]
fn every_stepper_on_the_page_is_wired() -> Result<()> {
    let html = r#"
        <div><button class="quantity-decrement" id="a-minus">-</button><input id="a" value="3"></div>
        <div><button class="quantity-decrement" id="b-minus">-</button><input id="b" value="7"></div>
        "#;
    let mut page = Storefront::from_html(html)?;
    assert_eq!(page.listener_count(), 2);
    page.click("#b-minus")?;
    page.assert_value("#a", "3")?;
    page.assert_value("#b", "6")?;
    Ok(())
}

#[test]
fn click_on_button_content_reaches_the_stepper() -> Result<()> {
    let html = r#"
        <input id="qty" value="1" max="3">
        <button class="quantity-increment"><i id="plus-icon" class="bi bi-plus"></i></button>
        "#;
    let mut page = Storefront::from_html(html)?;
    page.click("#plus-icon")?;
    page.assert_value("#qty", "2")?;
    Ok(())
}

#[test]
fn steppers_are_not_wired_on_cart_pages() -> Result<()> {
    let mut page = Storefront::from_html_with_url("http://localhost/cart", QUANTITY_STEPPER)?;
    assert_eq!(page.listener_count(), 0);
    page.click("#plus")?;
    page.click("#minus")?;
    page.assert_value("#qty", "2")?;
    Ok(())
}

#[test]
fn stepper_handler_can_still_be_run_directly_on_cart_pages() -> Result<()> {
    let mut page = Storefront::from_html_with_url("http://localhost/cart", QUANTITY_STEPPER)?;
    page.run_handler(Handler::IncrementQuantity, "#plus")?;
    page.assert_value("#qty", "3")?;
    Ok(())
}

#[test]
fn stepper_without_adjacent_input_does_nothing() -> Result<()> {
    let html = r#"
        <input id="qty" value="4">
        <span>units</span>
        <button class="quantity-increment" id="plus">+</button>
        <button class="quantity-decrement" id="minus">-</button>
        "#;
    let mut page = Storefront::from_html(html)?;
    page.click("#plus")?;
    page.click("#minus")?;
    page.assert_value("#qty", "4")?;
    Ok(())
}

#[test]
fn non_numeric_quantity_is_left_unchanged() -> Result<()> {
    let mut page = Storefront::from_html(QUANTITY_STEPPER)?;
    page.type_text("#qty", "")?;
    page.click("#plus")?;
    page.assert_value("#qty", "")?;
    Ok(())
}

#[test]
fn fractional_quantity_steps_from_its_integer_part() -> Result<()> {
    let mut page = Storefront::from_html(QUANTITY_STEPPER)?;
    page.type_text("#qty", "2.7")?;
    page.click("#plus")?;
    page.assert_value("#qty", "3")?;
    Ok(())
}

#[test]
fn disabled_stepper_ignores_clicks() -> Result<()> {
    let html = r#"
        <input id="qty" value="2">
        <button class="quantity-increment" id="plus" disabled>+</button>
        "#;
    let mut page = Storefront::from_html(html)?;
    page.click("#plus")?;
    page.assert_value("#qty", "2")?;
    Ok(())
}

#[test]
fn stepper_ignores_digits_from_other_scripts() -> Result<()> {
    let mut page = Storefront::from_html(QUANTITY_STEPPER)?;
    page.type_text("#qty", "\u{0663}")?;

    page.click("#minus")?;
    page.assert_value("#qty", "\u{0663}")?;
    page.click("#plus")?;
    page.assert_value("#qty", "\u{0663}")?;
    Ok(())
}
