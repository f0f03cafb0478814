use super::*;

const GROCERY_LISTING: &str = r#"
    <input id="productSearch" type="text" placeholder="Search products">
    <div class="row">
      <div class="col product-card-container" id="apple">
        <div class="card">
          <h5 class="product-title">Red Apple</h5>
          <p class="product-description">Fresh fruit</p>
        </div>
      </div>
      <div class="col product-card-container" id="milk">
        <div class="card">
          <h5 class="product-title">Milk</h5>
          <p class="product-description">Dairy, 1L</p>
        </div>
      </div>
    </div>
    "#;

#[test]
fn typing_hides_cards_that_do_not_match() -> Result<()> {
    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    page.type_text("#productSearch", "fr")?;

    page.assert_visible("#apple", true)?;
    page.assert_visible("#milk", false)?;
    assert_eq!(page.visible_product_titles()?, vec!["Red Apple".to_string()]);
    Ok(())
}

#[test]
fn clearing_the_query_shows_every_card_again() -> Result<()> {
    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    page.type_text("#productSearch", "milk")?;
    assert_eq!(page.visible_product_titles()?, vec!["Milk".to_string()]);

    page.type_text("#productSearch", "")?;
    assert_eq!(
        page.visible_product_titles()?,
        vec!["Red Apple".to_string(), "Milk".to_string()]
    );
    Ok(())
}

#[test]
fn query_case_is_ignored() -> Result<()> {
    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    page.type_text("#productSearch", "DAIRY")?;
    assert_eq!(page.visible_product_titles()?, vec!["Milk".to_string()]);
    Ok(())
}

#[test]
fn query_matching_nothing_hides_everything() -> Result<()> {
    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    page.type_text("#productSearch", "banana")?;
    assert!(page.visible_product_titles()?.is_empty());
    page.assert_visible("#apple", false)?;
    page.assert_visible("#milk", false)?;
    Ok(())
}

#[test]
fn each_keystroke_recomputes_from_scratch() -> Result<()> {
    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    page.type_text("#productSearch", "m")?;
    assert_eq!(page.visible_product_titles()?, vec!["Milk".to_string()]);
    page.type_text("#productSearch", "a")?;
    assert_eq!(
        page.visible_product_titles()?,
        vec!["Red Apple".to_string(), "Milk".to_string()]
    );
    Ok(())
}

#[test]
fn last_search_view_records_query_and_decisions() -> Result<()> {
    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    assert!(page.last_search_view().is_none());

    page.type_text("#productSearch", "fr")?;
    let view = page
        .last_search_view()
        .ok_or_else(|| Error::Runtime("search did not run".into()))?;
    assert_eq!(view.query, "fr");
    assert_eq!(view.visibility, vec![true, false]);
    Ok(())
}

#[test]
fn card_without_description_is_matched_on_title_only() -> Result<()> {
    let html = r#"
        <input id="productSearch">
        <div class="product-card-container" id="carrot">
          <span class="product-title">Carrot</span>
        </div>
        <div class="product-card-container" id="leek">
          <span class="product-title">Leek</span>
        </div>
        "#;
    let mut page = Storefront::from_html(html)?;
    page.type_text("#productSearch", "car")?;
    page.assert_visible("#carrot", true)?;
    page.assert_visible("#leek", false)?;

    let items = page.product_items()?;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].description, None);
    Ok(())
}

#[test]
fn card_without_title_is_left_alone() -> Result<()> {
    let html = r#"
        <input id="productSearch">
        <div class="product-card-container" id="promo">
          <p class="product-description">Weekly deals</p>
        </div>
        <div class="product-card-container" id="milk">
          <h5 class="product-title">Milk</h5>
        </div>
        "#;
    let mut page = Storefront::from_html(html)?;
    page.type_text("#productSearch", "zzz")?;
    page.assert_visible("#promo", true)?;
    page.assert_visible("#milk", false)?;
    assert_eq!(page.product_items()?.len(), 1);
    Ok(())
}

#[test]
fn hiding_keeps_other_inline_styles() -> Result<()> {
    let html = r#"
        <input id="productSearch">
        <div class="product-card-container" id="apple" style="margin: 0">
          <h5 class="product-title">Apple</h5>
        </div>
        "#;
    let mut page = Storefront::from_html(html)?;
    page.type_text("#productSearch", "pear")?;
    assert!(page
        .dump_dom("#apple")?
        .contains(r#"style="margin: 0; display: none;""#));

    page.type_text("#productSearch", "app")?;
    assert!(page.dump_dom("#apple")?.contains(r#"style="margin: 0;""#));
    page.assert_visible("#apple", true)?;
    Ok(())
}

#[test]
fn whitespace_query_is_matched_literally() -> Result<()> {
    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    page.type_text("#productSearch", " ")?;
    assert_eq!(
        page.visible_product_titles()?,
        vec!["Red Apple".to_string(), "Milk".to_string()]
    );
    page.type_text("#productSearch", "apple ")?;
    assert!(page.visible_product_titles()?.is_empty());
    Ok(())
}

#[test]
fn dispatching_input_and_running_the_handler_directly_both_filter() -> Result<()> {
    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    page.type_text("#productSearch", "fresh")?;
    page.type_text("#productSearch", "")?;

    page.run_handler(Handler::FilterProducts, "#productSearch")?;
    assert_eq!(page.visible_product_titles()?.len(), 2);

    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    page.run_handler(Handler::FilterProducts, "#productSearch")?;
    page.dispatch("#productSearch", "input")?;
    assert_eq!(page.visible_product_titles()?.len(), 2);
    Ok(())
}

#[test]
fn page_without_search_box_has_no_search_listener() -> Result<()> {
    let html = r#"
        <input id="newsletter">
        <div class="product-card-container"><h5 class="product-title">Milk</h5></div>
        "#;
    let mut page = Storefront::from_html(html)?;
    assert_eq!(page.listener_count(), 0);
    page.type_text("#newsletter", "zzz")?;
    assert_eq!(page.visible_product_titles()?, vec!["Milk".to_string()]);
    assert!(page.last_search_view().is_none());
    Ok(())
}

#[test]
fn disabled_search_box_ignores_typing() -> Result<()> {
    let html = r#"
        <input id="productSearch" disabled>
        <div class="product-card-container"><h5 class="product-title">Milk</h5></div>
        "#;
    let mut page = Storefront::from_html(html)?;
    page.type_text("#productSearch", "zzz")?;
    page.assert_value("#productSearch", "")?;
    assert_eq!(page.visible_product_titles()?, vec!["Milk".to_string()]);
    Ok(())
}

#[test]
fn typing_into_a_non_text_control_is_a_type_mismatch() -> Result<()> {
    let mut page = Storefront::from_html(GROCERY_LISTING)?;
    let err = page.type_text("#apple", "x").err();
    assert!(matches!(
        err,
        Some(Error::TypeMismatch { ref actual, .. }) if actual == "div"
    ));
    Ok(())
}

#[test]
fn decomposed_accent_in_title_still_contains_its_base_letter() -> Result<()> {
    let mut page = Storefront::from_html(
        "<input id=\"productSearch\">\
         <div class=\"product-card-container\" id=\"creme\">\
           <h5 class=\"product-title\">Cre\u{0300}me Brulee</h5>\
         </div>\
         <div class=\"product-card-container\" id=\"cress\">\
           <h5 class=\"product-title\">Watercress</h5>\
         </div>",
    )?;
    page.type_text("#productSearch", "cre")?;
    page.assert_visible("#creme", true)?;
    page.assert_visible("#cress", true)?;

    page.type_text("#productSearch", "cr\u{e8}me")?;
    page.assert_visible("#creme", false)?;
    page.assert_visible("#cress", false)?;
    Ok(())
}
