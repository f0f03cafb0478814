use super::*;

pub const TOOLTIP_SELECTOR: &str = r#"[data-bs-toggle="tooltip"]"#;

const ORIGINAL_TITLE_ATTR: &str = "data-bs-original-title";
const DATA_TITLE_ATTR: &str = "data-bs-title";

/// Turns every tooltip trigger into an initialized tooltip. A non-empty
/// `title` moves to `data-bs-original-title` so the native tooltip no longer
/// shows, and doubles as `aria-label` on triggers with no text and no label.
/// Triggers without a title are left as they are.
pub(crate) fn initialize_tooltips(dom: &mut Dom) -> Result<Vec<NodeId>> {
    let triggers = dom.query_selector_all(TOOLTIP_SELECTOR)?;
    for trigger in &triggers {
        let Some(title) = dom.attr(*trigger, "title").filter(|title| !title.is_empty()) else {
            continue;
        };
        if dom.attr(*trigger, "aria-label").is_none() && dom.text_content(*trigger).trim().is_empty()
        {
            dom.set_attr(*trigger, "aria-label", &title)?;
        }
        dom.set_attr(*trigger, ORIGINAL_TITLE_ATTR, &title)?;
        dom.remove_attr(*trigger, "title")?;
    }
    Ok(triggers)
}

/// Title an initialized trigger shows: `data-bs-title` when set, else the
/// title captured at initialization.
pub(crate) fn tooltip_title(dom: &Dom, trigger: NodeId) -> Option<String> {
    dom.attr(trigger, DATA_TITLE_ATTR)
        .filter(|title| !title.is_empty())
        .or_else(|| dom.attr(trigger, ORIGINAL_TITLE_ATTR))
}
