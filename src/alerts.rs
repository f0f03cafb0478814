use super::*;

/// Delay after page load before transient alerts are closed.
pub const ALERT_DISMISS_DELAY_MS: i64 = 5_000;

pub const ALERT_SELECTOR: &str = ".alert";

const SHOWN_CLASS: &str = "show";

/// Closes every alert currently in the document: the `show` class is dropped
/// and the element is removed. Returns how many alerts were closed.
pub(crate) fn dismiss_alerts(dom: &mut Dom) -> Result<usize> {
    let alerts = dom.query_selector_all(ALERT_SELECTOR)?;
    for alert in &alerts {
        dom.class_remove(*alert, SHOWN_CLASS)?;
        dom.detach(*alert)?;
    }
    Ok(alerts.len())
}
