use super::*;
use crate::alerts::dismiss_alerts;
use crate::bindings::ListenerStore;
use crate::cart::{AddToCartOutcome, QUANTITY_INPUT_SELECTOR, validate_add_to_cart};
use crate::category::category_listing_url;
use crate::html::parse_html;
use crate::location::{LocationParts, resolve_location};
use crate::quantity::{StepDirection, step_input_value};
use crate::scheduler::{ScheduledTask, SchedulerState, TimerTask};
use crate::search::evaluate;
use crate::tooltip::{initialize_tooltips, tooltip_title};
use crate::trace::TraceState;

/// Document URL used by [`Storefront::from_html`].
pub const DEFAULT_DOCUMENT_URL: &str = "http://localhost/";

pub const DEFAULT_DELETE_MESSAGE: &str = "Are you sure you want to delete this item?";

pub const PRODUCT_CARD_SELECTOR: &str = ".product-card-container";
const PRODUCT_TITLE_SELECTOR: &str = ".product-title";
const PRODUCT_DESCRIPTION_SELECTOR: &str = ".product-description";

const SNIPPET_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationNavigationKind {
    /// `location.href` was assigned.
    HrefSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationNavigation {
    pub kind: LocationNavigationKind,
    pub from: String,
    pub to: String,
}

/// A form submitted by the page glue. `action` is resolved against the
/// document URL; `method` is lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub form_id: String,
    pub action: String,
    pub method: String,
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Default)]
struct PlatformMockState {
    alert_messages: Vec<String>,
    confirm_messages: Vec<String>,
    confirm_responses: VecDeque<bool>,
    default_confirm_response: bool,
}

/// A storefront page loaded from markup, with its behaviors wired.
///
/// Loading runs the page bootstrap: tooltip triggers are initialized, alert
/// dismissal is scheduled [`ALERT_DISMISS_DELAY_MS`] after load, and every
/// entry of [`BINDINGS`] whose element exists is attached. User actions
/// (`type_text`, `select_option`, `click`, `dispatch`) then fire the attached
/// handlers synchronously.
///
/// Time is virtual and only moves through `advance_time`, `advance_time_to`
/// and `flush`. Browser dialogs, navigation and form submission are recorded
/// instead of performed; see the `take_*` methods.
#[derive(Debug)]
pub struct Storefront {
    dom: Dom,
    listeners: ListenerStore,
    document_url: String,
    tooltips: Vec<NodeId>,
    last_search: Option<SearchView>,
    scheduler: SchedulerState,
    platform_mocks: PlatformMockState,
    location_navigations: Vec<LocationNavigation>,
    submitted_forms: Vec<FormSubmission>,
    trace_state: TraceState,
}

impl Storefront {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_url(DEFAULT_DOCUMENT_URL, html)
    }

    /// Loads `html` as if served from `url`. The URL path decides which
    /// bindings apply (quantity steppers are not wired on cart pages).
    pub fn from_html_with_url(url: &str, html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        let mut storefront = Self {
            dom,
            listeners: ListenerStore::default(),
            document_url: resolve_location(DEFAULT_DOCUMENT_URL, url),
            tooltips: Vec::new(),
            last_search: None,
            scheduler: SchedulerState::default(),
            platform_mocks: PlatformMockState::default(),
            location_navigations: Vec::new(),
            submitted_forms: Vec::new(),
            trace_state: TraceState::default(),
        };
        storefront.bootstrap()?;
        Ok(storefront)
    }

    fn bootstrap(&mut self) -> Result<()> {
        self.tooltips = initialize_tooltips(&mut self.dom)?;
        self.trace_state
            .line(format!("[bind] tooltips count={}", self.tooltips.len()));

        let timer_id = self
            .scheduler
            .schedule(ALERT_DISMISS_DELAY_MS, TimerTask::DismissAlerts);
        self.trace_state.timer_line(format!(
            "[timer] schedule id={timer_id} task={} delay_ms={ALERT_DISMISS_DELAY_MS}",
            TimerTask::DismissAlerts.label()
        ));

        self.register_bindings()
    }

    fn register_bindings(&mut self) -> Result<()> {
        let pathname = self.pathname();
        for binding in BINDINGS {
            if !binding.applies_to(&pathname) {
                self.trace_state.line(format!(
                    "[bind] skip handler={} path={pathname}",
                    binding.handler.name()
                ));
                continue;
            }
            let mut targets = self.dom.query_selector_all(binding.role.selector())?;
            if binding.role.is_unique() {
                targets.truncate(1);
            }
            for target in &targets {
                self.listeners.add(*target, binding.event, binding.handler);
            }
            self.trace_state.line(format!(
                "[bind] handler={} event={} selector={} count={}",
                binding.handler.name(),
                binding.event.as_str(),
                binding.role.selector(),
                targets.len()
            ));
        }
        Ok(())
    }

    fn pathname(&self) -> String {
        LocationParts::parse(&self.document_url)
            .map(|parts| parts.pathname)
            .unwrap_or_default()
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) || self.dom.readonly(target) {
            return Ok(());
        }

        let tag = self.element_tag(selector, target, "input or textarea")?;
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)?;
        self.dispatch_event(target, EventKind::Input)
    }

    /// Chooses the option whose value is `value` and fires `change`.
    pub fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let tag = self.element_tag(selector, target, "select")?;
        if tag != "select" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".into(),
                actual: tag,
            });
        }
        if !self.dom.has_option_value(target, value) {
            return Err(Error::Runtime(format!(
                "select_option: no option with value {value:?} in {selector}"
            )));
        }

        self.dom.set_value(target, value)?;
        self.dispatch_event(target, EventKind::Change)
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        self.dispatch_event(target, EventKind::Click)
    }

    /// Fires `event` at the first element matching `selector`. Event names the
    /// page does not listen for are delivered to no one.
    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        match EventKind::parse(event) {
            Some(kind) => self.dispatch_event(target, kind),
            None => {
                let target_label = self.node_label(target);
                self.trace_state.event_line(format!(
                    "[event] done {event} target={target_label} handlers=0"
                ));
                Ok(())
            }
        }
    }

    /// Runs `handler` as if it were attached to the first element matching
    /// `selector`, whether or not the page wired it there.
    pub fn run_handler(&mut self, handler: Handler, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.run_handler_on(handler, target)
    }

    /// Delivers `event` to `target` and then to each ancestor in turn.
    fn dispatch_event(&mut self, target: NodeId, event: EventKind) -> Result<()> {
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }

        let target_label = self.node_label(target);
        let mut ran = 0usize;
        for current in path {
            for handler in self.listeners.handlers(current, event) {
                let current_label = self.node_label(current);
                self.trace_state.event_line(format!(
                    "[event] {} target={target_label} current={current_label} handler={}",
                    event.as_str(),
                    handler.name()
                ));
                self.run_handler_on(handler, current)?;
                ran += 1;
            }
        }
        self.trace_state.event_line(format!(
            "[event] done {} target={target_label} handlers={ran}",
            event.as_str()
        ));
        Ok(())
    }

    fn run_handler_on(&mut self, handler: Handler, current: NodeId) -> Result<()> {
        match handler {
            Handler::FilterProducts => self.filter_products(current),
            Handler::NavigateCategory => self.navigate_category(current),
            Handler::DecrementQuantity => self.step_quantity(current, StepDirection::Decrement),
            Handler::IncrementQuantity => self.step_quantity(current, StepDirection::Increment),
        }
    }

    fn filter_products(&mut self, search_input: NodeId) -> Result<()> {
        let query = self.dom.value(search_input)?;
        let (cards, items) = self.product_cards()?;
        let view = evaluate(&query, &items);
        for (index, card) in cards.iter().enumerate() {
            let display = if view.is_visible(index) { "" } else { "none" };
            self.dom.style_set(*card, "display", display)?;
        }
        self.trace_state.line(format!(
            "[search] query={query:?} items={} visible={} hidden={}",
            items.len(),
            view.visible_count(),
            view.hidden_count()
        ));
        self.last_search = Some(view);
        Ok(())
    }

    /// Product cards with a title element, in document order, paired with
    /// what the search box sees of them.
    fn product_cards(&self) -> Result<(Vec<NodeId>, Vec<Item>)> {
        let mut cards = Vec::new();
        let mut items = Vec::new();
        for card in self.dom.query_selector_all(PRODUCT_CARD_SELECTOR)? {
            let Some(title) = self.dom.query_selector_from(card, PRODUCT_TITLE_SELECTOR)? else {
                continue;
            };
            let description = self
                .dom
                .query_selector_from(card, PRODUCT_DESCRIPTION_SELECTOR)?
                .map(|node| self.dom.text_content(node));
            cards.push(card);
            items.push(Item {
                title: self.dom.text_content(title),
                description,
            });
        }
        Ok((cards, items))
    }

    fn navigate_category(&mut self, select: NodeId) -> Result<()> {
        let category = self.dom.value(select)?;
        self.navigate(&category_listing_url(&category));
        Ok(())
    }

    fn navigate(&mut self, href: &str) {
        let to = resolve_location(&self.document_url, href);
        let from = std::mem::replace(&mut self.document_url, to.clone());
        self.trace_state
            .line(format!("[nav] href_set from={from} to={to}"));
        self.location_navigations.push(LocationNavigation {
            kind: LocationNavigationKind::HrefSet,
            from,
            to,
        });
    }

    /// Decrement buttons sit before their input, increment buttons after it.
    fn step_quantity(&mut self, button: NodeId, direction: StepDirection) -> Result<()> {
        let sibling = match direction {
            StepDirection::Decrement => self.dom.next_element_sibling(button),
            StepDirection::Increment => self.dom.previous_element_sibling(button),
        };
        let Some(input) = sibling.filter(|node| {
            self.dom
                .tag_name(*node)
                .is_some_and(|tag| tag.eq_ignore_ascii_case("input"))
        }) else {
            self.trace_state.line(format!(
                "[form] quantity skip button={} reason=no_adjacent_input",
                self.node_label(button)
            ));
            return Ok(());
        };

        let current = self.dom.value(input)?;
        let max_attr = self.dom.attr(input, "max");
        if let Some(next) = step_input_value(&current, max_attr.as_deref(), direction) {
            self.dom.set_value(input, &next.to_string())?;
            self.trace_state.line(format!(
                "[form] quantity input={} from={current} to={next}",
                self.node_label(input)
            ));
        }
        Ok(())
    }

    /// Asks the shopper to confirm a deletion and submits the form with id
    /// `form_id` only if they agree. An absent or empty `message` uses
    /// [`DEFAULT_DELETE_MESSAGE`].
    ///
    /// Always returns `false`, so the triggering control's own submission is
    /// suppressed.
    pub fn confirm_delete(&mut self, message: Option<&str>, form_id: &str) -> Result<bool> {
        let message = message
            .filter(|message| !message.is_empty())
            .unwrap_or(DEFAULT_DELETE_MESSAGE)
            .to_string();
        let accepted = self
            .platform_mocks
            .confirm_responses
            .pop_front()
            .unwrap_or(self.platform_mocks.default_confirm_response);
        self.trace_state.line(format!(
            "[dialog] confirm message={message:?} accepted={accepted}"
        ));
        self.platform_mocks.confirm_messages.push(message);

        if accepted {
            let form = self.form_by_id(form_id)?;
            self.submit_form(form, form_id)?;
        }
        Ok(false)
    }

    /// Validates the quantity requested in the add-to-cart form `form_id`
    /// against its declared stock. Over-stock requests alert the shopper and
    /// return `false`; anything else submits the form and returns `true`.
    pub fn add_to_cart(&mut self, form_id: &str, product_name: &str) -> Result<bool> {
        let form = self.form_by_id(form_id)?;
        let quantity_input = self
            .dom
            .query_selector_from(form, QUANTITY_INPUT_SELECTOR)?
            .ok_or_else(|| {
                Error::SelectorNotFound(format!("#{form_id} {QUANTITY_INPUT_SELECTOR}"))
            })?;
        let quantity = self.dom.value(quantity_input)?;
        let max_attr = self.dom.attr(quantity_input, "max");

        match validate_add_to_cart(&quantity, max_attr.as_deref(), product_name) {
            AddToCartOutcome::Rejected { message } => {
                self.trace_state
                    .line(format!("[dialog] alert message={message:?}"));
                self.platform_mocks.alert_messages.push(message);
                Ok(false)
            }
            AddToCartOutcome::Submit => {
                self.submit_form(form, form_id)?;
                Ok(true)
            }
        }
    }

    fn form_by_id(&self, form_id: &str) -> Result<NodeId> {
        let selector = format!("#{form_id}");
        let form = self
            .dom
            .by_id(form_id)
            .ok_or_else(|| Error::SelectorNotFound(selector.clone()))?;
        let tag = self.element_tag(&selector, form, "form")?;
        if tag != "form" {
            return Err(Error::TypeMismatch {
                selector,
                expected: "form".into(),
                actual: tag,
            });
        }
        Ok(form)
    }

    fn submit_form(&mut self, form: NodeId, form_id: &str) -> Result<()> {
        let action = resolve_location(
            &self.document_url,
            &self.dom.attr(form, "action").unwrap_or_default(),
        );
        let method = match self.dom.attr(form, "method") {
            Some(method) if method.trim().eq_ignore_ascii_case("post") => "post",
            _ => "get",
        }
        .to_string();
        let fields = self.form_fields(form)?;

        self.trace_state.line(format!(
            "[form] submit id={form_id} method={method} action={action} fields={}",
            fields.len()
        ));
        self.submitted_forms.push(FormSubmission {
            form_id: form_id.to_string(),
            action,
            method,
            fields,
        });
        Ok(())
    }

    /// Name/value pairs of the successful controls in `form`.
    fn form_fields(&self, form: NodeId) -> Result<Vec<(String, String)>> {
        let mut controls = Vec::new();
        self.dom.collect_elements_descendants_dfs(form, &mut controls);

        let mut fields = Vec::new();
        for control in controls {
            let Some(tag) = self.dom.tag_name(control).map(str::to_ascii_lowercase) else {
                continue;
            };
            if !matches!(tag.as_str(), "input" | "select" | "textarea") || self.dom.disabled(control) {
                continue;
            }
            let Some(name) = self.dom.attr(control, "name").filter(|name| !name.is_empty()) else {
                continue;
            };

            if tag == "input" {
                let kind = self
                    .dom
                    .attr(control, "type")
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                match kind.as_str() {
                    "submit" | "button" | "reset" | "image" | "file" => continue,
                    "checkbox" | "radio" => {
                        if self.dom.attr(control, "checked").is_some() {
                            let value = self
                                .dom
                                .attr(control, "value")
                                .unwrap_or_else(|| "on".into());
                            fields.push((name, value));
                        }
                        continue;
                    }
                    _ => {}
                }
            }
            fields.push((name, self.dom.value(control)?));
        }
        Ok(fields)
    }

    /// Search items for every product card currently in the document, hidden
    /// or not.
    pub fn product_items(&self) -> Result<Vec<Item>> {
        Ok(self.product_cards()?.1)
    }

    /// Trimmed titles of the product cards that are currently displayed.
    pub fn visible_product_titles(&self) -> Result<Vec<String>> {
        let (cards, items) = self.product_cards()?;
        Ok(cards
            .into_iter()
            .zip(items)
            .filter(|(card, _)| self.dom.is_rendered(*card))
            .map(|(_, item)| item.title.trim().to_string())
            .collect())
    }

    /// The view computed by the most recent search, if the search box has
    /// fired.
    pub fn last_search_view(&self) -> Option<&SearchView> {
        self.last_search.as_ref()
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn is_visible(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(self.dom.is_rendered(target))
    }

    pub fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.dom.query_selector(selector)?.is_some())
    }

    /// Current document URL, updated by every navigation.
    pub fn location(&self) -> &str {
        &self.document_url
    }

    /// Number of initialized tooltip triggers still in the document.
    pub fn tooltip_count(&self) -> usize {
        self.tooltips
            .iter()
            .filter(|trigger| self.dom.is_connected(**trigger))
            .count()
    }

    /// Title of the tooltip attached to `selector`, or `None` if that element
    /// is not a tooltip trigger.
    pub fn tooltip_title(&self, selector: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        if !self.tooltips.contains(&target) {
            return Ok(None);
        }
        Ok(tooltip_title(&self.dom, target))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_visible(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.is_rendered(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("visible={expected}"),
                actual: format!("visible={actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), SNIPPET_MAX_CHARS)
    }

    fn element_tag(&self, selector: &str, node_id: NodeId, expected: &str) -> Result<String> {
        self.dom
            .tag_name(node_id)
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: "non-element".into(),
            })
    }

    fn node_label(&self, node_id: NodeId) -> String {
        let Some(tag) = self.dom.tag_name(node_id) else {
            return "#document".into();
        };
        match self.dom.attr(node_id, "id").filter(|id| !id.is_empty()) {
            Some(id) => format!("{tag}#{id}"),
            None => tag.to_string(),
        }
    }

    pub fn enqueue_confirm_response(&mut self, accepted: bool) {
        self.platform_mocks.confirm_responses.push_back(accepted);
    }

    /// Answer used once queued responses run out. Starts as `false`.
    pub fn set_default_confirm_response(&mut self, accepted: bool) {
        self.platform_mocks.default_confirm_response = accepted;
    }

    pub fn take_confirm_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.platform_mocks.confirm_messages)
    }

    pub fn take_alert_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.platform_mocks.alert_messages)
    }

    pub fn take_location_navigations(&mut self) -> Vec<LocationNavigation> {
        std::mem::take(&mut self.location_navigations)
    }

    pub fn take_submitted_forms(&mut self) -> Vec<FormSubmission> {
        std::mem::take(&mut self.submitted_forms)
    }

    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.scheduler.pending()
    }

    pub fn clear_timer(&mut self, timer_id: i64) -> bool {
        let existed = self.scheduler.cancel(timer_id);
        self.trace_state
            .timer_line(format!("[timer] clear id={timer_id} existed={existed}"));
        existed
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Runtime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.scheduler.now_ms;
        self.scheduler.now_ms = self.scheduler.now_ms.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(self.scheduler.now_ms), false)?;
        self.trace_state.timer_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={} ran_due={ran}",
            self.scheduler.now_ms
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.scheduler.now_ms {
            return Err(Error::Runtime(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.scheduler.now_ms
            )));
        }
        let from = self.scheduler.now_ms;
        self.scheduler.now_ms = target_ms;
        let ran = self.run_timer_queue(Some(target_ms), false)?;
        self.trace_state.timer_line(format!(
            "[timer] advance_to from={from} to={target_ms} ran_due={ran}"
        ));
        Ok(())
    }

    /// Runs every pending timer, moving the clock to each one's due time.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(None, true)?;
        self.trace_state.timer_line(format!(
            "[timer] flush from={from} to={} ran={ran}",
            self.scheduler.now_ms
        ));
        Ok(())
    }

    /// Runs timers already due without moving the clock.
    pub fn run_due_timers(&mut self) -> Result<usize> {
        let ran = self.run_timer_queue(Some(self.scheduler.now_ms), false)?;
        self.trace_state.timer_line(format!(
            "[timer] run_due now_ms={} ran={ran}",
            self.scheduler.now_ms
        ));
        Ok(ran)
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Runtime(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.scheduler.timer_step_limit = max_steps;
        Ok(())
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>, advance_clock: bool) -> Result<usize> {
        let mut steps = 0usize;
        while self.scheduler.next_task_index(due_limit).is_some() {
            steps += 1;
            if steps > self.scheduler.timer_step_limit {
                return Err(self.scheduler.step_limit_error(steps, due_limit));
            }
            let Some(task) = self.scheduler.pop_next(due_limit, advance_clock) else {
                break;
            };
            self.execute_timer_task(task)?;
        }
        Ok(steps)
    }

    fn execute_timer_task(&mut self, task: ScheduledTask) -> Result<()> {
        self.trace_state.timer_line(format!(
            "[timer] run id={} task={} due_at={} now_ms={}",
            task.id,
            task.task.label(),
            task.due_at,
            self.scheduler.now_ms
        ));
        match task.task {
            TimerTask::DismissAlerts => {
                let closed = dismiss_alerts(&mut self.dom)?;
                self.trace_state
                    .timer_line(format!("[timer] alerts closed={closed}"));
            }
        }
        Ok(())
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_state.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_state.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_state.timers = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        self.trace_state.set_log_limit(max_entries)
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.take()
    }
}
