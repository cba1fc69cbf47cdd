//! The content-script context object.
//!
//! One [`ContentScript`] is created per page at injection. It owns every piece
//! of mutable bookkeeping (processed set, affordances, the focus-tracked field)
//! behind a single mutex that is only touched from event handlers, and never
//! holds it across `focus` or `dispatch_event`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use enhancer_config::{keys, ContentConfig};
use enhancer_protocols::{
    ExtensionRuntime, KeyValueStore, MessageResponse, NavigationEvent, NodeId, PageDom, PageEvent, PageEventKind,
    RuntimeMessage, Selector, StorageArea, StorageChange, TabEnvelope,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::affordance::{decide, overlay_spec, Affordance, Decision, Visibility, OVERLAY_CLASS, REFRESH_PROMPT};
use crate::classifier;
use crate::debug::{AffordanceDebug, DebugSnapshot};
use crate::error::ContentError;
use crate::page::PageChannels;
use crate::policy::{BlockList, DomainPolicy, LocationInfo};
use crate::scanner::{Scanner, ScannerConfig};

/// Reply to a `replaceText` when no field is focus-tracked.
pub const NO_INPUT_TRACKED: &str = "No input element tracked";

/// Host capabilities the content script runs against.
#[derive(Clone)]
pub struct ContentHost {
    pub page: Arc<dyn PageDom>,
    pub runtime: Arc<dyn ExtensionRuntime>,
    /// The synced settings area.
    pub settings: Arc<dyn KeyValueStore>,
}

/// Inbound streams pumped by [`ContentScript::run`].
pub struct ContentChannels {
    pub page_events: mpsc::UnboundedReceiver<PageEvent>,
    pub navigation: mpsc::UnboundedReceiver<NavigationEvent>,
    pub messages: mpsc::Receiver<TabEnvelope>,
}

impl ContentChannels {
    pub fn new(page: PageChannels, messages: mpsc::Receiver<TabEnvelope>) -> Self {
        Self {
            page_events: page.events,
            navigation: page.navigation,
            messages,
        }
    }
}

#[derive(Default)]
struct ScriptState {
    enabled: bool,
    block_list: BlockList,
    /// Fields already classified; never unset while the node is attached.
    processed: HashSet<NodeId>,
    /// Field → affordance.
    affordances: HashMap<NodeId, Affordance>,
    /// Overlay → field.
    overlays: HashMap<NodeId, NodeId>,
    tracked: Option<NodeId>,
    next_token: u64,
}

struct Inner {
    page: Arc<dyn PageDom>,
    runtime: Arc<dyn ExtensionRuntime>,
    settings: Arc<dyn KeyValueStore>,
    config: ContentConfig,
    scanner: Scanner,
    state: Mutex<ScriptState>,
}

/// Handle to an injected content script. Cheap to clone.
#[derive(Clone)]
pub struct ContentScript {
    inner: Arc<Inner>,
}

impl ContentScript {
    /// Inject into the host's page.
    ///
    /// Returns `None` on extension-internal pages and when the runtime is
    /// already invalid. Otherwise reads the enable flag and block list and
    /// runs the first scan.
    pub async fn inject(host: ContentHost, config: ContentConfig) -> Result<Option<Self>, ContentError> {
        let url = host.page.url();
        let location = match LocationInfo::parse(&url) {
            Ok(location) => location,
            Err(e) => {
                debug!(url = %url, error = %e, "Unparseable page URL, not injecting");
                return Ok(None);
            }
        };
        if !DomainPolicy::is_supported_protocol(&location) {
            debug!(protocol = %location.protocol, "Extension-internal page, not injecting");
            return Ok(None);
        }
        if !host.runtime.is_valid() {
            debug!("Extension runtime is gone, not injecting");
            return Ok(None);
        }

        let scanner = Scanner::new(ScannerConfig::from_config(&config)?);
        let stored = host
            .settings
            .get(&[keys::ENABLE_CONTENT_SCRIPT, keys::BLOCKED_DOMAINS])
            .await?;
        let enabled = stored.get(keys::ENABLE_CONTENT_SCRIPT) != Some(&Value::Bool(false));
        let block_list = BlockList::parse(
            stored
                .get(keys::BLOCKED_DOMAINS)
                .and_then(Value::as_str)
                .unwrap_or_default(),
        );

        let script = Self {
            inner: Arc::new(Inner {
                page: host.page,
                runtime: host.runtime,
                settings: host.settings,
                config,
                scanner,
                state: Mutex::new(ScriptState {
                    enabled,
                    block_list,
                    ..Default::default()
                }),
            }),
        };

        info!(url = %url, enabled, should_run = script.should_run(), "Content script injected");
        script.scan();
        Ok(Some(script))
    }

    fn from_weak(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn location(&self) -> Option<LocationInfo> {
        LocationInfo::parse(&self.inner.page.url()).ok()
    }

    // ---- queries ---------------------------------------------------------

    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Policy verdict for the page's current location.
    pub fn should_run(&self) -> bool {
        let Some(location) = self.location() else {
            return false;
        };
        DomainPolicy::should_run(&location, &self.inner.state.lock().block_list)
    }

    /// The focus-tracked field, if any.
    pub fn tracked(&self) -> Option<NodeId> {
        self.inner.state.lock().tracked
    }

    pub fn is_processed(&self, node: NodeId) -> bool {
        self.inner.state.lock().processed.contains(&node)
    }

    pub fn overlay_for(&self, input: NodeId) -> Option<NodeId> {
        self.inner.state.lock().affordances.get(&input).map(|a| a.overlay)
    }

    pub fn visibility(&self, input: NodeId) -> Option<Visibility> {
        self.inner.state.lock().affordances.get(&input).map(|a| a.visibility)
    }

    /// Fields whose affordance is currently displayed.
    pub fn shown(&self) -> Vec<NodeId> {
        let state = self.inner.state.lock();
        let mut shown: Vec<NodeId> = state
            .affordances
            .iter()
            .filter(|(_, a)| a.visibility.is_shown())
            .map(|(n, _)| *n)
            .collect();
        shown.sort();
        shown
    }

    // ---- scanning --------------------------------------------------------

    /// Re-enumerate candidates and affix affordances to newly eligible ones.
    /// Returns how many fields were newly processed.
    pub fn scan(&self) -> usize {
        let Some(location) = self.location() else {
            return 0;
        };
        {
            let state = self.inner.state.lock();
            if !state.enabled || !DomainPolicy::should_run(&location, &state.block_list) {
                return 0;
            }
        }

        self.prune_detached();

        let mut added = 0;
        for node in self.inner.scanner.candidates(self.inner.page.as_ref(), &location.hostname) {
            if self.process_input(node) {
                added += 1;
            }
        }
        if added > 0 {
            debug!(added, "Scan found new inputs");
        }
        added
    }

    /// Classify one node and, when admitted, attach its affordance.
    fn process_input(&self, input: NodeId) -> bool {
        let page = self.inner.page.as_ref();
        {
            let mut state = self.inner.state.lock();
            let Some(kind) = classifier::eligible(page, input, &state.processed) else {
                return false;
            };
            state.processed.insert(input);

            let Some(parent) = page.parent(input) else {
                debug!(%input, "Eligible input has no parent element");
                return true;
            };
            if page.is_statically_positioned(parent) {
                if let Err(e) = page.set_position_relative(parent) {
                    warn!(%parent, error = %e, "Failed to position overlay container");
                }
            }
            let overlay = match page.attach_overlay(parent, &overlay_spec()) {
                Ok(overlay) => overlay,
                Err(e) => {
                    warn!(%input, error = %e, "Failed to attach overlay");
                    return true;
                }
            };

            state.overlays.insert(overlay, input);
            state
                .affordances
                .insert(input, Affordance::new(overlay, input, kind));
            debug!(%input, %overlay, ?kind, "Affordance attached");
        }
        self.update_visibility(input);
        true
    }

    /// Drop bookkeeping for fields that left the document.
    fn prune_detached(&self) {
        let page = self.inner.page.as_ref();
        let mut state = self.inner.state.lock();
        let detached: Vec<NodeId> = state
            .processed
            .iter()
            .copied()
            .filter(|n| !page.is_connected(*n))
            .collect();

        for node in detached {
            state.processed.remove(&node);
            if let Some(aff) = state.affordances.remove(&node) {
                state.overlays.remove(&aff.overlay);
                page.remove_overlay(aff.overlay);
            }
            if state.tracked == Some(node) {
                state.tracked = None;
            }
            debug!(%node, "Pruned detached input");
        }
    }

    /// Remove every affordance. The processed set is kept.
    fn teardown(&self, reason: &str) {
        let removed = {
            let mut state = self.inner.state.lock();
            let affordances = std::mem::take(&mut state.affordances);
            state.overlays.clear();
            state.tracked = None;
            affordances.len()
        };
        let overlays = self.inner.page.remove_overlays(OVERLAY_CLASS);
        info!(reason, affordances = removed, overlays, "Affordances torn down");
    }

    // ---- visibility ------------------------------------------------------

    fn update_visibility(&self, input: NodeId) {
        let page = self.inner.page.as_ref();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;

        let Some(aff) = state.affordances.get_mut(&input) else {
            return;
        };
        aff.cancel_timer();
        let overlay = aff.overlay;
        let has_text = !aff.surface.text(page).trim().is_empty();
        let has_focus = page.active_element() == Some(input);
        let is_tracked = state.tracked == Some(input);

        match decide(has_focus, has_text, is_tracked) {
            Decision::Show => {
                for (other, aff) in state.affordances.iter_mut() {
                    if *other == input {
                        aff.visibility = Visibility::Visible;
                        continue;
                    }
                    aff.cancel_timer();
                    if aff.visibility.is_shown() {
                        aff.visibility = Visibility::Hidden;
                        set_visible(page, aff.overlay, false);
                    }
                }
                set_visible(page, overlay, true);
                state.tracked = Some(input);
            }
            Decision::ScheduleHide => {
                state.next_token += 1;
                let token = state.next_token;
                let deadline = Instant::now() + self.inner.config.hide_delay();
                let weak = Arc::downgrade(&self.inner);
                let handle = tokio::spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    if let Some(script) = ContentScript::from_weak(&weak) {
                        script.expire_hide(input, token);
                    }
                });
                if let Some(aff) = state.affordances.get_mut(&input) {
                    aff.arm_hide(deadline, token, handle);
                }
            }
            Decision::Hide => {
                if let Some(aff) = state.affordances.get_mut(&input) {
                    aff.visibility = Visibility::Hidden;
                }
                set_visible(page, overlay, false);
                if state.tracked == Some(input) {
                    state.tracked = None;
                }
            }
        }
    }

    fn expire_hide(&self, input: NodeId, token: u64) {
        let mut state = self.inner.state.lock();
        let Some(aff) = state.affordances.get_mut(&input) else {
            return;
        };
        if !aff.expire(token) {
            return;
        }
        let overlay = aff.overlay;
        set_visible(self.inner.page.as_ref(), overlay, false);
        if state.tracked == Some(input) {
            state.tracked = None;
        }
        debug!(%input, "Pending hide expired");
    }

    // ---- events ----------------------------------------------------------

    pub fn handle_page_event(&self, event: PageEvent) {
        match event.kind {
            PageEventKind::Focus | PageEventKind::Blur | PageEventKind::Input => self.update_visibility(event.target),
            PageEventKind::FocusIn => self.handle_focus_in(event.target),
            PageEventKind::OverlayClick => self.handle_overlay_click(event.target),
        }
    }

    fn handle_focus_in(&self, target: NodeId) {
        let Some(location) = self.location() else {
            return;
        };
        {
            let state = self.inner.state.lock();
            if !state.enabled || !DomainPolicy::should_run(&location, &state.block_list) {
                return;
            }
        }
        self.process_input(target);
        self.scan();
    }

    fn handle_overlay_click(&self, overlay: NodeId) {
        let page = &self.inner.page;
        let (input, surface) = {
            let state = self.inner.state.lock();
            let Some(&input) = state.overlays.get(&overlay) else {
                return;
            };
            let Some(aff) = state.affordances.get(&input) else {
                return;
            };
            if !aff.visibility.is_shown() {
                debug!(%overlay, "Ignoring click on hidden overlay");
                return;
            }
            (input, aff.surface)
        };

        let text = surface.text(page.as_ref()).trim().to_string();
        if text.is_empty() {
            return;
        }
        self.inner.state.lock().tracked = Some(input);

        set_scale(page.as_ref(), overlay, 0.9);
        let restore_page = page.clone();
        let feedback = self.inner.config.click_feedback();
        tokio::spawn(async move {
            tokio::time::sleep(feedback).await;
            set_scale(restore_page.as_ref(), overlay, 1.0);
        });

        if !self.inner.runtime.is_valid() {
            page.alert(REFRESH_PROMPT);
            return;
        }

        let text: String = text.chars().take(self.inner.config.max_capture_chars).collect();
        let runtime = self.inner.runtime.clone();
        let page = page.clone();
        info!(%input, chars = text.chars().count(), "Requesting popup handoff");
        tokio::spawn(async move {
            match runtime.send_message(RuntimeMessage::OpenPopupWithText { text }).await {
                Ok(response) if !response.is_success() => {
                    debug!(error = ?response.error(), "Popup handoff rejected");
                }
                Ok(_) => {}
                Err(e) if e.is_context_invalidated() => page.alert(REFRESH_PROMPT),
                Err(e) => debug!(error = %e, "Popup handoff failed"),
            }
        });
    }

    /// Re-scan once the page has settled after an in-page navigation.
    pub fn handle_navigation(&self, event: &NavigationEvent) {
        debug!(url = event.url(), "In-page navigation");
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.config.settle_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(script) = ContentScript::from_weak(&weak) {
                script.scan();
            }
        });
    }

    /// Answer a popup request. `None` for actions this context does not serve.
    pub fn handle_message(&self, message: &RuntimeMessage) -> Option<MessageResponse> {
        match message {
            RuntimeMessage::Ping => Some(MessageResponse::pong()),
            RuntimeMessage::ReplaceText { text } => Some(self.replace_tracked(text)),
            _ => None,
        }
    }

    /// Overwrite the focus-tracked field. Single use: tracking is cleared on
    /// success, so a second call without a new focus fails.
    fn replace_tracked(&self, text: &str) -> MessageResponse {
        let surface = {
            let state = self.inner.state.lock();
            state
                .tracked
                .and_then(|node| state.affordances.get(&node).map(|a| a.surface))
        };
        let Some(surface) = surface else {
            debug!("replaceText with no tracked input");
            return MessageResponse::failed(NO_INPUT_TRACKED);
        };

        if let Err(e) = surface.set_text(self.inner.page.as_ref(), text) {
            warn!(input = %surface.node(), error = %e, "Failed to replace input text");
            return MessageResponse::failed(e.to_string());
        }
        // The programmatic focus is not reported back by the host.
        self.update_visibility(surface.node());
        self.inner.state.lock().tracked = None;

        info!(input = %surface.node(), chars = text.chars().count(), "Replaced input text");
        MessageResponse::ok()
    }

    pub fn apply_storage_change(&self, change: &StorageChange) {
        if change.area != StorageArea::Sync || !self.inner.runtime.is_valid() {
            return;
        }

        if let Some(c) = change.get(keys::ENABLE_CONTENT_SCRIPT) {
            let enabled = c.new_value != Some(Value::Bool(false));
            self.inner.state.lock().enabled = enabled;
            info!(enabled, "Content script toggled");
            if enabled {
                self.scan();
            } else {
                self.teardown("disabled");
            }
        }

        if let Some(c) = change.get(keys::BLOCKED_DOMAINS) {
            let list = BlockList::parse(c.new_value.as_ref().and_then(Value::as_str).unwrap_or_default());
            let blocked = self.location().is_some_and(|l| list.matches(&l));
            let enabled = {
                let mut state = self.inner.state.lock();
                state.block_list = list;
                state.enabled
            };
            if blocked {
                self.teardown("blocked");
            } else if enabled {
                self.scan();
            }
        }
    }

    // ---- diagnostics -----------------------------------------------------

    pub fn debug_snapshot(&self) -> DebugSnapshot {
        let page = self.inner.page.as_ref();
        let location = self.location();
        let dom_overlays = Selector::parse(&format!(".{}", OVERLAY_CLASS))
            .map(|s| page.query_selector_all(&s).len())
            .unwrap_or(0);
        let active = page.active_element();

        let state = self.inner.state.lock();
        let mut affordances: Vec<AffordanceDebug> = state
            .affordances
            .iter()
            .map(|(input, aff)| AffordanceDebug {
                input: *input,
                overlay: aff.overlay,
                kind: aff.kind,
                has_text: !aff.surface.text(page).trim().is_empty(),
                has_focus: active == Some(*input),
                visibility: aff.visibility.label(),
                has_timeout: aff.has_timer(),
            })
            .collect();
        affordances.sort_by_key(|a| a.input);

        DebugSnapshot {
            url: page.url(),
            enabled: state.enabled,
            blocked_domains: state.block_list.patterns().to_vec(),
            url_blocked: location.as_ref().is_some_and(|l| state.block_list.matches(l)),
            should_run: location
                .as_ref()
                .is_some_and(|l| DomainPolicy::should_run(l, &state.block_list)),
            processed_inputs: state.processed.len(),
            current_focused_input: state.tracked,
            active_timeouts: state.affordances.values().filter(|a| a.has_timer()).count(),
            affordances,
            dom_overlays,
        }
    }

    /// Snapshot, then force a scan.
    pub fn diagnose(&self) -> DebugSnapshot {
        let snapshot = self.debug_snapshot();
        self.scan();
        snapshot
    }

    // ---- pump ------------------------------------------------------------

    /// Pump page events, navigation, popup messages, settings changes and the
    /// periodic scan until the page closes or the runtime is invalidated.
    pub async fn run(self, mut channels: ContentChannels) {
        let mut storage = self.inner.settings.subscribe();
        let mut storage_open = true;
        let mut ticker = tokio::time::interval(self.inner.config.scan_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.inner.runtime.is_valid() {
                        info!("Extension runtime invalidated, stopping content script");
                        break;
                    }
                    self.scan();
                }
                event = channels.page_events.recv() => match event {
                    Some(event) => self.handle_page_event(event),
                    None => {
                        debug!("Page closed, stopping content script");
                        break;
                    }
                },
                Some(nav) = channels.navigation.recv() => self.handle_navigation(&nav),
                Some(envelope) = channels.messages.recv() => {
                    if let Some(response) = self.handle_message(&envelope.message) {
                        let _ = envelope.reply.send(response);
                    }
                }
                change = storage.recv(), if storage_open => match change {
                    Ok(change) => self.apply_storage_change(&change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Settings change stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => storage_open = false,
                },
            }
        }
    }
}

fn set_visible(page: &dyn PageDom, overlay: NodeId, visible: bool) {
    if let Err(e) = page.set_overlay_visible(overlay, visible) {
        debug!(%overlay, error = %e, "Overlay visibility update failed");
    }
}

fn set_scale(page: &dyn PageDom, overlay: NodeId, scale: f32) {
    if let Err(e) = page.set_overlay_scale(overlay, scale) {
        debug!(%overlay, scale, error = %e, "Overlay scale update failed");
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
