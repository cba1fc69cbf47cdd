//! Per-field affordance overlay and its visibility state machine.
//!
//! ```text
//! Hidden ──show──▶ Visible ──blur──▶ PendingHide(deadline) ──expiry──▶ Hidden
//!    ▲                │  ▲                   │
//!    └────hide────────┘  └──────refocus──────┘
//! ```
//!
//! Showing one affordance hides every other, so at most one is ever shown.

use enhancer_protocols::{NodeId, OverlaySpec};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::classifier::{InputKind, TextSurface};

pub const OVERLAY_CLASS: &str = "message-enhancer-icon";
pub const OVERLAY_TITLE: &str = "Enhance this text with Message Enhancer";
pub const OVERLAY_LABEL: &str = "\u{2728}";

/// Shown when the extension was reloaded underneath a live page.
pub const REFRESH_PROMPT: &str = "Extension was reloaded. Please refresh this page to use Message Enhancer.";

pub fn overlay_spec() -> OverlaySpec {
    OverlaySpec {
        class_name: OVERLAY_CLASS.to_string(),
        title: OVERLAY_TITLE.to_string(),
        label: OVERLAY_LABEL.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
    /// Still on screen; hides at `deadline` unless the timer carrying `token`
    /// is cancelled first.
    PendingHide { deadline: Instant, token: u64 },
}

impl Visibility {
    /// Whether the overlay is currently displayed.
    pub fn is_shown(&self) -> bool {
        !matches!(self, Visibility::Hidden)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Visibility::Hidden => "hidden",
            Visibility::Visible => "visible",
            Visibility::PendingHide { .. } => "pending-hide",
        }
    }
}

/// Outcome of a visibility update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Show this affordance, hide all others and track the field.
    Show,
    /// Keep showing, but hide after the delay.
    ScheduleHide,
    /// Hide now and stop tracking the field.
    Hide,
}

pub fn decide(has_focus: bool, has_text: bool, is_tracked: bool) -> Decision {
    match (has_focus, has_text) {
        (true, true) => Decision::Show,
        (false, true) if is_tracked => Decision::ScheduleHide,
        _ => Decision::Hide,
    }
}

/// Bookkeeping for one tracked field.
#[derive(Debug)]
pub(crate) struct Affordance {
    pub overlay: NodeId,
    pub kind: InputKind,
    pub surface: TextSurface,
    pub visibility: Visibility,
    timer: Option<JoinHandle<()>>,
}

impl Affordance {
    pub fn new(overlay: NodeId, input: NodeId, kind: InputKind) -> Self {
        Self {
            overlay,
            kind,
            surface: TextSurface::new(input, kind),
            visibility: Visibility::Hidden,
            timer: None,
        }
    }

    /// Abort a pending-hide timer. Leaves `visibility` for the caller to set.
    pub fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn arm_hide(&mut self, deadline: Instant, token: u64, handle: JoinHandle<()>) {
        self.cancel_timer();
        self.visibility = Visibility::PendingHide { deadline, token };
        self.timer = Some(handle);
    }

    /// Expire a pending hide if `token` still names the armed timer.
    pub fn expire(&mut self, token: u64) -> bool {
        match self.visibility {
            Visibility::PendingHide { token: armed, .. } if armed == token => {
                self.timer = None;
                self.visibility = Visibility::Hidden;
                true
            }
            _ => false,
        }
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }
}

impl Drop for Affordance {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
