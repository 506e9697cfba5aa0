use super::gesture::Key;
use super::placement::Anchor;
use crate::reply::ANSWER_PLACEHOLDER;
use std::fmt;
use tracing::debug;

/// Failure messages shown in the tooltip are cut to this many characters.
pub const MAX_ERROR_CHARS: usize = 500;

/// Identity captured by one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipStatus {
    Thinking,
    Done,
    Error,
}

impl TooltipStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TooltipStatus::Thinking => "Thinking…",
            TooltipStatus::Done => "Done",
            TooltipStatus::Error => "Error",
        }
    }

    /// Error states get the red treatment.
    pub fn is_error(&self) -> bool {
        matches!(self, TooltipStatus::Error)
    }
}

impl fmt::Display for TooltipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub anchor: Anchor,
    pub status: TooltipStatus,
    pub answer: String,
}

/// Rendering side of the tooltip; the controller calls it after every change.
pub trait TooltipSurface {
    fn mount(&mut self, tooltip: &Tooltip);
    fn update(&mut self, tooltip: &Tooltip);
    fn unmount(&mut self);
}

/// Surface for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl TooltipSurface for NullSurface {
    fn mount(&mut self, _tooltip: &Tooltip) {}
    fn update(&mut self, _tooltip: &Tooltip) {}
    fn unmount(&mut self) {}
}

pub type ClipboardError = Box<dyn std::error::Error + Send + Sync>;

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer request was dispatched after this one.
    Discarded,
    /// Still the latest request, but the tooltip was already closed.
    Dismissed,
}

/// Owner of the one tooltip instance and of the request counter.
pub struct TooltipController<S> {
    surface: S,
    current: Option<Tooltip>,
    latest: u64,
}

impl<S: TooltipSurface> TooltipController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            current: None,
            latest: 0,
        }
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Replaces any open tooltip with a fresh one in the thinking state.
    pub fn show(&mut self, anchor: Anchor) -> &Tooltip {
        self.dismiss();
        let tooltip = Tooltip {
            anchor,
            status: TooltipStatus::Thinking,
            answer: ANSWER_PLACEHOLDER.to_string(),
        };
        self.surface.mount(&tooltip);
        self.current.insert(tooltip)
    }

    pub fn update_status(&mut self, status: TooltipStatus) -> bool {
        self.mutate(|tooltip| tooltip.status = status)
    }

    pub fn update_answer(&mut self, answer: impl Into<String>) -> bool {
        let answer = answer.into();
        self.mutate(|tooltip| tooltip.answer = answer)
    }

    fn mutate(&mut self, change: impl FnOnce(&mut Tooltip)) -> bool {
        match self.current.as_mut() {
            Some(tooltip) => {
                change(tooltip);
                self.surface.update(tooltip);
                true
            }
            None => false,
        }
    }

    /// Removes the tooltip; returns whether one was open.
    pub fn dismiss(&mut self) -> bool {
        if self.current.take().is_some() {
            self.surface.unmount();
            true
        } else {
            false
        }
    }

    pub fn begin_request(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn current_token(&self) -> Option<RequestToken> {
        (self.latest > 0).then_some(RequestToken(self.latest))
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }

    /// Applies a finished request, unless a newer one has been dispatched since.
    pub fn complete<E: fmt::Display>(
        &mut self,
        token: RequestToken,
        outcome: Result<String, E>,
    ) -> Completion {
        if !self.is_current(token) {
            debug!(
                token = token.0,
                latest = self.latest,
                "Discarding superseded response"
            );
            return Completion::Discarded;
        }
        let (status, answer) = match outcome {
            Ok(answer) => (TooltipStatus::Done, answer),
            Err(err) => (TooltipStatus::Error, truncate_chars(&err.to_string(), MAX_ERROR_CHARS)),
        };
        let applied = self.mutate(|tooltip| {
            tooltip.status = status;
            tooltip.answer = answer;
        });
        if applied {
            Completion::Applied
        } else {
            Completion::Dismissed
        }
    }

    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => self.dismiss(),
            Key::Other => false,
        }
    }

    /// Pointer-down anywhere on the page; clicks inside the tooltip keep it open.
    pub fn handle_pointer_down(&mut self, inside_tooltip: bool) -> bool {
        if inside_tooltip {
            return false;
        }
        self.dismiss()
    }

    /// The tooltip's own close control.
    pub fn close(&mut self) -> bool {
        self.dismiss()
    }

    /// Copies the displayed answer; clipboard failures are logged and swallowed.
    pub fn copy_answer<C: Clipboard>(&self, clipboard: &mut C) -> bool {
        let Some(tooltip) = self.current.as_ref() else {
            return false;
        };
        match clipboard.write_text(&tooltip.answer) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "Clipboard write failed");
                false
            }
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum SurfaceEvent {
        Mount(Tooltip),
        Update(Tooltip),
        Unmount,
    }

    /// Surface that records every call and tracks how many tooltips are live.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub events: Vec<SurfaceEvent>,
        pub mounted: usize,
    }

    impl TooltipSurface for RecordingSurface {
        fn mount(&mut self, tooltip: &Tooltip) {
            self.mounted += 1;
            assert!(self.mounted <= 1, "two tooltips mounted at once");
            self.events.push(SurfaceEvent::Mount(tooltip.clone()));
        }

        fn update(&mut self, tooltip: &Tooltip) {
            assert_eq!(self.mounted, 1, "update without a mounted tooltip");
            self.events.push(SurfaceEvent::Update(tooltip.clone()));
        }

        fn unmount(&mut self) {
            assert_eq!(self.mounted, 1, "unmount without a mounted tooltip");
            self.mounted -= 1;
            self.events.push(SurfaceEvent::Unmount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordingSurface, SurfaceEvent};
    use super::*;

    const ANCHOR: Anchor = Anchor {
        left: 20.0,
        top: 30.0,
        width: 320.0,
    };

    fn controller() -> TooltipController<RecordingSurface> {
        TooltipController::new(RecordingSurface::default())
    }

    #[derive(Default)]
    struct MemoryClipboard {
        contents: Option<String>,
    }

    impl Clipboard for MemoryClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.contents = Some(text.to_string());
            Ok(())
        }
    }

    struct DeniedClipboard;

    impl Clipboard for DeniedClipboard {
        fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
            Err("permission denied".into())
        }
    }

    #[test]
    fn show_starts_in_thinking_state_with_placeholder() {
        let mut ctl = controller();
        let tooltip = ctl.show(ANCHOR).clone();
        assert_eq!(tooltip.status, TooltipStatus::Thinking);
        assert_eq!(tooltip.status.label(), "Thinking…");
        assert_eq!(tooltip.answer, "—");
        assert_eq!(tooltip.anchor, ANCHOR);
    }

    #[test]
    fn show_replaces_previous_instance() {
        let mut ctl = controller();
        ctl.show(ANCHOR);
        ctl.update_answer("old");
        ctl.show(Anchor {
            left: 8.0,
            top: 8.0,
            width: 320.0,
        });
        assert_eq!(ctl.surface().mounted, 1);
        assert_eq!(ctl.tooltip().unwrap().answer, "—");
        let unmounts = ctl
            .surface()
            .events
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::Unmount))
            .count();
        assert_eq!(unmounts, 1);
    }

    #[test]
    fn tokens_increase_monotonically() {
        let mut ctl = controller();
        assert_eq!(ctl.current_token(), None);
        let a = ctl.begin_request();
        let b = ctl.begin_request();
        assert!(b > a);
        assert_eq!(ctl.current_token(), Some(b));
        assert!(!ctl.is_current(a));
        assert!(ctl.is_current(b));
    }

    #[test]
    fn stale_completion_never_mutates_tooltip() {
        let mut ctl = controller();
        ctl.show(ANCHOR);
        let a = ctl.begin_request();
        ctl.show(ANCHOR);
        let b = ctl.begin_request();

        assert_eq!(
            ctl.complete(a, Ok::<_, String>("from A".into())),
            Completion::Discarded
        );
        assert_eq!(ctl.tooltip().unwrap().status, TooltipStatus::Thinking);

        assert_eq!(
            ctl.complete(b, Ok::<_, String>("from B".into())),
            Completion::Applied
        );
        let tooltip = ctl.tooltip().unwrap();
        assert_eq!(tooltip.status, TooltipStatus::Done);
        assert_eq!(tooltip.answer, "from B");

        // A late failure from A is fenced off as well.
        assert_eq!(
            ctl.complete(a, Err::<String, _>("boom")),
            Completion::Discarded
        );
        assert_eq!(ctl.tooltip().unwrap().answer, "from B");
    }

    #[test]
    fn failure_sets_error_and_truncates_message() {
        let mut ctl = controller();
        ctl.show(ANCHOR);
        let token = ctl.begin_request();
        let message = "x".repeat(MAX_ERROR_CHARS + 100);
        assert_eq!(
            ctl.complete(token, Err::<String, _>(message)),
            Completion::Applied
        );
        let tooltip = ctl.tooltip().unwrap();
        assert!(tooltip.status.is_error());
        assert_eq!(tooltip.answer.chars().count(), MAX_ERROR_CHARS);
    }

    #[test]
    fn completion_after_dismiss_is_reported() {
        let mut ctl = controller();
        ctl.show(ANCHOR);
        let token = ctl.begin_request();
        ctl.handle_key(Key::Escape);
        assert_eq!(
            ctl.complete(token, Ok::<_, String>("late".into())),
            Completion::Dismissed
        );
        assert!(!ctl.is_open());
    }

    #[test]
    fn dismissal_triggers_close_when_open_and_noop_when_absent() {
        let mut ctl = controller();
        assert!(!ctl.handle_key(Key::Escape));
        assert!(!ctl.handle_pointer_down(false));
        assert!(!ctl.close());

        ctl.show(ANCHOR);
        assert!(!ctl.handle_key(Key::Other));
        assert!(ctl.handle_key(Key::Escape));
        assert!(!ctl.is_open());

        ctl.show(ANCHOR);
        assert!(!ctl.handle_pointer_down(true));
        assert!(ctl.is_open());
        assert!(ctl.handle_pointer_down(false));
        assert!(!ctl.is_open());

        ctl.show(ANCHOR);
        assert!(ctl.close());
        assert!(!ctl.is_open());
        assert_eq!(ctl.surface().mounted, 0);
    }

    #[test]
    fn updates_without_tooltip_are_ignored() {
        let mut ctl = controller();
        assert!(!ctl.update_status(TooltipStatus::Done));
        assert!(!ctl.update_answer("nothing"));
        assert!(ctl.surface().events.is_empty());
    }

    #[test]
    fn copy_writes_displayed_answer() {
        let mut ctl = controller();
        let mut clipboard = MemoryClipboard::default();
        assert!(!ctl.copy_answer(&mut clipboard));

        ctl.show(ANCHOR);
        ctl.update_answer("Mars");
        assert!(ctl.copy_answer(&mut clipboard));
        assert_eq!(clipboard.contents.as_deref(), Some("Mars"));
    }

    #[test]
    fn copy_failure_is_swallowed() {
        let mut ctl = controller();
        ctl.show(ANCHOR);
        assert!(!ctl.copy_answer(&mut DeniedClipboard));
        assert!(ctl.is_open());
    }
}
