use super::extract::{TextNode, extract_text, prepare_text};
use super::gesture::{Key, TriggerEvent};
use super::placement::{Viewport, anchor_for};
use super::tooltip::{Clipboard, Completion, TooltipController, TooltipSurface};
use super::transport::AskTransport;
use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Not an Option/Alt + primary click.
    Ignored,
    /// Qualifying click, but too little text to send.
    TooShort,
    Applied,
    Discarded,
    Dismissed,
}

impl From<Completion> for TriggerOutcome {
    fn from(value: Completion) -> Self {
        match value {
            Completion::Applied => TriggerOutcome::Applied,
            Completion::Discarded => TriggerOutcome::Discarded,
            Completion::Dismissed => TriggerOutcome::Dismissed,
        }
    }
}

/// Event entry points of the page client. Requests are never cancelled:
/// overlapping triggers all run to completion and stale replies are dropped
/// by token comparison.
pub struct CaptureSession<T, S> {
    transport: T,
    controller: Mutex<TooltipController<S>>,
}

impl<T: AskTransport, S: TooltipSurface> CaptureSession<T, S> {
    pub fn new(transport: T, surface: S) -> Self {
        Self {
            transport,
            controller: Mutex::new(TooltipController::new(surface)),
        }
    }

    pub fn with_controller<R>(&self, f: impl FnOnce(&mut TooltipController<S>) -> R) -> R {
        f(&mut self.controller.lock())
    }

    pub async fn trigger<N: TextNode>(
        &self,
        event: &TriggerEvent,
        target: &N,
        viewport: Viewport,
    ) -> TriggerOutcome {
        if !event.qualifies() {
            return TriggerOutcome::Ignored;
        }
        let Some(text) = prepare_text(&extract_text(target)) else {
            return TriggerOutcome::TooShort;
        };

        let token = {
            let mut controller = self.controller.lock();
            controller.show(anchor_for(event.x, event.y, viewport));
            controller.begin_request()
        };
        debug!(token = token.value(), chars = text.chars().count(), "Dispatching lookup");

        let outcome = self.transport.ask(&text).await;
        self.controller.lock().complete(token, outcome).into()
    }

    pub fn handle_key(&self, key: Key) -> bool {
        self.controller.lock().handle_key(key)
    }

    pub fn handle_pointer_down(&self, inside_tooltip: bool) -> bool {
        self.controller.lock().handle_pointer_down(inside_tooltip)
    }

    pub fn close(&self) -> bool {
        self.controller.lock().close()
    }

    pub fn copy_answer<C: Clipboard>(&self, clipboard: &mut C) -> bool {
        self.controller.lock().copy_answer(clipboard)
    }
}
