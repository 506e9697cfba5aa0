//! Client half: turns an Option/Alt + primary click into one `/ask` request
//! and reconciles the reply with the single on-page tooltip.
//!
//! Nothing here touches a real DOM. The host page is reached through
//! [`TextNode`], [`TooltipSurface`] and [`Clipboard`], so the same logic runs
//! in a browser adapter, in the terminal client, and in tests.

mod extract;
mod gesture;
mod placement;
mod session;
mod tooltip;
mod transport;

pub use extract::{
    MAX_ANCESTOR_LEVELS, MAX_QUERY_CHARS, MIN_BLOCK_CHARS, MIN_QUERY_CHARS, TextNode,
    extract_text, prepare_text,
};
pub use gesture::{Key, PointerButton, TriggerEvent};
pub use placement::{
    Anchor, ANCHOR_OFFSET, EDGE_MARGIN, RESERVED_HEIGHT, RESERVED_WIDTH, TOOLTIP_WIDTH, Viewport,
    anchor_for,
};
pub use session::{CaptureSession, TriggerOutcome};
pub use tooltip::{
    Clipboard, ClipboardError, Completion, MAX_ERROR_CHARS, NullSurface, RequestToken, Tooltip,
    TooltipController, TooltipStatus, TooltipSurface,
};
pub use transport::{AskError, AskTransport, DEFAULT_ENDPOINT, HttpAskTransport};
