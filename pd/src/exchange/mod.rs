//! Cross-pillar message exchange

mod core;
mod webhook;

pub use core::{DropReason, MessageExchange, SendOutcome};
pub use webhook::{MessageSink, WebhookSink};
