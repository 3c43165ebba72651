pub mod actor;
pub mod handler;
pub mod protocol;

use tokio::sync::mpsc;

/// Type alias for the sender half of a WebSocket connection's outbound queue.
/// The registry clones this to push messages to a specific client; each
/// connection drains its own queue, so a slow peer never stalls the rest.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;
