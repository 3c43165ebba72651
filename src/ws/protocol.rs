//! Wire protocol: tagged JSON messages and per-kind dispatch.
//!
//! Both directions use a closed enum with a `type` tag, decoded once at the
//! boundary. Unknown kinds and malformed payloads fail decoding in a single
//! place and are ignored; the connection stays up.

use serde::{Deserialize, Serialize};

use crate::registry::SessionId;
use crate::state::AppState;

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Subscribe to a named audio channel; replied to with `audio-url`.
    JoinChannel { channel: String },
    /// Ask whoever is acting as the media source to re-announce the position.
    SyncRequest,
    /// Transport controls, relayed verbatim to every other connection.
    VideoPlay { timestamp: f64 },
    VideoPause { timestamp: f64 },
    VideoSeek { timestamp: f64 },
}

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Reply to `join-channel`, sent to the requesting connection only.
    /// `url` is absent when the channel id is unknown.
    AudioUrl { channel: String, url: Option<String> },
    /// Live participant count, sent to every connection on admit/remove.
    UserCount { count: usize },
    /// A peer asked for the current position; carries the asker's session id.
    SyncRequested { from: SessionId },
    VideoPlay { timestamp: f64 },
    VideoPause { timestamp: f64 },
    VideoSeek { timestamp: f64 },
}

/// Handle one inbound text frame from `session`.
pub fn handle_text_message(text: &str, session: SessionId, state: &AppState) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            // Robustness against protocol drift: never terminate the
            // connection over a message we do not understand.
            tracing::debug!(
                session_id = %session,
                error = %e,
                "ignoring unrecognized message"
            );
            return;
        }
    };
    dispatch(message, session, state);
}

fn dispatch(message: ClientMessage, session: SessionId, state: &AppState) {
    match message {
        ClientMessage::JoinChannel { channel } => {
            handle_join_channel(channel, session, state);
        }
        ClientMessage::SyncRequest => {
            state
                .registry
                .broadcast_except(session, &ServerMessage::SyncRequested { from: session });
        }
        ClientMessage::VideoPlay { timestamp } => {
            state
                .registry
                .broadcast_except(session, &ServerMessage::VideoPlay { timestamp });
        }
        ClientMessage::VideoPause { timestamp } => {
            state
                .registry
                .broadcast_except(session, &ServerMessage::VideoPause { timestamp });
        }
        ClientMessage::VideoSeek { timestamp } => {
            state
                .registry
                .broadcast_except(session, &ServerMessage::VideoSeek { timestamp });
        }
    }
}

/// Record the subscription, resolve the channel, and reply to the sender
/// only. Unknown channels get an absent URL rather than an error.
fn handle_join_channel(channel: String, session: SessionId, state: &AppState) {
    state.registry.set_channel(session, &channel);

    let url = state.channels.resolve(&channel).map(str::to_owned);
    if url.is_none() {
        tracing::debug!(
            session_id = %session,
            channel = %channel,
            "join request for unknown channel"
        );
    }

    state
        .registry
        .send_to(session, &ServerMessage::AudioUrl { channel, url });
}
