//! Audio channel directory.
//!
//! Static mapping from channel identifier (language name) to the URL of that
//! language's audio track. Built once at startup from config and never
//! mutated afterwards, so it needs no synchronization.

use std::collections::{BTreeMap, HashMap};

/// Immutable channel table resolved against on every `join-channel` request.
#[derive(Debug, Clone)]
pub struct ChannelDirectory {
    channels: HashMap<String, String>,
}

/// Starter channel table (the languages the deployment ships with).
/// Overridable via the `[channels]` section of the config file.
fn default_table() -> HashMap<String, String> {
    let mut channels = HashMap::new();
    for lang in ["english", "hindi", "tamil", "kannada"] {
        channels.insert(lang.to_string(), format!("/audio/{lang}.mp3"));
    }
    channels
}

impl ChannelDirectory {
    pub fn new(channels: HashMap<String, String>) -> Self {
        Self { channels }
    }

    /// Directory with the built-in starter table.
    pub fn with_defaults() -> Self {
        Self::new(default_table())
    }

    /// Build from the optional `[channels]` config section.
    /// An explicit table replaces the starter table wholesale.
    pub fn from_config(overrides: Option<BTreeMap<String, String>>) -> Self {
        match overrides {
            Some(table) if !table.is_empty() => Self::new(table.into_iter().collect()),
            _ => Self::with_defaults(),
        }
    }

    /// Pure lookup. Unknown identifiers yield `None`, never an error;
    /// the caller replies with an absent URL and the connection stays up.
    pub fn resolve(&self, channel_id: &str) -> Option<&str> {
        self.channels.get(channel_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
