use chrono::{DateTime, Utc};

/// Lifecycle state of a plugin load attempt
///
/// `Failed` is terminal for the attempt; only an explicit reload
/// retries initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Unloaded,
    Initialized,
    Started,
    Failed,
}

impl PluginState {
    pub fn as_str(&self) -> &str {
        match self {
            PluginState::Unloaded => "unloaded",
            PluginState::Initialized => "initialized",
            PluginState::Started => "started",
            PluginState::Failed => "failed",
        }
    }

    /// Whether the plugin participates in event dispatch
    pub fn is_started(&self) -> bool {
        matches!(self, PluginState::Started)
    }
}

/// One line in a plugin's load log
///
/// Records lifecycle transitions and registrations rejected during load,
/// so a plugin author can see why something did not take effect.
#[derive(Debug, Clone)]
pub struct LoadLogEntry {
    pub plugin: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LoadLogEntry {
    pub fn new(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}
