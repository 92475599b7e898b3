/// A host lifecycle or message event delivered to plugin hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The host session is starting; promotes initialized plugins
    Start,
    /// An account signed in
    Connect { account: String, fulljid: String },
    /// An account signed out
    Disconnect { account: String, fulljid: String },
    /// An incoming chat message; plugins may rewrite the text
    MessageReceived { jid: String, text: String },
    /// An outgoing chat message; plugins may rewrite the text
    MessageSend { jid: String, text: String },
    /// The host is shutting down
    Shutdown,
}

impl HostEvent {
    /// Stable event name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::Start => "start",
            HostEvent::Connect { .. } => "connect",
            HostEvent::Disconnect { .. } => "disconnect",
            HostEvent::MessageReceived { .. } => "message-received",
            HostEvent::MessageSend { .. } => "message-send",
            HostEvent::Shutdown => "shutdown",
        }
    }

    /// Whether this event carries a rewritable text payload
    pub fn is_message(&self) -> bool {
        matches!(
            self,
            HostEvent::MessageReceived { .. } | HostEvent::MessageSend { .. }
        )
    }
}
