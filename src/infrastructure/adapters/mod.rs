//! Production backends for the host facade
//!
//! Development-grade adapters: console output goes to stdout, the
//! transport and notifier log what would have left the process. The real
//! chat client swaps these for its window manager, its connection and
//! the desktop notification service.

use std::sync::RwLock;

use crate::infrastructure::host::{Console, Notifier, Session, Transport};

/// Console backend writing plugin output to stdout
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn show(&self, text: &str) {
        println!("{}", text);
    }

    fn alert(&self) {
        // Terminal bell; the full client flashes the console window
        print!("\x07");
    }
}

/// Transport that logs outgoing lines instead of owning a connection
pub struct LoggingTransport;

impl Transport for LoggingTransport {
    fn send_line(&self, line: &str) {
        tracing::info!("[SEND] {}", line);
    }
}

/// Notifier that logs instead of raising OS notifications
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, timeout_ms: u64, category: &str) {
        tracing::info!("[NOTIFY:{}] {} ({}ms)", category, message, timeout_ms);
    }
}

/// In-memory session state
///
/// Tracks the recipient of the currently focused chat; the host loop
/// updates it as the user switches windows.
#[derive(Default)]
pub struct SessionState {
    recipient: RwLock<Option<String>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_recipient(&self, recipient: Option<String>) {
        if let Ok(mut current) = self.recipient.write() {
            *current = recipient;
        }
    }
}

impl Session for SessionState {
    fn current_recipient(&self) -> Option<String> {
        self.recipient.read().ok().and_then(|r| r.clone())
    }
}
