//! Plugin trait and handler capability definitions

use crate::application::errors::CallbackResult;
use crate::infrastructure::host::HostHandle;

/// Entry points the host calls into a plugin
///
/// Every hook is optional; the default implementation means "not
/// interested". Message hooks may return a replacement text, and
/// returning `None` explicitly means "no change" - the next plugin in
/// load order sees the text as-is.
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin
    fn name(&self) -> &str;

    /// Called once per load attempt, before any other hook
    ///
    /// The handle is the plugin's only capability to reach the host; a
    /// plugin that wants to call back later keeps a clone. Failure marks
    /// the whole load attempt `Failed`.
    fn init(&self, _host: HostHandle, _version: &str, _status: &str) -> CallbackResult {
        Ok(())
    }

    /// Called when the host session starts; failure fails the load attempt
    fn on_start(&self) -> CallbackResult {
        Ok(())
    }

    /// An account signed in
    fn on_connect(&self, _account: &str, _fulljid: &str) -> CallbackResult {
        Ok(())
    }

    /// An account signed out
    fn on_disconnect(&self, _account: &str, _fulljid: &str) -> CallbackResult {
        Ok(())
    }

    /// The host is shutting down
    fn on_shutdown(&self) -> CallbackResult {
        Ok(())
    }

    /// An incoming message; return `Some` to replace the text
    fn on_message_received(&self, _jid: &str, _text: &str) -> CallbackResult<Option<String>> {
        Ok(None)
    }

    /// An outgoing message; return `Some` to replace the text
    fn on_message_send(&self, _jid: &str, _text: &str) -> CallbackResult<Option<String>> {
        Ok(None)
    }
}

/// Callable registered against a command
///
/// Receives the raw argument string, or `None` when the user typed the
/// bare command.
pub trait CommandHandler: Send + Sync {
    fn call(&self, arg: Option<&str>) -> CallbackResult;
}

impl<F> CommandHandler for F
where
    F: Fn(Option<&str>) -> CallbackResult + Send + Sync,
{
    fn call(&self, arg: Option<&str>) -> CallbackResult {
        self(arg)
    }
}

/// Callable registered against a timer
pub trait TimerHandler: Send + Sync {
    fn fire(&self) -> CallbackResult;
}

impl<F> TimerHandler for F
where
    F: Fn() -> CallbackResult + Send + Sync,
{
    fn fire(&self) -> CallbackResult {
        self()
    }
}
