//! Built-in demonstration plugin
//!
//! The native rendition of the classic sample scripts: greets on load,
//! registers a `/hello` command and a keep-alive timer, announces
//! connections and tags incoming messages so the whole facade surface
//! gets exercised.

use std::sync::{Arc, Mutex};

use crate::application::errors::{CallbackError, CallbackResult};
use crate::domain::entities::CommandSpec;
use crate::infrastructure::host::HostHandle;
use crate::plugins::trait_def::Plugin;

pub struct HelloPlugin {
    handle: Mutex<Option<HostHandle>>,
}

impl HelloPlugin {
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    fn with_handle<R>(&self, f: impl FnOnce(&HostHandle) -> R) -> CallbackResult<Option<R>> {
        let guard = self
            .handle
            .lock()
            .map_err(|_| CallbackError::new("plugin state lock poisoned"))?;
        Ok(guard.as_ref().map(f))
    }
}

impl Default for HelloPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for HelloPlugin {
    fn name(&self) -> &str {
        "hello"
    }

    fn init(&self, host: HostHandle, version: &str, status: &str) -> CallbackResult {
        host.cons_show(&format!("hello plugin: host {} ({})", version, status));

        let cmd_host = host.clone();
        host.register_command(
            CommandSpec::new("/hello", 0, 1)
                .with_usage("/hello [name]")
                .with_category("fun")
                .with_description("Say hello back"),
            Arc::new(move |arg: Option<&str>| -> CallbackResult {
                let who = arg.unwrap_or("world");
                cmd_host.cons_show(&format!("Hello, {}!", who));
                if let Some(recipient) = cmd_host.get_current_recipient() {
                    cmd_host.send_line(&format!("{} waves at {}", who, recipient));
                }
                Ok(())
            }),
        )
        .map_err(|e| CallbackError::new(e.to_string()))?;

        let timer_host = host.clone();
        host.register_timed(
            Arc::new(move || -> CallbackResult {
                timer_host.notify("hello plugin is alive", 5000, "plugin");
                Ok(())
            }),
            60,
        )
        .map_err(|e| CallbackError::new(e.to_string()))?;

        let mut guard = self
            .handle
            .lock()
            .map_err(|_| CallbackError::new("plugin state lock poisoned"))?;
        *guard = Some(host);
        Ok(())
    }

    fn on_start(&self) -> CallbackResult {
        self.with_handle(|host| host.cons_show("hello plugin started"))?;
        Ok(())
    }

    fn on_connect(&self, account: &str, fulljid: &str) -> CallbackResult {
        self.with_handle(|host| {
            host.cons_show(&format!("hello plugin: {} connected as {}", account, fulljid));
        })?;
        Ok(())
    }

    fn on_disconnect(&self, account: &str, _fulljid: &str) -> CallbackResult {
        self.with_handle(|host| host.cons_show(&format!("hello plugin: {} disconnected", account)))?;
        Ok(())
    }

    fn on_message_received(&self, _jid: &str, text: &str) -> CallbackResult<Option<String>> {
        if text.contains("hello") {
            self.with_handle(|host| host.cons_alert())?;
        }
        Ok(None)
    }

    fn on_shutdown(&self) -> CallbackResult {
        self.with_handle(|host| host.cons_show("hello plugin: goodbye"))?;
        Ok(())
    }
}
