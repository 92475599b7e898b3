//! Event dispatcher - delivers host events to plugin hooks
//!
//! Hooks run in load order, one at a time, to completion; ordering is
//! deterministic and stable across runs. A failing hook is caught and
//! logged with the plugin identity and event name, and never interrupts
//! sibling plugins or the host's own control flow.

use std::sync::Arc;

use crate::application::errors::CallbackResult;
use crate::application::registry::SharedRegistry;
use crate::domain::entities::{HostEvent, LoadLogEntry, PluginState};
use crate::infrastructure::host::SharedLoadLog;
use crate::plugins::manager::SharedSlots;
use crate::plugins::trait_def::Plugin;

pub struct EventDispatcher {
    slots: SharedSlots,
    registry: SharedRegistry,
    load_log: SharedLoadLog,
}

impl EventDispatcher {
    pub fn new(slots: SharedSlots, registry: SharedRegistry, load_log: SharedLoadLog) -> Self {
        Self {
            slots,
            registry,
            load_log,
        }
    }

    /// Deliver an event to every interested plugin
    ///
    /// For message events the return value is the final text after all
    /// plugins ran their transforms; for lifecycle events it is `None`.
    /// `Start` promotes every `Initialized` plugin through `on_start`
    /// and is idempotent: already started plugins are not re-entered.
    pub fn dispatch(&self, event: HostEvent) -> Option<String> {
        tracing::debug!("Dispatching {} event", event.name());
        match event {
            HostEvent::Start => {
                self.start_initialized();
                None
            }
            HostEvent::Connect { account, fulljid } => {
                self.each_started("connect", |p| p.on_connect(&account, &fulljid));
                None
            }
            HostEvent::Disconnect { account, fulljid } => {
                self.each_started("disconnect", |p| p.on_disconnect(&account, &fulljid));
                None
            }
            HostEvent::Shutdown => {
                self.each_started("shutdown", |p| p.on_shutdown());
                None
            }
            HostEvent::MessageReceived { jid, text } => {
                Some(self.fold_text("message-received", &jid, text, |p, jid, text| {
                    p.on_message_received(jid, text)
                }))
            }
            HostEvent::MessageSend { jid, text } => {
                Some(self.fold_text("message-send", &jid, text, |p, jid, text| {
                    p.on_message_send(jid, text)
                }))
            }
        }
    }

    /// Promote `Initialized` plugins through `on_start`
    ///
    /// An `on_start` failure fails the whole load attempt: the plugin
    /// goes to `Failed` and its registrations are removed.
    fn start_initialized(&self) {
        let pending = self.snapshot(PluginState::Initialized);
        for plugin in pending {
            let name = plugin.name().to_string();
            let new_state = match plugin.on_start() {
                Ok(()) => {
                    tracing::info!("Started plugin: {}", name);
                    self.log(&name, "started");
                    PluginState::Started
                }
                Err(e) => {
                    tracing::error!("Plugin '{}' on_start failed: {}", name, e);
                    self.log(&name, format!("on_start failed: {}", e));
                    if let Ok(mut registry) = self.registry.write() {
                        registry.unregister_all(&name);
                    }
                    PluginState::Failed
                }
            };
            if let Ok(mut slots) = self.slots.write() {
                if let Some(slot) = slots.iter_mut().find(|s| s.instance.name() == name) {
                    slot.state = new_state;
                }
            }
        }
    }

    fn each_started<F>(&self, event_name: &str, hook: F)
    where
        F: Fn(&dyn Plugin) -> CallbackResult,
    {
        for plugin in self.snapshot(PluginState::Started) {
            if let Err(e) = hook(plugin.as_ref()) {
                tracing::warn!(
                    "Plugin '{}' {} hook failed: {}",
                    plugin.name(),
                    event_name,
                    e
                );
            }
        }
    }

    /// Thread the text through every started plugin in load order
    ///
    /// `Some` replaces the text for the next plugin, `None` leaves it
    /// unchanged; the result is the left-to-right composition of all
    /// transforms.
    fn fold_text<F>(&self, event_name: &str, jid: &str, mut text: String, hook: F) -> String
    where
        F: Fn(&dyn Plugin, &str, &str) -> CallbackResult<Option<String>>,
    {
        for plugin in self.snapshot(PluginState::Started) {
            match hook(plugin.as_ref(), jid, &text) {
                Ok(Some(replacement)) => text = replacement,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        "Plugin '{}' {} hook failed: {}",
                        plugin.name(),
                        event_name,
                        e
                    );
                }
            }
        }
        text
    }

    /// Snapshot plugins in `state`, in load order, without holding the
    /// slot lock across hook invocations
    fn snapshot(&self, state: PluginState) -> Vec<Arc<dyn Plugin>> {
        self.slots
            .read()
            .ok()
            .map(|slots| {
                slots
                    .iter()
                    .filter(|s| s.state == state)
                    .map(|s| s.instance.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn log(&self, plugin: &str, message: impl Into<String>) {
        if let Ok(mut log) = self.load_log.write() {
            log.push(LoadLogEntry::new(plugin, message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::CallbackError;
    use crate::application::registry::{shared_registry, CommandAction};
    use crate::domain::entities::CommandSpec;
    use crate::infrastructure::host::shared_load_log;
    use crate::plugins::manager::PluginSlot;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    struct TagPlugin {
        name: String,
        tag: String,
    }

    impl Plugin for TagPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_message_received(&self, _jid: &str, text: &str) -> CallbackResult<Option<String>> {
            Ok(Some(format!("{}{}", text, self.tag)))
        }
    }

    struct CountingPlugin {
        name: String,
        connects: Arc<AtomicUsize>,
        starts: Arc<AtomicUsize>,
        fail_connect: bool,
        fail_start: bool,
    }

    impl CountingPlugin {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                connects: Arc::new(AtomicUsize::new(0)),
                starts: Arc::new(AtomicUsize::new(0)),
                fail_connect: false,
                fail_start: false,
            }
        }
    }

    impl Plugin for CountingPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_start(&self) -> CallbackResult {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(CallbackError::new("start failed"));
            }
            Ok(())
        }

        fn on_connect(&self, _account: &str, _fulljid: &str) -> CallbackResult {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail_connect {
                return Err(CallbackError::new("connect failed"));
            }
            Ok(())
        }
    }

    fn dispatcher_with(slots: Vec<PluginSlot>) -> EventDispatcher {
        EventDispatcher::new(
            Arc::new(RwLock::new(slots)),
            shared_registry(),
            shared_load_log(),
        )
    }

    fn started_slot(plugin: Arc<dyn Plugin>) -> PluginSlot {
        let mut slot = PluginSlot::new(plugin);
        slot.state = PluginState::Started;
        slot
    }

    #[test]
    fn test_message_transforms_compose_in_load_order() {
        let dispatcher = dispatcher_with(vec![
            started_slot(Arc::new(TagPlugin {
                name: "a".to_string(),
                tag: "[A]".to_string(),
            })),
            started_slot(Arc::new(TagPlugin {
                name: "b".to_string(),
                tag: "[B]".to_string(),
            })),
        ]);

        let result = dispatcher.dispatch(HostEvent::MessageReceived {
            jid: "buddy@chat.example".to_string(),
            text: "hi".to_string(),
        });
        assert_eq!(result, Some("hi[A][B]".to_string()));
    }

    #[test]
    fn test_uninterested_plugin_leaves_text_unchanged() {
        let counting = Arc::new(CountingPlugin::new("quiet"));
        let dispatcher = dispatcher_with(vec![
            started_slot(counting),
            started_slot(Arc::new(TagPlugin {
                name: "b".to_string(),
                tag: "[B]".to_string(),
            })),
        ]);

        let result = dispatcher.dispatch(HostEvent::MessageReceived {
            jid: "buddy@chat.example".to_string(),
            text: "hi".to_string(),
        });
        assert_eq!(result, Some("hi[B]".to_string()));
    }

    #[test]
    fn test_failing_hook_does_not_stop_siblings() {
        let mut failing = CountingPlugin::new("bad");
        failing.fail_connect = true;
        let failing = Arc::new(failing);
        let healthy = Arc::new(CountingPlugin::new("good"));

        let dispatcher = dispatcher_with(vec![
            started_slot(failing.clone()),
            started_slot(healthy.clone()),
        ]);

        dispatcher.dispatch(HostEvent::Connect {
            account: "me".to_string(),
            fulljid: "me@chat.example/console".to_string(),
        });

        assert_eq!(failing.connects.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_start_promotes_initialized_once() {
        let plugin = Arc::new(CountingPlugin::new("starter"));
        let slots = Arc::new(RwLock::new(vec![PluginSlot::new(plugin.clone())]));
        let dispatcher =
            EventDispatcher::new(slots.clone(), shared_registry(), shared_load_log());

        dispatcher.dispatch(HostEvent::Start);
        assert_eq!(plugin.starts.load(Ordering::SeqCst), 1);
        assert_eq!(slots.read().unwrap()[0].state, PluginState::Started);

        // Already started plugins are not re-entered
        dispatcher.dispatch(HostEvent::Start);
        assert_eq!(plugin.starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_start_failure_fails_load_and_drops_registrations() {
        let mut plugin = CountingPlugin::new("fragile");
        plugin.fail_start = true;
        let plugin = Arc::new(plugin);

        let registry = shared_registry();
        registry
            .write()
            .unwrap()
            .register_command(
                "fragile",
                CommandSpec::new("/fragile", 0, 0),
                CommandAction::Builtin(|_| Ok(())),
            )
            .unwrap();

        let slots = Arc::new(RwLock::new(vec![PluginSlot::new(plugin)]));
        let dispatcher = EventDispatcher::new(slots.clone(), registry.clone(), shared_load_log());

        dispatcher.dispatch(HostEvent::Start);

        assert_eq!(slots.read().unwrap()[0].state, PluginState::Failed);
        assert!(registry.read().unwrap().command("/fragile").is_none());
    }
}
