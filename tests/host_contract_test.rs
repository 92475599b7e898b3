//! End-to-end tests over the plugin host: load, start, route, tick,
//! unload, with recording backends standing in for the real subsystems.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use prattle::application::errors::{CallbackError, CallbackResult, RouterError};
use prattle::application::registry::{shared_registry, SharedRegistry};
use prattle::application::router::CommandRouter;
use prattle::application::scheduler::TimerScheduler;
use prattle::domain::entities::{CommandSpec, HostEvent, PluginState};
use prattle::infrastructure::host::{
    shared_load_log, Console, Host, HostHandle, Notifier, Session, Transport,
};
use prattle::plugins::trait_def::Plugin;
use prattle::plugins::PluginManager;

#[derive(Default)]
struct RecordingConsole {
    lines: Mutex<Vec<String>>,
    alerts: AtomicUsize,
}

impl Console for RecordingConsole {
    fn show(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }

    fn alert(&self) {
        self.alerts.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingTransport {
    lines: Mutex<Vec<String>>,
}

impl Transport for RecordingTransport {
    fn send_line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notes: Mutex<Vec<(String, u64, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, timeout_ms: u64, category: &str) {
        self.notes
            .lock()
            .unwrap()
            .push((message.to_string(), timeout_ms, category.to_string()));
    }
}

struct FixedSession(Option<String>);

impl Session for FixedSession {
    fn current_recipient(&self) -> Option<String> {
        self.0.clone()
    }
}

struct Harness {
    registry: SharedRegistry,
    manager: PluginManager,
    console: Arc<RecordingConsole>,
    transport: Arc<RecordingTransport>,
    notifier: Arc<RecordingNotifier>,
}

fn harness() -> Harness {
    let registry = shared_registry();
    let load_log = shared_load_log();
    let console = Arc::new(RecordingConsole::default());
    let transport = Arc::new(RecordingTransport::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let host = Arc::new(Host::new(
        registry.clone(),
        load_log.clone(),
        console.clone(),
        transport.clone(),
        notifier.clone(),
        Arc::new(FixedSession(Some("buddy@chat.example".to_string()))),
    ));
    let manager = PluginManager::new(host, registry.clone(), load_log, "0.1.0", "test");
    Harness {
        registry,
        manager,
        console,
        transport,
        notifier,
    }
}

/// Registers `/greet` and a 1s keep-alive timer, tags incoming messages
struct GreeterPlugin;

impl Plugin for GreeterPlugin {
    fn name(&self) -> &str {
        "greeter"
    }

    fn init(&self, host: HostHandle, _version: &str, _status: &str) -> CallbackResult {
        let cmd_host = host.clone();
        host.register_command(
            CommandSpec::new("/greet", 0, 1).with_usage("/greet [name]"),
            Arc::new(move |arg: Option<&str>| -> CallbackResult {
                let who = arg.unwrap_or("stranger");
                cmd_host.cons_show(&format!("greetings, {}", who));
                if let Some(recipient) = cmd_host.get_current_recipient() {
                    cmd_host.send_line(&format!("{} greets {}", who, recipient));
                }
                Ok(())
            }),
        )
        .map_err(|e| CallbackError::new(e.to_string()))?;

        let timer_host = host.clone();
        host.register_timed(
            Arc::new(move || -> CallbackResult {
                timer_host.notify("greeter alive", 1000, "test");
                Ok(())
            }),
            1,
        )
        .map_err(|e| CallbackError::new(e.to_string()))?;
        Ok(())
    }

    fn on_message_received(&self, _jid: &str, text: &str) -> CallbackResult<Option<String>> {
        Ok(Some(format!("{}[greeter]", text)))
    }
}

/// Tries to grab `/greet` too; keeps loading when the registration loses
struct ClashPlugin;

impl Plugin for ClashPlugin {
    fn name(&self) -> &str {
        "clash"
    }

    fn init(&self, host: HostHandle, _version: &str, _status: &str) -> CallbackResult {
        let result = host.register_command(
            CommandSpec::new("/greet", 0, 0),
            Arc::new(|_: Option<&str>| -> CallbackResult { Ok(()) }),
        );
        // Losing the name is fine; the rejection lands in the load log
        assert!(result.is_err());
        Ok(())
    }
}

/// Registers a command, then fails init; nothing may linger
struct BrokenPlugin;

impl Plugin for BrokenPlugin {
    fn name(&self) -> &str {
        "broken"
    }

    fn init(&self, host: HostHandle, _version: &str, _status: &str) -> CallbackResult {
        host.register_command(
            CommandSpec::new("/broken", 0, 0),
            Arc::new(|_: Option<&str>| -> CallbackResult { Ok(()) }),
        )
        .map_err(|e| CallbackError::new(e.to_string()))?;
        Err(CallbackError::new("missing hypothetical dependency"))
    }
}

struct TagPlugin {
    name: &'static str,
    tag: &'static str,
}

impl Plugin for TagPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn on_message_send(&self, _jid: &str, text: &str) -> CallbackResult<Option<String>> {
        Ok(Some(format!("{}{}", text, self.tag)))
    }
}

#[test]
fn full_plugin_lifecycle() {
    let h = harness();
    h.manager.load(Arc::new(GreeterPlugin)).unwrap();
    assert_eq!(h.manager.state("greeter"), Some(PluginState::Initialized));

    let dispatcher = h.manager.dispatcher();
    dispatcher.dispatch(HostEvent::Start);
    assert_eq!(h.manager.state("greeter"), Some(PluginState::Started));

    let router = CommandRouter::new(h.registry.clone());
    router.route("/greet", None).unwrap();
    router.route("/greet", Some("bob")).unwrap();

    let console = h.console.lines.lock().unwrap();
    assert!(console.contains(&"greetings, stranger".to_string()));
    assert!(console.contains(&"greetings, bob".to_string()));
    drop(console);

    // Effects reached the transport through the facade
    let sent = h.transport.lines.lock().unwrap();
    assert!(sent.contains(&"bob greets buddy@chat.example".to_string()));
}

#[test]
fn router_surfaces_arity_and_unknown_command() {
    let h = harness();
    h.manager.load(Arc::new(GreeterPlugin)).unwrap();
    h.manager.dispatcher().dispatch(HostEvent::Start);

    let router = CommandRouter::new(h.registry.clone());
    let err = router.route("/greet", Some("hello world")).unwrap_err();
    assert_eq!(
        err,
        RouterError::Arity {
            min: 0,
            max: 1,
            got: 2,
            usage: "/greet [name]".to_string(),
        }
    );

    assert_eq!(
        router.route("/nope", None),
        Err(RouterError::UnknownCommand("/nope".to_string()))
    );
}

#[test]
fn duplicate_command_lands_in_load_log() {
    let h = harness();
    h.manager.load(Arc::new(GreeterPlugin)).unwrap();
    h.manager.load(Arc::new(ClashPlugin)).unwrap();

    // The losing plugin still loads; only the registration is rejected
    assert_eq!(h.manager.state("clash"), Some(PluginState::Initialized));

    let log = h.manager.load_log();
    assert!(log
        .iter()
        .any(|entry| entry.plugin == "clash" && entry.message.contains("rejected")));

    // Original registration intact
    let owner = h.registry.read().unwrap().command("/greet").unwrap().owner.clone();
    assert_eq!(owner, "greeter");
}

#[test]
fn unload_removes_all_registrations() {
    let h = harness();
    h.manager.load(Arc::new(GreeterPlugin)).unwrap();
    h.manager.dispatcher().dispatch(HostEvent::Start);

    h.manager.unload("greeter").unwrap();
    assert_eq!(h.manager.state("greeter"), None);

    let router = CommandRouter::new(h.registry.clone());
    assert_eq!(
        router.route("/greet", None),
        Err(RouterError::UnknownCommand("/greet".to_string()))
    );

    // The timer is gone as well
    let mut scheduler = TimerScheduler::new(h.registry.clone());
    scheduler.tick(Instant::now() + Duration::from_secs(5));
    assert!(h.notifier.notes.lock().unwrap().is_empty());
}

#[test]
fn timers_fire_through_the_facade() {
    let h = harness();
    h.manager.load(Arc::new(GreeterPlugin)).unwrap();
    h.manager.dispatcher().dispatch(HostEvent::Start);

    let mut scheduler = TimerScheduler::new(h.registry.clone());
    scheduler.tick(Instant::now() + Duration::from_secs(2));

    let notes = h.notifier.notes.lock().unwrap();
    assert_eq!(
        *notes,
        vec![("greeter alive".to_string(), 1000, "test".to_string())]
    );
}

#[test]
fn failed_init_is_terminal_until_reload() {
    let h = harness();
    assert!(h.manager.load(Arc::new(BrokenPlugin)).is_err());
    assert_eq!(h.manager.state("broken"), Some(PluginState::Failed));

    // Nothing registered by the failed attempt survives
    let router = CommandRouter::new(h.registry.clone());
    assert_eq!(
        router.route("/broken", None),
        Err(RouterError::UnknownCommand("/broken".to_string()))
    );

    // Loading under the same name is blocked while the failed slot exists
    assert!(h.manager.load(Arc::new(GreeterPlugin)).is_ok());
    assert!(h.manager.load(Arc::new(BrokenPlugin)).is_err());
}

#[test]
fn reload_retries_a_failed_plugin() {
    let h = harness();
    assert!(h.manager.load(Arc::new(BrokenPlugin)).is_err());
    assert_eq!(h.manager.state("broken"), Some(PluginState::Failed));

    struct FixedPlugin;
    impl Plugin for FixedPlugin {
        fn name(&self) -> &str {
            "broken"
        }
    }

    h.manager.reload(Arc::new(FixedPlugin)).unwrap();
    assert_eq!(h.manager.state("broken"), Some(PluginState::Initialized));
}

#[test]
fn builtin_plugin_handles_incoming_messages() {
    use prattle::plugins::builtin::HelloPlugin;

    let h = harness();
    h.manager.load(Arc::new(HelloPlugin::new())).unwrap();
    h.manager.dispatcher().dispatch(HostEvent::Start);

    let dispatcher = h.manager.dispatcher();
    let result = dispatcher.dispatch(HostEvent::MessageReceived {
        jid: "buddy@chat.example".to_string(),
        text: "well hello there".to_string(),
    });

    // Uninterested in rewriting, but the alert fired
    assert_eq!(result, Some("well hello there".to_string()));
    assert_eq!(h.console.alerts.load(Ordering::SeqCst), 1);

    let quiet = dispatcher.dispatch(HostEvent::MessageReceived {
        jid: "buddy@chat.example".to_string(),
        text: "good morning".to_string(),
    });
    assert_eq!(quiet, Some("good morning".to_string()));
    assert_eq!(h.console.alerts.load(Ordering::SeqCst), 1);
}

#[test]
fn outgoing_messages_fold_across_plugins_in_load_order() {
    let h = harness();
    h.manager
        .load(Arc::new(TagPlugin { name: "a", tag: "[A]" }))
        .unwrap();
    h.manager
        .load(Arc::new(TagPlugin { name: "b", tag: "[B]" }))
        .unwrap();

    let dispatcher = h.manager.dispatcher();
    dispatcher.dispatch(HostEvent::Start);

    let result = dispatcher.dispatch(HostEvent::MessageSend {
        jid: "buddy@chat.example".to_string(),
        text: "hi".to_string(),
    });
    assert_eq!(result, Some("hi[A][B]".to_string()));
}
