use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;

use prattle::application::registry::shared_registry;
use prattle::application::router::CommandRouter;
use prattle::application::scheduler::TimerScheduler;
use prattle::domain::entities::HostEvent;
use prattle::infrastructure::adapters::{LogNotifier, LoggingTransport, SessionState, StdoutConsole};
use prattle::infrastructure::config::Config;
use prattle::infrastructure::host::{shared_load_log, Host, Session};
use prattle::plugins::builtin::HelloPlugin;
use prattle::plugins::PluginManager;

#[derive(Parser)]
#[command(name = "prattle")]
#[command(about = "Plugin host for a console chat client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "prattle.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the host loop
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_host(cli.config);
        }
        Commands::Version => {
            println!("prattle v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config(cli.config);
        }
    }
}

// Plugin callbacks run on this single thread, one at a time, to
// completion; the loop also serializes timer ticks against everything
// else.
#[tokio::main(flavor = "current_thread")]
async fn run_host(config_path: String) {
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting {}", config.host.name);

    let registry = shared_registry();
    let load_log = shared_load_log();
    let session = Arc::new(SessionState::new());
    let host = Arc::new(Host::new(
        registry.clone(),
        load_log.clone(),
        Arc::new(StdoutConsole),
        Arc::new(LoggingTransport),
        Arc::new(LogNotifier),
        session.clone(),
    ));

    let manager = PluginManager::new(
        host,
        registry.clone(),
        load_log,
        config.host.api_version.clone(),
        config.host.api_status.clone(),
    );

    if let Err(e) = manager.load(Arc::new(HelloPlugin::new())) {
        tracing::error!("Failed to load built-in plugin: {}", e);
    }

    if config.plugins.auto_load {
        match manager.load_directory(&config.plugins.directory) {
            Ok(count) => tracing::info!("Loaded {} dynamic plugins", count),
            Err(e) => tracing::warn!("Plugin directory scan failed: {}", e),
        }
    }

    let dispatcher = manager.dispatcher();
    let router = CommandRouter::new(registry.clone());
    let mut scheduler = TimerScheduler::new(registry);

    dispatcher.dispatch(HostEvent::Start);

    println!("{} ready. /connect <account>, /chat <jid>, /quit, or just type.", config.host.name);

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(Duration::from_secs(config.plugins.tick_seconds.max(1)));

    loop {
        tokio::select! {
            _ = tick.tick() => {
                scheduler.tick(Instant::now());
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("stdin error: {}", e);
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if line == "/quit" {
                    break;
                }

                // Host-owned session commands; everything else routes to
                // plugin registrations
                if let Some(account) = line.strip_prefix("/connect ") {
                    let account = account.trim().to_string();
                    let fulljid = format!("{}/console", account);
                    dispatcher.dispatch(HostEvent::Connect {
                        account: account.clone(),
                        fulljid,
                    });
                    // Stub incoming greeting, so receive hooks also run
                    // outside of a real connection
                    let greeting = dispatcher.dispatch(HostEvent::MessageReceived {
                        jid: account.clone(),
                        text: format!("welcome back, {}", account),
                    });
                    if let Some(text) = greeting {
                        println!("[{}] {}", account, text);
                    }
                    continue;
                }
                if let Some(jid) = line.strip_prefix("/chat ") {
                    session.set_recipient(Some(jid.trim().to_string()));
                    println!("Now chatting with {}", jid.trim());
                    continue;
                }

                if line.starts_with('/') {
                    let (name, args) = match line.split_once(char::is_whitespace) {
                        Some((name, rest)) => (name, Some(rest)),
                        None => (line, None),
                    };
                    if let Err(e) = router.route(name, args) {
                        println!("{}", e);
                    }
                    continue;
                }

                let jid = session
                    .current_recipient()
                    .unwrap_or_else(|| "console".to_string());
                let sent = dispatcher.dispatch(HostEvent::MessageSend {
                    jid: jid.clone(),
                    text: line.to_string(),
                });
                if let Some(text) = sent {
                    println!("[{}] {}", jid, text);
                }
            }
        }
    }

    dispatcher.dispatch(HostEvent::Shutdown);
    tracing::info!("Host loop stopped");
}

fn init_config(path: String) {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            if let Err(e) = std::fs::write(&path, yaml) {
                tracing::error!("Failed to write {}: {}", path, e);
            } else {
                println!("Wrote default config to {}", path);
            }
        }
        Err(e) => tracing::error!("Failed to serialize config: {}", e),
    }
}
