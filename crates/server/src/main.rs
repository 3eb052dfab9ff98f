//! Maxwell Server Entry Point

use std::io::Write;
use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use maxwell_config::{load_settings, RunMode, Settings};
use maxwell_persistence::LogStore;
use maxwell_server::{create_router, AppState};

/// Cold-calling voice sales assistant with conversation logging
#[derive(Parser, Debug)]
#[command(name = "maxwell", version, about)]
struct Args {
    /// Mode to run the application in
    #[arg(long, default_value = "ui")]
    mode: RunMode,

    /// Port to listen on (overrides configuration)
    #[arg(long)]
    port: Option<u16>,

    /// Configuration environment name (config/{env}.yaml)
    #[arg(long)]
    env: Option<String>,

    /// List all conversation logs and exit
    #[arg(long)]
    list_logs: bool,

    /// View a specific conversation log by ID and exit
    #[arg(long)]
    view_log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match load_settings(args.env.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}. Using defaults.", e);
            Settings::default()
        }
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config);

    // Log inspection flags print and exit without starting anything.
    if args.list_logs {
        list_logs(&config);
        return Ok(());
    }
    if let Some(id) = &args.view_log {
        return view_log(&config, id);
    }

    match args.mode {
        RunMode::Logs => browse_logs(&config),
        mode => run_server(config, mode).await,
    }
}

/// Run the HTTP/WebSocket server
async fn run_server(config: Settings, mode: RunMode) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting Maxwell server v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config.clone(), mode)
        .map_err(|e| format!("Failed to initialize application state: {}", e))?;
    tracing::info!("Initialized application state");

    let cleanup_shutdown = state.sessions.clone().start_cleanup_task();

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Listening on {}", addr);
    if mode == RunMode::Ui {
        tracing::info!("Open http://localhost:{}/ to start a call", config.server.port);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = cleanup_shutdown.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing from the observability configuration
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!(
            "maxwell_server={0},maxwell_live={0},maxwell_persistence={0},maxwell_tools={0},tower_http=debug",
            level
        )
        .into()
    });

    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Print all conversation logs, most recent first
fn list_logs(config: &Settings) {
    let store = LogStore::new(config.logging.log_dir.clone());
    let conversations = store.list();

    if conversations.is_empty() {
        println!("No conversation logs found.");
        return;
    }

    println!("\nAvailable conversation logs:");
    println!("{}", "-".repeat(80));
    for conv in conversations {
        println!(
            "{} - {} - {:.1} KB",
            conv.id, conv.last_modified, conv.size_kb
        );
    }
    println!("{}", "-".repeat(80));
}

/// Print one conversation log by ID
fn view_log(config: &Settings, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = LogStore::new(config.logging.log_dir.clone());
    match store.fetch(id) {
        Ok(content) => {
            println!("\nViewing conversation: {}", id);
            println!("{}", "=".repeat(80));
            println!("{}", content);
            println!("{}", "=".repeat(80));
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.into())
        }
    }
}

/// Interactive terminal log browser
fn browse_logs(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let store = LogStore::new(config.logging.log_dir.clone());
    let conversations = store.list();

    if conversations.is_empty() {
        println!("No conversation logs found.");
        return Ok(());
    }

    println!("\nConversation Log Browser\n");
    for (i, conv) in conversations.iter().enumerate() {
        println!(
            "{}. {} - {} - {:.1} KB",
            i + 1,
            conv.id,
            conv.last_modified,
            conv.size_kb
        );
    }

    print!("\nEnter the number of the log to view (or 0 to exit): ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    match input.trim().parse::<usize>() {
        Ok(0) => Ok(()),
        Ok(choice) if choice <= conversations.len() => {
            let conv = &conversations[choice - 1];
            println!("\nViewing: {}\n", conv.id);
            println!("{}", "=".repeat(80));
            println!("{}", store.fetch(&conv.id)?);
            println!("{}", "=".repeat(80));
            Ok(())
        }
        _ => {
            println!("Invalid input.");
            Ok(())
        }
    }
}
