//! codemate CLI and web application entry point.
//!
//! Binary name: `codemate`
//!
//! Parses CLI arguments, sets up tracing and application state, then either
//! serves the chat UI or runs a session inspection command.

mod cli;
mod http;
mod state;

use anyhow::anyhow;
use clap::Parser;
use secrecy::SecretString;

use cli::{Cli, Commands};
use state::{AppState, StartupOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    codemate_observe::tracing_setup::init_tracing(cli.log_filter(), cli.otel)
        .map_err(|e| anyhow!("failed to initialize tracing: {e}"))?;

    let options = StartupOptions {
        database_url: cli.database_url.clone(),
        api_key: cli.api_key.clone().map(SecretString::from),
    };
    let state = AppState::init(options).await;

    let result = run(cli.command, state).await;
    codemate_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(command: Commands, state: AppState) -> anyhow::Result<()> {
    match command {
        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!();
            println!(
                "  {} codemate listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            if let Some(err) = state.startup_error() {
                println!(
                    "  {} {}",
                    console::style("!").yellow().bold(),
                    console::style(err).yellow()
                );
            }
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Sessions { limit, json } => {
            cli::session::list_sessions(&state, limit, json).await?;
        }

        Commands::Show { session_id, json } => {
            cli::session::show_session(&state, session_id, json).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to install Ctrl+C handler: {e}");
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
                tracing::warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
