use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing::info;

use pay_sentinel::models::SessionUser;
use pay_sentinel::{Config, PayEngine};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session user id issued by the auth provider
    #[arg(long)]
    user_id: String,

    /// Payment alias the user receives funds on
    #[arg(long)]
    pay_id: String,

    /// Display name for the session
    #[arg(long, default_value = "User")]
    display_name: String,

    /// Also run the fraud-monitor feed poller
    #[arg(long)]
    monitor: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter("pay_sentinel=debug,info")
        .with_target(false)
        .init();

    info!("Starting pay-sentinel v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let user = SessionUser {
        id: args.user_id,
        pay_id: args.pay_id,
        display_name: args.display_name,
    };

    let engine = PayEngine::start(config, user)?;
    if args.monitor {
        engine.start_monitor();
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut report_ticker = interval(Duration::from_secs(10));
    loop {
        tokio::select! {
            _ = report_ticker.tick() => {
                engine.report_metrics();
            }
            _ = &mut shutdown => {
                break;
            }
        }
    }

    info!("Shutting down pay-sentinel...");
    engine.sign_out();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
