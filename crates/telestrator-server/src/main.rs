use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telestrator_server::{App, create_app, state::Config};

#[derive(Parser)]
#[command(
    name = "telestrator-server",
    version,
    about = "A remote telestrator: signaling relay and broadcast bridge"
)]
struct Args {
    /// HTTP port; the relay uses the next port up (default: 8888)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory of static client pages
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telestrator_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Load configuration; command line wins over the environment
    let mut config = Config::load()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(static_dir) = args.static_dir {
        config.static_dir = static_dir;
    }
    let relay_address = config.relay_address()?;
    let http_address = config.http_address();

    let App { http, relay, .. } = create_app(config.clone());

    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    let relay_listener = tokio::net::TcpListener::bind(&relay_address).await?;

    print_banner(&config)?;
    tracing::info!("HTTP listening on {}", http_address);
    tracing::info!("Relay listening on {}", relay_address);

    tokio::try_join!(
        async { axum::serve(http_listener, http).await },
        async { axum::serve(relay_listener, relay).await },
    )?;

    Ok(())
}

fn print_banner(config: &Config) -> Result<()> {
    let port = config.port;
    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "<this-host>".to_string());

    println!();
    println!("---------------------------");
    println!("Welcome to Telestrator");
    println!("---------------------------");
    println!("Http server is running on port {port}");
    println!("WebSocket server is running on port {}", config.relay_port()?);
    println!();
    println!("1. Add a BrowserSource to http://localhost:{port}/obs.html");
    println!(
        "2. Open a local browser to http://localhost:{port} and click \"Host\" to select a sharing window"
    );
    println!(
        "3. Open a remote browser to http://{hostname}:{port} and click \"Join\" to begin telestrating"
    );
    println!();
    Ok(())
}
