//! Brewstand CLI - drinks-menu API server
//!
//! Run `brewstand --help` for usage information.

use brewstand::auth::{JwksProvider, TokenVerifier};
use brewstand::config::Config;
use brewstand::storage::{seed_sample_drinks, DrinkStore, FileStore};
use brewstand::web::ApiServer;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "brewstand", about = "A drinks-menu API with JWT role-based access control", version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the drinks API server
    Serve {
        /// Address to bind to (overrides the config file)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path).await?
    } else {
        let default_path = Config::default_path();
        if default_path.exists() {
            Config::load(&default_path).await.unwrap_or_default()
        } else {
            Config::default()
        }
    };

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            run_server(config, bind).await?;
        }
    }

    Ok(())
}

async fn run_server(config: Config, bind: String) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let verifier = build_verifier(&config)?;

    let store = FileStore::open(&config.storage.path).await?;
    info!(path = %config.storage.path.display(), "opened drink store");

    let store: Arc<dyn DrinkStore> = Arc::new(store);
    seed_sample_drinks(store.as_ref()).await?;

    ApiServer::new(bind, store, verifier).run().await?;
    Ok(())
}

fn build_verifier(config: &Config) -> Result<TokenVerifier, Box<dyn std::error::Error + Send + Sync>> {
    let auth = &config.auth;
    let (jwks_uri, audience, issuer) = match (&auth.jwks_uri, &auth.audience, &auth.issuer) {
        (Some(uri), Some(aud), Some(iss)) => (uri.clone(), aud.clone(), iss.clone()),
        _ => {
            return Err(
                "auth is not configured: set auth.jwks_uri, auth.audience and auth.issuer".into(),
            )
        }
    };

    let jwks = JwksProvider::new(jwks_uri)?;
    Ok(TokenVerifier::new(jwks, audience, issuer).with_leeway(auth.leeway_secs))
}
