use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use novabud::{config, gateway};

#[derive(Parser)]
#[command(name = "novabud")]
#[command(about = "Backend for the Nova AI buddy companion app")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the backend server
    Serve {
        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Bind address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,

        /// Shared auth secret for local deployments without an identity
        /// provider
        #[arg(long, env = "NOVABUD_TOKEN")]
        token: Option<String>,
    },

    /// Show resolved configuration and exit
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind, token } => {
            let mut config = config::load()?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            gateway::run(config, token).await
        }
        Commands::Status => {
            let config = config::load()?;
            println!("novabud v{}", env!("CARGO_PKG_VERSION"));
            println!("server: {}:{}", config.server.bind, config.server.port);
            println!("chat model: {}", config.provider.chat_model);
            println!(
                "auth: {}",
                match &config.auth.verify_url {
                    Some(url) => format!("remote ({url})"),
                    None => "shared secret (--token)".to_string(),
                }
            );
            Ok(())
        }
    }
}
