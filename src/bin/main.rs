use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use form_gateway::commands::serve::ServeCommand;
use form_gateway::commands::verify_env::EnvReport;
use form_gateway::config::Config;
use form_gateway::parameters::Commands;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "form-gateway", version)]
struct Cli {
    /// Loads environment variables from this file instead of `.env`.
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let loaded = match &cli.env_file {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_owned()),
        None => dotenvy::dotenv(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match loaded {
        Ok(path) => debug!(path = %path.display(), "environment file loaded"),
        Err(e) if cli.env_file.is_some() => return Err(e.into()),
        Err(_) => debug!("no .env file found, using process environment"),
    }

    match cli.command {
        Commands::Serve { port } => {
            let mut config = Config::from_env()?;
            if let Some(port) = port {
                config.listener.port = port;
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(ServeCommand::new(config).run())?;
            Ok(())
        }
        Commands::VerifyEnv => {
            let report = EnvReport::collect(|name| std::env::var(name));
            println!("{report}");
            match &report.backend {
                Err(e) => Err(e.to_owned().into()),
                Ok(_) if !report.is_ok() => {
                    Err(format!("missing variables: {}", report.missing().join(", ")).into())
                }
                Ok(_) => Ok(()),
            }
        }
    }
}
