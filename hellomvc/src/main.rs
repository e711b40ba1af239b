//! Hellomvc - request-body JSON demo server
//!
//! This is the main entry point for the hellomvc CLI.

use clap::{Parser, Subcommand};
use hellomvc_core::config::{ConfigLoader, HandlerConfig, HelloMvcConfig, LogFormat, LoggingConfig, Reply};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Hellomvc - five ways to read a JSON request body
#[derive(Parser)]
#[command(name = "hellomvc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server
    Run {
        /// Path to a .json or .toml configuration file
        config: Option<String>,

        /// Address to listen on (overrides the configuration file)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to a .json or .toml configuration file
        config: String,
    },

    /// Print the effective route table
    Routes {
        /// Path to a .json or .toml configuration file
        config: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config: config_path, listen } => {
            let mut config = load_config(config_path.as_deref())?;
            if let Some(listen) = listen {
                config.server.listen = listen;
                config.validate()?;
            }

            init_tracing(&config.logging, cli.verbose);
            tracing::info!("🚀 Starting hellomvc v{}", hellomvc_core::VERSION);
            match &config_path {
                Some(path) => tracing::info!("📄 Loaded configuration from: {}", path),
                None => tracing::info!("📄 No configuration file, using defaults"),
            }

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(hellomvc_api::run_server(&config))?;
        }

        Commands::Validate { config } => {
            init_tracing(&LoggingConfig::default(), cli.verbose);
            tracing::info!("Validating config: {}", config);

            match ConfigLoader::load(&config) {
                Ok(_) => {
                    println!("✅ Configuration '{}' is valid!", config);
                }
                Err(e) => {
                    eprintln!("❌ Configuration Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Routes { config } => {
            let config = load_config(config.as_deref())?;
            for route in config.effective_routes() {
                let methods = route
                    .methods
                    .as_ref()
                    .map(|m| m.join(","))
                    .unwrap_or_else(|| "*".to_string());
                println!("{:<8} {:<28} {}", methods, route.path, describe(&route.handler));
            }
        }

        Commands::Version => {
            println!("hellomvc v{}", hellomvc_core::VERSION);
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> anyhow::Result<HelloMvcConfig> {
    Ok(match path {
        Some(path) => ConfigLoader::load(path)?,
        None => HelloMvcConfig::default(),
    })
}

/// `--verbose` beats `RUST_LOG`, which beats the configured level
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Compact => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
    }
}

fn describe(handler: &HandlerConfig) -> String {
    match handler {
        HandlerConfig::JsonBody { binding, reply } => {
            let reply = match reply {
                Reply::Ok => "ok",
                Reply::Echo => "echo",
            };
            format!("json_body(binding={}, reply={})", binding, reply)
        }
        HandlerConfig::Health => "health".to_string(),
    }
}
