use areas_proxy::server::{build_router, serve, AppState, ServeConfig};
use areas_proxy::utils::display::DisplayFormatter;
use areas_proxy::{AreaService, AreasResult, Config};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the areas API
    Serve {
        /// Overrides HOST
        #[arg(long)]
        host: Option<String>,
        /// Overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch the areas once and print them
    Show {
        /// Only list areas that are currently available
        #[arg(short, long)]
        available: bool,
    },
}

#[tokio::main]
async fn main() -> AreasResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    debug!("Upstream areas URL: {}", config.areas_url());

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            info!("Starting areas proxy");
            let service = AreaService::from_config(&config)?;
            service.warm_up().await?;

            let router = build_router(AppState::new(service));
            serve(ServeConfig {
                host: config.host.clone(),
                port: config.port,
                router,
                max_concurrency: config.max_concurrency,
            })
            .await?;
        }
        Commands::Show { available } => {
            let service = AreaService::from_config(&config)?;
            let dataset = service.warm_up().await?;
            println!("{}", DisplayFormatter::new().format_dataset(&dataset, available));
        }
    }

    Ok(())
}
