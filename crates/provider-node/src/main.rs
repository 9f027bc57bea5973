// provider-node/src/main.rs
use clap::{Parser, Subcommand};
use provider_core::{Provider, Timestamp};
use provider_node::{runtime::status_counts, NodeConfig, NodeGenesis, ProviderNode};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "provider-node")]
#[command(about = "Provider staking ledger", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "./config.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Data directory
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Also write an empty genesis file into the data directory
        #[arg(short, long)]
        genesis: bool,

        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective parameters as JSON
    Params,

    /// Check a genesis file without touching the store
    ValidateGenesis {
        file: String,
    },

    /// Apply a genesis file to an empty store and print the ranking
    LoadGenesis {
        file: String,

        /// Genesis block height
        #[arg(long, default_value = "1")]
        height: u64,

        /// Genesis block time in unix seconds, defaults to now
        #[arg(long)]
        time: Option<Timestamp>,

        /// Providers to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Print staked providers by rank from an existing store
    Rank {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Dump the store as a genesis file
    ExportGenesis {
        /// Output path, stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}={},provider_staking={},provider_store={}",
                    env!("CARGO_CRATE_NAME"),
                    log_level,
                    log_level,
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Init {
            data_dir,
            genesis,
            force,
        } => init_node(&cli.config, &data_dir, genesis, force)?,
        Commands::Params => {
            let config = load_config(&cli.config)?;
            println!("{}", serde_json::to_string_pretty(&config.params)?);
        }
        Commands::ValidateGenesis { file } => {
            let genesis = NodeGenesis::from_file(&file)?;
            genesis.validate()?;
            let [staked, unstaking, unstaked] = status_counts(&genesis.providers.providers);
            println!(
                "{}: ok ({} staked, {} unstaking, {} unstaked, {} bonded)",
                file,
                staked,
                unstaking,
                unstaked,
                genesis.bonded_tokens()
            );
        }
        Commands::LoadGenesis {
            file,
            height,
            time,
            limit,
        } => {
            let config = load_config(&cli.config)?;
            let genesis = NodeGenesis::from_file(&file)?;
            let time = time.unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64);

            let mut node = ProviderNode::open(config)?;
            node.load_genesis(&genesis, height, time)?;
            print_ranking(&node.ranking(height, time, limit)?);
            print_unstaking(&node)?;
        }
        Commands::Rank { limit } => {
            let config = load_config(&cli.config)?;
            let mut node = ProviderNode::open(config)?;
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            print_ranking(&node.ranking(0, now, limit)?);
            print_unstaking(&node)?;
        }
        Commands::ExportGenesis { output } => {
            let config = load_config(&cli.config)?;
            let node = ProviderNode::open(config)?;
            let genesis = node.export_genesis()?;
            match output {
                Some(path) => {
                    genesis.to_file(&path)?;
                    tracing::info!("Exported {} providers to {}", genesis.providers.providers.len(), path);
                }
                None => println!("{}", serde_json::to_string_pretty(&genesis)?),
            }
        }
    }

    Ok(())
}

fn load_config(path: &str) -> anyhow::Result<NodeConfig> {
    if Path::new(path).exists() {
        tracing::debug!("Loading configuration from {}", path);
        NodeConfig::from_file(path)
    } else {
        tracing::warn!("{} not found, using default configuration", path);
        Ok(NodeConfig::default())
    }
}

fn init_node(config_path: &str, data_dir: &str, create_genesis: bool, force: bool) -> anyhow::Result<()> {
    if Path::new(config_path).exists() && !force {
        anyhow::bail!("{} already exists, pass --force to overwrite", config_path);
    }

    std::fs::create_dir_all(data_dir)?;
    let config = NodeConfig {
        data_dir: data_dir.to_string(),
        ..NodeConfig::default()
    };
    config.to_file(config_path)?;
    tracing::info!("Wrote default configuration to {}", config_path);

    if create_genesis {
        let mut genesis = NodeGenesis::default();
        genesis.providers.params = config.params.clone();
        let path = Path::new(data_dir).join("genesis.json");
        genesis.to_file(&path)?;
        tracing::info!("Wrote empty genesis to {}", path.display());
    }
    Ok(())
}

fn format_time(time: Timestamp) -> String {
    i64::try_from(time)
        .ok()
        .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| time.to_string())
}

fn print_ranking(providers: &[Provider]) {
    println!("{:>4}  {:<42}  {:>24}  {:>12}  chains", "rank", "address", "staked", "max relays");
    for (rank, p) in providers.iter().enumerate() {
        println!(
            "{:>4}  {:<42}  {:>24}  {:>12}  {}",
            rank + 1,
            p.address.to_string(),
            p.staked_tokens.to_string(),
            p.max_relays.to_string(),
            p.chains.join(",")
        );
    }
}

fn print_unstaking(node: &ProviderNode) -> anyhow::Result<()> {
    let queue = node.unstaking()?;
    if queue.is_empty() {
        return Ok(());
    }
    println!();
    println!("unstaking:");
    for (time, addresses) in queue {
        for address in addresses {
            println!("  {}  matures {}", address, format_time(time));
        }
    }
    Ok(())
}
