use doodle_catalog::config::Config;
use doodle_catalog::{Board, Catalog};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashSet;
use tracing::info;

#[derive(Parser)]
#[command(name = "doodle-catalog")]
#[command(about = "Inspect a collectible catalog and deal memory-game boards", long_about = None)]
struct Cli {
    /// Config file
    #[arg(short, long, env = "DOODLE_CATALOG_CONFIG", default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collection summary
    Info,
    /// Print one record as JSON
    Show { token_id: String },
    /// Pick random records
    Sample {
        count: usize,

        /// Token ids that must not be picked
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Deal a shuffled board of card pairs
    Deal {
        #[arg(long)]
        rows: Option<usize>,

        #[arg(long)]
        cols: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// List distinct image URLs
    Urls,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = Config::load(&cli.config)
        .with_context(|| format!("{} の読み込みに失敗しました", cli.config))?;
    doodle_catalog::init_logging(cfg.log_level());

    let catalog = Catalog::load(&cfg.catalog_source())
        .with_context(|| format!("カタログの読み込みに失敗しました: {:?}", cfg.source.path))?;

    match cli.command {
        Commands::Info => {
            println!("records:        {}", catalog.len());
            println!("with image:     {}", catalog.with_images().count());
            if let Some(c) = catalog.collection() {
                println!("contract:       {}", c.address.as_deref().unwrap_or("-"));
                println!("name:           {}", c.name.as_deref().unwrap_or("-"));
                println!("symbol:         {}", c.symbol.as_deref().unwrap_or("-"));
                println!("total supply:   {}", c.total_supply.as_deref().unwrap_or("-"));
            }
            if let Some(key) = catalog.next_page_key() {
                println!("next page key:  {key}");
            }
        }
        Commands::Show { token_id } => {
            let record = catalog.get(&token_id)?;
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        Commands::Sample {
            count,
            exclude,
            seed,
        } => {
            let excluding: HashSet<String> = exclude.into_iter().collect();
            let picked = catalog.sample_with_rng(count, &excluding, &mut rng(seed))?;
            for record in picked {
                println!(
                    "{:>8}  {:30} {}",
                    record.token_id,
                    record.display_name,
                    record.image_url.as_deref().unwrap_or("(image unavailable)")
                );
            }
        }
        Commands::Deal { rows, cols, seed } => {
            let rows = rows.unwrap_or(cfg.board.rows);
            let cols = cols.unwrap_or(cfg.board.cols);
            let board = Board::deal(&catalog, rows, cols, &mut rng(seed))?;
            info!(pairs = board.pair_count(), "dealt {}x{} board", rows, cols);

            for row in board.cards().chunks(cols) {
                let line: Vec<String> = row
                    .iter()
                    .map(|c| format!("{:>6}:{:<6}", c.id, c.token_id))
                    .collect();
                println!("{}", line.join(" "));
            }
        }
        Commands::Urls => {
            for url in catalog.image_urls() {
                println!("{url}");
            }
        }
    }

    Ok(())
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}
