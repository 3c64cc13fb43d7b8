use anyhow::{Context, Result};
use clap::Parser;
use doodle_catalog::Catalog;
use doodle_catalog::config::Config;

/// Trait rarity report over the configured catalog
#[derive(Parser)]
#[command(name = "check")]
struct Args {
    #[arg(short, long, env = "DOODLE_CATALOG_CONFIG", default_value = "config.yaml")]
    config: String,

    /// Exit with status 1 if any record has no usable image
    #[arg(long)]
    require_images: bool,

    /// Maximum number of image-less records to list
    #[arg(long, default_value_t = 20)]
    max_examples: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = Config::load(&args.config)?;
    doodle_catalog::init_logging(cfg.log_level());

    let catalog = Catalog::load(&cfg.catalog_source())
        .with_context(|| format!("カタログの読み込みに失敗しました: {:?}", cfg.source.path))?;
    let total = catalog.len();

    println!("==============================");
    println!(" Collectible Rarity Check");
    println!(" Total records: {}", total);
    println!("==============================\n");

    for (trait_type, values) in catalog.trait_distribution() {
        println!("▶ Trait: {}", trait_type);

        let mut sorted: Vec<_> = values.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        for (value, count) in sorted {
            let ratio = count as f64 / total as f64 * 100.0;
            println!("  {:30} {:5} ({:.2}%)", value, count, ratio);
        }
        println!();
    }

    let missing: Vec<_> = catalog.all().filter(|r| !r.image_available()).collect();

    println!("==============================");
    println!(" Image Availability");
    println!(" Missing images: {}", missing.len());
    println!("==============================");

    if missing.is_empty() {
        println!("✅ 全レコードに画像があります");
    } else {
        println!("⚠ 画像のないレコードがあります（最大 {} 件表示）:", args.max_examples);
        for record in missing.iter().take(args.max_examples) {
            println!("  - {} : {}", record.token_id, record.display_name);
        }
    }

    if args.require_images && !missing.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
