use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::Path;

use mailminer::classifier::TfidfLogisticModel;
use mailminer::config::{self, Config};
use mailminer::pipeline::Pipeline;
use mailminer::processor::Processor;
use mailminer::rules::Rules;

#[derive(Parser)]
#[command(name = "mailminer")]
#[command(about = "Scans mailboxes and extracts recruiter contact records")]
#[command(version = "0.1.0")]
struct Args {
    /// Dry-run mode: run the full pipeline and print contacts, but write
    /// nothing and leave checkpoints untouched
    #[arg(short, long)]
    dry_run: bool,

    /// Limit the number of messages processed per account
    #[arg(short = 'l', long)]
    limit: Option<usize>,

    /// Only process accounts carrying this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Check the configuration without connecting
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load the .env file if present
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    if args.dry_run {
        info!("🧪 Starting mailminer in DRY-RUN mode");
    } else {
        info!("🚀 Starting mailminer");
    }

    let config = Config::new()?;

    if args.check_config {
        println!("✅ Configuration valid!");
        println!("📧 Accounts file: {}", config.accounts_path);
        println!("📋 Rules file: {}", config.rules_path);
        println!("🧠 Classifier model: {}", config.model_path);
        println!("📁 Output directory: {}", config.output_dir);
        println!("🔖 Checkpoint file: {}", config.checkpoint_path);
        return Ok(());
    }

    // The classifier is the one component the pipeline cannot run without;
    // a load failure stops the run before any message is touched.
    let model = TfidfLogisticModel::load(Path::new(&config.model_path))
        .context("Unable to load classifier model")?;

    let rules = Rules::load(Path::new(&config.rules_path))
        .context("Unable to load extraction rules")?;

    let accounts = config::load_accounts(Path::new(&config.accounts_path), args.tag.as_deref())
        .context("Unable to load accounts")?;

    if accounts.is_empty() {
        error!("No active accounts found matching criteria");
        return Ok(());
    }
    info!("Loaded {} account(s)", accounts.len());

    let pipeline = Pipeline::new(rules, Box::new(model));

    let mut processor = if args.dry_run {
        Processor::new_dry_run(pipeline, args.limit)
    } else {
        Processor::new(&config, pipeline, args.limit)?
    };

    let stats = processor.run(&accounts).await;

    match stats {
        Ok(stats) => {
            stats.log_summary();
            info!(
                "✅ Run completed: {} contact(s) extracted from {} message(s)",
                stats.total_contacts(),
                stats.total_fetched()
            );
        }
        Err(e) => {
            error!("❌ Error during processing: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
