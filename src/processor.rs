use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::config::{Account, Config};
use crate::mail_client::MailClient;
use crate::pipeline::Pipeline;
use crate::storage::StorageManager;

/// What happened for one account during a run.
#[derive(Debug, Default)]
pub struct AccountStats {
    pub email: String,
    pub fetched: usize,
    pub accepted: usize,
    pub contacts: usize,
    pub duplicates: usize,
    pub error: Option<String>,
}

/// Aggregated counters for a whole run, printed as a summary at the end.
#[derive(Debug)]
pub struct RunStats {
    pub started: DateTime<Utc>,
    pub accounts: Vec<AccountStats>,
}

impl RunStats {
    fn new() -> Self {
        RunStats {
            started: Utc::now(),
            accounts: Vec::new(),
        }
    }

    pub fn total_fetched(&self) -> usize {
        self.accounts.iter().map(|a| a.fetched).sum()
    }

    pub fn total_accepted(&self) -> usize {
        self.accounts.iter().map(|a| a.accepted).sum()
    }

    pub fn total_contacts(&self) -> usize {
        self.accounts.iter().map(|a| a.contacts).sum()
    }

    pub fn log_summary(&self) {
        let duration = Utc::now() - self.started;

        info!("{}", "=".repeat(60));
        info!("{:=^60}", " PROCESSING SUMMARY ");
        info!("{}", "=".repeat(60));
        info!("Total processing time: {}s", duration.num_seconds());
        info!("Accounts processed: {}", self.accounts.len());
        info!("Total messages fetched: {}", self.total_fetched());
        info!("Total recruiter messages: {}", self.total_accepted());
        info!("Total contacts extracted: {}", self.total_contacts());

        for acc in &self.accounts {
            info!("Account: {}", acc.email);
            info!("- Messages fetched: {}", acc.fetched);
            info!("- Recruiter messages: {}", acc.accepted);
            info!("- Contacts extracted: {}", acc.contacts);
            info!("- Duplicates dropped: {}", acc.duplicates);
            if let Some(err) = &acc.error {
                error!("- ERROR: {}", err);
            }
        }
    }
}

/// Drives the run: per account, fetch new messages since the checkpoint,
/// push them through the pipeline, persist contacts, advance the checkpoint.
/// In dry-run mode nothing is written and checkpoints do not move.
pub struct Processor {
    storage: Option<StorageManager>,
    pipeline: Pipeline,
    limit: Option<usize>,
}

impl Processor {
    pub fn new(config: &Config, pipeline: Pipeline, limit: Option<usize>) -> Result<Self> {
        info!("Initializing mailbox processor");

        let storage = StorageManager::new(
            config.output_dir.as_ref(),
            config.checkpoint_path.as_ref(),
        )
        .context("Unable to initialize storage")?;

        Ok(Processor {
            storage: Some(storage),
            pipeline,
            limit,
        })
    }

    pub fn new_dry_run(pipeline: Pipeline, limit: Option<usize>) -> Self {
        info!("🧪 Initializing mailbox processor in dry-run mode (no storage writes)");
        Processor {
            storage: None,
            pipeline,
            limit,
        }
    }

    pub async fn run(&mut self, accounts: &[Account]) -> Result<RunStats> {
        let mut stats = RunStats::new();
        let is_dry_run = self.storage.is_none();

        if is_dry_run {
            println!("\n{}", "=".repeat(80));
            println!("🧪 DRY-RUN MODE - CONTACT EXTRACTION ANALYSIS");
            println!("{}", "=".repeat(80));
        }

        let mut checkpoints = self
            .storage
            .as_ref()
            .map(|s| s.load_checkpoints())
            .unwrap_or_default();

        for account in accounts {
            info!("Processing account: {}", account.email);

            let account_stats = self
                .process_account(account, &mut checkpoints, is_dry_run)
                .await;

            if let Some(err) = &account_stats.error {
                error!("Account {} failed: {}", account.email, err);
            }
            stats.accounts.push(account_stats);
        }

        if is_dry_run {
            println!("{}", "=".repeat(80));
            println!(
                "🏁 Analysis completed: {} contact(s) from {} message(s)",
                stats.total_contacts(),
                stats.total_fetched()
            );
            println!("{}", "=".repeat(80));
        }

        Ok(stats)
    }

    /// One account, end to end. Errors are captured in the stats record so
    /// the remaining accounts still get processed.
    async fn process_account(
        &mut self,
        account: &Account,
        checkpoints: &mut crate::storage::Checkpoints,
        is_dry_run: bool,
    ) -> AccountStats {
        let mut account_stats = AccountStats {
            email: account.email.clone(),
            ..Default::default()
        };

        let last_uid = checkpoints.get(&account.email);
        let limit = account.fetch_limit.or(self.limit);

        let result: Result<()> = async {
            let mut client = MailClient::connect(account)
                .await
                .with_context(|| format!("Unable to connect to {}", account.email))?;

            let messages = client
                .fetch_since(last_uid, limit)
                .await
                .context("Error fetching messages")?;
            account_stats.fetched = messages.len();

            let outcome = self.pipeline.process_batch(&messages, &account.email);
            account_stats.accepted = outcome.accepted;
            account_stats.contacts = outcome.contacts.len();
            account_stats.duplicates = outcome.duplicates;

            if is_dry_run {
                for contact in &outcome.contacts {
                    match serde_json::to_string_pretty(contact) {
                        Ok(json) => println!("✅ Contact:\n{}\n", json),
                        Err(e) => warn!("Unable to render contact: {}", e),
                    }
                }
            } else if let Some(storage) = &self.storage {
                storage
                    .save_contacts(&account.email, &outcome.contacts)
                    .context("Unable to save contacts")?;

                if let Some(max_uid) = outcome.max_uid {
                    if checkpoints.advance(&account.email, max_uid) {
                        storage
                            .save_checkpoints(checkpoints)
                            .context("Unable to save checkpoints")?;
                    }
                }
            }

            if let Err(e) = client.logout().await {
                warn!("Error during logout for {}: {}", account.email, e);
            }

            Ok(())
        }
        .await;

        if let Err(e) = result {
            account_stats.error = Some(format!("{:#}", e));
        }

        account_stats
    }
}
