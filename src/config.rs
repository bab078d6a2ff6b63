use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Config {
    pub accounts_path: String,
    pub rules_path: String,
    pub model_path: String,
    pub output_dir: String,
    pub checkpoint_path: String,
}

/// A mailbox to scan. Loaded from the accounts JSON file, never from code.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub email: String,
    pub password: String,
    pub imap_server: String,
    #[serde(default = "default_imap_port")]
    pub imap_port: u16,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub fetch_limit: Option<usize>,
}

fn default_imap_port() -> u16 {
    993
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct AccountsFile {
    accounts: Vec<Account>,
}

impl Config {
    pub fn new() -> Result<Self> {
        Self::check_required_env_vars()?;

        Ok(Config {
            accounts_path: std::env::var("ACCOUNTS_PATH")
                .unwrap_or_else(|_| "./config/accounts.json".to_string()),
            rules_path: std::env::var("RULES_PATH")
                .unwrap_or_else(|_| "./config/rules.json".to_string()),
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| String::new()),
            output_dir: std::env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "./output".to_string()),
            checkpoint_path: std::env::var("CHECKPOINT_PATH")
                .unwrap_or_else(|_| "./output/checkpoints.json".to_string()),
        })
    }

    fn check_required_env_vars() -> Result<()> {
        let required_vars = ["MODEL_PATH"];

        let mut missing_vars = Vec::new();

        for var in &required_vars {
            if std::env::var(var).is_err() {
                missing_vars.push(*var);
            }
        }

        if !missing_vars.is_empty() {
            anyhow::bail!(
                "Missing environment variables: {}\n\
                 \n\
                 Solutions:\n\
                 1. Create a .env file with your settings:\n\
                    cp .env.example .env\n\
                    # then edit .env with your values\n\
                 \n\
                 2. Or set the variables manually:\n\
                    export MODEL_PATH=/path/to/classifier.json\n\
                    export ACCOUNTS_PATH=./config/accounts.json\n\
                    cargo run -- --dry-run",
                missing_vars.join(", ")
            );
        }

        Ok(())
    }
}

/// Load accounts from the configured JSON file, keeping only active ones and,
/// when a tag filter is given, only accounts carrying that tag.
pub fn load_accounts(path: &Path, filter_tag: Option<&str>) -> Result<Vec<Account>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Unable to read accounts file {}", path.display()))?;

    let parsed: AccountsFile = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid accounts file {}", path.display()))?;

    let accounts: Vec<Account> = parsed
        .accounts
        .into_iter()
        .filter(|acc| acc.active)
        .filter(|acc| match filter_tag {
            Some(tag) => acc.tags.iter().any(|t| t == tag),
            None => true,
        })
        .collect();

    Ok(accounts)
}
