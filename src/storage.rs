use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::contact::ContactCandidate;

/// Per-account fetch checkpoints: the highest message UID already processed.
/// Values only ever move forward.
#[derive(Debug, Default)]
pub struct Checkpoints {
    map: HashMap<String, u32>,
}

impl Checkpoints {
    pub fn get(&self, account: &str) -> Option<u32> {
        self.map.get(account).copied()
    }

    /// Record a newly observed UID. Returns true when the checkpoint moved;
    /// a smaller or equal UID leaves it untouched.
    pub fn advance(&mut self, account: &str, uid: u32) -> bool {
        match self.map.get(account) {
            Some(&current) if current >= uid => false,
            _ => {
                self.map.insert(account.to_string(), uid);
                true
            }
        }
    }
}

/// Persistence collaborator: contact records as one JSON file per account
/// per run, plus the checkpoint map in a single JSON file.
pub struct StorageManager {
    output_dir: PathBuf,
    checkpoint_path: PathBuf,
}

impl StorageManager {
    pub fn new(output_dir: &Path, checkpoint_path: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Unable to create output directory {}", output_dir.display()))?;

        Ok(StorageManager {
            output_dir: output_dir.to_path_buf(),
            checkpoint_path: checkpoint_path.to_path_buf(),
        })
    }

    /// Write one run's contacts for an account. Candidates arrive already
    /// finalized (blank fields stripped, email present).
    pub fn save_contacts(
        &self,
        account: &str,
        contacts: &[ContactCandidate],
    ) -> Result<Option<PathBuf>> {
        if contacts.is_empty() {
            info!("No contacts to save for {}", account);
            return Ok(None);
        }

        let safe_account = account.replace('@', "_at_").replace('.', "_");
        let filename = format!(
            "{}_{}.json",
            safe_account,
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let path = self.output_dir.join(filename);

        let json = serde_json::to_string_pretty(contacts)
            .context("Unable to serialize contacts")?;
        fs::write(&path, json)
            .with_context(|| format!("Unable to write contacts file {}", path.display()))?;

        info!("Saved {} contact(s) to {}", contacts.len(), path.display());
        Ok(Some(path))
    }

    /// Load the checkpoint map. A missing file is a fresh start; a corrupt
    /// file is logged and treated the same rather than blocking the run.
    pub fn load_checkpoints(&self) -> Checkpoints {
        let raw = match fs::read_to_string(&self.checkpoint_path) {
            Ok(raw) => raw,
            Err(_) => {
                info!(
                    "No checkpoint file at {}, starting from scratch",
                    self.checkpoint_path.display()
                );
                return Checkpoints::default();
            }
        };

        match serde_json::from_str::<HashMap<String, u32>>(&raw) {
            Ok(map) => Checkpoints { map },
            Err(e) => {
                warn!(
                    "Checkpoint file {} is invalid ({}), starting from scratch",
                    self.checkpoint_path.display(),
                    e
                );
                Checkpoints::default()
            }
        }
    }

    /// Persist the checkpoint map, write-then-rename so a crash mid-write
    /// cannot leave a truncated file behind.
    pub fn save_checkpoints(&self, checkpoints: &Checkpoints) -> Result<()> {
        if let Some(parent) = self.checkpoint_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Unable to create checkpoint directory {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&checkpoints.map)
            .context("Unable to serialize checkpoints")?;

        let tmp_path = self.checkpoint_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("Unable to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.checkpoint_path)
            .with_context(|| format!("Unable to replace {}", self.checkpoint_path.display()))?;

        info!("Checkpoints saved to {}", self.checkpoint_path.display());
        Ok(())
    }
}
