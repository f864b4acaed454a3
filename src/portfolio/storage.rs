//! Portfolio persistence and snapshot layer
//!
//! Stores state under the data directory:
//! - portfolio.json - current aggregate (positions + transactions + metadata)
//! - snapshots/YYYY-MM-DD-HH-MM-SS.json - integrity-hashed point-in-time copies
//!
//! Saves are write-then-rename so a crash mid-write cannot leave a torn
//! document behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::data_paths::DataPaths;

use super::types::Portfolio;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("portfolio I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("portfolio serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Portfolio storage manager
#[derive(Clone)]
pub struct PortfolioStore {
    data_paths: DataPaths,
}

/// Point-in-time copy of the aggregate with an integrity hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub timestamp: DateTime<Utc>,
    pub portfolio: Portfolio,
    /// blake3 hash of the serialized portfolio
    pub content_hash: String,
}

impl PortfolioStore {
    pub fn new(data_paths: DataPaths) -> Self {
        Self { data_paths }
    }

    /// Initialize storage directories
    pub async fn init_directories(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.data_paths.root()).await?;
        fs::create_dir_all(self.data_paths.snapshots()).await?;
        Ok(())
    }

    /// Load the persisted portfolio, bootstrapping an empty one on first use
    pub async fn load(&self) -> Result<Portfolio, StorageError> {
        let path = self.data_paths.portfolio_file();

        if !path.exists() {
            info!(path = %path.display(), "No portfolio document found, initializing empty portfolio");
            let portfolio = Portfolio::empty();
            self.save(&portfolio).await?;
            return Ok(portfolio);
        }

        let content = fs::read_to_string(&path).await?;
        let portfolio = serde_json::from_str(&content)?;
        Ok(portfolio)
    }

    /// Persist the aggregate atomically (write to a temp file, then rename)
    pub async fn save(&self, portfolio: &Portfolio) -> Result<(), StorageError> {
        self.init_directories().await?;

        let path = self.data_paths.portfolio_file();
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(portfolio)?;
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        Ok(())
    }

    /// Save an integrity-hashed snapshot; returns the snapshot filename
    pub async fn save_snapshot(&self, portfolio: &Portfolio) -> Result<String, StorageError> {
        self.init_directories().await?;

        let timestamp = Utc::now();
        let content_hash = snapshot_hash(portfolio)?;
        let snapshot = PortfolioSnapshot {
            timestamp,
            portfolio: portfolio.clone(),
            content_hash,
        };

        let filename = format!("{}.json", timestamp.format("%Y-%m-%d-%H-%M-%S"));
        let filepath = self.data_paths.snapshots().join(&filename);

        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&filepath, json).await?;

        info!(snapshot = %filename, "Saved portfolio snapshot");
        Ok(filename)
    }

    /// Remove old snapshots, keeping the newest `keep_count`.
    /// Returns the number removed.
    pub async fn prune_snapshots(&self, keep_count: usize) -> Result<usize, StorageError> {
        let snapshots_dir = self.data_paths.snapshots();
        if !snapshots_dir.exists() {
            return Ok(0);
        }

        let mut snapshots: Vec<PathBuf> = Vec::new();
        let mut entries = fs::read_dir(&snapshots_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                snapshots.push(path);
            }
        }

        // Timestamped filenames sort chronologically; newest last
        snapshots.sort();
        snapshots.reverse();

        let mut removed = 0;
        for path in snapshots.into_iter().skip(keep_count) {
            match fs::remove_file(&path).await {
                Ok(_) => {
                    removed += 1;
                    info!(path = %path.display(), "Removed old snapshot");
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove snapshot"),
            }
        }

        Ok(removed)
    }
}

/// Integrity hash over the serialized aggregate
fn snapshot_hash(portfolio: &Portfolio) -> Result<String, StorageError> {
    let json = serde_json::to_string(portfolio)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}
