use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;

use super::connect;

#[derive(Args, Clone)]
pub struct SnapshotArgs {
    /// How many snapshots to keep after pruning
    #[arg(long, default_value_t = 20)]
    pub keep: usize,
}

pub struct SnapshotCommand {
    args: SnapshotArgs,
}

impl SnapshotCommand {
    pub fn new(args: SnapshotArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: &Settings, data_paths: DataPaths) -> Result<()> {
        info!("Creating portfolio snapshot");

        let handle = connect(settings, data_paths).await?;
        let filename = handle.create_snapshot(self.args.keep).await?;

        println!("Saved snapshot {filename}");
        Ok(())
    }
}
