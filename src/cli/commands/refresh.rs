use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::portfolio::display::format_refresh_report;

use super::connect;

#[derive(Args, Clone)]
pub struct RefreshArgs {}

pub struct RefreshCommand {
    #[allow(dead_code)]
    args: RefreshArgs,
}

impl RefreshCommand {
    pub fn new(args: RefreshArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: &Settings, data_paths: DataPaths) -> Result<()> {
        info!("Refreshing position prices");

        let handle = connect(settings, data_paths).await?;
        let report = handle.refresh_prices().await?;

        print!("{}", format_refresh_report(&report));
        Ok(())
    }
}
