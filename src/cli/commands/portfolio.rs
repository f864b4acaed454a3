use anyhow::Result;
use clap::Args;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::portfolio::display::SummaryFormatter;

use super::connect;

#[derive(Args, Clone)]
pub struct PortfolioArgs {
    /// Emit the raw portfolio document as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub struct PortfolioCommand {
    args: PortfolioArgs,
}

impl PortfolioCommand {
    pub fn new(args: PortfolioArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: &Settings, data_paths: DataPaths) -> Result<()> {
        let handle = connect(settings, data_paths).await?;
        let portfolio = handle.state().await?;

        if self.args.json {
            println!("{}", serde_json::to_string_pretty(&portfolio)?);
        } else {
            print!("{}", SummaryFormatter::new(&portfolio).format());
        }

        Ok(())
    }
}
