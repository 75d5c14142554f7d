//! Export command implementation

use crate::config::Config;
use crate::data::{ExportFormat, SnapshotExporter};
use crate::store::{JsonFileStore, StateStore};
use crate::window::Observation;
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

const HISTORY_PREFIX: &str = "history";

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output directory (defaults to export.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to export.format)
    #[arg(short, long, value_enum)]
    pub format: Option<ExportFormat>,

    /// State file path
    #[arg(long)]
    pub state: Option<PathBuf>,
}

impl ExportArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let state_path = self
            .state
            .clone()
            .unwrap_or_else(|| config.storage.state_path.clone());
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.export.output_dir.clone());
        let format = self.format.unwrap_or(config.export.format);

        let snapshot = JsonFileStore::new(&state_path).load_state().await?;
        let observations: Vec<Observation> = snapshot
            .windows
            .instruments
            .into_values()
            .flat_map(|i| i.detailed)
            .collect();

        let exporter = SnapshotExporter::new(output, format);
        match exporter.export(HISTORY_PREFIX, &observations, Utc::now())? {
            Some(path) => println!("Exported {} observations to {}", observations.len(), path.display()),
            None => println!("No saved observations in {}", state_path.display()),
        }
        Ok(())
    }
}
