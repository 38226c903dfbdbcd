use anyhow::Result;
use clap::ValueEnum;
use paramcat_core::{ExportSummary, TableName};
use std::fmt::Display;
use std::path::Path;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Console output. Text mode prints progress as it happens; JSON mode stays
/// silent until the final summary.
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Reporter { format }
    }

    pub fn line(&self, msg: impl Display) {
        if self.format == OutputFormat::Text {
            println!("{msg}");
        }
    }

    pub fn exported(&self, table: &TableName, rows: u64, path: &Path) {
        self.line(format!("✓ Exported {table}: {rows} rows → {}", path.display()));
    }

    pub fn finish(&self, summary: &ExportSummary) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.line("\n✅ Complete!"),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        }
        Ok(())
    }
}
