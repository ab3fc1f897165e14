//! Table sinks
//!
//! A sink receives a grid as "clear the range, then append rows". The
//! spreadsheet-backed sink lives outside this crate; [`FileSink`] writes the
//! same grid to a file or stdout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::timeline::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Tsv,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn render(&self, table: &Table) -> Result<String> {
        match self {
            OutputFormat::Tsv => Ok(table.to_tsv()),
            OutputFormat::Csv => Ok(table.to_csv()),
            OutputFormat::Json => {
                let mut json = table.to_json().context("Failed to serialize table")?;
                json.push('\n');
                Ok(json)
            }
        }
    }
}

#[async_trait]
pub trait TableSink: Send + Sync {
    async fn clear(&self, range: &str) -> Result<()>;
    async fn append(&self, range: &str, table: &Table) -> Result<()>;
}

/// Replace the contents of `range` with `table`.
pub async fn publish(sink: &dyn TableSink, range: &str, table: &Table) -> Result<()> {
    sink.clear(range).await?;
    sink.append(range, table).await?;
    info!(range, rows = table.rows.len(), "Table published");
    Ok(())
}

/// Writes to `path`, or stdout when no path is set. The range is ignored.
pub struct FileSink {
    path: Option<PathBuf>,
    format: OutputFormat,
}

impl FileSink {
    pub fn new(path: Option<PathBuf>, format: OutputFormat) -> Self {
        Self { path, format }
    }
}

#[async_trait]
impl TableSink for FileSink {
    async fn clear(&self, range: &str) -> Result<()> {
        if let Some(path) = &self.path {
            debug!(range, path = %path.display(), "Truncating output");
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
        }
        Ok(())
    }

    async fn append(&self, range: &str, table: &Table) -> Result<()> {
        let rendered = self.format.render(table)?;
        match &self.path {
            Some(path) => {
                debug!(range, path = %path.display(), "Appending rows");
                let mut file = tokio::fs::OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                file.write_all(rendered.as_bytes()).await?;
                file.flush().await?;
            }
            None => {
                let mut out = tokio::io::stdout();
                out.write_all(rendered.as_bytes()).await?;
                out.flush().await?;
            }
        }
        Ok(())
    }
}
