//! Local file archive
//!
//! Layout: `<root>/<agent_id>/<YYYY-MM-DD>.jsonl`, one compact JSON object
//! per line, files opened in append mode only.

use async_trait::async_trait;
use chrono::NaiveDate;
use provlog_core::Event;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::backend::{ArchiveBackend, ArchiveError, ArchiveRecord};

/// File-backed archive rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FileArchive {
    root: PathBuf,
}

impl FileArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the file for one agent and day.
    ///
    /// Agent ids are validated upstream (`[A-Za-z0-9._-]{1,128}`); separators
    /// and traversal sequences are rejected here as well so that no caller
    /// can escape the archive root.
    fn day_path(&self, agent_id: &str, date: NaiveDate) -> Result<PathBuf, ArchiveError> {
        if agent_id.is_empty()
            || agent_id == "."
            || agent_id == ".."
            || agent_id.contains('/')
            || agent_id.contains('\\')
        {
            return Err(ArchiveError::InvalidPath(agent_id.to_string()));
        }
        let mut path = self.root.join(agent_id);
        path.push(format!("{}.jsonl", date.format("%Y-%m-%d")));
        Ok(path)
    }
}

#[async_trait]
impl ArchiveBackend for FileArchive {
    fn name(&self) -> &str {
        "file"
    }

    async fn write_event(&self, event: &Event) -> Result<(), ArchiveError> {
        let path = self.day_path(&event.agent_id, event.timestamp.date_naive())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let record = ArchiveRecord::from_event(event);
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        // Append mode only; an existing file is never truncated.
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    async fn read_events(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ArchiveRecord>, ArchiveError> {
        let path = self.day_path(agent_id, date)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let mut records = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }

    async fn check_health(&self) -> bool {
        if fs::create_dir_all(&self.root).await.is_err() {
            return false;
        }
        let probe = self.root.join(".health_check");
        match fs::write(&probe, b"").await {
            Ok(()) => fs::remove_file(&probe).await.is_ok(),
            Err(_) => false,
        }
    }
}
