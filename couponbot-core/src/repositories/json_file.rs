// File: couponbot-core/src/repositories/json_file.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use couponbot_common::models::RecordBook;
use couponbot_common::traits::repository_traits::RecordStore;

use crate::Error;

/// Keeps the whole registration book in one pretty-printed JSON file.
///
/// Writes go to a sibling temp file which is then renamed over the target, so
/// a crash mid-write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "players.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self) -> Result<RecordBook, Error> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No players file at {} => starting empty", self.path.display());
                return Ok(RecordBook::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if raw.trim().is_empty() {
            return Ok(RecordBook::new());
        }

        let book: RecordBook = serde_json::from_str(&raw).map_err(|e| {
            Error::Persistence(format!("could not parse {}: {e}", self.path.display()))
        })?;
        debug!(
            "Loaded {} registration(s) across {} scope(s) from {}",
            book.total_accounts(),
            book.scope_count(),
            self.path.display()
        );
        Ok(book)
    }

    async fn save(&self, records: &RecordBook) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(records)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Saved {} registration(s) to {}", records.total_accounts(), self.path.display());
        Ok(())
    }
}
