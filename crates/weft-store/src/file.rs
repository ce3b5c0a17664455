use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::entries::Entries;
use crate::types::{HistoryEntry, RunSummary};
use crate::{Error, HistoryStore};

/// History store kept in a single JSON file.
///
/// The file is read on every operation and rewritten after every change, so
/// several processes can share it as long as they do not write concurrently.
#[derive(Debug)]
pub struct FileHistoryStore {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FileHistoryStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      lock: Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  async fn load(&self) -> Result<Entries, Error> {
    match tokio::fs::read_to_string(&self.path).await {
      Ok(content) if content.trim().is_empty() => Ok(Entries::default()),
      Ok(content) => Ok(serde_json::from_str(&content)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::default()),
      Err(e) => Err(e.into()),
    }
  }

  async fn save(&self, entries: &Entries) -> Result<(), Error> {
    if let Some(parent) = self.path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(entries)?;
    let tmp = self.path.with_extension("json.tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, &self.path).await?;
    Ok(())
  }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
  async fn add(&self, summary: RunSummary) -> Result<String, Error> {
    let _guard = self.lock.lock().await;
    let mut entries = self.load().await?;
    let id = entries.add(summary);
    self.save(&entries).await?;
    Ok(id)
  }

  async fn get(&self, id: &str) -> Result<HistoryEntry, Error> {
    let _guard = self.lock.lock().await;
    self
      .load()
      .await?
      .get(id)
      .cloned()
      .ok_or_else(|| Error::NotFound(id.to_string()))
  }

  async fn delete(&self, id: &str) -> Result<(), Error> {
    let _guard = self.lock.lock().await;
    let mut entries = self.load().await?;
    entries.delete(id);
    self.save(&entries).await
  }

  async fn clear(&self) -> Result<(), Error> {
    let _guard = self.lock.lock().await;
    self.save(&Entries::default()).await
  }

  async fn list(&self) -> Result<Vec<HistoryEntry>, Error> {
    let _guard = self.lock.lock().await;
    Ok(self.load().await?.list())
  }

  async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, Error> {
    let _guard = self.lock.lock().await;
    Ok(self.load().await?.recent(limit))
  }
}
