//! Filesystem implementation of the upload store.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use beleg_core::gateway::UploadStore;

use crate::Error;

/// Stores uploads under a configured directory, naming each file by a fresh
/// UUID while preserving the original extension — collision-proof by
/// construction.
#[derive(Debug, Clone)]
pub struct DiskUploadStore {
  root: PathBuf,
}

impl DiskUploadStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

impl UploadStore for DiskUploadStore {
  type Error = Error;

  async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, Error> {
    tokio::fs::create_dir_all(&self.root).await?;

    let file_name = match Path::new(original_name).extension() {
      Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_string_lossy()),
      None => Uuid::new_v4().to_string(),
    };
    let path = self.root.join(file_name);

    tokio::fs::write(&path, bytes).await?;
    Ok(path.to_string_lossy().into_owned())
  }
}
