//! Local filesystem image store.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::common::ItemId;
use crate::domains::items::data::ImageUpload;
use crate::kernel::BaseImageStore;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Writes item images to `dir/<item_id>.<ext>` and returns `item_images/<file>`.
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Lower-cased extension of `filename` if it is an accepted image type.
pub fn image_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[async_trait]
impl BaseImageStore for LocalImageStore {
    async fn store(&self, item_id: ItemId, upload: &ImageUpload) -> Result<String> {
        let Some(ext) = image_extension(&upload.filename) else {
            bail!("unsupported image type: {}", upload.filename);
        };

        let bytes = STANDARD
            .decode(upload.content.trim())
            .context("image content is not valid base64")?;
        if bytes.is_empty() {
            bail!("image content is empty");
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let file_name = format!("{}.{}", item_id, ext);
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        tracing::debug!(item_id = %item_id, path = %path.display(), bytes = bytes.len(), "Image stored");
        Ok(format!("item_images/{}", file_name))
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        let Some(file_name) = Path::new(reference).file_name() else {
            return Ok(());
        };
        let path = self.dir.join(file_name);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Image removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
        }
    }
}
