use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::warn;

use crate::classifier::AssetCategory;
use crate::error::MirrorError;

pub const INDEX_FILE: &str = "index.html";

/// `<host with dots as underscores>_website_<YYYYMMDD_HHMMSS>`
pub fn project_folder_name(host: &str, time: &DateTime<Local>) -> String {
    format!("{}_website_{}", host.replace('.', "_"), time.format("%Y%m%d_%H%M%S"))
}

/// On-disk layout of one mirror: the project root plus one folder per
/// asset category.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Creates `<output_dir>/<project folder>` and its category folders.
    /// Only a root that is still missing afterwards is an error; category
    /// folders are best effort.
    pub async fn create(output_dir: &Path, host: &str) -> Result<Self, MirrorError> {
        let root = output_dir.join(project_folder_name(host, &Local::now()));

        if let Err(source) = tokio::fs::create_dir_all(&root).await {
            if !tokio::fs::metadata(&root).await.is_ok_and(|meta| meta.is_dir()) {
                return Err(MirrorError::ProjectFolder { path: root, source });
            }
        }

        for category in AssetCategory::ALL {
            let dir = root.join(category.dir_name());
            if let Err(e) = tokio::fs::create_dir_all(&dir).await {
                warn!("Failed to create {:?}: {}", dir, e);
            }
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a project-relative path such as `css/site.css`.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    pub async fn write_file(&self, relative: &str, content: &[u8]) -> Result<PathBuf, MirrorError> {
        let path = self.resolve(relative);
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| MirrorError::Write { path: path.clone(), source })?;
        Ok(path)
    }

    pub async fn write_index(&self, html: &str) -> Result<PathBuf, MirrorError> {
        self.write_file(INDEX_FILE, html.as_bytes()).await
    }
}
