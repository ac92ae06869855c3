//! Mapping request targets onto files beneath the document root.
//!
//! No path outside the root is ever opened: targets are first resolved
//! lexically (a `..` that would climb above the root is rejected), and the
//! resulting path is then canonicalized and checked again, which catches
//! symlinks pointing out of the tree.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;

use crate::config::StaticFilesConfig;
use crate::http::request::Request;
use crate::http::response::Response;

#[derive(Debug, Clone)]
pub struct DocRoot {
    root: PathBuf,
    index_file: String,
}

impl DocRoot {
    /// Validates the configured root; fails if it is missing or not a directory.
    pub fn open(cfg: &StaticFilesConfig) -> Result<Self> {
        Self::new(&cfg.doc_root, &cfg.index_file)
    }

    pub fn new(root: impl AsRef<Path>, index_file: impl Into<String>) -> Result<Self> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root)
            .with_context(|| format!("Document root {} does not exist", root.display()))?;

        if !root.is_dir() {
            anyhow::bail!("Document root {} is not a directory", root.display());
        }

        Ok(Self {
            root,
            index_file: index_file.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lexically joins `target` onto the root, appending the index file to
    /// targets ending in `/`.
    ///
    /// Returns `None` if the target climbs above the root.
    pub fn resolve(&self, target: &str) -> Option<PathBuf> {
        let mut target = target.to_string();
        if target.ends_with('/') {
            target.push_str(&self.index_file);
        }

        let mut relative = PathBuf::new();
        for component in Path::new(&target).components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(segment) => relative.push(segment),
                Component::ParentDir => {
                    if !relative.pop() {
                        return None;
                    }
                }
                Component::Prefix(_) => return None,
            }
        }

        Some(self.root.join(relative))
    }

    /// Produces a 200 response bound to the target's file, or a 404.
    pub async fn dispatch(&self, request: Request) -> Response {
        match self.locate(&request.path).await {
            Some((path, file, metadata)) => Response::ok(request, path, file, &metadata),
            None => {
                tracing::debug!(path = %request.path, "No servable file for target");
                Response::not_found(Some(request))
            }
        }
    }

    async fn locate(&self, target: &str) -> Option<(PathBuf, File, std::fs::Metadata)> {
        let path = self.resolve(target)?;

        let path = tokio::fs::canonicalize(&path).await.ok()?;
        if !path.starts_with(&self.root) {
            tracing::warn!(path = target, resolved = %path.display(), "Target escapes document root");
            return None;
        }

        let file = File::open(&path).await.ok()?;
        let metadata = file.metadata().await.ok()?;
        if metadata.is_dir() {
            return None;
        }

        Some((path, file, metadata))
    }
}
