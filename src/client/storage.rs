use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ClientError;
use crate::{domain::cart::CartItem, store::UserProfile};

/// Everything the client keeps between runs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

/// JSON file holding the [`LocalState`].
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file yields an empty guest state.
    pub async fn load(&self) -> Result<LocalState, ClientError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LocalState::default());
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(state) => Ok(state),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "Discarding corrupt local state: {}", err);
                Ok(LocalState::default())
            }
        }
    }

    /// Writes to a sibling temp file first so a crash never leaves half a file.
    pub async fn save(&self, state: &LocalState) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(state)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
