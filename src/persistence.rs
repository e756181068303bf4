//! Durable per-session cart storage: the server cart id plus a local
//! fallback item list, so a cart survives reloads before any server cart
//! exists or while the backend is unreachable.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::models::CartItem;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedCart {
    pub server_cart_id: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

pub trait CartStore: Send + Sync {
    fn load(
        &self,
        session: &str,
    ) -> impl Future<Output = anyhow::Result<Option<PersistedCart>>> + Send;

    fn save(
        &self,
        session: &str,
        cart: &PersistedCart,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn clear(&self, session: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// One JSON document per session under a data directory. Writes go through
/// a temp file and rename so a crash never leaves a half-written cart.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    root: PathBuf,
}

impl FileCartStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Session keys arrive from a client header; anything outside a safe
    /// charset is stripped before touching the filesystem.
    fn path_for(&self, session: &str) -> PathBuf {
        let safe: String = session
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(96)
            .collect();
        self.root.join(format!("{safe}.json"))
    }
}

impl CartStore for FileCartStore {
    async fn load(&self, session: &str) -> anyhow::Result<Option<PersistedCart>> {
        let path = self.path_for(session);
        match fs::read(&path).await {
            // a corrupt document counts as no cart, not as a failure
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).ok()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
        }
    }

    async fn save(&self, session: &str, cart: &PersistedCart) -> anyhow::Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating {}", self.root.display()))?;
        let path = self.path_for(session);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(cart)?;
        fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("renaming into {}", path.display()))?;
        Ok(())
    }

    async fn clear(&self, session: &str) -> anyhow::Result<()> {
        let path = self.path_for(session);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
        }
    }
}

/// In-memory store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    inner: Mutex<HashMap<String, PersistedCart>>,
}

impl CartStore for MemoryCartStore {
    async fn load(&self, session: &str) -> anyhow::Result<Option<PersistedCart>> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(session)
            .cloned())
    }

    async fn save(&self, session: &str, cart: &PersistedCart) -> anyhow::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(session.to_string(), cart.clone());
        Ok(())
    }

    async fn clear(&self, session: &str) -> anyhow::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(session);
        Ok(())
    }
}
