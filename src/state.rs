use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::commerce::CommerceClient;
use crate::config::AppConfig;
use crate::marketing::MarketingClient;
use crate::persistence::FileCartStore;
use crate::services::cart_sync::CartSynchronizer;

pub type SessionSynchronizer = CartSynchronizer<CommerceClient, FileCartStore>;
pub type SharedSession = Arc<Mutex<SessionSynchronizer>>;

/// One synchronizer per cart session, each behind its own mutex. Holding
/// the mutex across the full gateway round-trip serializes rapid mutations
/// on the same cart, so rollback snapshots never interleave.
#[derive(Default)]
pub struct CartSessions {
    inner: Mutex<HashMap<String, SharedSession>>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub commerce: Arc<CommerceClient>,
    pub marketing: Arc<MarketingClient>,
    pub store: Arc<FileCartStore>,
    pub sessions: Arc<CartSessions>,
    /// Root cancellation token; cancelled on shutdown so in-flight backend
    /// calls abort instead of outliving the server.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let commerce = Arc::new(CommerceClient::new(&config)?);
        let marketing = Arc::new(MarketingClient::new(&config.marketing)?);
        let store = Arc::new(FileCartStore::new(config.cart_data_dir.clone()));
        Ok(Self {
            config: Arc::new(config),
            commerce,
            marketing,
            store,
            sessions: Arc::new(CartSessions::default()),
            shutdown: CancellationToken::new(),
        })
    }

    pub async fn cart_session(&self, session: &str) -> SharedSession {
        let mut sessions = self.sessions.inner.lock().await;
        sessions
            .entry(session.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(CartSynchronizer::new(
                    session,
                    self.commerce.clone(),
                    self.store.clone(),
                    self.config.shipping.clone(),
                )))
            })
            .clone()
    }
}
