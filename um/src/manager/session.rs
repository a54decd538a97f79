//! Per-application session state

use std::sync::Arc;

use tracing::debug;

use crate::admission::LeakyBucket;
use crate::api::ApiClient;
use crate::config::Config;
use crate::dispatch::DispatchWindow;
use crate::domain::Credentials;
use crate::error::ManagerError;
use crate::store::UserStore;
use crate::transport::Transport;

/// Client and limiters that exist once credentials are known
#[derive(Debug)]
struct Connection {
    client: ApiClient,
    admission: Arc<LeakyBucket>,
    dispatch: Arc<DispatchWindow>,
}

/// Everything owned by one application session: the user cache, the
/// admission queue, the dispatch window, and the client bound to the
/// session's credentials
///
/// Requests started under a session keep a handle to its cache, so replacing
/// the session never redirects their results into the new session's cache.
/// Before credentials are set the session holds only an empty cache and spawns
/// no background work.
#[derive(Debug)]
pub struct Session {
    generation: u64,
    store: Arc<UserStore>,
    connection: Option<Connection>,
}

impl Session {
    /// Placeholder session used until an application is initialized
    pub fn uninitialized() -> Self {
        Self {
            generation: 0,
            store: Arc::new(UserStore::new()),
            connection: None,
        }
    }

    /// Fresh session with its own cache and limiters
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        generation: u64,
        config: &Config,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        debug!(generation, ?credentials, "Session::new: called");
        Self {
            generation,
            store: Arc::new(UserStore::new()),
            connection: Some(Connection {
                client: ApiClient::new(config.api.base_url.clone(), credentials, transport),
                admission: Arc::new(LeakyBucket::from_config(&config.admission)),
                dispatch: Arc::new(DispatchWindow::from_config(&config.dispatch)),
            }),
        }
    }

    /// Same cache and limiters, different client
    ///
    /// Returns `None` for an uninitialized session, which has no limiters to share.
    pub fn with_client(&self, generation: u64, client: ApiClient) -> Option<Self> {
        debug!(generation, "Session::with_client: called");
        let connection = self.connection.as_ref()?;
        Some(Self {
            generation,
            store: self.store.clone(),
            connection: Some(Connection {
                client,
                admission: connection.admission.clone(),
                dispatch: connection.dispatch.clone(),
            }),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_initialized(&self) -> bool {
        self.connection.is_some()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.connection.as_ref().map(|c| c.client.credentials())
    }

    fn connection(&self) -> Result<&Connection, ManagerError> {
        self.connection.as_ref().ok_or(ManagerError::ApplicationNotInitialized)
    }

    pub fn client(&self) -> Result<&ApiClient, ManagerError> {
        self.connection().map(|c| &c.client)
    }

    pub fn store(&self) -> &Arc<UserStore> {
        &self.store
    }

    pub fn admission(&self) -> Result<&LeakyBucket, ManagerError> {
        self.connection().map(|c| c.admission.as_ref())
    }

    pub fn dispatch(&self) -> Result<&DispatchWindow, ManagerError> {
        self.connection().map(|c| c.dispatch.as_ref())
    }

    pub(super) fn dispatch_handle(&self) -> Result<Arc<DispatchWindow>, ManagerError> {
        self.connection().map(|c| c.dispatch.clone())
    }
}
