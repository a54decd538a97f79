//! UserManager implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::join_all;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::commit::CacheCommit;
use super::session::Session;
use crate::api::{ApiClient, ApiRequest, CreateUserRequest, GetUserRequest, ListUsersRequest, UpdateUserRequest};
use crate::config::Config;
use crate::dispatch::NetworkTask;
use crate::domain::{Credentials, User, UserCreationParams, UserPage, UserUpdateParams};
use crate::error::ManagerError;
use crate::store::UserStore;
use crate::transport::{HttpTransport, Transport};
use crate::validation::Validator;

/// Rate-limited, cache-fronted access to the user API
///
/// Each `UserManager` is an independent instance: it owns its current
/// session and nothing is shared through process-wide state. Must be created
/// and used from within a Tokio runtime.
pub struct UserManager {
    config: Config,
    validator: Validator,
    transport: Arc<dyn Transport>,
    session: RwLock<Arc<Session>>,
    generation: AtomicU64,
}

impl UserManager {
    /// Create a manager with an uninitialized session
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        debug!(?config, "UserManager::new: called");
        Self {
            validator: Validator::new(config.validation.clone()),
            config: config.clone(),
            transport,
            session: RwLock::new(Arc::new(Session::uninitialized())),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a manager talking HTTP through reqwest
    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        let transport = HttpTransport::new(config.api.timeout())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The current session
    pub fn session(&self) -> Arc<Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The current session's user cache
    pub fn store(&self) -> Arc<UserStore> {
        self.session().store().clone()
    }

    /// Point the manager at an application
    ///
    /// A different application id replaces the whole session: new cache, new
    /// admission queue, new dispatch window. A different token alone keeps
    /// the cache and limiters and only swaps the credentials. Requests already
    /// in flight finish against the session they started in.
    pub fn init_application(&self, application_id: &str, api_token: &str) {
        debug!(%application_id, "UserManager::init_application: called");
        let credentials = Credentials::new(application_id, api_token);
        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);

        let next = match current.credentials() {
            Some(existing) if *existing == credentials => {
                debug!("UserManager::init_application: unchanged, keeping session");
                return;
            }
            Some(existing) if existing.application_id == credentials.application_id => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                info!(%application_id, generation, "API token changed, keeping cache and limiters");
                let client =
                    ApiClient::new(self.config.api.base_url.clone(), credentials.clone(), self.transport.clone());
                match current.with_client(generation, client) {
                    Some(session) => session,
                    None => Session::new(generation, &self.config, credentials, self.transport.clone()),
                }
            }
            _ => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                info!(%application_id, generation, "Application changed, starting new session");
                Session::new(generation, &self.config, credentials, self.transport.clone())
            }
        };

        *current = Arc::new(next);
    }

    /// Create a single user
    pub async fn create_user(&self, params: UserCreationParams) -> Result<User, ManagerError> {
        debug!(user_id = %params.user_id, "UserManager::create_user: called");
        let session = self.session();
        let user_id = params.user_id.clone();

        let result = self.create_in(&session, params).await;
        match &result {
            Ok(_) => debug!(%user_id, "UserManager::create_user: created and cached"),
            Err(e) if e.is_rate_limit() => warn!(%user_id, "create_user rejected by admission queue"),
            Err(e) => error!(%user_id, error = %e, "create_user failed"),
        }
        result
    }

    async fn create_in(&self, session: &Arc<Session>, params: UserCreationParams) -> Result<User, ManagerError> {
        self.validator.creation(&params)?;
        if session.store().contains(&params.user_id) {
            debug!(user_id = %params.user_id, "UserManager::create_in: already cached");
            return Err(ManagerError::UniqueKeyViolated(params.user_id));
        }
        self.submit(session, CreateUserRequest { params }).await
    }

    /// Create up to `max-batch-size` users concurrently
    ///
    /// Succeeds only if every user is created. Otherwise the error carries the
    /// per-user failures; users that were created are still cached.
    pub async fn create_users(&self, params: Vec<UserCreationParams>) -> Result<Vec<User>, ManagerError> {
        debug!(count = params.len(), "UserManager::create_users: called");
        self.validator.batch(params.len())?;

        let session = self.session();
        session.client()?;

        let ids: Vec<String> = params.iter().map(|p| p.user_id.clone()).collect();
        let results = join_all(params.into_iter().map(|p| self.create_in(&session, p))).await;

        let mut users = Vec::with_capacity(results.len());
        let mut errors = HashMap::new();
        for (user_id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(user) => users.push(user),
                Err(e) => {
                    errors.insert(user_id, e);
                }
            }
        }

        if errors.is_empty() {
            debug!(count = users.len(), "UserManager::create_users: all created and cached");
            Ok(users)
        } else {
            error!(failed = errors.len(), created = users.len(), "create_users partially failed");
            Err(ManagerError::PartialBatchFailure(errors))
        }
    }

    /// Update a user's nickname and/or profile URL
    pub async fn update_user(&self, params: UserUpdateParams) -> Result<User, ManagerError> {
        debug!(user_id = %params.user_id, "UserManager::update_user: called");
        self.validator.update(&params)?;
        let session = self.session();
        let user_id = params.user_id.clone();

        let result = self.submit(&session, UpdateUserRequest { params }).await;
        if let Err(e) = &result {
            error!(%user_id, error = %e, "update_user failed");
        }
        result
    }

    /// Get a user, from the cache when possible
    pub async fn get_user(&self, user_id: &str) -> Result<User, ManagerError> {
        debug!(%user_id, "UserManager::get_user: called");
        self.validator.user_id(user_id)?;
        let session = self.session();

        if let Some(user) = session.store().get(user_id) {
            debug!(%user_id, "UserManager::get_user: cache hit");
            return Ok(user);
        }

        let result = self
            .submit(
                &session,
                GetUserRequest {
                    user_id: user_id.to_string(),
                },
            )
            .await;
        if let Err(e) = &result {
            warn!(%user_id, error = %e, "get_user failed");
        }
        result
    }

    /// First page of users whose nickname matches
    pub async fn get_users(&self, nickname: &str) -> Result<Vec<User>, ManagerError> {
        self.get_users_page(nickname, None).await.map(|page| page.users)
    }

    /// One page of users whose nickname matches; every returned user is cached
    pub async fn get_users_page(&self, nickname: &str, token: Option<&str>) -> Result<UserPage, ManagerError> {
        debug!(%nickname, ?token, "UserManager::get_users_page: called");
        self.validator.nickname(Some(nickname), true)?;
        let session = self.session();

        let request = ListUsersRequest {
            nickname: nickname.to_string(),
            limit: self.config.page_size,
            token: token.map(str::to_string),
        };
        let result = self.submit(&session, request).await;
        match &result {
            Ok(page) => debug!(count = page.users.len(), "UserManager::get_users_page: fetched and cached"),
            Err(e) => warn!(%nickname, error = %e, "get_users failed"),
        }
        result
    }

    /// Admit a request into the session's bucket and wait for its result
    ///
    /// The request is built before admission so malformed requests never take
    /// capacity. When released, the job hands a network task to the dispatch
    /// window; on success the task writes back to the session cache before
    /// the result is delivered.
    async fn submit<R>(&self, session: &Arc<Session>, request: R) -> Result<R::Response, ManagerError>
    where
        R: ApiRequest,
        R::Response: CacheCommit,
    {
        let client = session.client()?.clone();
        let description = client.build(&request)?;
        let method = description.method.to_string();
        let target = request.endpoint();

        let (reply_tx, reply_rx) = oneshot::channel();
        let store = session.store().clone();
        let window = session.dispatch_handle()?;

        let job = async move {
            window.submit(NetworkTask::new(method, target, async move {
                let result = client.execute::<R::Response>(description).await;
                if let Ok(response) = &result {
                    response.commit(&store);
                }
                // The caller may have gone away; the cache write above still stands
                let _ = reply_tx.send(result);
            }));
        };

        if !session.admission()?.try_enqueue(job) {
            debug!(endpoint = %request.endpoint(), "UserManager::submit: admission queue full");
            return Err(ManagerError::CapacityExceeded);
        }

        reply_rx.await.map_err(|_| ManagerError::SessionClosed)?
    }
}

impl std::fmt::Debug for UserManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserManager")
            .field("session", &self.session())
            .finish_non_exhaustive()
    }
}
