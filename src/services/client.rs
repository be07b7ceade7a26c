//! Client session: limiter gate, entity cache and typed API operations.

use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::domain::errors::{ClientError, ClientResult, RemoteError};
use crate::domain::models::{
    hydrate, AlwaysOnTask, ClientConfig, Console, Entity, EntityId, NewScheduledTask, Record,
    ScheduledTask, ScheduledTaskUpdate, WebApp, WebAppUpdate,
};
use crate::domain::ports::{HttpMethod, Transport};
use crate::infrastructure::cache::CacheCoordinator;
use crate::infrastructure::http::HttpTransport;
use crate::infrastructure::limiter::RouteRegistry;

#[derive(Deserialize)]
struct ConsoleOutput {
    output: String,
}

/// One authenticated session against the API.
///
/// Owns the entity cache, the route registry and the transport. Every
/// request passes the route gate first (unless the limiter is off or the
/// route is exempt); reads consult the cache before the network and
/// populate it afterwards. Nothing is retried: a denied route surfaces as
/// [`ClientError::Limit`] with the wait attached.
pub struct ApiClient<T: Transport = HttpTransport> {
    username: String,
    transport: Arc<T>,
    cache: CacheCoordinator<Entity>,
    routes: RouteRegistry,
    limiter_enabled: AtomicBool,
    exempt_routes: RwLock<HashSet<String>>,
}

impl ApiClient<HttpTransport> {
    /// Session over HTTP, configured from `config`
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }
}

impl<T: Transport> ApiClient<T> {
    /// Session over an arbitrary transport
    pub fn with_transport(config: &ClientConfig, transport: Arc<T>) -> Self {
        info!(
            username = %config.username,
            cache_enabled = config.cache.enabled,
            limiter_enabled = config.limiter.enabled,
            "client session created"
        );

        Self {
            username: config.username.clone(),
            transport,
            cache: CacheCoordinator::from_config(&config.cache),
            routes: RouteRegistry::new(),
            limiter_enabled: AtomicBool::new(config.limiter.enabled),
            exempt_routes: RwLock::new(config.limiter.exempt_routes.iter().cloned().collect()),
        }
    }

    /// Account this session acts for
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The session's entity cache (switches live here)
    pub const fn cache(&self) -> &CacheCoordinator<Entity> {
        &self.cache
    }

    /// The session's route registry
    pub const fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    /// Turn pre-flight admission checks on or off
    pub fn set_limiter_enabled(&self, enabled: bool) {
        self.limiter_enabled.store(enabled, Ordering::Release);
        debug!(enabled, "limiter switch changed");
    }

    /// Whether admission checks run
    pub fn is_limiter_enabled(&self) -> bool {
        self.limiter_enabled.load(Ordering::Acquire)
    }

    /// Let one route bypass admission checks
    pub async fn exempt_route(&self, path: impl Into<String>) {
        self.exempt_routes.write().await.insert(path.into());
    }

    /// Subject a previously exempted route to admission checks again
    pub async fn unexempt_route(&self, path: &str) {
        self.exempt_routes.write().await.remove(path);
    }

    fn user_path(&self, rest: &str) -> String {
        format!("/api/v0/user/{}/{rest}", self.username)
    }

    /// Gate `path` through the limiter, then send it.
    #[instrument(skip(self, body))]
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<Value> {
        if self.is_limiter_enabled() && !self.exempt_routes.read().await.contains(path) {
            self.routes.admit(path).await?;
        }
        Ok(self.transport.request(method, path, body).await?)
    }

    async fn get_cached<R: Record>(&self, id: EntityId, path: &str) -> ClientResult<R> {
        if let Some(record) = self
            .cache
            .get(R::CATEGORY, &id)
            .await?
            .and_then(R::from_entity)
        {
            return Ok(record);
        }

        let record: R = hydrate(self.request(HttpMethod::Get, path, None).await?)?;
        self.cache.set(R::CATEGORY, record.clone().into(), false).await?;
        Ok(record)
    }

    async fn list_cached<R: Record>(&self, path: &str) -> ClientResult<Vec<R>> {
        let mut records: Vec<R> = self
            .cache
            .all(R::CATEGORY)
            .await?
            .into_iter()
            .filter_map(R::from_entity)
            .collect();

        if records.is_empty() {
            records = hydrate(self.request(HttpMethod::Get, path, None).await?)?;
            self.cache
                .set_many(R::CATEGORY, records.iter().cloned().map(Into::into), true)
                .await?;
        }

        records.sort_by_key(R::cache_id);
        Ok(records)
    }

    async fn remember<R: Record>(&self, record: R) -> ClientResult<R> {
        self.cache.set(R::CATEGORY, record.clone().into(), false).await?;
        Ok(record)
    }

    /// Cache a freshly created record. The category's cached listing no
    /// longer covers every record, so it is unlisted first.
    async fn remember_created<R: Record>(&self, record: R) -> ClientResult<R> {
        self.cache.invalidate_listing(R::CATEGORY).await?;
        self.remember(record).await
    }

    async fn forget<R: Record>(&self, id: EntityId) -> ClientResult<()> {
        self.cache.pop(R::CATEGORY, &id).await?;
        Ok(())
    }

    /// Drop a record whose remote state changed without the new state being known.
    async fn evict<R: Record>(&self, id: EntityId) -> ClientResult<()> {
        self.cache.invalidate_listing(R::CATEGORY).await?;
        self.forget::<R>(id).await
    }

    /// Apply the answer to an update: a full record replaces the cached one,
    /// anything else evicts it.
    async fn refresh<R: Record>(&self, id: EntityId, payload: Value) -> ClientResult<()> {
        match serde_json::from_value::<R>(payload) {
            Ok(record) if record.cache_id() == id => {
                self.remember(record).await?;
                Ok(())
            }
            _ => {
                debug!(category = %R::CATEGORY, %id, "update answer is not a full record");
                self.evict::<R>(id).await
            }
        }
    }

    /// Personal consoles
    #[instrument(skip(self))]
    pub async fn consoles(&self) -> ClientResult<Vec<Console>> {
        self.list_cached(&self.user_path("consoles/")).await
    }

    /// One console by id
    #[instrument(skip(self))]
    pub async fn console(&self, id: u64) -> ClientResult<Console> {
        self.get_cached(id.into(), &self.user_path(&format!("consoles/{id}/")))
            .await
    }

    /// Create a console. It must be started from the web UI before it accepts input.
    ///
    /// The API answers a non-JSON body when the account's console limit is
    /// reached; that is reported as an HTTP 429 API error.
    #[instrument(skip(self))]
    pub async fn create_console(
        &self,
        executable: &str,
        working_directory: Option<&str>,
        arguments: &str,
    ) -> ClientResult<Console> {
        let body = json!({
            "executable": executable,
            "arguments": arguments,
            "working_directory": working_directory,
        });

        let payload = match self
            .request(HttpMethod::Post, &self.user_path("consoles/"), Some(body))
            .await
        {
            Err(ClientError::Remote(RemoteError::Decode(_))) => {
                return Err(RemoteError::Api {
                    status: 429,
                    message: "Console limit reached.".to_string(),
                }
                .into())
            }
            other => other?,
        };

        self.remember_created(hydrate::<Console>(payload)?).await
    }

    /// Delete a console and drop it from the cache
    #[instrument(skip(self))]
    pub async fn delete_console(&self, id: u64) -> ClientResult<()> {
        self.request(
            HttpMethod::Delete,
            &self.user_path(&format!("consoles/{id}/")),
            None,
        )
        .await?;
        self.forget::<Console>(id.into()).await
    }

    /// Type `input` into a running console. Uses the console input route tier.
    #[instrument(skip(self, input))]
    pub async fn send_input(&self, console_id: u64, input: &str) -> ClientResult<()> {
        self.request(
            HttpMethod::Post,
            &self.user_path(&format!("consoles/{console_id}/send_input/")),
            Some(json!({ "input": input })),
        )
        .await?;
        Ok(())
    }

    /// Most recent output of a console
    #[instrument(skip(self))]
    pub async fn latest_output(&self, console_id: u64) -> ClientResult<String> {
        let payload = self
            .request(
                HttpMethod::Get,
                &self.user_path(&format!("consoles/{console_id}/get_latest_output/")),
                None,
            )
            .await?;
        Ok(hydrate::<ConsoleOutput>(payload)?.output)
    }

    /// Delete every personal console concurrently; returns how many were deleted.
    ///
    /// All deletions are attempted; the first failure is returned afterwards.
    #[instrument(skip(self))]
    pub async fn delete_all_consoles(&self) -> ClientResult<usize> {
        let consoles = self.consoles().await?;
        let results = join_all(consoles.iter().map(|console| self.delete_console(console.id))).await;

        let deleted = results.iter().filter(|result| result.is_ok()).count();
        info!(deleted, total = consoles.len(), "consoles deleted");
        results.into_iter().collect::<ClientResult<Vec<()>>>()?;
        Ok(deleted)
    }

    /// Scheduled tasks
    #[instrument(skip(self))]
    pub async fn scheduled_tasks(&self) -> ClientResult<Vec<ScheduledTask>> {
        self.list_cached(&self.user_path("schedule/")).await
    }

    /// One scheduled task by id
    #[instrument(skip(self))]
    pub async fn scheduled_task(&self, id: u64) -> ClientResult<ScheduledTask> {
        self.get_cached(id.into(), &self.user_path(&format!("schedule/{id}/")))
            .await
    }

    /// Create a scheduled task (times are UTC)
    #[instrument(skip(self, task), fields(command = %task.command))]
    pub async fn create_scheduled_task(&self, task: &NewScheduledTask) -> ClientResult<ScheduledTask> {
        let body = serde_json::to_value(task).map_err(ClientError::Hydration)?;
        let payload = self
            .request(HttpMethod::Post, &self.user_path("schedule/"), Some(body))
            .await?;
        self.remember_created(hydrate::<ScheduledTask>(payload)?).await
    }

    /// Change some fields of a scheduled task (times are UTC)
    #[instrument(skip(self, update))]
    pub async fn update_scheduled_task(
        &self,
        id: u64,
        update: &ScheduledTaskUpdate,
    ) -> ClientResult<()> {
        let body = serde_json::to_value(update).map_err(ClientError::Hydration)?;
        let payload = self
            .request(
                HttpMethod::Patch,
                &self.user_path(&format!("schedule/{id}/")),
                Some(body),
            )
            .await?;
        self.refresh::<ScheduledTask>(id.into(), payload).await
    }

    /// Delete a scheduled task and drop it from the cache
    #[instrument(skip(self))]
    pub async fn delete_scheduled_task(&self, id: u64) -> ClientResult<()> {
        self.request(
            HttpMethod::Delete,
            &self.user_path(&format!("schedule/{id}/")),
            None,
        )
        .await?;
        self.forget::<ScheduledTask>(id.into()).await
    }

    /// Always-on tasks
    #[instrument(skip(self))]
    pub async fn always_on_tasks(&self) -> ClientResult<Vec<AlwaysOnTask>> {
        self.list_cached(&self.user_path("always_on/")).await
    }

    /// One always-on task by id
    #[instrument(skip(self))]
    pub async fn always_on_task(&self, id: u64) -> ClientResult<AlwaysOnTask> {
        self.get_cached(id.into(), &self.user_path(&format!("always_on/{id}/")))
            .await
    }

    /// Create an always-on task
    #[instrument(skip(self))]
    pub async fn create_always_on_task(
        &self,
        command: &str,
        description: &str,
        enabled: bool,
    ) -> ClientResult<AlwaysOnTask> {
        let body = json!({
            "command": command,
            "description": description,
            "enabled": enabled,
        });
        let payload = self
            .request(HttpMethod::Post, &self.user_path("always_on/"), Some(body))
            .await?;
        self.remember_created(hydrate::<AlwaysOnTask>(payload)?).await
    }

    /// Restart an always-on task. Its cached state is dropped.
    #[instrument(skip(self))]
    pub async fn restart_always_on_task(&self, id: u64) -> ClientResult<()> {
        self.request(
            HttpMethod::Post,
            &self.user_path(&format!("always_on/{id}/restart/")),
            None,
        )
        .await?;
        self.evict::<AlwaysOnTask>(id.into()).await
    }

    /// Delete an always-on task and drop it from the cache
    #[instrument(skip(self))]
    pub async fn delete_always_on_task(&self, id: u64) -> ClientResult<()> {
        self.request(
            HttpMethod::Delete,
            &self.user_path(&format!("always_on/{id}/")),
            None,
        )
        .await?;
        self.forget::<AlwaysOnTask>(id.into()).await
    }

    /// Webapps
    #[instrument(skip(self))]
    pub async fn webapps(&self) -> ClientResult<Vec<WebApp>> {
        self.list_cached(&self.user_path("webapps/")).await
    }

    /// One webapp by domain name
    #[instrument(skip(self))]
    pub async fn webapp(&self, domain_name: &str) -> ClientResult<WebApp> {
        self.get_cached(
            domain_name.into(),
            &self.user_path(&format!("webapps/{domain_name}/")),
        )
        .await
    }

    /// Create a webapp, then read it back in full.
    ///
    /// The creation answer lacks most of the record's fields, so the webapp
    /// is fetched by domain afterwards.
    #[instrument(skip(self))]
    pub async fn create_webapp(&self, domain_name: &str, python_version: &str) -> ClientResult<WebApp> {
        let body = json!({
            "domain_name": domain_name,
            "python_version": python_version,
        });
        self.request(HttpMethod::Post, &self.user_path("webapps/"), Some(body))
            .await?;

        self.evict::<WebApp>(domain_name.into()).await?;
        self.webapp(domain_name).await
    }

    /// Change a webapp's configuration. Takes effect after [`reload_webapp`](Self::reload_webapp).
    #[instrument(skip(self, update))]
    pub async fn update_webapp(&self, domain_name: &str, update: &WebAppUpdate) -> ClientResult<()> {
        let body = serde_json::to_value(update).map_err(ClientError::Hydration)?;
        let payload = self
            .request(
                HttpMethod::Patch,
                &self.user_path(&format!("webapps/{domain_name}/")),
                Some(body),
            )
            .await?;
        self.refresh::<WebApp>(domain_name.into(), payload).await
    }

    /// Delete a webapp and drop it from the cache
    #[instrument(skip(self))]
    pub async fn delete_webapp(&self, domain_name: &str) -> ClientResult<()> {
        self.request(
            HttpMethod::Delete,
            &self.user_path(&format!("webapps/{domain_name}/")),
            None,
        )
        .await?;
        self.forget::<WebApp>(domain_name.into()).await
    }

    /// Reload a webapp so configuration changes take effect
    pub async fn reload_webapp(&self, domain_name: &str) -> ClientResult<()> {
        self.webapp_action(domain_name, "reload").await
    }

    /// Start serving a disabled webapp
    pub async fn enable_webapp(&self, domain_name: &str) -> ClientResult<()> {
        self.webapp_action(domain_name, "enable").await
    }

    /// Stop serving a webapp
    pub async fn disable_webapp(&self, domain_name: &str) -> ClientResult<()> {
        self.webapp_action(domain_name, "disable").await
    }

    #[instrument(skip(self))]
    async fn webapp_action(&self, domain_name: &str, action: &str) -> ClientResult<()> {
        self.request(
            HttpMethod::Post,
            &self.user_path(&format!("webapps/{domain_name}/{action}/")),
            None,
        )
        .await?;
        Ok(())
    }

    /// Consoles other users shared with this account.
    ///
    /// Never cached: their owners change them outside this session.
    #[instrument(skip(self))]
    pub async fn shared_consoles(&self) -> ClientResult<Vec<Console>> {
        let payload = self
            .request(
                HttpMethod::Get,
                &self.user_path("consoles/shared_with_you/"),
                None,
            )
            .await?;
        hydrate(payload)
    }
}
