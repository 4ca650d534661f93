//! TestServer: full-stack integration test harness.

use std::sync::Arc;

use simpletax_config::{
    ApiKeyTenantResolver, CustomField, CustomFieldStore, InMemoryCustomFieldStore, StoreError,
    Tenant, API_KEY_HEADER, API_SECRET_HEADER, PLUGIN_BASE_PATH,
};
use simpletax_server::{create_router, serve, AppState};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// API key of the tenant registered by [`TestServer::start`].
pub const TEST_API_KEY: &str = "bob";

/// API secret of the tenant registered by [`TestServer::start`].
pub const TEST_API_SECRET: &str = "lazar";

/// Errors from TestServer operations.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fixture error: {0}")]
    Store(#[from] StoreError),
}

/// Full-stack test harness.
///
/// Boots the server in-process on a random port with an in-memory store
/// and one tenant, and provides HTTP request helpers. Paths given to the
/// helpers are relative to the plugin base path.
pub struct TestServer {
    port: u16,
    client: reqwest::Client,
    store: Arc<InMemoryCustomFieldStore>,
    tenant: Tenant,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Start a server on `127.0.0.1` with a single tenant.
    pub async fn start() -> Result<Self, TestError> {
        let tenant = Tenant {
            id: Uuid::new_v4(),
            api_key: TEST_API_KEY.to_string(),
        };
        let tenants =
            ApiKeyTenantResolver::new().with_tenant(tenant.id, TEST_API_KEY, TEST_API_SECRET);
        let store = Arc::new(InMemoryCustomFieldStore::new());
        let app = create_router(AppState::new(store.clone(), Arc::new(tenants)));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, app, async move {
            let _ = rx.await;
        }));

        Ok(Self {
            port,
            client: reqwest::Client::new(),
            store,
            tenant,
            shutdown: Some(tx),
            handle,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the base URL of the plugin endpoints.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, PLUGIN_BASE_PATH)
    }

    /// The tenant requests are authenticated as.
    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    /// Seed custom fields for the test tenant.
    pub fn seed(&self, fields: Vec<CustomField>) -> Result<(), TestError> {
        Ok(self.store.add_fields(fields, &self.tenant)?)
    }

    pub fn store(&self) -> &InMemoryCustomFieldStore {
        &self.store
    }

    /// Make an authenticated GET request.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, TestError> {
        Ok(self.authed(reqwest::Method::GET, path).send().await?)
    }

    /// Make an authenticated PUT request with a JSON body.
    pub async fn put(&self, path: &str, body: &str) -> Result<reqwest::Response, TestError> {
        Ok(self
            .authed(reqwest::Method::PUT, path)
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await?)
    }

    /// Make a request without tenant credentials.
    pub async fn anonymous(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::Response, TestError> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.request(method, &url).send().await?)
    }

    fn authed(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url(), path);
        self.client
            .request(method, &url)
            .header(API_KEY_HEADER, TEST_API_KEY)
            .header(API_SECRET_HEADER, TEST_API_SECRET)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}
