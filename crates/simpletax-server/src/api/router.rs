//! Axum router configuration.

use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};
use simpletax_config::{
    CustomFieldStore, SimpleTaxServlet, TaxCountryController, TenantResolver, VatinController,
    PLUGIN_BASE_PATH,
};
use tower_http::trace::TraceLayer;

use super::{health, plugin};

/// Default cap on request bodies, in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub servlet: Arc<SimpleTaxServlet>,
    pub tenants: Arc<dyn TenantResolver>,
    pub max_body_size: usize,
}

impl AppState {
    /// Wire the servlet and its controllers on top of a custom field store.
    pub fn new(store: Arc<dyn CustomFieldStore>, tenants: Arc<dyn TenantResolver>) -> Self {
        let servlet = SimpleTaxServlet::new(
            Arc::new(VatinController::new(store.clone())),
            Arc::new(TaxCountryController::new(store)),
        );
        Self {
            servlet: Arc::new(servlet),
            tenants,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }
}

/// Create the router: a health check, and the plugin endpoints mounted under
/// their base path.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(PLUGIN_BASE_PATH, any(plugin::dispatch_base))
        .route(&format!("{PLUGIN_BASE_PATH}/"), any(plugin::dispatch_base))
        .route(&format!("{PLUGIN_BASE_PATH}/{{*path}}"), any(plugin::dispatch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
