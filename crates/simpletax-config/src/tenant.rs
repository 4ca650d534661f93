//! Tenant resolution from credential headers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Request;

/// Header carrying the tenant API key.
pub const API_KEY_HEADER: &str = "X-Killbill-ApiKey";

/// Header carrying the tenant API secret.
pub const API_SECRET_HEADER: &str = "X-Killbill-ApiSecret";

/// A customer organization isolating all data access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub api_key: String,
}

/// Resolves the tenant of an inbound request.
///
/// Returning `None` makes the servlet answer 404 without touching any
/// controller.
pub trait TenantResolver: Send + Sync {
    fn resolve(&self, req: &Request) -> Option<Tenant>;
}

/// Resolves tenants from a fixed table of API key/secret pairs.
#[derive(Debug, Default, Clone)]
pub struct ApiKeyTenantResolver {
    by_key: HashMap<String, Credentials>,
}

#[derive(Debug, Clone)]
struct Credentials {
    secret: String,
    tenant: Tenant,
}

impl ApiKeyTenantResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant; a later registration of the same key wins.
    pub fn with_tenant(
        mut self,
        id: Uuid,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.insert(id, api_key, api_secret);
        self
    }

    pub fn insert(&mut self, id: Uuid, api_key: impl Into<String>, api_secret: impl Into<String>) {
        let api_key = api_key.into();
        self.by_key.insert(
            api_key.clone(),
            Credentials {
                secret: api_secret.into(),
                tenant: Tenant { id, api_key },
            },
        );
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl TenantResolver for ApiKeyTenantResolver {
    fn resolve(&self, req: &Request) -> Option<Tenant> {
        let key = req.header(API_KEY_HEADER).map(str::trim)?;
        let secret = req.header(API_SECRET_HEADER).map(str::trim)?;
        if key.is_empty() || secret.is_empty() {
            return None;
        }

        let credentials = self.by_key.get(key)?;
        (credentials.secret == secret).then(|| credentials.tenant.clone())
    }
}
