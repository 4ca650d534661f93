//! Configuration endpoints of the simple tax plugin.
//!
//! Exposes a small REST surface to set and read the two account properties
//! the tax calculation depends on: the VAT identification number and the
//! tax country. The host runtime owns transport, tenant credentials and
//! custom field storage; this crate only sees the narrow [`Request`] and
//! [`Response`] types and the [`CustomFieldStore`] and [`TenantResolver`]
//! seams.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use simpletax_config::prelude::*;
//!
//! let store = Arc::new(InMemoryCustomFieldStore::new());
//! let servlet = SimpleTaxServlet::new(
//!     Arc::new(VatinController::new(store.clone())),
//!     Arc::new(TaxCountryController::new(store)),
//! );
//!
//! let resp = servlet.handle(&Request::new("GET", "/whatever"), None);
//! assert_eq!(resp.status, 404);
//! ```

pub mod codec;
pub mod controller;
pub mod country;
pub mod custom_field;
pub mod error;
pub mod loose_uuid;
pub mod resource;
pub mod servlet;
pub mod tenant;
pub mod types;
pub mod vatin;

pub use codec::{Codec, CodecError, JsonCodec};
pub use controller::{
    AccountFieldController, AccountResourceController, FieldResource, TaxCountryController,
    VatinController,
};
pub use country::TaxCountry;
pub use custom_field::{CustomField, CustomFieldStore, InMemoryCustomFieldStore, ObjectType, StoreError};
pub use error::ServletError;
pub use resource::{ResourceKind, TaxCountryRsc, VatinRsc};
pub use servlet::{account_resource_uri, SimpleTaxServlet, PLUGIN_BASE_PATH, PLUGIN_NAME};
pub use tenant::{ApiKeyTenantResolver, Tenant, TenantResolver, API_KEY_HEADER, API_SECRET_HEADER};
pub use types::{Request, Response};
pub use vatin::Vatin;

pub mod prelude {
    pub use crate::controller::{AccountResourceController, TaxCountryController, VatinController};
    pub use crate::custom_field::{CustomFieldStore, InMemoryCustomFieldStore};
    pub use crate::servlet::SimpleTaxServlet;
    pub use crate::tenant::{ApiKeyTenantResolver, Tenant, TenantResolver};
    pub use crate::types::{Request, Response};
}
