//! Controllers reading and writing account resources.
//!
//! Both resources are stored as account custom fields; they only differ in
//! field name and value type, so a single generic controller serves both.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::country::TaxCountry;
use crate::custom_field::{CustomField, CustomFieldStore, ObjectType, StoreError};
use crate::resource::{ResourceKind, TaxCountryRsc, VatinRsc};
use crate::tenant::Tenant;
use crate::vatin::Vatin;

/// Operations the servlet needs on one kind of account resource.
pub trait AccountResourceController: Send + Sync {
    type Resource: Serialize + DeserializeOwned + Send;

    /// The value set on an account, if any.
    fn get(&self, account_id: Uuid, tenant: &Tenant) -> Result<Option<Self::Resource>, StoreError>;

    /// All values of the tenant, or only the one of `account_id`.
    fn list(
        &self,
        account_id: Option<Uuid>,
        tenant: &Tenant,
    ) -> Result<Vec<Self::Resource>, StoreError>;

    /// Replace the value of an account. Returns whether it was saved.
    fn save(&self, account_id: Uuid, resource: &Self::Resource, tenant: &Tenant) -> bool;
}

/// A resource stored as a single account custom field.
pub trait FieldResource: Serialize + DeserializeOwned + Send + Sync {
    const KIND: ResourceKind;

    /// Build the resource from a stored field value.
    fn from_field(account_id: Uuid, value: &str) -> Result<Self, String>;

    /// The value to store.
    fn field_value(&self) -> String;
}

impl FieldResource for TaxCountryRsc {
    const KIND: ResourceKind = ResourceKind::TaxCountry;

    fn from_field(account_id: Uuid, value: &str) -> Result<Self, String> {
        let country = value.parse::<TaxCountry>().map_err(|e| e.to_string())?;
        Ok(Self::new(account_id, country))
    }

    fn field_value(&self) -> String {
        self.tax_country.to_string()
    }
}

impl FieldResource for VatinRsc {
    const KIND: ResourceKind = ResourceKind::Vatin;

    fn from_field(account_id: Uuid, value: &str) -> Result<Self, String> {
        let vatin = value.parse::<Vatin>().map_err(|e| e.to_string())?;
        Ok(Self::new(account_id, vatin))
    }

    fn field_value(&self) -> String {
        self.vatin.to_string()
    }
}

/// Controller for a resource kept in an account custom field.
pub struct AccountFieldController<R> {
    store: Arc<dyn CustomFieldStore>,
    _resource: PhantomData<fn() -> R>,
}

/// Reads and writes the tax country of accounts.
pub type TaxCountryController = AccountFieldController<TaxCountryRsc>;

/// Reads and writes the VAT identification number of accounts.
pub type VatinController = AccountFieldController<VatinRsc>;

impl<R> AccountFieldController<R> {
    pub fn new(store: Arc<dyn CustomFieldStore>) -> Self {
        Self {
            store,
            _resource: PhantomData,
        }
    }
}

impl<R> fmt::Debug for AccountFieldController<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountFieldController")
            .field("resource", &std::any::type_name::<R>())
            .finish_non_exhaustive()
    }
}

impl<R: FieldResource> AccountFieldController<R> {
    fn account_fields(&self, account_id: Uuid, tenant: &Tenant) -> Result<Vec<CustomField>, StoreError> {
        let fields = self
            .store
            .fields_for_object(account_id, ObjectType::Account, tenant)?;
        Ok(fields
            .into_iter()
            .filter(|f| f.field_name == R::KIND.field_name())
            .collect())
    }

    /// Convert a stored field, skipping values that no longer validate.
    fn convert(field: &CustomField) -> Option<R> {
        match R::from_field(field.object_id, &field.field_value) {
            Ok(resource) => Some(resource),
            Err(reason) => {
                tracing::warn!(
                    account_id = %field.object_id,
                    field = %field.field_name,
                    reason = %reason,
                    "ignoring invalid stored value"
                );
                None
            }
        }
    }
}

impl<R: FieldResource> AccountResourceController for AccountFieldController<R> {
    type Resource = R;

    fn get(&self, account_id: Uuid, tenant: &Tenant) -> Result<Option<R>, StoreError> {
        Ok(self
            .account_fields(account_id, tenant)?
            .iter()
            .find_map(Self::convert))
    }

    fn list(&self, account_id: Option<Uuid>, tenant: &Tenant) -> Result<Vec<R>, StoreError> {
        if let Some(account_id) = account_id {
            return Ok(self.get(account_id, tenant)?.into_iter().collect());
        }

        let mut fields =
            self.store
                .fields_by_name(ObjectType::Account, R::KIND.field_name(), tenant)?;
        fields.sort_by_key(|f| f.object_id);
        Ok(fields.iter().filter_map(Self::convert).collect())
    }

    fn save(&self, account_id: Uuid, resource: &R, tenant: &Tenant) -> bool {
        let field = CustomField::new(
            account_id,
            ObjectType::Account,
            R::KIND.field_name(),
            resource.field_value(),
        );
        let result = self.store.replace_fields(
            account_id,
            ObjectType::Account,
            R::KIND.field_name(),
            vec![field],
            tenant,
        );

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    account_id = %account_id,
                    resource = R::KIND.name(),
                    error = %e,
                    "failed to save account resource"
                );
                false
            }
        }
    }
}
