//! Custom fields attached to billing objects.
//!
//! The storage itself belongs to the billing host; [`CustomFieldStore`] is
//! the seam, and [`InMemoryCustomFieldStore`] backs the standalone server
//! and tests.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::tenant::Tenant;

/// Kind of billing object a custom field is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Account,
    Bundle,
    Invoice,
    InvoiceItem,
    Payment,
    Subscription,
}

/// A named value attached to a billing object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub custom_field_id: Uuid,
    pub object_id: Uuid,
    pub object_type: ObjectType,
    pub field_name: String,
    pub field_value: String,
}

impl CustomField {
    /// A new field with a random id.
    pub fn new(
        object_id: Uuid,
        object_type: ObjectType,
        field_name: impl Into<String>,
        field_value: impl Into<String>,
    ) -> Self {
        Self {
            custom_field_id: Uuid::new_v4(),
            object_id,
            object_type,
            field_name: field_name.into(),
            field_value: field_value.into(),
        }
    }
}

/// Custom field storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("custom field {0} does not exist")]
    UnknownField(Uuid),

    #[error("custom field storage failure: {0}")]
    Backend(String),
}

/// Tenant-scoped custom field storage.
pub trait CustomFieldStore: Send + Sync {
    /// All fields attached to one object.
    fn fields_for_object(
        &self,
        object_id: Uuid,
        object_type: ObjectType,
        tenant: &Tenant,
    ) -> Result<Vec<CustomField>, StoreError>;

    /// All fields with this name on objects of this type.
    fn fields_by_name(
        &self,
        object_type: ObjectType,
        field_name: &str,
        tenant: &Tenant,
    ) -> Result<Vec<CustomField>, StoreError>;

    fn add_fields(&self, fields: Vec<CustomField>, tenant: &Tenant) -> Result<(), StoreError>;

    /// Remove fields by id. Fails without removing anything if one is unknown.
    fn remove_fields(&self, fields: &[CustomField], tenant: &Tenant) -> Result<(), StoreError>;

    /// Atomically drop every field named `field_name` on the object and add
    /// `fields` in their place.
    fn replace_fields(
        &self,
        object_id: Uuid,
        object_type: ObjectType,
        field_name: &str,
        fields: Vec<CustomField>,
        tenant: &Tenant,
    ) -> Result<(), StoreError>;
}

/// Custom field store kept in memory, one field list per tenant.
#[derive(Debug, Default)]
pub struct InMemoryCustomFieldStore {
    fields: RwLock<HashMap<Uuid, Vec<CustomField>>>,
}

impl InMemoryCustomFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields stored for a tenant.
    pub fn len(&self, tenant: &Tenant) -> usize {
        self.fields.read().get(&tenant.id).map_or(0, Vec::len)
    }

    fn select(
        &self,
        tenant: &Tenant,
        pred: impl Fn(&CustomField) -> bool,
    ) -> Vec<CustomField> {
        self.fields
            .read()
            .get(&tenant.id)
            .map(|fields| fields.iter().filter(|f| pred(f)).cloned().collect())
            .unwrap_or_default()
    }
}

impl CustomFieldStore for InMemoryCustomFieldStore {
    fn fields_for_object(
        &self,
        object_id: Uuid,
        object_type: ObjectType,
        tenant: &Tenant,
    ) -> Result<Vec<CustomField>, StoreError> {
        Ok(self.select(tenant, |f| {
            f.object_id == object_id && f.object_type == object_type
        }))
    }

    fn fields_by_name(
        &self,
        object_type: ObjectType,
        field_name: &str,
        tenant: &Tenant,
    ) -> Result<Vec<CustomField>, StoreError> {
        Ok(self.select(tenant, |f| {
            f.object_type == object_type && f.field_name == field_name
        }))
    }

    fn add_fields(&self, fields: Vec<CustomField>, tenant: &Tenant) -> Result<(), StoreError> {
        self.fields
            .write()
            .entry(tenant.id)
            .or_default()
            .extend(fields);
        Ok(())
    }

    fn remove_fields(&self, fields: &[CustomField], tenant: &Tenant) -> Result<(), StoreError> {
        let mut guard = self.fields.write();
        let stored = guard.entry(tenant.id).or_default();

        if let Some(missing) = fields.iter().find(|f| {
            !stored
                .iter()
                .any(|s| s.custom_field_id == f.custom_field_id)
        }) {
            return Err(StoreError::UnknownField(missing.custom_field_id));
        }

        stored.retain(|s| {
            !fields
                .iter()
                .any(|f| f.custom_field_id == s.custom_field_id)
        });
        Ok(())
    }

    fn replace_fields(
        &self,
        object_id: Uuid,
        object_type: ObjectType,
        field_name: &str,
        fields: Vec<CustomField>,
        tenant: &Tenant,
    ) -> Result<(), StoreError> {
        let mut guard = self.fields.write();
        let stored = guard.entry(tenant.id).or_default();
        stored.retain(|s| {
            !(s.object_id == object_id && s.object_type == object_type && s.field_name == field_name)
        });
        stored.extend(fields);
        Ok(())
    }
}
