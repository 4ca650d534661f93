//! Fixture builders.

use simpletax_config::{CustomField, ObjectType, ResourceKind};
use uuid::Uuid;

/// Builds [`CustomField`] fixtures.
///
/// Unset properties default to a nil object id on an account, with empty
/// name and value. Every `build()` draws a fresh field id.
#[derive(Debug, Clone, Default)]
pub struct CustomFieldBuilder {
    object_id: Option<Uuid>,
    object_type: Option<ObjectType>,
    field_name: Option<String>,
    field_value: Option<String>,
}

impl CustomFieldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder preset for the account field holding `kind`.
    pub fn account_resource(account_id: Uuid, kind: ResourceKind) -> Self {
        Self::new()
            .with_object_id(account_id)
            .with_object_type(ObjectType::Account)
            .with_field_name(kind.field_name())
    }

    pub fn copy(that: &CustomFieldBuilder) -> Self {
        that.clone()
    }

    pub fn with_object_id(mut self, object_id: Uuid) -> Self {
        self.object_id = Some(object_id);
        self
    }

    pub fn with_object_type(mut self, object_type: ObjectType) -> Self {
        self.object_type = Some(object_type);
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    pub fn with_field_value(mut self, field_value: impl Into<String>) -> Self {
        self.field_value = Some(field_value.into());
        self
    }

    pub fn build(&self) -> CustomField {
        CustomField::new(
            self.object_id.unwrap_or_else(Uuid::nil),
            self.object_type.unwrap_or(ObjectType::Account),
            self.field_name.clone().unwrap_or_default(),
            self.field_value.clone().unwrap_or_default(),
        )
    }
}
