//! Resources exchanged over HTTP, and the kinds of account resources.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::country::TaxCountry;
use crate::vatin::Vatin;

/// The tax country assigned to an account.
///
/// In request bodies `accountId` is optional and ignored: the account
/// is the one named in the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaxCountryRsc {
    #[serde(default)]
    pub account_id: Option<Uuid>,
    pub tax_country: TaxCountry,
}

impl TaxCountryRsc {
    pub fn new(account_id: Uuid, tax_country: TaxCountry) -> Self {
        Self {
            account_id: Some(account_id),
            tax_country,
        }
    }
}

/// The VAT identification number assigned to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VatinRsc {
    #[serde(default)]
    pub account_id: Option<Uuid>,
    pub vatin: Vatin,
}

impl VatinRsc {
    pub fn new(account_id: Uuid, vatin: Vatin) -> Self {
        Self {
            account_id: Some(account_id),
            vatin,
        }
    }
}

/// The per-account resources served under `/accounts/{id}/{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    TaxCountry,
    Vatin,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::TaxCountry, ResourceKind::Vatin];

    /// Resource name as it appears in account paths.
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::TaxCountry => "taxCountry",
            ResourceKind::Vatin => "vatin",
        }
    }

    /// Path of the collection listing this resource for all accounts.
    pub fn collection_path(self) -> &'static str {
        match self {
            ResourceKind::TaxCountry => "/taxCountries",
            ResourceKind::Vatin => "/vatins",
        }
    }

    /// Name of the account custom field holding the value.
    pub fn field_name(self) -> &'static str {
        match self {
            ResourceKind::TaxCountry => "taxCountry",
            ResourceKind::Vatin => "VATIdNum",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn from_collection_path(path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.collection_path() == path)
    }

    pub(crate) fn invalid_body_message(self) -> &'static str {
        match self {
            ResourceKind::TaxCountry => "Invalid tax country resource in request body",
            ResourceKind::Vatin => "Invalid VAT Identification Number resource in request body",
        }
    }

    pub(crate) fn save_failed_message(self) -> &'static str {
        match self {
            ResourceKind::TaxCountry => "Could not save tax country",
            ResourceKind::Vatin => "Could not save VAT Identification Number",
        }
    }
}
