//! Tenant credentials file.
//!
//! ```toml
//! [[tenants]]
//! id = "6f1c7a4e-3c1d-4b8e-9a51-0d2f4b8a9c10"
//! api_key = "bob"
//! api_secret = "lazar"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use simpletax_config::ApiKeyTenantResolver;
use thiserror::Error;
use uuid::Uuid;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tenants file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("tenant #{index}: {field} must not be blank")]
    BlankField { index: usize, field: &'static str },

    #[error("api key '{0}' is declared more than once")]
    DuplicateApiKey(String),
}

/// Contents of the tenants file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantsFile {
    #[serde(default)]
    pub tenants: Vec<TenantEntry>,
}

/// Credentials of one tenant.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantEntry {
    pub id: Uuid,
    pub api_key: String,
    pub api_secret: String,
}

impl TenantsFile {
    /// Read, parse and validate a tenants file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate tenants from TOML.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: Self = toml::from_str(content)?;
        file.validate()?;
        Ok(file)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut keys = HashSet::new();
        for (index, entry) in self.tenants.iter().enumerate() {
            if entry.api_key.trim().is_empty() {
                return Err(ConfigError::BlankField {
                    index,
                    field: "api_key",
                });
            }
            if entry.api_secret.trim().is_empty() {
                return Err(ConfigError::BlankField {
                    index,
                    field: "api_secret",
                });
            }
            if !keys.insert(entry.api_key.trim()) {
                return Err(ConfigError::DuplicateApiKey(entry.api_key.clone()));
            }
        }
        Ok(())
    }

    pub fn into_resolver(self) -> ApiKeyTenantResolver {
        self.tenants
            .into_iter()
            .fold(ApiKeyTenantResolver::new(), |resolver, entry| {
                resolver.with_tenant(entry.id, entry.api_key.trim(), entry.api_secret.trim())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_TENANTS: &str = r#"
        [[tenants]]
        id = "00000000-0000-0000-0000-000000000001"
        api_key = "bob"
        api_secret = "lazar"

        [[tenants]]
        id = "00000000-0000-0000-0000-000000000002"
        api_key = "alice"
        api_secret = "wonderland"
    "#;

    #[test]
    fn test_parse_tenants() {
        let file = TenantsFile::parse(TWO_TENANTS).unwrap();
        assert_eq!(file.tenants.len(), 2);
        assert_eq!(file.tenants[1].api_key, "alice");
        assert_eq!(file.into_resolver().len(), 2);
    }

    #[test]
    fn test_empty_file_has_no_tenants() {
        let file = TenantsFile::parse("").unwrap();
        assert!(file.into_resolver().is_empty());
    }

    #[test]
    fn test_rejects_blank_fields() {
        let err = TenantsFile::parse(
            r#"
            [[tenants]]
            id = "00000000-0000-0000-0000-000000000001"
            api_key = "bob"
            api_secret = "  "
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BlankField {
                index: 0,
                field: "api_secret"
            }
        ));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = TenantsFile::parse(
            r#"
            [[tenants]]
            id = "00000000-0000-0000-0000-000000000001"
            api_key = "bob"
            api_secret = "a"

            [[tenants]]
            id = "00000000-0000-0000-0000-000000000002"
            api_key = "bob"
            api_secret = "b"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateApiKey(key) if key == "bob"));
    }

    #[test]
    fn test_rejects_malformed_toml_and_unknown_fields() {
        assert!(matches!(
            TenantsFile::parse("[[tenants]]\nid = 12"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            TenantsFile::parse(
                "[[tenants]]\nid = \"00000000-0000-0000-0000-000000000001\"\napi_key = \"a\"\napi_secret = \"b\"\nrole = \"admin\""
            ),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_TENANTS.as_bytes()).unwrap();
        assert_eq!(TenantsFile::load(file.path()).unwrap().tenants.len(), 2);

        let err = TenantsFile::load(Path::new("/nonexistent/tenants.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
