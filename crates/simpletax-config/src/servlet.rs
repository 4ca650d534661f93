//! Endpoints to set up and review the account properties used by the
//! simple tax plugin.
//!
//! ```text
//! GET /accounts/{accountId}/vatin
//! PUT /accounts/{accountId}/vatin
//! GET /vatins
//! GET /vatins?account={accountId}
//!
//! GET /accounts/{accountId}/taxCountry
//! PUT /accounts/{accountId}/taxCountry
//! GET /taxCountries
//! GET /taxCountries?account={accountId}
//! ```
//!
//! `accountId` has the loose UUID shape `\w+-\w+-\w+-\w+-\w+`. Paths are
//! relative to [`PLUGIN_BASE_PATH`]. The generic account custom field
//! endpoints of the host are not used because they do not validate values.

use std::sync::{Arc, LazyLock};

use regex_lite::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::codec::{Codec, JsonCodec};
use crate::controller::AccountResourceController;
use crate::error::ServletError;
use crate::loose_uuid::{self, UUID_LOOSE_PATTERN};
use crate::resource::{ResourceKind, TaxCountryRsc, VatinRsc};
use crate::tenant::{Tenant, TenantResolver, API_KEY_HEADER, API_SECRET_HEADER};
use crate::types::{Request, Response};

macro_rules! plugin_name {
    () => {
        "killbill-simple-tax"
    };
}

/// Name under which the plugin is mounted by the host.
pub const PLUGIN_NAME: &str = plugin_name!();

/// Base path of every endpoint served here.
pub const PLUGIN_BASE_PATH: &str = concat!("/plugins/", plugin_name!());

const ACCOUNTS_PATH: &str = "/accounts";
const ACCOUNT_PARAM_NAME: &str = "account";

static ACCOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{ACCOUNTS_PATH}/({UUID_LOOSE_PATTERN})/(\w+)$"))
        .expect("account path pattern is valid")
});

/// Location of an account resource, as returned after a successful PUT.
pub fn account_resource_uri(account_id: Uuid, kind: ResourceKind) -> String {
    format!(
        "{PLUGIN_BASE_PATH}{ACCOUNTS_PATH}/{account_id}/{}",
        kind.name()
    )
}

type TaxCountryHandler = dyn AccountResourceController<Resource = TaxCountryRsc>;
type VatinHandler = dyn AccountResourceController<Resource = VatinRsc>;

/// Routes requests to the tax country and VATIN controllers.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct SimpleTaxServlet<C = JsonCodec> {
    vatin: Arc<VatinHandler>,
    tax_country: Arc<TaxCountryHandler>,
    codec: C,
}

impl SimpleTaxServlet<JsonCodec> {
    pub fn new(vatin: Arc<VatinHandler>, tax_country: Arc<TaxCountryHandler>) -> Self {
        Self::with_codec(vatin, tax_country, JsonCodec)
    }
}

impl<C: Codec> SimpleTaxServlet<C> {
    pub fn with_codec(vatin: Arc<VatinHandler>, tax_country: Arc<TaxCountryHandler>, codec: C) -> Self {
        Self {
            vatin,
            tax_country,
            codec,
        }
    }

    /// Resolve the tenant of `req`, then serve it.
    pub fn serve(&self, req: &Request, tenants: &dyn TenantResolver) -> Response {
        let tenant = tenants.resolve(req);
        self.handle(req, tenant.as_ref())
    }

    /// Serve a request on behalf of an already resolved tenant.
    pub fn handle(&self, req: &Request, tenant: Option<&Tenant>) -> Response {
        let result = match req.method.as_str() {
            "GET" => self.do_get(req, tenant),
            "PUT" => self.do_put(req, tenant),
            other => Err(ServletError::MethodNotAllowed(other.to_string())),
        };

        match result {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(
                    method = %req.method,
                    path = %req.path,
                    status = e.status(),
                    reason = %e,
                    "request rejected"
                );
                e.into_response()
            }
        }
    }

    fn do_get(&self, req: &Request, tenant: Option<&Tenant>) -> Result<Response, ServletError> {
        let tenant = require_tenant(tenant)?;
        let path = req.path.as_str();

        if let Some((account, name)) = match_account_path(path) {
            let account_id = loose_uuid::to_uuid_or_none(account)
                .ok_or_else(|| ServletError::resource_not_found(path))?;
            return match ResourceKind::from_name(name) {
                Some(ResourceKind::TaxCountry) => {
                    self.json_ok(&self.tax_country.get(account_id, tenant)?)
                }
                Some(ResourceKind::Vatin) => self.json_ok(&self.vatin.get(account_id, tenant)?),
                None => Err(ServletError::resource_not_found(path)),
            };
        }

        let kind = ResourceKind::from_collection_path(path)
            .ok_or_else(|| ServletError::resource_not_found(path))?;
        let account_id = account_filter(req)?;
        match kind {
            ResourceKind::TaxCountry => self.json_ok(&self.tax_country.list(account_id, tenant)?),
            ResourceKind::Vatin => self.json_ok(&self.vatin.list(account_id, tenant)?),
        }
    }

    fn do_put(&self, req: &Request, tenant: Option<&Tenant>) -> Result<Response, ServletError> {
        let tenant = require_tenant(tenant)?;
        let path = req.path.as_str();

        let (account, name) =
            match_account_path(path).ok_or_else(|| ServletError::resource_not_found(path))?;
        let account_id = loose_uuid::to_uuid_or_none(account)
            .ok_or_else(|| ServletError::resource_not_found(path))?;
        let kind =
            ResourceKind::from_name(name).ok_or_else(|| ServletError::resource_not_found(path))?;

        let body = req.body.as_deref().unwrap_or_default();
        match kind {
            ResourceKind::TaxCountry => {
                self.save(&*self.tax_country, kind, account_id, body, tenant)
            }
            ResourceKind::Vatin => self.save(&*self.vatin, kind, account_id, body, tenant),
        }
    }

    fn save<R>(
        &self,
        controller: &dyn AccountResourceController<Resource = R>,
        kind: ResourceKind,
        account_id: Uuid,
        body: &str,
        tenant: &Tenant,
    ) -> Result<Response, ServletError>
    where
        R: Serialize + serde::de::DeserializeOwned + Send,
    {
        // A `null` body decodes to `None` and is rejected like malformed JSON.
        let resource = match self.codec.decode::<Option<R>>(body) {
            Ok(Some(resource)) => resource,
            Ok(None) | Err(_) => {
                tracing::warn!(
                    account_id = %account_id,
                    resource = kind.name(),
                    "invalid resource in request body"
                );
                return Err(ServletError::BadRequest(
                    kind.invalid_body_message().to_string(),
                ));
            }
        };

        if !controller.save(account_id, &resource, tenant) {
            return Err(ServletError::SaveFailed(kind.save_failed_message()));
        }

        tracing::info!(account_id = %account_id, resource = kind.name(), "account resource saved");
        Ok(Response::new(201).with_header("location", account_resource_uri(account_id, kind)))
    }

    fn json_ok<T: Serialize + ?Sized>(&self, value: &T) -> Result<Response, ServletError> {
        let body = self.codec.encode(value)?;
        Ok(Response::new(200)
            .with_header("content-type", self.codec.content_type())
            .with_body(body))
    }
}

fn require_tenant(tenant: Option<&Tenant>) -> Result<&Tenant, ServletError> {
    tenant.ok_or_else(|| {
        ServletError::NotFound(format!(
            "No tenant specified by the '{API_KEY_HEADER}' and '{API_SECRET_HEADER}' headers"
        ))
    })
}

/// Split `/accounts/{id}/{name}` into its id and name segments.
fn match_account_path(path: &str) -> Option<(&str, &str)> {
    let caps = ACCOUNT_PATTERN.captures(path)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// The optional `account` filter of collection requests.
fn account_filter(req: &Request) -> Result<Option<Uuid>, ServletError> {
    let Some(account) = req.query_param(ACCOUNT_PARAM_NAME) else {
        return Ok(None);
    };
    if account.trim().is_empty() {
        return Ok(None);
    }

    loose_uuid::parse_loose(&account).map(Some).ok_or_else(|| {
        tracing::warn!(value = %account, "illegal account filter");
        ServletError::BadRequest(format!(
            "Illegal value [{account}] for request parameter [{ACCOUNT_PARAM_NAME}]"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_field::StoreError;
    use crate::tenant::ApiKeyTenantResolver;
    use parking_lot::Mutex;

    const ACCOUNT: &str = "11111111-1111-1111-1111-111111111111";

    fn account() -> Uuid {
        Uuid::parse_str(ACCOUNT).unwrap()
    }

    fn tenant() -> Tenant {
        Tenant {
            id: Uuid::from_u128(99),
            api_key: "bob".to_string(),
        }
    }

    /// Controller recording its calls and answering from fixed data.
    struct Recording<R> {
        stored: Vec<R>,
        save_result: bool,
        lists: Mutex<Vec<Option<Uuid>>>,
        saves: Mutex<Vec<(Uuid, R)>>,
    }

    impl<R> Recording<R> {
        fn new(stored: Vec<R>, save_result: bool) -> Self {
            Self {
                stored,
                save_result,
                lists: Mutex::new(Vec::new()),
                saves: Mutex::new(Vec::new()),
            }
        }
    }

    trait HasAccount {
        fn account(&self) -> Option<Uuid>;
    }

    impl HasAccount for TaxCountryRsc {
        fn account(&self) -> Option<Uuid> {
            self.account_id
        }
    }

    impl HasAccount for VatinRsc {
        fn account(&self) -> Option<Uuid> {
            self.account_id
        }
    }

    impl<R> AccountResourceController for Recording<R>
    where
        R: HasAccount + Clone + Serialize + serde::de::DeserializeOwned + Send + Sync,
    {
        type Resource = R;

        fn get(&self, account_id: Uuid, _: &Tenant) -> Result<Option<R>, StoreError> {
            Ok(self
                .stored
                .iter()
                .find(|r| r.account() == Some(account_id))
                .cloned())
        }

        fn list(&self, account_id: Option<Uuid>, _: &Tenant) -> Result<Vec<R>, StoreError> {
            self.lists.lock().push(account_id);
            Ok(self
                .stored
                .iter()
                .filter(|r| account_id.is_none() || r.account() == account_id)
                .cloned()
                .collect())
        }

        fn save(&self, account_id: Uuid, resource: &R, _: &Tenant) -> bool {
            self.saves.lock().push((account_id, resource.clone()));
            self.save_result
        }
    }

    struct Fixture {
        servlet: SimpleTaxServlet,
        tax: Arc<Recording<TaxCountryRsc>>,
        vat: Arc<Recording<VatinRsc>>,
    }

    fn fixture(save_result: bool) -> Fixture {
        let tax = Arc::new(Recording::new(
            vec![
                TaxCountryRsc::new(account(), "FR".parse().unwrap()),
                TaxCountryRsc::new(Uuid::from_u128(2), "DE".parse().unwrap()),
            ],
            save_result,
        ));
        let vat = Arc::new(Recording::new(
            vec![VatinRsc::new(account(), "FR12345678901".parse().unwrap())],
            save_result,
        ));
        Fixture {
            servlet: SimpleTaxServlet::new(vat.clone(), tax.clone()),
            tax,
            vat,
        }
    }

    fn get(f: &Fixture, path: &str) -> Response {
        f.servlet.handle(&Request::new("GET", path), Some(&tenant()))
    }

    fn put(f: &Fixture, path: &str, body: &str) -> Response {
        f.servlet
            .handle(&Request::new("PUT", path).with_body(body), Some(&tenant()))
    }

    fn json(resp: &Response) -> serde_json::Value {
        serde_json::from_str(resp.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn test_base_path_is_built_from_plugin_name() {
        assert_eq!(PLUGIN_BASE_PATH, format!("/plugins/{PLUGIN_NAME}"));
        assert_eq!(PLUGIN_BASE_PATH, "/plugins/killbill-simple-tax");
    }

    #[test]
    fn test_get_account_tax_country() {
        let f = fixture(true);
        let resp = get(&f, &format!("/accounts/{ACCOUNT}/taxCountry"));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(
            json(&resp),
            serde_json::json!({"accountId": ACCOUNT, "taxCountry": "FR"})
        );
    }

    #[test]
    fn test_get_unset_value_is_null() {
        let f = fixture(true);
        let resp = get(&f, "/accounts/1-2-3-4-5/vatin");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body.as_deref(), Some("null"));
    }

    #[test]
    fn test_missing_tenant_is_not_found() {
        let f = fixture(true);
        for (method, path) in [
            ("GET", format!("/accounts/{ACCOUNT}/taxCountry")),
            ("GET", "/vatins".to_string()),
            ("PUT", format!("/accounts/{ACCOUNT}/vatin")),
        ] {
            let resp = f.servlet.handle(
                &Request::new(method, path).with_body(r#"{"vatin":"FR12345678901"}"#),
                None,
            );
            assert_eq!(resp.status, 404);
            assert_eq!(
                resp.body.as_deref(),
                Some("No tenant specified by the 'X-Killbill-ApiKey' and 'X-Killbill-ApiSecret' headers")
            );
        }
        assert!(f.vat.saves.lock().is_empty());
        assert!(f.vat.lists.lock().is_empty());
    }

    #[test]
    fn test_unknown_paths_are_not_found() {
        let f = fixture(true);
        for path in [
            "/whatever",
            "/",
            "",
            "/accounts",
            &format!("/accounts/{ACCOUNT}/taxCountries"),
            &format!("/accounts/{ACCOUNT}/vatin/extra"),
            &format!("/accounts/{ACCOUNT}/"),
            "/vatins/",
            "/accounts/not-a-uuid/vatin",
        ] {
            let resp = get(&f, path);
            assert_eq!(resp.status, 404, "path {path:?}");
            assert_eq!(resp.body, Some(format!("Resource {path} not found")));
        }
    }

    #[test]
    fn test_loose_but_unconvertible_account_is_not_found() {
        let f = fixture(true);
        let resp = get(&f, "/accounts/zz_top-x-y-z-w/vatin");
        assert_eq!(resp.status, 404);
        assert_eq!(
            resp.body.as_deref(),
            Some("Resource /accounts/zz_top-x-y-z-w/vatin not found")
        );
    }

    #[test]
    fn test_list_without_filter() {
        let f = fixture(true);
        let resp = get(&f, "/taxCountries");
        assert_eq!(resp.status, 200);
        assert_eq!(json(&resp).as_array().unwrap().len(), 2);
        assert_eq!(*f.tax.lists.lock(), vec![None]);

        let resp = f.servlet.handle(
            &Request::new("GET", "/taxCountries").with_query("account=%20"),
            Some(&tenant()),
        );
        assert_eq!(resp.status, 200);
        assert_eq!(*f.tax.lists.lock(), vec![None, None]);
    }

    #[test]
    fn test_list_with_filter() {
        let f = fixture(true);
        let resp = f.servlet.handle(
            &Request::new("GET", "/taxCountries").with_query(format!("account={ACCOUNT}")),
            Some(&tenant()),
        );
        assert_eq!(resp.status, 200);
        let items = json(&resp);
        assert_eq!(items.as_array().unwrap().len(), 1);
        assert_eq!(items[0]["taxCountry"], "FR");
        assert_eq!(*f.tax.lists.lock(), vec![Some(account())]);
    }

    #[test]
    fn test_list_with_illegal_filter() {
        let f = fixture(true);
        for value in ["not-a-uuid", "zz_top-x-y-z-w"] {
            let resp = f.servlet.handle(
                &Request::new("GET", "/vatins").with_query(format!("account={value}")),
                Some(&tenant()),
            );
            assert_eq!(resp.status, 400);
            assert_eq!(
                resp.body,
                Some(format!(
                    "Illegal value [{value}] for request parameter [account]"
                ))
            );
        }
        assert!(f.vat.lists.lock().is_empty());
    }

    #[test]
    fn test_put_vatin_creates_resource() {
        let f = fixture(true);
        let resp = put(
            &f,
            &format!("/accounts/{ACCOUNT}/vatin"),
            r#"{"vatin":"FR12345678901"}"#,
        );
        assert_eq!(resp.status, 201);
        assert_eq!(
            resp.header("location"),
            Some(format!("/plugins/killbill-simple-tax/accounts/{ACCOUNT}/vatin").as_str())
        );

        let saves = f.vat.saves.lock();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, account());
        assert_eq!(saves[0].1.vatin.as_str(), "FR12345678901");
    }

    #[test]
    fn test_put_uses_canonical_account_in_location() {
        let f = fixture(true);
        let resp = put(&f, "/accounts/1-2-3-4-5/taxCountry", r#"{"taxCountry":"BE"}"#);
        assert_eq!(resp.status, 201);
        assert_eq!(
            resp.header("location"),
            Some("/plugins/killbill-simple-tax/accounts/00000001-0002-0003-0004-000000000005/taxCountry")
        );
    }

    #[test]
    fn test_put_invalid_bodies() {
        let f = fixture(true);
        let tax_path = format!("/accounts/{ACCOUNT}/taxCountry");
        for body in ["", "null", "{", "[]", r#"{"taxCountry":"ZZ"}"#, r#"{"taxCountry":"FR","x":1}"#] {
            let resp = put(&f, &tax_path, body);
            assert_eq!(resp.status, 400, "body {body:?}");
            assert_eq!(
                resp.body.as_deref(),
                Some("Invalid tax country resource in request body")
            );
        }

        let vat_path = format!("/accounts/{ACCOUNT}/vatin");
        let resp = put(&f, &vat_path, r#"{"vatin":"FR1"}"#);
        assert_eq!(resp.status, 400);
        assert_eq!(
            resp.body.as_deref(),
            Some("Invalid VAT Identification Number resource in request body")
        );

        assert!(f.tax.saves.lock().is_empty());
        assert!(f.vat.saves.lock().is_empty());
    }

    #[test]
    fn test_put_save_failure() {
        let f = fixture(false);
        let resp = put(&f, &format!("/accounts/{ACCOUNT}/taxCountry"), r#"{"taxCountry":"FR"}"#);
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body.as_deref(), Some("Could not save tax country"));

        let resp = put(&f, &format!("/accounts/{ACCOUNT}/vatin"), r#"{"vatin":"DE123456789"}"#);
        assert_eq!(resp.status, 500);
        assert_eq!(
            resp.body.as_deref(),
            Some("Could not save VAT Identification Number")
        );
    }

    #[test]
    fn test_put_outside_account_paths() {
        let f = fixture(true);
        for path in ["/vatins", "/accounts/not-a-uuid/vatin", "/accounts/zz_top-x-y-z-w/vatin"] {
            let resp = put(&f, path, r#"{"vatin":"FR12345678901"}"#);
            assert_eq!(resp.status, 404, "path {path}");
        }
        let resp = put(&f, &format!("/accounts/{ACCOUNT}/other"), "{}");
        assert_eq!(resp.status, 404);
        assert!(f.vat.saves.lock().is_empty());
    }

    #[test]
    fn test_other_methods_not_allowed() {
        let f = fixture(true);
        let resp = f
            .servlet
            .handle(&Request::new("DELETE", "/vatins"), Some(&tenant()));
        assert_eq!(resp.status, 405);
        assert_eq!(resp.header("allow"), Some("GET, PUT"));
    }

    #[test]
    fn test_serve_resolves_tenant() {
        let f = fixture(true);
        let tenants = ApiKeyTenantResolver::new().with_tenant(Uuid::from_u128(99), "bob", "lazar");

        let anonymous = f.servlet.serve(&Request::new("GET", "/vatins"), &tenants);
        assert_eq!(anonymous.status, 404);

        let req = Request::new("GET", "/vatins")
            .with_header("X-Killbill-ApiKey", "bob")
            .with_header("X-Killbill-ApiSecret", "lazar");
        assert_eq!(f.servlet.serve(&req, &tenants).status, 200);
    }
}
