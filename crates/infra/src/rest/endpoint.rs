use std::fmt;

use bx24_domain::{redact_webhook, Bx24Error, Params, PortalAuth, Result};
use serde_json::Value;
use url::Url;

use crate::errors::InfraError;

/// Resolved REST base URL plus the credential to attach to each call.
#[derive(Clone)]
pub struct PortalEndpoint {
    base: Url,
    access_token: Option<String>,
}

impl PortalEndpoint {
    /// Resolve the endpoint for the configured authentication mode.
    ///
    /// Webhook URLs already carry the credential in their path. Access-token
    /// mode targets `https://<domain>/rest/` and sends the token as `auth`.
    pub fn from_auth(auth: &PortalAuth) -> Result<Self> {
        match auth {
            PortalAuth::Webhook { url } => {
                let base = parse_base(url)?;
                if !base.path().contains("/rest/") {
                    return Err(Bx24Error::PlatformLoad(format!(
                        "webhook URL must point at the portal REST root: {}",
                        redact_webhook(url)
                    )));
                }
                Ok(Self { base, access_token: None })
            }
            PortalAuth::AccessToken { domain, token } => {
                if token.trim().is_empty() {
                    return Err(Bx24Error::PlatformLoad("access token is empty".into()));
                }
                let domain = domain.trim().trim_end_matches('/');
                if domain.is_empty() {
                    return Err(Bx24Error::PlatformLoad("portal domain is empty".into()));
                }
                let root = if domain.contains("://") {
                    format!("{domain}/rest/")
                } else {
                    format!("https://{domain}/rest/")
                };
                Ok(Self { base: parse_base(&root)?, access_token: Some(token.clone()) })
            }
        }
    }

    /// URL of `<method>.json` under the REST root.
    pub fn method_url(&self, method: &str) -> Result<Url> {
        if method.is_empty()
            || !method.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(Bx24Error::InvalidInput(format!("invalid method name: {method:?}")));
        }

        self.base
            .join(&format!("{method}.json"))
            .map_err(|err| Bx24Error::from(InfraError::from(err)))
    }

    /// Attach the access token, if this endpoint uses one.
    pub fn authorize(&self, params: &mut Params) {
        if let Some(token) = &self.access_token {
            params.insert("auth".to_string(), Value::String(token.clone()));
        }
    }

    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }
}

impl fmt::Debug for PortalEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalEndpoint")
            .field("base", &redact_webhook(self.base.as_str()))
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|err| Bx24Error::from(InfraError::from(err)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Bx24Error::PlatformLoad(format!(
            "unsupported portal URL scheme: {}",
            url.scheme()
        )));
    }

    // `Url::join` replaces the last segment unless the path ends with '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webhook(url: &str) -> PortalAuth {
        PortalAuth::Webhook { url: url.to_string() }
    }

    #[test]
    fn webhook_urls_resolve_methods_under_the_secret_path() {
        let endpoint = PortalEndpoint::from_auth(&webhook("https://acme.bitrix24.com/rest/1/s3cr3t"))
            .expect("endpoint");

        let url = endpoint.method_url("crm.deal.list").expect("url");
        assert_eq!(url.as_str(), "https://acme.bitrix24.com/rest/1/s3cr3t/crm.deal.list.json");

        let mut params = Params::new();
        endpoint.authorize(&mut params);
        assert!(params.is_empty());
    }

    #[test]
    fn access_token_mode_targets_rest_root_and_adds_auth() {
        let auth = PortalAuth::AccessToken { domain: "acme.bitrix24.com".into(), token: "tok".into() };
        let endpoint = PortalEndpoint::from_auth(&auth).expect("endpoint");

        assert_eq!(
            endpoint.method_url("batch").expect("url").as_str(),
            "https://acme.bitrix24.com/rest/batch.json"
        );

        let mut params = Params::new();
        endpoint.authorize(&mut params);
        assert_eq!(params["auth"], "tok");
    }

    #[test]
    fn access_token_domain_may_carry_a_scheme() {
        let auth =
            PortalAuth::AccessToken { domain: "http://127.0.0.1:8080/".into(), token: "tok".into() };
        let endpoint = PortalEndpoint::from_auth(&auth).expect("endpoint");
        assert_eq!(
            endpoint.method_url("server.time").expect("url").as_str(),
            "http://127.0.0.1:8080/rest/server.time.json"
        );
    }

    #[test]
    fn rejects_unusable_configuration() {
        let cases = [
            webhook("not a url"),
            webhook("ftp://acme.bitrix24.com/rest/1/x/"),
            webhook("https://acme.bitrix24.com/"),
            PortalAuth::AccessToken { domain: "acme.bitrix24.com".into(), token: " ".into() },
            PortalAuth::AccessToken { domain: "".into(), token: "tok".into() },
        ];

        for auth in cases {
            let err = PortalEndpoint::from_auth(&auth).unwrap_err();
            assert!(matches!(err, Bx24Error::PlatformLoad(_)), "{auth:?} gave {err:?}");
        }
    }

    #[test]
    fn rejects_method_names_that_escape_the_root() {
        let endpoint =
            PortalEndpoint::from_auth(&webhook("https://acme.bitrix24.com/rest/1/x/")).unwrap();
        for method in ["", "../admin", "crm.deal.list?x=1"] {
            assert!(matches!(endpoint.method_url(method), Err(Bx24Error::InvalidInput(_))));
        }
    }

    #[test]
    fn debug_output_hides_credentials() {
        let endpoint =
            PortalEndpoint::from_auth(&webhook("https://acme.bitrix24.com/rest/1/s3cr3t/")).unwrap();
        let printed = format!("{endpoint:?}");
        assert!(!printed.contains("s3cr3t"));
    }
}
