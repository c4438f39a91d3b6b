use async_trait::async_trait;
use bx24_core::PlatformSdk;
use bx24_domain::constants::BATCH_METHOD;
use bx24_domain::{
    BatchRequestSet, BatchResponse, Bx24Error, HttpConfig, Params, PortalAuth, RemoteCallRequest,
    RemoteCallResponse, Result,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::endpoint::PortalEndpoint;
use super::query::batch_command;
use super::wire::{parse_batch, CallEnvelope};
use crate::errors::InfraError;
use crate::http::{HttpClient, HttpReply};

/// `PlatformSdk` over the portal's REST API.
///
/// Every call is a JSON `POST` to `<rest root>/<method>.json`. Remote errors
/// are returned inside the response; only transport and decoding failures
/// surface as `Err`.
#[derive(Clone, Debug)]
pub struct RestClient {
    endpoint: PortalEndpoint,
    http: HttpClient,
}

impl RestClient {
    pub fn new(auth: &PortalAuth, http: &HttpConfig) -> Result<Self> {
        let endpoint = PortalEndpoint::from_auth(auth)?;
        let http = HttpClient::from_config(http)?;
        Ok(Self::with_http_client(endpoint, http))
    }

    pub fn with_http_client(endpoint: PortalEndpoint, http: HttpClient) -> Self {
        Self { endpoint, http }
    }

    pub fn endpoint(&self) -> &PortalEndpoint {
        &self.endpoint
    }

    async fn post(&self, method: &str, mut body: Params) -> Result<HttpReply> {
        let url = self.endpoint.method_url(method)?;
        self.endpoint.authorize(&mut body);
        self.http.post_json(url, &body).await
    }
}

#[async_trait]
impl PlatformSdk for RestClient {
    async fn call_method(&self, request: &RemoteCallRequest) -> Result<RemoteCallResponse> {
        let reply = self.post(request.method(), request.params().clone()).await?;
        debug!(method = request.method(), status = %reply.status, "portal call completed");

        match serde_json::from_str::<CallEnvelope>(&reply.body) {
            Ok(envelope) if envelope.error.is_some() || reply.status.is_success() => {
                Ok(envelope.into_response(request))
            }
            Ok(_) => Err(InfraError::from_status(reply.status).into()),
            Err(_) if !reply.status.is_success() => Err(InfraError::from_status(reply.status).into()),
            Err(err) => {
                warn!(method = request.method(), error = %err, "portal returned unreadable body");
                Err(InfraError::from(err).into())
            }
        }
    }

    async fn call_batch(
        &self,
        batch: &BatchRequestSet,
        halt_on_error: bool,
    ) -> Result<BatchResponse> {
        let commands: Params = batch
            .iter()
            .map(|(key, request)| (key.to_string(), Value::String(batch_command(request))))
            .collect();

        let mut body = Params::new();
        body.insert("halt".to_string(), Value::from(u8::from(halt_on_error)));
        body.insert("cmd".to_string(), Value::Object(commands));

        let reply = self.post(BATCH_METHOD, body).await?;
        debug!(commands = batch.len(), status = %reply.status, "portal batch completed");

        match parse_batch(&reply.body) {
            Ok(Ok(sections)) => Ok(sections.into_batch_response()),
            Ok(Err(remote)) => Err(Bx24Error::from(remote)),
            Err(_) if !reply.status.is_success() => Err(InfraError::from_status(reply.status).into()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> RestClient {
        let auth = PortalAuth::Webhook { url: format!("{}/rest/1/secret/", server.uri()) };
        let endpoint = PortalEndpoint::from_auth(&auth).expect("endpoint");
        let http = HttpClient::builder()
            .max_attempts(1)
            .base_backoff(Duration::from_millis(1))
            .build()
            .expect("http");
        RestClient::with_http_client(endpoint, http)
    }

    #[tokio::test]
    async fn call_method_posts_params_and_reads_paging_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/1/secret/crm.deal.list.json"))
            .and(body_partial_json(json!({"select": ["ID"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{"ID": "1"}, {"ID": "2"}],
                "total": 3,
                "next": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut params = Params::new();
        params.insert("select".into(), json!(["ID"]));
        let request = RemoteCallRequest::new("crm.deal.list", params);

        let response = client(&server).call_method(&request).await.expect("response");
        assert_eq!(response.total(), Some(3));
        let (records, next) = response.into_parts();
        assert_eq!(records.len(), 2);
        let next = next.expect("continuation");
        assert_eq!(next.params()["start"], 2);
        assert_eq!(next.params()["select"], json!(["ID"]));
    }

    #[tokio::test]
    async fn remote_errors_come_back_inside_the_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "ERROR_CORE",
                "error_description": "Invalid filter"
            })))
            .mount(&server)
            .await;

        let response = client(&server)
            .call_method(&RemoteCallRequest::bare("crm.deal.list"))
            .await
            .expect("response");

        let error = response.error().expect("remote error");
        assert_eq!(error.code.as_deref(), Some("ERROR_CORE"));
    }

    #[tokio::test]
    async fn status_without_error_body_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("<html>denied</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .call_method(&RemoteCallRequest::bare("profile"))
            .await
            .unwrap_err();
        assert!(matches!(err, Bx24Error::Auth(_)));
    }

    #[tokio::test]
    async fn unreadable_success_body_is_internal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server)
            .call_method(&RemoteCallRequest::bare("profile"))
            .await
            .unwrap_err();
        assert!(matches!(err, Bx24Error::Internal(_)));
    }

    #[tokio::test]
    async fn call_batch_sends_encoded_commands() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/1/secret/batch.json"))
            .and(body_partial_json(json!({
                "halt": 0,
                "cmd": {
                    "crm.deal.list_50": "crm.deal.list?start=50",
                    "crm.deal.list_100": "crm.deal.list?start=100"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "result": {
                        "crm.deal.list_50": [{"ID": "51"}],
                        "crm.deal.list_100": [{"ID": "101"}]
                    },
                    "result_error": [],
                    "result_total": {"crm.deal.list_50": 120, "crm.deal.list_100": 120},
                    "result_next": {"crm.deal.list_50": 100}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let base = RemoteCallRequest::bare("crm.deal.list");
        let mut batch = BatchRequestSet::new();
        batch.insert("crm.deal.list_50", base.with_start(50)).unwrap();
        batch.insert("crm.deal.list_100", base.with_start(100)).unwrap();

        let response = client(&server).call_batch(&batch, false).await.expect("batch");
        assert_eq!(response.len(), 2);
        let first = response.get("crm.deal.list_50").unwrap();
        assert_eq!(first.total(), Some(120));
        assert!(!first.more());
    }

    #[tokio::test]
    async fn batch_level_remote_error_fails_the_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "expired_token",
                "error_description": "The access token provided has expired."
            })))
            .mount(&server)
            .await;

        let mut batch = BatchRequestSet::new();
        batch.insert("a", RemoteCallRequest::bare("crm.deal.list")).unwrap();

        let err = client(&server).call_batch(&batch, false).await.unwrap_err();
        match err {
            Bx24Error::RemoteApi { code, description } => {
                assert_eq!(code.as_deref(), Some("expired_token"));
                assert!(description.contains("expired"));
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbled_batch_reply_is_a_processing_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"result\": 42}"))
            .mount(&server)
            .await;

        let mut batch = BatchRequestSet::new();
        batch.insert("a", RemoteCallRequest::bare("crm.deal.list")).unwrap();

        let err = client(&server).call_batch(&batch, false).await.unwrap_err();
        assert!(matches!(err, Bx24Error::BatchProcessing(_)));
    }

    #[tokio::test]
    async fn access_token_mode_sends_auth_param() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/server.time.json"))
            .and(body_partial_json(json!({"auth": "tok"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": "2026-01-01T00:00:00"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth = PortalAuth::AccessToken { domain: server.uri(), token: "tok".into() };
        let client = RestClient::new(&auth, &HttpConfig::default()).expect("client");
        let response =
            client.call_method(&RemoteCallRequest::bare("server.time")).await.expect("response");
        assert!(response.error().is_none());
    }
}
