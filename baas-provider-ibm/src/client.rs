//! Backup & Recovery REST client
//!
//! One method per endpoint. Every request carries the bearer token, the
//! tenant header and `Accept: application/json`. Failures are never retried.

use reqwest::Method;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{
    PoliciesQuery, ProtectionGroupRunsResponse, ProtectionPoliciesResponse, ProtectionPolicy,
    RunsQuery,
};

/// Default IBM Cloud IAM endpoint
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

const API_PREFIX: [&str; 2] = ["v2", "data-protect"];
const TENANT_HEADER: &str = "X-IBM-Tenant-Id";
const REQUEST_INITIATOR_HEADER: &str = "requestInitiatorType";
const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// How the client obtains its bearer token
#[derive(Debug, Clone, PartialEq)]
pub enum Auth {
    /// Use this token as is
    BearerToken(String),
    /// Exchange an API key for a token at `{iam_url}/identity/token`
    IamApiKey { api_key: String, iam_url: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the Backup & Recovery instance
    pub endpoint: String,
    pub tenant_id: String,
    pub auth: Auth,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("{operation} failed {status}\n{body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} returned an unreadable body: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Whether the server answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }
}

#[derive(serde::Deserialize)]
struct IamToken {
    access_token: String,
}

/// Authenticated client for one tenant of a Backup & Recovery instance
#[derive(Debug, Clone)]
pub struct BackupRecoveryClient {
    base_url: reqwest::Url,
    tenant_id: String,
    token: String,
    http: reqwest::Client,
}

impl BackupRecoveryClient {
    /// Validate the configuration and obtain a token
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let endpoint = config.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ClientError::Configuration(
                "endpoint must be set".to_string(),
            ));
        }
        let base_url = reqwest::Url::parse(endpoint)
            .map_err(|e| ClientError::Configuration(format!("invalid endpoint: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Configuration(format!(
                "endpoint {} is not an HTTP base URL",
                endpoint
            )));
        }
        if config.tenant_id.trim().is_empty() {
            return Err(ClientError::Configuration(
                "tenant_id must be set".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let token = match config.auth {
            Auth::BearerToken(token) if token.trim().is_empty() => {
                return Err(ClientError::Configuration(
                    "bearer token must not be empty".to_string(),
                ));
            }
            Auth::BearerToken(token) => token,
            Auth::IamApiKey { api_key, iam_url } => {
                exchange_api_key(&http, &iam_url, &api_key).await?
            }
        };

        Ok(Self {
            base_url,
            tenant_id: config.tenant_id,
            token,
            http,
        })
    }

    /// API URL for `segments`; each segment is percent-encoded
    fn url(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> reqwest::RequestBuilder {
        let url = self.url(segments);
        log::debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(TENANT_HEADER, &self.tenant_id)
            .header(ACCEPT, "application/json")
    }

    /// CreateProtectionPolicy: POST /policies
    pub async fn create_protection_policy(
        &self,
        policy: &ProtectionPolicy,
    ) -> Result<ProtectionPolicy, ClientError> {
        let request = self
            .request(Method::POST, &["policies"])
            .json(&policy.clone().into_request());
        send_json("CreateProtectionPolicy", request).await
    }

    /// GetProtectionPolicyByID: GET /policies/{id}
    pub async fn get_protection_policy_by_id(
        &self,
        id: &str,
    ) -> Result<ProtectionPolicy, ClientError> {
        let request = self.request(Method::GET, &["policies", id]);
        send_json("GetProtectionPolicyByID", request).await
    }

    /// UpdateProtectionPolicy: PUT /policies/{id}
    ///
    /// The whole document is replaced.
    pub async fn update_protection_policy(
        &self,
        id: &str,
        policy: &ProtectionPolicy,
    ) -> Result<ProtectionPolicy, ClientError> {
        let request = self
            .request(Method::PUT, &["policies", id])
            .json(&policy.clone().into_request());
        send_json("UpdateProtectionPolicy", request).await
    }

    /// DeleteProtectionPolicy: DELETE /policies/{id}
    pub async fn delete_protection_policy(&self, id: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &["policies", id]);
        send("DeleteProtectionPolicy", request).await.map(|_| ())
    }

    /// GetProtectionPolicies: GET /policies
    pub async fn get_protection_policies(
        &self,
        query: &PoliciesQuery,
    ) -> Result<ProtectionPoliciesResponse, ClientError> {
        let request = with_initiator(
            self.request(Method::GET, &["policies"]),
            query.request_initiator_type.as_deref(),
        )
        .query(&query.query_pairs());
        send_json("GetProtectionPolicies", request).await
    }

    /// GetProtectionGroupRuns: GET /protection-groups/{id}/runs
    ///
    /// Returns a single page; `num_runs` bounds its size.
    pub async fn get_protection_group_runs(
        &self,
        query: &RunsQuery,
    ) -> Result<ProtectionGroupRunsResponse, ClientError> {
        let path = ["protection-groups", query.protection_group_id.as_str(), "runs"];
        let request = with_initiator(
            self.request(Method::GET, &path),
            query.request_initiator_type.as_deref(),
        )
        .query(&query.query_pairs());
        send_json("GetProtectionGroupRuns", request).await
    }
}

fn with_initiator(
    request: reqwest::RequestBuilder,
    initiator: Option<&str>,
) -> reqwest::RequestBuilder {
    match initiator {
        Some(initiator) => request.header(REQUEST_INITIATOR_HEADER, initiator),
        None => request,
    }
}

/// Send a request and turn a non-2xx answer into [`ClientError::Api`]
async fn send(
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<String, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|source| ClientError::Transport { operation, source })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ClientError::Transport { operation, source })?;

    if status.is_success() {
        Ok(body)
    } else {
        log::debug!("{} failed with {}: {}", operation, status, body);
        Err(ClientError::Api {
            operation,
            status: status.as_u16(),
            body,
        })
    }
}

async fn send_json<T: DeserializeOwned>(
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, ClientError> {
    let body = send(operation, request).await?;
    serde_json::from_str(&body).map_err(|source| ClientError::Decode { operation, source })
}

#[derive(Serialize)]
struct ApiKeyGrant<'a> {
    grant_type: &'a str,
    apikey: &'a str,
}

async fn exchange_api_key(
    http: &reqwest::Client,
    iam_url: &str,
    api_key: &str,
) -> Result<String, ClientError> {
    if api_key.trim().is_empty() {
        return Err(ClientError::Configuration(
            "API key must not be empty".to_string(),
        ));
    }

    let url = format!("{}/identity/token", iam_url.trim_end_matches('/'));
    log::debug!("POST {}", url);
    let response = http
        .post(&url)
        .header(ACCEPT, "application/json")
        .form(&ApiKeyGrant {
            grant_type: APIKEY_GRANT_TYPE,
            apikey: api_key,
        })
        .send()
        .await
        .map_err(|e| ClientError::Authentication(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Authentication(e.to_string()))?;
    if !status.is_success() {
        return Err(ClientError::Authentication(format!(
            "IAM returned {}: {}",
            status, body
        )));
    }

    let token: IamToken = serde_json::from_str(&body)
        .map_err(|e| ClientError::Authentication(format!("unexpected IAM response: {}", e)))?;
    Ok(token.access_token)
}
