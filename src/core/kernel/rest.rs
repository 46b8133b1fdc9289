use crate::core::errors::AdapterError;
use crate::core::kernel::signer::{SignatureResult, Signer};
use crate::core::time::now_ms;
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, trace};

/// REST client trait for making HTTP requests.
///
/// The venue layer talks to the wire exclusively through this trait, which
/// keeps endpoint wrappers testable against canned transports. The venue
/// API is GET/POST only.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Make a GET request
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `query_params` - Query parameters as key-value pairs
    /// * `authenticated` - Whether to sign the request
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, AdapterError>;

    /// Make a GET request with strongly-typed response
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<T, AdapterError>;

    /// Make a POST request with a JSON body
    ///
    /// The body bytes are transmitted verbatim, which matters for
    /// signature schemes that sign the exact payload.
    async fn post(
        &self,
        endpoint: &str,
        body: &str,
        authenticated: bool,
    ) -> Result<Value, AdapterError>;

    /// Make a POST request with strongly-typed response
    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &str,
        authenticated: bool,
    ) -> Result<T, AdapterError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 30,
            user_agent: "bitgetx/0.1".to_string(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build the REST client. The underlying connection pool is created
    /// once here and reused for the adapter's lifetime.
    pub fn build(self) -> Result<ReqwestRest, AdapterError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                AdapterError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn new(
        base_url: String,
        exchange_name: String,
        signer: Option<Arc<dyn Signer>>,
    ) -> Result<Self, AdapterError> {
        let config = RestClientConfig::new(base_url, exchange_name);
        RestClientBuilder::new(config)
            .with_signer(signer.unwrap_or_else(|| Arc::new(NoopSigner)))
            .build()
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    fn create_query_string(params: &[(&str, &str)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, AdapterError> {
        let status = response.status();
        let response_text = response.text().await?;

        trace!("Response body: {}", response_text);

        if status.is_success() {
            serde_json::from_str(&response_text).map_err(|e| {
                AdapterError::DeserializationError(format!("Failed to parse JSON response: {}", e))
            })
        } else {
            Err(AdapterError::ApiError {
                code: i32::from(status.as_u16()),
                message: response_text,
            })
        }
    }

    #[instrument(skip(self, body), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: &[u8],
        authenticated: bool,
    ) -> Result<Value, AdapterError> {
        let url = self.build_url(endpoint);
        let mut request = self.client.request(method.clone(), &url);

        if authenticated {
            let Some(signer) = &self.signer else {
                return Err(AdapterError::AuthError(
                    "Authentication required but no signer provided".to_string(),
                ));
            };

            let query_string = Self::create_query_string(query_params);
            let (headers, signed_params) =
                signer.sign_request(method.as_str(), endpoint, &query_string, body, now_ms() as u64)?;

            for (key, value) in headers {
                request = request.header(&key, &value);
            }

            // The signed params go on the URL in exactly the order they
            // were signed in.
            for (key, value) in signed_params {
                request = request.query(&[(key, value)]);
            }

            if !body.is_empty() {
                request = request.body(body.to_vec());
            }
        } else {
            for (key, value) in query_params {
                request = request.query(&[(key, value)]);
            }

            if !body.is_empty() {
                request = request
                    .header("Content-Type", "application/json")
                    .body(body.to_vec());
            }
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params), fields(exchange = %self.config.exchange_name, endpoint = %endpoint, param_count = query_params.len()))]
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Value, AdapterError> {
        self.make_request(Method::GET, endpoint, query_params, &[], authenticated)
            .await
    }

    #[instrument(skip(self, query_params), fields(exchange = %self.config.exchange_name, endpoint = %endpoint, param_count = query_params.len()))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<T, AdapterError> {
        self.make_request(Method::GET, endpoint, query_params, &[], authenticated)
            .await
            .and_then(|value| {
                serde_json::from_value(value).map_err(|e| {
                    AdapterError::DeserializationError(format!("Failed to deserialize JSON: {}", e))
                })
            })
    }

    #[instrument(skip(self, body), fields(exchange = %self.config.exchange_name, endpoint = %endpoint))]
    async fn post(
        &self,
        endpoint: &str,
        body: &str,
        authenticated: bool,
    ) -> Result<Value, AdapterError> {
        self.make_request(Method::POST, endpoint, &[], body.as_bytes(), authenticated)
            .await
    }

    #[instrument(skip(self, body), fields(exchange = %self.config.exchange_name, endpoint = %endpoint))]
    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &str,
        authenticated: bool,
    ) -> Result<T, AdapterError> {
        self.make_request(Method::POST, endpoint, &[], body.as_bytes(), authenticated)
            .await
            .and_then(|value| {
                serde_json::from_value(value).map_err(|e| {
                    AdapterError::DeserializationError(format!("Failed to deserialize JSON: {}", e))
                })
            })
    }
}

/// No-op signer for public-only clients
struct NoopSigner;

impl Signer for NoopSigner {
    fn sign_request(
        &self,
        _method: &str,
        _endpoint: &str,
        query_string: &str,
        _body: &[u8],
        _timestamp: u64,
    ) -> SignatureResult {
        let headers = HashMap::new();
        let signed_params = if query_string.is_empty() {
            Vec::new()
        } else {
            query_string
                .split('&')
                .filter_map(|param| {
                    param
                        .split_once('=')
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                })
                .collect()
        };

        Ok((headers, signed_params))
    }
}
