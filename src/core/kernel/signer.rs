use crate::core::errors::AdapterError;
use std::collections::HashMap;

/// Result type for signing operations: (headers, `query_params`)
pub type SignatureResult = Result<(HashMap<String, String>, Vec<(String, String)>), AdapterError>;

/// Signer trait for request authentication.
///
/// The transport hands every authenticated request through here before it
/// goes on the wire. Implementations return the auth headers plus the
/// query parameters exactly as signed, so the transmitted query string
/// can never drift from the signed one.
pub trait Signer: Send + Sync {
    /// Sign a request and return headers and query parameters.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, ...)
    /// * `endpoint` - API endpoint path
    /// * `query_string` - Canonical query string (without leading '?')
    /// * `body` - Raw request body bytes
    /// * `timestamp` - Request timestamp in milliseconds
    fn sign_request(
        &self,
        method: &str,
        endpoint: &str,
        query_string: &str,
        body: &[u8],
        timestamp: u64,
    ) -> SignatureResult;
}
