use crate::bitget::types::WsLoginArgs;
use crate::core::errors::AdapterError;
use crate::core::kernel::Signer;
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;

type HmacSha256 = Hmac<Sha256>;

/// Bitget request signer.
///
/// REST requests sign `timestamp_ms + METHOD + request_path [+ body]`
/// with HMAC-SHA256 over the secret key, base64-encoded. The WebSocket
/// login signs `timestamp_secs + "GET/user/verify"` instead; note the
/// second-resolution timestamp there against milliseconds everywhere
/// else.
pub struct BitgetSigner {
    api_key: String,
    secret_key: String,
    passphrase: String,
}

impl BitgetSigner {
    pub fn new(api_key: String, secret_key: String, passphrase: String) -> Self {
        Self {
            api_key,
            secret_key,
            passphrase,
        }
    }

    fn hmac_base64(&self, prehash: &str) -> Result<String, AdapterError> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| AdapterError::AuthError(format!("Failed to create HMAC: {}", e)))?;
        mac.update(prehash.as_bytes());
        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn prehash(timestamp: u64, method: &str, request_path: &str, body: &str) -> String {
        format!("{}{}{}{}", timestamp, method, request_path, body)
    }

    /// Arguments for the private-stream `login` op. The signature covers
    /// a fixed verification path rather than a real endpoint.
    pub fn login_args(&self, timestamp_secs: i64) -> Result<WsLoginArgs, AdapterError> {
        let sign = self.hmac_base64(&format!("{}GET/user/verify", timestamp_secs))?;
        Ok(WsLoginArgs {
            api_key: self.api_key.clone(),
            passphrase: self.passphrase.clone(),
            timestamp: timestamp_secs,
            sign,
        })
    }
}

impl Signer for BitgetSigner {
    fn sign_request(
        &self,
        method: &str,
        endpoint: &str,
        query_string: &str,
        body: &[u8],
        timestamp: u64,
    ) -> Result<(HashMap<String, String>, Vec<(String, String)>), AdapterError> {
        // Query params are part of the signed path for GETs
        let request_path = if query_string.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}?{}", endpoint, query_string)
        };

        let body_str = std::str::from_utf8(body)
            .map_err(|e| AdapterError::AuthError(format!("Invalid body encoding: {}", e)))?;

        let prehash = Self::prehash(timestamp, method, &request_path, body_str);
        let signature = self.hmac_base64(&prehash)?;

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("locale".to_string(), "en-US".to_string());
        headers.insert("ACCESS-KEY".to_string(), self.api_key.clone());
        headers.insert("ACCESS-SIGN".to_string(), signature);
        headers.insert("ACCESS-TIMESTAMP".to_string(), timestamp.to_string());
        headers.insert("ACCESS-PASSPHRASE".to_string(), self.passphrase.clone());

        // Return the query params untouched so the transmitted query
        // string stays byte-identical to the signed one
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
