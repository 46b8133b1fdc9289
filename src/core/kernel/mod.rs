/// Transport kernel - the venue-agnostic REST and WebSocket layer.
///
/// Everything in here is plain plumbing: HTTP dispatch, WebSocket session
/// lifecycle, and the seams the venue layer plugs into. No endpoint
/// paths, field names or signing rules live here.
///
/// # Components
///
/// ## Transport
/// - `RestClient`: unified HTTP client interface (GET/POST)
/// - `WsSession`: WebSocket connection management
/// - `ReconnectWs`: automatic reconnection wrapper with login replay
///
/// ## Seams
/// - `Signer`: request authentication, implemented per venue
/// - `WsCodec`: venue-specific frame encoding/decoding
///
/// # Example
///
/// ```rust,no_run
/// use bitgetx::bitget::signer::BitgetSigner;
/// use bitgetx::core::kernel::{RestClient, RestClientBuilder, RestClientConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RestClientConfig::new(
///     "https://api.bitget.com".to_string(),
///     "bitget".to_string(),
/// );
/// let signer = Arc::new(BitgetSigner::new(
///     "api_key".to_string(),
///     "secret_key".to_string(),
///     "passphrase".to_string(),
/// ));
/// let rest = RestClientBuilder::new(config).with_signer(signer).build()?;
///
/// let contracts = rest
///     .get("/api/mix/v1/market/contracts", &[("productType", "umcbl")], false)
///     .await?;
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod rest;
pub mod signer;
pub mod ws;

// Re-export key types for convenience
pub use codec::WsCodec;
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{SignatureResult, Signer};
pub use ws::{LoginFrames, ReconnectWs, TungsteniteWs, WsConfig, WsSession};
