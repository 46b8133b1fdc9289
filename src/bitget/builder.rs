use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bitget::codec::BitgetCodec;
use crate::bitget::connector::BitgetConnector;
use crate::bitget::instrument::{InstrumentMeta, ProductType};
use crate::bitget::rest::BitgetRestClient;
use crate::bitget::signer::BitgetSigner;
use crate::bitget::streams::{login_frames, spawn_market_stream, spawn_user_stream};
use crate::core::config::ExchangeConfig;
use crate::core::errors::AdapterError;
use crate::core::kernel::{
    ReconnectWs, ReqwestRest, RestClientBuilder, RestClientConfig, TungsteniteWs,
};
use crate::core::types::{MarketTick, UserStreamEvent};

const DEFAULT_BASE_URL: &str = "https://api.bitget.com";

/// Mix v1 stream endpoint, shared by public and private channels.
pub const DEFAULT_WS_URL: &str = "wss://ws.bitget.com/mix/v1/stream";

const DEFAULT_BROKER_CODE: &str = "bitgetx";
const EVENT_BUFFER: usize = 256;

/// Receiver ends of the spawned stream tasks.
///
/// Dropping a receiver is the shutdown signal for its task: the next event
/// fails to send, the task closes its socket and exits. The join handles are
/// exposed so callers can await a clean exit.
pub struct BitgetStreams {
    pub market: mpsc::Receiver<MarketTick>,
    pub market_task: JoinHandle<()>,
    pub user: Option<mpsc::Receiver<UserStreamEvent>>,
    pub user_task: Option<JoinHandle<()>>,
}

/// Create a Bitget connector with REST-only support
///
/// Resolves the symbol against the venue's contract listing, so this performs
/// one public REST call before returning.
pub async fn build_connector(
    config: ExchangeConfig,
    symbol: &str,
) -> Result<BitgetConnector<ReqwestRest>, AdapterError> {
    build_connector_with_broker_code(config, symbol, DEFAULT_BROKER_CODE).await
}

/// Create a Bitget connector tagging client order ids with a custom broker code
pub async fn build_connector_with_broker_code(
    config: ExchangeConfig,
    symbol: &str,
    broker_code: &str,
) -> Result<BitgetConnector<ReqwestRest>, AdapterError> {
    let signer = credential_signer(&config);
    let rest = build_rest(&config, signer)?;
    let meta = resolve_instrument(&rest, symbol).await?;

    Ok(BitgetConnector::new(rest, meta, broker_code.to_string()))
}

/// Create a Bitget connector together with its WebSocket stream tasks
///
/// The market stream is public and always started. The user stream requires
/// credentials and is only started when the config carries them.
pub async fn build_connector_with_streams(
    config: ExchangeConfig,
    symbol: &str,
) -> Result<(BitgetConnector<ReqwestRest>, BitgetStreams), AdapterError> {
    let signer = credential_signer(&config);
    let rest = build_rest(&config, signer.clone())?;
    let meta = resolve_instrument(&rest, symbol).await?;

    let (market, market_task) =
        spawn_market_stream(reconnecting_session(), meta.symbol_stripped.clone(), EVENT_BUFFER);

    let (user, user_task) = match signer {
        Some(signer) => {
            let session = reconnecting_session().with_login_frames(login_frames(signer));
            let (rx, task) = spawn_user_stream(session, meta.clone(), EVENT_BUFFER);
            (Some(rx), Some(task))
        }
        None => (None, None),
    };

    let connector = BitgetConnector::new(rest, meta, DEFAULT_BROKER_CODE.to_string());
    let streams = BitgetStreams {
        market,
        market_task,
        user,
        user_task,
    };
    Ok((connector, streams))
}

fn credential_signer(config: &ExchangeConfig) -> Option<Arc<BitgetSigner>> {
    if config.has_credentials() {
        Some(Arc::new(BitgetSigner::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
            config.passphrase().to_string(),
        )))
    } else {
        None
    }
}

fn build_rest(
    config: &ExchangeConfig,
    signer: Option<Arc<BitgetSigner>>,
) -> Result<BitgetRestClient<ReqwestRest>, AdapterError> {
    // Create REST client with Bitget configuration
    let rest_config = RestClientConfig::new(
        config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        "bitget".to_string(),
    )
    .with_timeout(30);

    let mut rest_builder = RestClientBuilder::new(rest_config);

    // Add authentication if available
    if let Some(signer) = signer {
        rest_builder = rest_builder.with_signer(signer);
    }

    Ok(BitgetRestClient::new(rest_builder.build()?))
}

fn reconnecting_session() -> ReconnectWs<BitgetCodec, TungsteniteWs<BitgetCodec>> {
    let base_ws = TungsteniteWs::new(DEFAULT_WS_URL.to_string(), "bitget".to_string(), BitgetCodec);
    ReconnectWs::new(base_ws)
        .with_max_reconnect_attempts(10)
        .with_reconnect_delay(Duration::from_secs(2))
        .with_auto_resubscribe(true)
}

async fn resolve_instrument(
    rest: &BitgetRestClient<ReqwestRest>,
    symbol: &str,
) -> Result<InstrumentMeta, AdapterError> {
    let product_type = ProductType::for_symbol(symbol)?;
    let contracts = rest.get_contracts(product_type.as_str()).await?;
    InstrumentMeta::resolve(symbol, &contracts)
}
