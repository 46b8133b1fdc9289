pub mod codec;
pub mod conversions;
pub mod instrument;
pub mod params;
pub mod signer;
pub mod types;

pub mod builder;
pub mod connector;
pub mod rest;
pub mod streams;

// Re-export main components
pub use builder::{
    build_connector, build_connector_with_broker_code, build_connector_with_streams,
    BitgetStreams, DEFAULT_WS_URL,
};
pub use codec::{trade_stream, user_stream, BitgetCodec, BitgetWsEvent};
pub use connector::{Account, BitgetConnector, History, MarketData, Trading};
pub use instrument::{InstrumentMeta, ProductType};
pub use params::Params;
pub use rest::BitgetRestClient;
pub use signer::BitgetSigner;
pub use streams::{login_frames, spawn_market_stream, spawn_user_stream};
pub use types::{
    BitgetBalance, BitgetContract, BitgetFill, BitgetMarketFill, BitgetOpenOrder,
    BitgetOrderResult, BitgetPosition, BitgetResponse, BitgetTicker, WsSubscriptionArg,
};
