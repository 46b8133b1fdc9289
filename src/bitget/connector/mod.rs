use crate::bitget::instrument::InstrumentMeta;
use crate::bitget::rest::BitgetRestClient;
use crate::core::errors::AdapterError;
use crate::core::kernel::RestClient;
use crate::core::traits::{
    AccountInfo, ExchangeAdapter, MarketDataSource, OrderPlacer, TradeHistory,
};
use crate::core::types::{
    Candle, CandleInterval, Fill, IncomeRecord, MarketTick, Order, OrderRequest, PositionState,
    PriceEstimates, Ticker,
};
use async_trait::async_trait;
use std::sync::Arc;

pub mod account;
pub mod history;
pub mod market_data;
pub mod trading;

pub use account::Account;
pub use history::History;
pub use market_data::MarketData;
pub use trading::Trading;

/// Connector bound to one instrument, composing the sub-trait
/// implementations over a shared REST client and contract metadata.
pub struct BitgetConnector<R: RestClient> {
    pub market: MarketData<R>,
    pub trading: Trading<R>,
    pub account: Account<R>,
    pub history: History<R>,
    meta: Arc<InstrumentMeta>,
}

impl<R: RestClient> BitgetConnector<R> {
    pub fn new(rest: BitgetRestClient<R>, meta: InstrumentMeta, broker_code: String) -> Self {
        let rest = Arc::new(rest);
        let meta = Arc::new(meta);
        Self {
            market: MarketData::new(Arc::clone(&rest), Arc::clone(&meta)),
            trading: Trading::new(Arc::clone(&rest), Arc::clone(&meta), broker_code),
            account: Account::new(Arc::clone(&rest), Arc::clone(&meta)),
            history: History::new(rest, Arc::clone(&meta)),
            meta,
        }
    }

    /// The resolved contract metadata this connector is bound to.
    pub fn instrument(&self) -> &InstrumentMeta {
        &self.meta
    }

    /// Best-effort application of margin mode and leverage defaults.
    pub async fn init_exchange_config(&self) {
        self.account.init_exchange_config().await;
    }
}

#[async_trait]
impl<R: RestClient + 'static> MarketDataSource for BitgetConnector<R> {
    async fn fetch_ticker(&self, symbol: Option<&str>) -> Result<Ticker, AdapterError> {
        self.market.fetch_ticker(symbol).await
    }

    async fn fetch_ohlcv(
        &self,
        symbol: Option<&str>,
        start_time: Option<i64>,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, AdapterError> {
        self.market.fetch_ohlcv(symbol, start_time, interval).await
    }

    async fn fetch_trades(&self) -> Vec<MarketTick> {
        self.market.fetch_trades().await
    }
}

#[async_trait]
impl<R: RestClient + 'static> OrderPlacer for BitgetConnector<R> {
    async fn place_order(&self, request: &OrderRequest) -> Result<Order, AdapterError> {
        self.trading.place_order(request).await
    }

    async fn cancel_order(&self, order: &Order) -> Result<Order, AdapterError> {
        self.trading.cancel_order(order).await
    }

    async fn fetch_open_orders(&self) -> Result<Vec<Order>, AdapterError> {
        self.trading.fetch_open_orders().await
    }
}

#[async_trait]
impl<R: RestClient + 'static> AccountInfo for BitgetConnector<R> {
    async fn fetch_position(
        &self,
        estimates: &PriceEstimates,
    ) -> Result<PositionState, AdapterError> {
        self.account.fetch_position(estimates).await
    }
}

#[async_trait]
impl<R: RestClient + 'static> TradeHistory for BitgetConnector<R> {
    async fn fetch_fills(&self, from_id: Option<i64>, start_time: Option<i64>) -> Vec<Fill> {
        self.history.fetch_fills(from_id, start_time).await
    }

    async fn fetch_income(
        &self,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<Vec<IncomeRecord>, AdapterError> {
        self.history.fetch_income(start_time, end_time).await
    }
}

impl<R: RestClient + 'static> ExchangeAdapter for BitgetConnector<R> {}
