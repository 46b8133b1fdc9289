use crate::core::{
    errors::AdapterError,
    types::{
        Candle, CandleInterval, Fill, IncomeRecord, MarketTick, Order, OrderRequest,
        PositionState, PriceEstimates, Ticker,
    },
};
use async_trait::async_trait;

#[async_trait]
pub trait MarketDataSource {
    /// Best bid/ask and last price. `symbol` overrides the bound symbol.
    async fn fetch_ticker(&self, symbol: Option<&str>) -> Result<Ticker, AdapterError>;

    /// Candles, oldest first. With no `start_time` the window ends near
    /// the venue's current server time.
    async fn fetch_ohlcv(
        &self,
        symbol: Option<&str>,
        start_time: Option<i64>,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, AdapterError>;

    /// Recent public trades. Best effort: any failure is logged and an
    /// empty batch returned, the caller simply polls again.
    async fn fetch_trades(&self) -> Vec<MarketTick>;
}

#[async_trait]
pub trait OrderPlacer {
    /// Submit one order. An `Err` means the outcome is unknown and the
    /// caller must reconcile against open orders, never that the order
    /// definitely failed.
    async fn place_order(&self, request: &OrderRequest) -> Result<Order, AdapterError>;

    /// Cancel one order. The same unknown-outcome contract as
    /// [`Self::place_order`] applies, and an `Err` additionally marks any
    /// cached order state as stale.
    async fn cancel_order(&self, order: &Order) -> Result<Order, AdapterError>;

    async fn fetch_open_orders(&self) -> Result<Vec<Order>, AdapterError>;
}

#[async_trait]
pub trait AccountInfo {
    /// Both position legs and the wallet balance as one atomic snapshot.
    /// `estimates` supplies the caller-owned price context used to value
    /// inverse-contract balances.
    async fn fetch_position(
        &self,
        estimates: &PriceEstimates,
    ) -> Result<PositionState, AdapterError>;
}

#[async_trait]
pub trait TradeHistory {
    /// Our own fills, ascending in time. Best effort like
    /// [`MarketDataSource::fetch_trades`].
    async fn fetch_fills(&self, from_id: Option<i64>, start_time: Option<i64>) -> Vec<Fill>;

    /// Balance-affecting history. Fails with
    /// [`AdapterError::NotSupported`] on venues without the endpoint.
    async fn fetch_income(
        &self,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<Vec<IncomeRecord>, AdapterError>;
}

// Composite trait for callers that need the full surface
#[async_trait]
pub trait ExchangeAdapter: MarketDataSource + OrderPlacer + AccountInfo + TradeHistory {}
