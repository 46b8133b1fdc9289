use crate::bitget::conversions::{candle_from_row, market_tick_from_wire, ticker_from_wire};
use crate::bitget::instrument::InstrumentMeta;
use crate::bitget::rest::BitgetRestClient;
use crate::core::errors::AdapterError;
use crate::core::kernel::RestClient;
use crate::core::time::ms_to_date;
use crate::core::traits::MarketDataSource;
use crate::core::types::{Candle, CandleInterval, MarketTick, OrderBookTop, Ticker};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Candle requests always span this many bars.
const CANDLE_LIMIT: i64 = 100;
const TRADES_LIMIT: u32 = 100;

/// Market data operations for one bound instrument.
pub struct MarketData<R: RestClient> {
    rest: Arc<BitgetRestClient<R>>,
    meta: Arc<InstrumentMeta>,
}

impl<R: RestClient> MarketData<R> {
    pub fn new(rest: Arc<BitgetRestClient<R>>, meta: Arc<InstrumentMeta>) -> Self {
        Self { rest, meta }
    }

    /// Seeds the caller's book-top state from the ticker; the trade
    /// stream keeps it current afterwards.
    pub async fn fetch_order_book_top(&self) -> Result<OrderBookTop, AdapterError> {
        let wire = self.rest.get_ticker(&self.meta.symbol).await?;
        let ticker = ticker_from_wire(&wire)?;
        Ok(OrderBookTop {
            bid: ticker.bid,
            ask: ticker.ask,
            last: ticker.last,
        })
    }
}

#[async_trait]
impl<R: RestClient + 'static> MarketDataSource for MarketData<R> {
    async fn fetch_ticker(&self, symbol: Option<&str>) -> Result<Ticker, AdapterError> {
        let symbol = symbol.unwrap_or(&self.meta.symbol);
        let wire = self.rest.get_ticker(symbol).await?;
        ticker_from_wire(&wire)
    }

    async fn fetch_ohlcv(
        &self,
        symbol: Option<&str>,
        start_time: Option<i64>,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, AdapterError> {
        let symbol = symbol.unwrap_or(&self.meta.symbol);
        let secs = interval.secs();
        let start = match start_time {
            Some(start) => start,
            // Default to the most recent full window of candles
            None => self.rest.get_server_time().await? - 1000 * secs * CANDLE_LIMIT,
        };
        let end = start + 1000 * secs * CANDLE_LIMIT;
        let rows = self.rest.get_candles(symbol, secs, start, end).await?;
        rows.iter().map(|row| candle_from_row(row)).collect()
    }

    async fn fetch_trades(&self) -> Vec<MarketTick> {
        let rows = match self
            .rest
            .get_market_fills(&self.meta.symbol, TRADES_LIMIT)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Error fetching trades for {}: {}", self.meta.symbol, e);
                return Vec::new();
            }
        };
        match rows.iter().map(market_tick_from_wire).collect::<Result<Vec<_>, _>>() {
            Ok(ticks) => {
                if let Some(latest) = ticks.first() {
                    debug!(
                        "Fetched {} trades for {} up to {}",
                        ticks.len(),
                        self.meta.symbol,
                        ms_to_date(latest.timestamp)
                    );
                }
                ticks
            }
            Err(e) => {
                warn!("Error decoding trades for {}: {}", self.meta.symbol, e);
                Vec::new()
            }
        }
    }
}
