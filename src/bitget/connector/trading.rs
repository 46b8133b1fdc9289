use crate::bitget::conversions::{order_from_open_order, order_intent};
use crate::bitget::instrument::InstrumentMeta;
use crate::bitget::params::Params;
use crate::bitget::rest::BitgetRestClient;
use crate::core::errors::AdapterError;
use crate::core::kernel::RestClient;
use crate::core::time::now_ms;
use crate::core::traits::OrderPlacer;
use crate::core::types::{Order, OrderRequest, OrderType};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use tracing::error;

/// Order lifecycle operations for one bound instrument.
pub struct Trading<R: RestClient> {
    rest: Arc<BitgetRestClient<R>>,
    meta: Arc<InstrumentMeta>,
    broker_code: String,
}

impl<R: RestClient> Trading<R> {
    pub fn new(
        rest: Arc<BitgetRestClient<R>>,
        meta: Arc<InstrumentMeta>,
        broker_code: String,
    ) -> Self {
        Self {
            rest,
            meta,
            broker_code,
        }
    }

    /// Client order id: broker tag, caller correlation id, the low
    /// digits of the clock and a random suffix. Unique in practice
    /// without a central counter.
    fn client_order_id(&self, custom_id: Option<&str>) -> String {
        let timestamp = now_ms().to_string();
        let tail = &timestamp[timestamp.len().saturating_sub(6)..];
        let noise = rand::thread_rng().gen_range(0..10_000);
        format!(
            "{}#{}_{}_{}",
            self.broker_code,
            custom_id.unwrap_or("0"),
            tail,
            noise
        )
    }
}

#[async_trait]
impl<R: RestClient + 'static> OrderPlacer for Trading<R> {
    async fn place_order(&self, request: &OrderRequest) -> Result<Order, AdapterError> {
        let client_oid = self.client_order_id(request.custom_id.as_deref());
        let mut params = Params::new()
            .with("symbol", &self.meta.symbol)
            .with("marginCoin", &self.meta.margin_coin)
            .with("size", request.qty)
            .with("side", order_intent(request.side, request.position_side))
            .with("orderType", request.order_type)
            .with("presetTakeProfitPrice", "")
            .with("presetStopLossPrice", "")
            .with("clientOid", &client_oid);
        params = match request.order_type {
            // Never submit a marketable limit order
            OrderType::Limit => params
                .with("timeInForceValue", "post_only")
                .with("price", request.price),
            OrderType::Market => params.with("timeInForceValue", "normal"),
        };

        match self.rest.place_order(&params).await {
            Ok(result) => Ok(Order {
                order_id: result.order_id,
                custom_id: Some(client_oid),
                symbol: self.meta.symbol.clone(),
                price: request.price,
                qty: request.qty,
                side: request.side,
                position_side: request.position_side,
                order_type: request.order_type,
                timestamp: now_ms(),
            }),
            Err(e) => {
                error!(
                    "Order placement failed for {} {:?}: {}",
                    self.meta.symbol, request, e
                );
                Err(e)
            }
        }
    }

    async fn cancel_order(&self, order: &Order) -> Result<Order, AdapterError> {
        match self
            .rest
            .cancel_order(&self.meta.symbol, &self.meta.margin_coin, &order.order_id)
            .await
        {
            Ok(result) => Ok(Order {
                order_id: result.order_id,
                custom_id: order.custom_id.clone(),
                symbol: self.meta.symbol.clone(),
                price: order.price,
                qty: order.qty,
                side: order.side,
                position_side: order.position_side,
                order_type: order.order_type,
                timestamp: order.timestamp,
            }),
            Err(e) => {
                // Open-order state is stale until the caller re-fetches
                error!(
                    "Cancellation failed for order {} on {}: {}",
                    order.order_id, self.meta.symbol, e
                );
                Err(e)
            }
        }
    }

    async fn fetch_open_orders(&self) -> Result<Vec<Order>, AdapterError> {
        let rows = self.rest.get_open_orders(&self.meta.symbol).await?;
        rows.iter().map(order_from_open_order).collect()
    }
}
