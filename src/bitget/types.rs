use serde::{Deserialize, Serialize};

/// Standard mix v1 response envelope. `code` is `"00000"` on success;
/// anything else carries a venue error in `msg`.
#[derive(Debug, Deserialize)]
pub struct BitgetResponse<T> {
    pub code: String,
    pub msg: String,
    #[serde(rename = "requestTime")]
    pub request_time: Option<i64>,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BitgetContract {
    pub symbol: String,
    #[serde(rename = "baseCoin")]
    pub base_coin: String,
    #[serde(rename = "quoteCoin")]
    pub quote_coin: String,
    #[serde(rename = "pricePlace")]
    pub price_place: String,
    #[serde(rename = "priceEndStep")]
    pub price_end_step: String,
    #[serde(rename = "volumePlace")]
    pub volume_place: String,
    #[serde(rename = "minTradeNum")]
    pub min_trade_num: String,
}

#[derive(Debug, Deserialize)]
pub struct BitgetTicker {
    pub symbol: String,
    #[serde(rename = "bestBid")]
    pub best_bid: String,
    #[serde(rename = "bestAsk")]
    pub best_ask: String,
    pub last: String,
}

#[derive(Debug, Deserialize)]
pub struct BitgetPosition {
    #[serde(rename = "holdSide")]
    pub hold_side: String,
    pub total: String,
    #[serde(rename = "averageOpenPrice")]
    pub average_open_price: String,
    #[serde(rename = "liquidationPrice")]
    pub liquidation_price: String,
}

#[derive(Debug, Deserialize)]
pub struct BitgetBalance {
    #[serde(rename = "marginCoin")]
    pub margin_coin: String,
    pub available: String,
}

/// `placeOrder` and `cancel-order` both return this pair.
#[derive(Debug, Deserialize)]
pub struct BitgetOrderResult {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "clientOid")]
    pub client_oid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BitgetOpenOrder {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "clientOid")]
    pub client_oid: Option<String>,
    pub symbol: String,
    pub price: String,
    pub size: String,
    /// Directional intent, e.g. `open_long` or `close_short`.
    pub side: String,
    #[serde(rename = "posSide")]
    pub pos_side: String,
    #[serde(rename = "orderType")]
    pub order_type: Option<String>,
    #[serde(rename = "cTime")]
    pub c_time: String,
}

#[derive(Debug, Deserialize)]
pub struct BitgetFill {
    pub symbol: String,
    #[serde(rename = "tradeId")]
    pub trade_id: String,
    #[serde(rename = "orderId")]
    pub order_id: String,
    /// Directional intent, same vocabulary as open orders.
    pub side: String,
    pub price: String,
    #[serde(rename = "sizeQty")]
    pub size_qty: String,
    pub profit: String,
    #[serde(rename = "fillAmount")]
    pub fill_amount: String,
    pub fee: String,
    #[serde(rename = "cTime")]
    pub c_time: String,
}

#[derive(Debug, Deserialize)]
pub struct BitgetMarketFill {
    #[serde(rename = "tradeId")]
    pub trade_id: String,
    pub price: String,
    pub size: String,
    /// Taker side, `buy` or `sell`.
    pub side: String,
    pub timestamp: String,
}

/// WebSocket `login` op arguments. `timestamp` is in seconds and is
/// serialized as a JSON number, unlike the millisecond string REST uses.
#[derive(Debug, Clone, Serialize)]
pub struct WsLoginArgs {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub passphrase: String,
    pub timestamp: i64,
    pub sign: String,
}

/// Subscription target for `subscribe`/`unsubscribe` ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsSubscriptionArg {
    #[serde(rename = "instType")]
    pub inst_type: String,
    pub channel: String,
    #[serde(rename = "instId")]
    pub inst_id: String,
}

#[derive(Debug, Serialize)]
pub struct WsLoginRequest {
    pub op: String,
    pub args: Vec<WsLoginArgs>,
}

#[derive(Debug, Serialize)]
pub struct WsSubscriptionRequest {
    pub op: String,
    pub args: Vec<WsSubscriptionArg>,
}

/// Row of an `orders` channel push. Only `status == "new"` rows carry
/// the full order; removals may omit price and size.
#[derive(Debug, Clone, Deserialize)]
pub struct WsOrderData {
    #[serde(rename = "ordId")]
    pub ord_id: String,
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub px: Option<String>,
    #[serde(default)]
    pub sz: Option<String>,
    #[serde(rename = "ordType", default)]
    pub ord_type: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(rename = "posSide", default)]
    pub pos_side: Option<String>,
    #[serde(rename = "uTime", default)]
    pub u_time: Option<String>,
}

/// Row of a `positions` channel push. Snapshot rows without an average
/// open price are skipped by the standardizer.
#[derive(Debug, Clone, Deserialize)]
pub struct WsPositionData {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "holdSide")]
    pub hold_side: String,
    pub total: String,
    #[serde(rename = "averageOpenPrice", default)]
    pub average_open_price: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsAccountData {
    #[serde(rename = "marginCoin")]
    pub margin_coin: String,
    pub available: String,
}
