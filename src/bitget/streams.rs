//! Long-lived stream tasks and the pure event standardizers they feed.
//!
//! Each stream runs as one spawned task owning its socket; the caller
//! receives standardized events over a channel and tears the stream
//! down by dropping the receiver.

use crate::bitget::codec::{trade_stream, user_stream, BitgetCodec, BitgetWsEvent};
use crate::bitget::conversions::{parse_f64, parse_i64, side_from_wire};
use crate::bitget::instrument::InstrumentMeta;
use crate::bitget::signer::BitgetSigner;
use crate::bitget::types::{WsAccountData, WsLoginRequest, WsOrderData, WsPositionData};
use crate::core::errors::AdapterError;
use crate::core::kernel::{LoginFrames, WsSession};
use crate::core::time::now_secs;
use crate::core::types::{MarketTick, Order, OrderRemoval, PositionSide, UserStreamEvent};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// The venue drops idle connections after 30s; ping just under that.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(27);
const PING_FRAME: &str = r#"{"op":"ping"}"#;
/// Private channels, subscribed together after login.
const USER_CHANNELS: [&str; 3] = ["account", "positions", "orders"];

/// Builds the login frames replayed on every (re)connect. Regenerating
/// per attempt keeps the second-resolution signature timestamp fresh.
pub fn login_frames(signer: Arc<BitgetSigner>) -> LoginFrames {
    Box::new(move || {
        let args = signer.login_args(now_secs())?;
        let request = WsLoginRequest {
            op: "login".to_string(),
            args: vec![args],
        };
        let json = serde_json::to_string(&request).map_err(|e| {
            AdapterError::SerializationError(format!("Failed to encode login frame: {}", e))
        })?;
        Ok(vec![Message::Text(json)])
    })
}

fn tick_from_row(row: &Value) -> Result<MarketTick, AdapterError> {
    let fields = row.as_array().ok_or_else(|| {
        AdapterError::DeserializationError("trade row is not an array".to_string())
    })?;
    if fields.len() < 4 {
        return Err(AdapterError::DeserializationError(format!(
            "trade row has {} fields, expected at least 4",
            fields.len()
        )));
    }
    let field = |idx: usize| {
        fields[idx].as_str().ok_or_else(|| {
            AdapterError::DeserializationError(format!("trade row field {} is not a string", idx))
        })
    };
    Ok(MarketTick {
        trade_id: None,
        timestamp: parse_i64("timestamp", field(0)?)?,
        price: parse_f64("price", field(1)?)?,
        qty: parse_f64("qty", field(2)?)?,
        is_buyer_maker: field(3)? == "sell",
    })
}

/// Ticks from a public trade push. Frames that are not an `update`
/// action produce nothing; malformed rows are skipped, not fatal.
pub fn standardize_market_event(event: &BitgetWsEvent) -> Vec<MarketTick> {
    let BitgetWsEvent::Trades { action, rows } = event else {
        return Vec::new();
    };
    if action != "update" {
        return Vec::new();
    }
    rows.iter()
        .filter_map(|row| match tick_from_row(row) {
            Ok(tick) => Some(tick),
            Err(e) => {
                warn!("Skipping malformed trade row: {}", e);
                None
            }
        })
        .collect()
}

fn new_order_from_push(row: WsOrderData) -> Result<Order, AdapterError> {
    let require = |field: Option<String>, name: &str| {
        field.ok_or_else(|| {
            AdapterError::DeserializationError(format!("order push missing {}", name))
        })
    };
    let px = require(row.px, "px")?;
    let sz = require(row.sz, "sz")?;
    let side = require(row.side, "side")?;
    let pos_side = require(row.pos_side, "posSide")?;
    let ord_type = require(row.ord_type, "ordType")?;
    let u_time = require(row.u_time, "uTime")?;
    Ok(Order {
        order_id: row.ord_id,
        custom_id: None,
        symbol: row.inst_id,
        price: parse_f64("px", &px)?,
        qty: parse_f64("sz", &sz)?,
        side: side_from_wire(&side)?,
        position_side: pos_side.parse()?,
        order_type: ord_type.parse()?,
        timestamp: parse_i64("uTime", &u_time)?,
    })
}

fn order_event(
    row: &Value,
    meta: &InstrumentMeta,
) -> Result<Option<UserStreamEvent>, AdapterError> {
    let order: WsOrderData = serde_json::from_value(row.clone())
        .map_err(|e| AdapterError::DeserializationError(format!("bad order row: {}", e)))?;
    if order.inst_id != meta.symbol {
        return Ok(None);
    }
    let Some(status) = order.status.clone() else {
        return Ok(None);
    };
    let event = match status.as_str() {
        "cancelled" => Some(UserStreamEvent::OrderRemoved {
            order_id: order.ord_id,
            reason: OrderRemoval::Cancelled,
        }),
        "partial-fill" => Some(UserStreamEvent::OrderRemoved {
            order_id: order.ord_id,
            reason: OrderRemoval::PartiallyFilled,
        }),
        "full-fill" => Some(UserStreamEvent::OrderRemoved {
            order_id: order.ord_id,
            reason: OrderRemoval::Filled,
        }),
        "new" => Some(UserStreamEvent::NewOpenOrder(new_order_from_push(order)?)),
        _ => None,
    };
    Ok(event)
}

fn position_event(
    row: &Value,
    meta: &InstrumentMeta,
) -> Result<Option<UserStreamEvent>, AdapterError> {
    let position: WsPositionData = serde_json::from_value(row.clone())
        .map_err(|e| AdapterError::DeserializationError(format!("bad position row: {}", e)))?;
    if position.inst_id != meta.symbol {
        return Ok(None);
    }
    // Snapshot rows without an entry price carry nothing actionable
    let Some(avg_price) = position.average_open_price.as_deref() else {
        return Ok(None);
    };
    let position_side: PositionSide = position.hold_side.parse()?;
    let magnitude = meta.round_qty(parse_f64("total", &position.total)?.abs());
    let size = match position_side {
        PositionSide::Long => magnitude,
        PositionSide::Short => -magnitude,
    };
    Ok(Some(UserStreamEvent::PositionUpdate {
        position_side,
        size,
        price: meta.truncate_price(parse_f64("averageOpenPrice", avg_price)?),
    }))
}

fn account_event(
    row: &Value,
    meta: &InstrumentMeta,
) -> Result<Option<UserStreamEvent>, AdapterError> {
    let balance: WsAccountData = serde_json::from_value(row.clone())
        .map_err(|e| AdapterError::DeserializationError(format!("bad account row: {}", e)))?;
    if balance.margin_coin == meta.margin_coin || balance.margin_coin == meta.quote_coin {
        Ok(Some(UserStreamEvent::WalletBalance {
            balance: parse_f64("available", &balance.available)?,
        }))
    } else {
        Ok(None)
    }
}

/// Partial-state updates from a private push. Rows for other symbols
/// are filtered silently; malformed rows are skipped with a warning.
pub fn standardize_user_event(
    event: &BitgetWsEvent,
    meta: &InstrumentMeta,
) -> Vec<UserStreamEvent> {
    type RowFn = fn(&Value, &InstrumentMeta) -> Result<Option<UserStreamEvent>, AdapterError>;
    let (rows, decode): (&[Value], RowFn) = match event {
        BitgetWsEvent::Orders { rows } => (rows, order_event),
        BitgetWsEvent::Positions { rows } => (rows, position_event),
        BitgetWsEvent::Account { rows } => (rows, account_event),
        _ => return Vec::new(),
    };
    rows.iter()
        .filter_map(|row| match decode(row, meta) {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping malformed user stream row: {}", e);
                None
            }
        })
        .collect()
}

async fn send_heartbeat<S: WsSession<BitgetCodec>>(session: &mut S, label: &str) {
    let ping = Message::Text(PING_FRAME.to_string());
    if let Err(e) = session.send_raw(ping).await {
        warn!("Failed to send {} heartbeat: {}", label, e);
    }
}

async fn run_market_stream<S>(mut session: S, symbol_stripped: String, tx: mpsc::Sender<MarketTick>)
where
    S: WsSession<BitgetCodec>,
{
    if let Err(e) = session.connect().await {
        error!("Market stream connect failed: {}", e);
        return;
    }
    if let Err(e) = session.subscribe(&[trade_stream(&symbol_stripped)]).await {
        error!("Market stream subscribe failed: {}", e);
        return;
    }

    let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
    loop {
        tokio::select! {
            _ = heartbeat.tick() => send_heartbeat(&mut session, "market").await,
            message = session.next_message() => match message {
                Some(Ok(event)) => {
                    match &event {
                        BitgetWsEvent::SubscribeAck { arg } => {
                            info!("Market stream subscribed to {}:{}", arg.channel, arg.inst_id);
                        }
                        BitgetWsEvent::Error { code, message } => {
                            warn!("Market stream error {}: {}", code, message);
                        }
                        _ => {}
                    }
                    for tick in standardize_market_event(&event) {
                        if tx.send(tick).await.is_err() {
                            let _ = session.close().await;
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    error!("Market stream failed: {}", e);
                    break;
                }
                None => break,
            }
        }
    }
    let _ = session.close().await;
}

async fn run_user_stream<S>(mut session: S, meta: InstrumentMeta, tx: mpsc::Sender<UserStreamEvent>)
where
    S: WsSession<BitgetCodec>,
{
    // Login frames are replayed by the session itself on each connect
    if let Err(e) = session.connect().await {
        error!("User stream connect failed: {}", e);
        return;
    }
    let streams: Vec<String> = USER_CHANNELS
        .iter()
        .map(|channel| user_stream(meta.product_type, channel))
        .collect();
    if let Err(e) = session.subscribe(&streams).await {
        error!("User stream subscribe failed: {}", e);
        return;
    }

    let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
    loop {
        tokio::select! {
            _ = heartbeat.tick() => send_heartbeat(&mut session, "user").await,
            message = session.next_message() => match message {
                Some(Ok(event)) => {
                    match &event {
                        BitgetWsEvent::LoginAck { code, message } => {
                            if code == "0" || code.is_empty() {
                                info!("User stream login acknowledged");
                            } else {
                                warn!("User stream login rejected {}: {}", code, message);
                            }
                        }
                        BitgetWsEvent::SubscribeAck { arg } => {
                            info!("User stream subscribed to {}:{}", arg.channel, arg.inst_id);
                        }
                        BitgetWsEvent::Error { code, message } => {
                            warn!("User stream error {}: {}", code, message);
                        }
                        BitgetWsEvent::Pong => debug!("User stream pong"),
                        _ => {}
                    }
                    for update in standardize_user_event(&event, &meta) {
                        if tx.send(update).await.is_err() {
                            let _ = session.close().await;
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    error!("User stream failed: {}", e);
                    break;
                }
                None => break,
            }
        }
    }
    let _ = session.close().await;
}

/// Spawns the public trade stream for a bare symbol. The task exits
/// when the receiver is dropped or the transport gives up reconnecting.
pub fn spawn_market_stream<S>(
    session: S,
    symbol_stripped: String,
    buffer: usize,
) -> (mpsc::Receiver<MarketTick>, JoinHandle<()>)
where
    S: WsSession<BitgetCodec> + 'static,
{
    let (tx, rx) = mpsc::channel(buffer);
    let handle = tokio::spawn(run_market_stream(session, symbol_stripped, tx));
    (rx, handle)
}

/// Spawns the private account/positions/orders stream. The session must
/// carry login frames so authentication survives reconnects.
pub fn spawn_user_stream<S>(
    session: S,
    meta: InstrumentMeta,
    buffer: usize,
) -> (mpsc::Receiver<UserStreamEvent>, JoinHandle<()>)
where
    S: WsSession<BitgetCodec> + 'static,
{
    let (tx, rx) = mpsc::channel(buffer);
    let handle = tokio::spawn(run_user_stream(session, meta, tx));
    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitget::instrument::ProductType;
    use serde_json::json;

    fn meta() -> InstrumentMeta {
        InstrumentMeta {
            symbol: "BTCUSDT_UMCBL".to_string(),
            symbol_stripped: "BTCUSDT".to_string(),
            product_type: ProductType::Umcbl,
            base_coin: "BTC".to_string(),
            quote_coin: "USDT".to_string(),
            margin_coin: "USDT".to_string(),
            price_step: 0.5,
            price_rounding: 1,
            qty_step: 0.001,
            min_qty: 0.001,
            min_cost: 5.0,
        }
    }

    fn trades(action: &str, rows: Vec<Value>) -> BitgetWsEvent {
        BitgetWsEvent::Trades {
            action: action.to_string(),
            rows,
        }
    }

    #[test]
    fn snapshot_frames_yield_no_ticks() {
        let event = trades(
            "snapshot",
            vec![json!(["1700000000000", "30000.5", "0.02", "sell"])],
        );
        assert!(standardize_market_event(&event).is_empty());
    }

    #[test]
    fn update_rows_become_ticks_and_bad_rows_are_skipped() {
        let event = trades(
            "update",
            vec![
                json!(["1700000000000", "30000.5", "0.02", "sell"]),
                json!(["not-a-ts", "30000.5", "0.02", "buy"]),
                json!(["1700000000500", "30001.0", "0.01", "buy"]),
            ],
        );
        let ticks = standardize_market_event(&event);
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].timestamp, 1_700_000_000_000);
        assert!(ticks[0].is_buyer_maker);
        assert!(!ticks[1].is_buyer_maker);
        assert_eq!(ticks[0].trade_id, None);
    }

    #[test]
    fn full_fill_removes_the_order_as_filled() {
        let event = BitgetWsEvent::Orders {
            rows: vec![json!({
                "ordId": "987",
                "instId": "BTCUSDT_UMCBL",
                "status": "full-fill"
            })],
        };
        let updates = standardize_user_event(&event, &meta());
        assert_eq!(
            updates,
            vec![UserStreamEvent::OrderRemoved {
                order_id: "987".to_string(),
                reason: OrderRemoval::Filled,
            }]
        );
    }

    #[test]
    fn cancelled_and_partial_fill_both_remove() {
        let event = BitgetWsEvent::Orders {
            rows: vec![
                json!({"ordId": "1", "instId": "BTCUSDT_UMCBL", "status": "cancelled"}),
                json!({"ordId": "2", "instId": "BTCUSDT_UMCBL", "status": "partial-fill"}),
            ],
        };
        let updates = standardize_user_event(&event, &meta());
        assert_eq!(updates.len(), 2);
        assert!(matches!(
            &updates[0],
            UserStreamEvent::OrderRemoved { reason: OrderRemoval::Cancelled, .. }
        ));
        assert!(matches!(
            &updates[1],
            UserStreamEvent::OrderRemoved { reason: OrderRemoval::PartiallyFilled, .. }
        ));
    }

    #[test]
    fn new_order_push_becomes_an_open_order() {
        let event = BitgetWsEvent::Orders {
            rows: vec![json!({
                "ordId": "555",
                "instId": "BTCUSDT_UMCBL",
                "status": "new",
                "px": "30000.5",
                "sz": "0.01",
                "ordType": "limit",
                "side": "buy",
                "posSide": "long",
                "uTime": "1700000000000"
            })],
        };
        let updates = standardize_user_event(&event, &meta());
        let UserStreamEvent::NewOpenOrder(order) = &updates[0] else {
            panic!("expected new open order, got {updates:?}");
        };
        assert_eq!(order.order_id, "555");
        assert_eq!(order.price, 30000.5);
        assert_eq!(order.side, crate::core::types::Side::Buy);
        assert_eq!(order.position_side, PositionSide::Long);
    }

    #[test]
    fn other_symbols_are_filtered() {
        let event = BitgetWsEvent::Orders {
            rows: vec![json!({
                "ordId": "9",
                "instId": "ETHUSDT_UMCBL",
                "status": "cancelled"
            })],
        };
        assert!(standardize_user_event(&event, &meta()).is_empty());
    }

    #[test]
    fn short_position_push_is_negative_and_truncated() {
        let event = BitgetWsEvent::Positions {
            rows: vec![json!({
                "instId": "BTCUSDT_UMCBL",
                "holdSide": "short",
                "total": "2.5004",
                "averageOpenPrice": "30123.46"
            })],
        };
        let updates = standardize_user_event(&event, &meta());
        assert_eq!(
            updates,
            vec![UserStreamEvent::PositionUpdate {
                position_side: PositionSide::Short,
                size: -2.5,
                price: 30123.4,
            }]
        );
    }

    #[test]
    fn position_rows_without_entry_price_are_skipped() {
        let event = BitgetWsEvent::Positions {
            rows: vec![json!({
                "instId": "BTCUSDT_UMCBL",
                "holdSide": "long",
                "total": "0"
            })],
        };
        assert!(standardize_user_event(&event, &meta()).is_empty());
    }

    #[test]
    fn account_rows_match_margin_or_quote_coin() {
        let matching = BitgetWsEvent::Account {
            rows: vec![json!({"marginCoin": "USDT", "available": "1234.5"})],
        };
        let updates = standardize_user_event(&matching, &meta());
        assert_eq!(
            updates,
            vec![UserStreamEvent::WalletBalance { balance: 1234.5 }]
        );

        let other = BitgetWsEvent::Account {
            rows: vec![json!({"marginCoin": "BTC", "available": "1.0"})],
        };
        assert!(standardize_user_event(&other, &meta()).is_empty());
    }

    #[test]
    fn acks_and_errors_standardize_to_nothing() {
        let ack = BitgetWsEvent::LoginAck {
            code: "0".to_string(),
            message: String::new(),
        };
        assert!(standardize_user_event(&ack, &meta()).is_empty());
        assert!(standardize_market_event(&ack).is_empty());
    }

    #[test]
    fn login_frames_regenerate_on_each_call() {
        let signer = Arc::new(BitgetSigner::new(
            "key".to_string(),
            "secret".to_string(),
            "pass".to_string(),
        ));
        let generate = login_frames(signer);
        let frames = generate().unwrap();
        assert_eq!(frames.len(), 1);
        let Message::Text(json) = &frames[0] else {
            panic!("expected text frame");
        };
        assert!(json.contains("\"op\":\"login\""));
        assert!(json.contains("\"apiKey\":\"key\""));
        assert!(json.contains("\"sign\":"));
    }
}
