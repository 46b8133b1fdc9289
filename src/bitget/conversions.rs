//! Mapping between mix v1 wire rows and the adapter's own schema.

use crate::bitget::types::{BitgetFill, BitgetMarketFill, BitgetOpenOrder, BitgetTicker};
use crate::core::errors::AdapterError;
use crate::core::types::{Candle, Fill, MarketTick, Order, OrderType, PositionSide, Side, Ticker};

/// The four-way directional vocabulary of the venue. Order placement,
/// open-order listings, fills and stream events all translate through
/// this one table; directional semantics live nowhere else.
pub const ORDER_INTENTS: [(Side, PositionSide, &str); 4] = [
    (Side::Buy, PositionSide::Long, "open_long"),
    (Side::Sell, PositionSide::Long, "close_long"),
    (Side::Buy, PositionSide::Short, "close_short"),
    (Side::Sell, PositionSide::Short, "open_short"),
];

/// Venue intent for an abstract (side, position side) pair.
pub fn order_intent(side: Side, position_side: PositionSide) -> &'static str {
    ORDER_INTENTS
        .iter()
        .find(|(s, ps, _)| *s == side && *ps == position_side)
        // the table enumerates every pair of both enums
        .map_or("open_long", |(_, _, intent)| intent)
}

/// Exact inverse of [`order_intent`]. Unknown intents are a decode error.
pub fn intent_direction(intent: &str) -> Result<(Side, PositionSide), AdapterError> {
    ORDER_INTENTS
        .iter()
        .find(|(_, _, i)| *i == intent)
        .map(|(side, position_side, _)| (*side, *position_side))
        .ok_or_else(|| {
            AdapterError::DeserializationError(format!("unknown order intent '{}'", intent))
        })
}

/// Side for an open-order listing row. Intents that open longs or close
/// shorts are bids; everything else, including unrecognized values, is
/// treated as an ask.
pub fn listed_order_side(intent: &str) -> Side {
    ORDER_INTENTS
        .iter()
        .find(|(_, _, i)| *i == intent)
        .map_or(Side::Sell, |(side, _, _)| *side)
}

/// Order stream pushes carry either a plain `buy`/`sell` or a
/// directional intent depending on the channel revision.
pub fn side_from_wire(value: &str) -> Result<Side, AdapterError> {
    value
        .parse()
        .or_else(|_| intent_direction(value).map(|(side, _)| side))
}

pub fn parse_f64(field: &str, value: &str) -> Result<f64, AdapterError> {
    value.parse().map_err(|_| {
        AdapterError::DeserializationError(format!("invalid {} '{}'", field, value))
    })
}

pub fn parse_i64(field: &str, value: &str) -> Result<i64, AdapterError> {
    value.parse().map_err(|_| {
        AdapterError::DeserializationError(format!("invalid {} '{}'", field, value))
    })
}

pub fn ticker_from_wire(ticker: &BitgetTicker) -> Result<Ticker, AdapterError> {
    Ok(Ticker {
        symbol: ticker.symbol.clone(),
        bid: parse_f64("bestBid", &ticker.best_bid)?,
        ask: parse_f64("bestAsk", &ticker.best_ask)?,
        last: parse_f64("last", &ticker.last)?,
    })
}

pub fn order_from_open_order(row: &BitgetOpenOrder) -> Result<Order, AdapterError> {
    // Resting orders without an explicit type can only be limit orders
    let order_type = match row.order_type.as_deref() {
        Some(raw) => raw.parse()?,
        None => OrderType::Limit,
    };
    Ok(Order {
        order_id: row.order_id.clone(),
        custom_id: row.client_oid.clone(),
        symbol: row.symbol.clone(),
        price: parse_f64("price", &row.price)?,
        qty: parse_f64("size", &row.size)?,
        side: listed_order_side(&row.side),
        position_side: row.pos_side.parse()?,
        order_type,
        timestamp: parse_i64("cTime", &row.c_time)?,
    })
}

pub fn fill_from_wire(row: &BitgetFill, quote_coin: &str) -> Result<Fill, AdapterError> {
    let (side, position_side) = intent_direction(&row.side)?;
    Ok(Fill {
        id: parse_i64("tradeId", &row.trade_id)?,
        order_id: parse_i64("orderId", &row.order_id)?,
        symbol: row.symbol.clone(),
        side,
        price: parse_f64("price", &row.price)?,
        qty: parse_f64("sizeQty", &row.size_qty)?,
        realized_pnl: parse_f64("profit", &row.profit)?,
        cost: parse_f64("fillAmount", &row.fill_amount)?,
        fee_paid: parse_f64("fee", &row.fee)?,
        fee_token: quote_coin.to_string(),
        timestamp: parse_i64("cTime", &row.c_time)?,
        position_side,
        is_maker: None,
    })
}

pub fn market_tick_from_wire(row: &BitgetMarketFill) -> Result<MarketTick, AdapterError> {
    Ok(MarketTick {
        trade_id: Some(parse_i64("tradeId", &row.trade_id)?),
        timestamp: parse_i64("timestamp", &row.timestamp)?,
        price: parse_f64("price", &row.price)?,
        qty: parse_f64("size", &row.size)?,
        is_buyer_maker: row.side == "sell",
    })
}

/// Candle rows arrive as positional string arrays, oldest first.
pub fn candle_from_row(row: &[String]) -> Result<Candle, AdapterError> {
    if row.len() < 6 {
        return Err(AdapterError::DeserializationError(format!(
            "candle row has {} fields, expected at least 6",
            row.len()
        )));
    }
    Ok(Candle {
        timestamp: parse_i64("timestamp", &row[0])?,
        open: parse_f64("open", &row[1])?,
        high: parse_f64("high", &row[2])?,
        low: parse_f64("low", &row[3])?,
        close: parse_f64("close", &row[4])?,
        volume: parse_f64("volume", &row[5])?,
    })
}
