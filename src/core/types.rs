use crate::core::errors::AdapterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl FromStr for Side {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(AdapterError::InvalidParameters(format!(
                "unknown side: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Long or short leg of a hedge-mode position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

impl FromStr for PositionSide {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            other => Err(AdapterError::InvalidParameters(format!(
                "unknown position side: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
        }
    }
}

impl FromStr for OrderType {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "limit" => Ok(Self::Limit),
            "market" => Ok(Self::Market),
            other => Err(AdapterError::InvalidParameters(format!(
                "unknown order type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
}

/// Best bid/ask plus the last traded price, seeded from the ticker and
/// kept current by the caller from the trade stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookTop {
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
}

/// An order intent as the engine expresses it, before any venue mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub custom_id: Option<String>,
    pub price: f64,
    pub qty: f64,
    pub side: Side,
    pub position_side: PositionSide,
    pub order_type: OrderType,
}

/// An order as the venue knows it.
///
/// `timestamp` is the venue creation/update time in ms where the venue
/// reports one, otherwise the adapter's own clock at response time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub custom_id: Option<String>,
    pub symbol: String,
    pub price: f64,
    pub qty: f64,
    pub side: Side,
    pub position_side: PositionSide,
    pub order_type: OrderType,
    pub timestamp: i64,
}

/// One side of the position snapshot. Sizes are signed: the short leg
/// is stored as a negative magnitude, a flat leg is all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionLeg {
    pub size: f64,
    pub price: f64,
    pub liquidation_price: f64,
}

/// Atomic snapshot of both position legs and the wallet balance,
/// the balance always expressed in quote terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub long: PositionLeg,
    pub short: PositionLeg,
    pub wallet_balance: f64,
}

/// An executed trade of our own orders.
///
/// `is_maker` is `None` when the venue does not report maker/taker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub id: i64,
    pub order_id: i64,
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub qty: f64,
    pub realized_pnl: f64,
    pub cost: f64,
    pub fee_paid: f64,
    pub fee_token: String,
    pub timestamp: i64,
    pub position_side: PositionSide,
    pub is_maker: Option<bool>,
}

/// A balance-affecting event (realized pnl, funding, fees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub symbol: String,
    pub income_type: String,
    pub income: f64,
    pub token: String,
    pub timestamp: i64,
    pub transaction_id: i64,
    pub trade_id: String,
}

/// A public trade. `trade_id` is present on REST responses only; the
/// trade stream does not carry ids. `is_buyer_maker` is derived from the
/// aggressor side (a "sell" aggressor means the buyer was the maker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    pub trade_id: Option<i64>,
    pub timestamp: i64,
    pub price: f64,
    pub qty: f64,
    pub is_buyer_maker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// The closed set of candle intervals the venue serves.
///
/// Parsing is the precondition gate: an unsupported interval fails here,
/// before any request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour4,
    Hour12,
    Day1,
    Week1,
}

impl CandleInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Min1 => "1m",
            Self::Min5 => "5m",
            Self::Min15 => "15m",
            Self::Min30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Hour12 => "12h",
            Self::Day1 => "1d",
            Self::Week1 => "1w",
        }
    }

    /// Interval length in seconds, which is also the venue's granularity
    /// parameter.
    pub fn secs(&self) -> i64 {
        match self {
            Self::Min1 => 60,
            Self::Min5 => 300,
            Self::Min15 => 900,
            Self::Min30 => 1800,
            Self::Hour1 => 3600,
            Self::Hour4 => 14_400,
            Self::Hour12 => 43_200,
            Self::Day1 => 86_400,
            Self::Week1 => 604_800,
        }
    }
}

impl FromStr for CandleInterval {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Self::Min1),
            "5m" => Ok(Self::Min5),
            "15m" => Ok(Self::Min15),
            "30m" => Ok(Self::Min30),
            "1h" => Ok(Self::Hour1),
            "4h" => Ok(Self::Hour4),
            "12h" => Ok(Self::Hour12),
            "1d" => Ok(Self::Day1),
            "1w" => Ok(Self::Week1),
            other => Err(AdapterError::InvalidParameters(format!(
                "unsupported interval: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Price context the caller maintains, used to value inverse-contract
/// balances in quote terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimates {
    pub emas_long: Vec<f64>,
    pub emas_short: Vec<f64>,
    pub book: OrderBookTop,
}

impl PriceEstimates {
    /// Mean of all tracked EMAs. Any zero EMA means the estimates are not
    /// warmed up yet, in which case the mid of the live book is used so a
    /// zero price can never corrupt the balance.
    pub fn conversion_price(&self) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for ema in self.emas_long.iter().chain(self.emas_short.iter()) {
            if *ema == 0.0 {
                return (self.book.bid + self.book.ask) / 2.0;
            }
            sum += ema;
            count += 1;
        }
        if count == 0 {
            return (self.book.bid + self.book.ask) / 2.0;
        }
        sum / count as f64
    }
}

/// Why an order left the open set. Removal alone never implies the
/// position is unchanged; the fill variants say that it did change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderRemoval {
    Cancelled,
    PartiallyFilled,
    Filled,
}

/// Standardized private-stream event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UserStreamEvent {
    OrderRemoved {
        order_id: String,
        reason: OrderRemoval,
    },
    NewOpenOrder(Order),
    PositionUpdate {
        position_side: PositionSide,
        size: f64,
        price: f64,
    },
    WalletBalance {
        balance: f64,
    },
}
