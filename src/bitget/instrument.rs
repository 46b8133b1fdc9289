use crate::bitget::conversions::{parse_f64, parse_i64};
use crate::bitget::types::BitgetContract;
use crate::core::errors::AdapterError;
use crate::core::numerics::{round_to_step, truncate_float};
use std::fmt;

/// Mix v1 product family. Selects the symbol suffix, the margin coin
/// and the minimum order cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    /// USDT-margined linear perpetual.
    Umcbl,
    /// Coin-margined inverse perpetual.
    Dmcbl,
}

impl ProductType {
    /// Classifies a bare symbol like `BTCUSDT` or `ETHUSD`.
    pub fn for_symbol(symbol: &str) -> Result<Self, AdapterError> {
        if symbol.ends_with("USDT") {
            Ok(Self::Umcbl)
        } else if symbol.ends_with("USD") {
            Ok(Self::Dmcbl)
        } else {
            Err(AdapterError::InvalidParameters(format!(
                "unsupported symbol '{}', expected a USDT or USD settled perpetual",
                symbol
            )))
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Umcbl => "_UMCBL",
            Self::Dmcbl => "_DMCBL",
        }
    }

    /// Lowercase form used by REST `productType` parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Umcbl => "umcbl",
            Self::Dmcbl => "dmcbl",
        }
    }

    /// Uppercase form used by private-stream `instType` arguments.
    pub fn inst_type(self) -> &'static str {
        match self {
            Self::Umcbl => "UMCBL",
            Self::Dmcbl => "DMCBL",
        }
    }

    pub fn is_inverse(self) -> bool {
        matches!(self, Self::Dmcbl)
    }

    /// Smallest order cost the venue accepts, in quote terms.
    pub fn min_cost(self) -> f64 {
        match self {
            Self::Umcbl => 5.0,
            Self::Dmcbl => 6.0,
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static contract metadata resolved once at startup from the venue's
/// contract listing. Everything downstream (rounding, margin coin,
/// stream subscriptions) reads from here.
#[derive(Debug, Clone)]
pub struct InstrumentMeta {
    /// Suffixed venue symbol, e.g. `BTCUSDT_UMCBL`.
    pub symbol: String,
    /// Bare symbol used by public-stream subscriptions, e.g. `BTCUSDT`.
    pub symbol_stripped: String,
    pub product_type: ProductType,
    pub base_coin: String,
    pub quote_coin: String,
    /// Collateral asset: the base coin for inverse contracts, the quote
    /// coin otherwise.
    pub margin_coin: String,
    pub price_step: f64,
    /// Decimal places of the price, used for truncation.
    pub price_rounding: i32,
    pub qty_step: f64,
    pub min_qty: f64,
    pub min_cost: f64,
}

impl InstrumentMeta {
    /// Looks the bare symbol up in the contract listing and derives the
    /// tick sizes. Fails when the symbol is not listed for its product
    /// family.
    pub fn resolve(symbol: &str, contracts: &[BitgetContract]) -> Result<Self, AdapterError> {
        let product_type = ProductType::for_symbol(symbol)?;
        let full_symbol = format!("{}{}", symbol, product_type.suffix());
        let contract = contracts
            .iter()
            .find(|c| c.symbol == full_symbol)
            .ok_or_else(|| {
                AdapterError::InvalidParameters(format!("symbol '{}' is not listed", full_symbol))
            })?;

        let price_place = parse_i64("pricePlace", &contract.price_place)? as i32;
        let price_end_step = parse_f64("priceEndStep", &contract.price_end_step)?;
        let volume_place = parse_i64("volumePlace", &contract.volume_place)? as i32;
        let min_qty = parse_f64("minTradeNum", &contract.min_trade_num)?;

        let margin_coin = if product_type.is_inverse() {
            contract.base_coin.clone()
        } else {
            contract.quote_coin.clone()
        };

        Ok(Self {
            symbol: full_symbol,
            symbol_stripped: symbol.to_string(),
            product_type,
            base_coin: contract.base_coin.clone(),
            quote_coin: contract.quote_coin.clone(),
            margin_coin,
            price_step: round_to_step(10f64.powi(-price_place) * price_end_step, 0.000_000_01),
            price_rounding: price_place,
            qty_step: round_to_step(10f64.powi(-volume_place), 0.000_000_01),
            min_qty,
            min_cost: product_type.min_cost(),
        })
    }

    /// Snaps a quantity to the contract's volume step.
    pub fn round_qty(&self, qty: f64) -> f64 {
        round_to_step(qty, self.qty_step)
    }

    /// Truncates a price to the contract's quoted decimal places.
    pub fn truncate_price(&self, price: f64) -> f64 {
        truncate_float(price, self.price_rounding)
    }
}
