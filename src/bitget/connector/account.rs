use crate::bitget::conversions::parse_f64;
use crate::bitget::instrument::InstrumentMeta;
use crate::bitget::rest::BitgetRestClient;
use crate::core::errors::AdapterError;
use crate::core::kernel::RestClient;
use crate::core::traits::AccountInfo;
use crate::core::types::{PositionLeg, PositionState, PriceEstimates};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_MARGIN_MODE: &str = "crossed";
const DEFAULT_LEVERAGE: u32 = 20;

/// Position and balance reconciliation for one bound instrument.
pub struct Account<R: RestClient> {
    rest: Arc<BitgetRestClient<R>>,
    meta: Arc<InstrumentMeta>,
}

impl<R: RestClient> Account<R> {
    pub fn new(rest: Arc<BitgetRestClient<R>>, meta: Arc<InstrumentMeta>) -> Self {
        Self { rest, meta }
    }

    /// Applies the standing account configuration, crossed margin and a
    /// fixed leverage. Venue rejections are logged and ignored since the
    /// account is often configured already.
    pub async fn init_exchange_config(&self) {
        match self
            .rest
            .set_margin_mode(&self.meta.symbol, &self.meta.margin_coin, DEFAULT_MARGIN_MODE)
            .await
        {
            Ok(result) => info!("Margin mode response: {}", result),
            Err(e) => warn!("Failed to set margin mode for {}: {}", self.meta.symbol, e),
        }
        match self
            .rest
            .set_leverage(&self.meta.symbol, &self.meta.margin_coin, DEFAULT_LEVERAGE)
            .await
        {
            Ok(result) => info!("Leverage response: {}", result),
            Err(e) => warn!("Failed to set leverage for {}: {}", self.meta.symbol, e),
        }
    }

    /// Derivatives-to-spot transfers fail explicitly rather than
    /// pretending to move funds.
    pub async fn transfer_to_spot(&self, _coin: &str, _amount: f64) -> Result<(), AdapterError> {
        Err(AdapterError::NotSupported(
            "funds transfers are not available on this venue".to_string(),
        ))
    }

    /// The spot wallet is outside this adapter's account scope.
    pub async fn fetch_spot_balance(&self) -> Result<Value, AdapterError> {
        Err(AdapterError::NotSupported(
            "spot account balances are not available on this venue".to_string(),
        ))
    }

    fn position_leg(&self, total: &str, price: &str, liquidation: &str) -> Result<PositionLeg, AdapterError> {
        Ok(PositionLeg {
            size: self.meta.round_qty(parse_f64("total", total)?),
            price: self.meta.truncate_price(parse_f64("averageOpenPrice", price)?),
            liquidation_price: parse_f64("liquidationPrice", liquidation)?,
        })
    }
}

#[async_trait]
impl<R: RestClient + 'static> AccountInfo for Account<R> {
    async fn fetch_position(
        &self,
        estimates: &PriceEstimates,
    ) -> Result<PositionState, AdapterError> {
        // Both reads are independent; issue them concurrently and merge
        let (positions, balances) = tokio::try_join!(
            self.rest
                .get_single_position(&self.meta.symbol, &self.meta.margin_coin),
            self.rest
                .get_account_balances(self.meta.product_type.as_str()),
        )?;

        let mut state = PositionState::default();
        for row in &positions {
            match row.hold_side.as_str() {
                "long" => {
                    state.long = self.position_leg(
                        &row.total,
                        &row.average_open_price,
                        &row.liquidation_price,
                    )?;
                }
                "short" => {
                    let mut leg = self.position_leg(
                        &row.total,
                        &row.average_open_price,
                        &row.liquidation_price,
                    )?;
                    leg.size = -leg.size.abs();
                    state.short = leg;
                }
                _ => {}
            }
        }

        for row in &balances {
            if row.margin_coin == self.meta.margin_coin || row.margin_coin == self.meta.quote_coin {
                let available = parse_f64("available", &row.available)?;
                state.wallet_balance = if self.meta.product_type.is_inverse() {
                    // Coin-margined balances are valued in quote terms
                    // through the caller's price estimates
                    available * estimates.conversion_price()
                } else {
                    available
                };
                break;
            }
        }

        Ok(state)
    }
}
