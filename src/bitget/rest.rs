use crate::bitget::params::Params;
use crate::bitget::types::{
    BitgetBalance, BitgetContract, BitgetFill, BitgetMarketFill, BitgetOpenOrder,
    BitgetOrderResult, BitgetPosition, BitgetResponse, BitgetTicker,
};
use crate::core::errors::AdapterError;
use crate::core::kernel::RestClient;
use serde_json::Value;

const OK_CODE: &str = "00000";

/// Thin typed wrapper around `RestClient` for the mix v1 API.
pub struct BitgetRestClient<R: RestClient> {
    client: R,
}

/// Maps mix v1 rejection codes onto the error taxonomy. Codes outside
/// the known families stay generic `ApiError`s.
fn map_bitget_error(code: &str, message: &str) -> AdapterError {
    match code {
        // Credential, signature and timestamp rejections
        "40001" | "40002" | "40003" | "40005" | "40006" | "40008" | "40009" | "40011"
        | "40012" | "40014" | "40018" | "40037" => {
            AdapterError::AuthError(format!("{}: {}", code, message))
        }
        // Gateway throttling
        "429" => AdapterError::RateLimitExceeded(format!("{}: {}", code, message)),
        // Request validation failures
        "40017" | "40034" | "40305" | "40808" => {
            AdapterError::InvalidParameters(format!("{}: {}", code, message))
        }
        _ => AdapterError::ApiError {
            code: code.parse().unwrap_or(-1),
            message: message.to_string(),
        },
    }
}

fn ensure_ok(code: &str, msg: &str) -> Result<(), AdapterError> {
    if code == OK_CODE {
        Ok(())
    } else {
        Err(map_bitget_error(code, msg))
    }
}

fn unwrap_data<T>(endpoint: &str, resp: BitgetResponse<T>) -> Result<T, AdapterError> {
    ensure_ok(&resp.code, &resp.msg)?;
    resp.data
        .ok_or_else(|| AdapterError::EmptyResponse(endpoint.to_string()))
}

impl<R: RestClient> BitgetRestClient<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    /// Venue clock in milliseconds, read from the public spot time
    /// endpoint.
    pub async fn get_server_time(&self) -> Result<i64, AdapterError> {
        let endpoint = "/api/spot/v1/public/time";
        let resp: BitgetResponse<String> = self.client.get_json(endpoint, &[], false).await?;
        let data = unwrap_data(endpoint, resp)?;
        data.parse().map_err(|_| {
            AdapterError::DeserializationError(format!("invalid server time '{}'", data))
        })
    }

    /// Contract listing for one product family.
    pub async fn get_contracts(
        &self,
        product_type: &str,
    ) -> Result<Vec<BitgetContract>, AdapterError> {
        let endpoint = "/api/mix/v1/market/contracts";
        let params = Params::new().with("productType", product_type);
        let resp: BitgetResponse<Vec<BitgetContract>> = self
            .client
            .get_json(endpoint, &params.as_pairs(), false)
            .await?;
        unwrap_data(endpoint, resp)
    }

    pub async fn get_ticker(&self, symbol: &str) -> Result<BitgetTicker, AdapterError> {
        let endpoint = "/api/mix/v1/market/ticker";
        let params = Params::new().with("symbol", symbol);
        let resp: BitgetResponse<BitgetTicker> = self
            .client
            .get_json(endpoint, &params.as_pairs(), false)
            .await?;
        unwrap_data(endpoint, resp)
    }

    /// Candle history. This endpoint answers with a bare JSON array
    /// instead of the usual envelope; rows are positional string
    /// arrays.
    pub async fn get_candles(
        &self,
        symbol: &str,
        granularity_secs: i64,
        start_time_ms: i64,
        end_time_ms: i64,
    ) -> Result<Vec<Vec<String>>, AdapterError> {
        let params = Params::new()
            .with("symbol", symbol)
            .with("granularity", granularity_secs)
            .with("startTime", start_time_ms)
            .with("endTime", end_time_ms);
        self.client
            .get_json("/api/mix/v1/market/candles", &params.as_pairs(), false)
            .await
    }

    /// Most recent public trades, newest first.
    pub async fn get_market_fills(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<BitgetMarketFill>, AdapterError> {
        let endpoint = "/api/mix/v1/market/fills";
        let params = Params::new().with("symbol", symbol).with("limit", limit);
        let resp: BitgetResponse<Vec<BitgetMarketFill>> = self
            .client
            .get_json(endpoint, &params.as_pairs(), false)
            .await?;
        unwrap_data(endpoint, resp)
    }

    pub async fn get_open_orders(
        &self,
        symbol: &str,
    ) -> Result<Vec<BitgetOpenOrder>, AdapterError> {
        let endpoint = "/api/mix/v1/order/current";
        let params = Params::new().with("symbol", symbol);
        let resp: BitgetResponse<Vec<BitgetOpenOrder>> = self
            .client
            .get_json(endpoint, &params.as_pairs(), true)
            .await?;
        unwrap_data(endpoint, resp)
    }

    /// Position legs for one symbol. The venue returns a row per hold
    /// side, including flat ones.
    pub async fn get_single_position(
        &self,
        symbol: &str,
        margin_coin: &str,
    ) -> Result<Vec<BitgetPosition>, AdapterError> {
        let endpoint = "/api/mix/v1/position/singlePosition";
        let params = Params::new()
            .with("symbol", symbol)
            .with("marginCoin", margin_coin);
        let resp: BitgetResponse<Vec<BitgetPosition>> = self
            .client
            .get_json(endpoint, &params.as_pairs(), true)
            .await?;
        unwrap_data(endpoint, resp)
    }

    pub async fn get_account_balances(
        &self,
        product_type: &str,
    ) -> Result<Vec<BitgetBalance>, AdapterError> {
        let endpoint = "/api/mix/v1/account/accounts";
        let params = Params::new().with("productType", product_type);
        let resp: BitgetResponse<Vec<BitgetBalance>> = self
            .client
            .get_json(endpoint, &params.as_pairs(), true)
            .await?;
        unwrap_data(endpoint, resp)
    }

    /// Submits a fully assembled order parameter set. The caller owns
    /// intent mapping and client id generation.
    pub async fn place_order(&self, params: &Params) -> Result<BitgetOrderResult, AdapterError> {
        let endpoint = "/api/mix/v1/order/placeOrder";
        let resp: BitgetResponse<BitgetOrderResult> = self
            .client
            .post_json(endpoint, &params.to_json()?, true)
            .await?;
        unwrap_data(endpoint, resp)
    }

    pub async fn cancel_order(
        &self,
        symbol: &str,
        margin_coin: &str,
        order_id: &str,
    ) -> Result<BitgetOrderResult, AdapterError> {
        let endpoint = "/api/mix/v1/order/cancel-order";
        let params = Params::new()
            .with("symbol", symbol)
            .with("marginCoin", margin_coin)
            .with("orderId", order_id);
        let resp: BitgetResponse<BitgetOrderResult> = self
            .client
            .post_json(endpoint, &params.to_json()?, true)
            .await?;
        unwrap_data(endpoint, resp)
    }

    /// Private fill history for one symbol within a time window.
    pub async fn get_order_fills(
        &self,
        symbol: &str,
        last_end_id: Option<i64>,
        start_time_ms: i64,
        end_time_ms: i64,
    ) -> Result<Vec<BitgetFill>, AdapterError> {
        let endpoint = "/api/mix/v1/order/fills";
        let params = Params::new()
            .with("symbol", symbol)
            .with_opt("lastEndId", last_end_id)
            .with("startTime", start_time_ms)
            .with("endTime", end_time_ms);
        let resp: BitgetResponse<Vec<BitgetFill>> = self
            .client
            .get_json(endpoint, &params.as_pairs(), true)
            .await?;
        unwrap_data(endpoint, resp)
    }

    pub async fn set_margin_mode(
        &self,
        symbol: &str,
        margin_coin: &str,
        margin_mode: &str,
    ) -> Result<Value, AdapterError> {
        let params = Params::new()
            .with("symbol", symbol)
            .with("marginCoin", margin_coin)
            .with("marginMode", margin_mode);
        let resp: BitgetResponse<Value> = self
            .client
            .post_json("/api/mix/v1/account/setMarginMode", &params.to_json()?, true)
            .await?;
        ensure_ok(&resp.code, &resp.msg)?;
        Ok(resp.data.unwrap_or(Value::Null))
    }

    pub async fn set_leverage(
        &self,
        symbol: &str,
        margin_coin: &str,
        leverage: u32,
    ) -> Result<Value, AdapterError> {
        let params = Params::new()
            .with("symbol", symbol)
            .with("marginCoin", margin_coin)
            .with("leverage", leverage);
        let resp: BitgetResponse<Value> = self
            .client
            .post_json("/api/mix/v1/account/setLeverage", &params.to_json()?, true)
            .await?;
        ensure_ok(&resp.code, &resp.msg)?;
        Ok(resp.data.unwrap_or(Value::Null))
    }
}
