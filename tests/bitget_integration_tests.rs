use std::sync::Arc;

use bitgetx::bitget::{
    codec::{trade_stream, user_stream, BitgetCodec, BitgetWsEvent},
    connector::BitgetConnector,
    conversions::{intent_direction, listed_order_side, order_intent, side_from_wire, ORDER_INTENTS},
    instrument::{InstrumentMeta, ProductType},
    rest::BitgetRestClient,
    signer::BitgetSigner,
    streams::{login_frames, standardize_market_event, standardize_user_event},
    types::BitgetContract,
};
use bitgetx::core::{
    config::ExchangeConfig,
    kernel::{Signer, WsCodec},
    types::{
        CandleInterval, OrderBookTop, OrderRemoval, OrderRequest, OrderType, PositionLeg,
        PositionSide, PriceEstimates, Side, UserStreamEvent,
    },
};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

/// Helper function to build a contract listing shaped like the venue's
fn sample_contracts() -> Vec<BitgetContract> {
    vec![
        BitgetContract {
            symbol: "BTCUSDT_UMCBL".to_string(),
            base_coin: "BTC".to_string(),
            quote_coin: "USDT".to_string(),
            price_place: "1".to_string(),
            price_end_step: "5".to_string(),
            volume_place: "3".to_string(),
            min_trade_num: "0.001".to_string(),
        },
        BitgetContract {
            symbol: "ETHUSD_DMCBL".to_string(),
            base_coin: "ETH".to_string(),
            quote_coin: "USD".to_string(),
            price_place: "2".to_string(),
            price_end_step: "1".to_string(),
            volume_place: "1".to_string(),
            min_trade_num: "0.1".to_string(),
        },
    ]
}

/// Helper function to resolve BTCUSDT metadata from the sample listing
fn resolved_btcusdt() -> InstrumentMeta {
    InstrumentMeta::resolve("BTCUSDT", &sample_contracts()).unwrap()
}

fn decode(text: &str) -> BitgetWsEvent {
    BitgetCodec
        .decode_message(Message::Text(text.to_string()))
        .unwrap()
        .expect("frame should decode to an event")
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_read_only_config_has_no_credentials() {
        let config = ExchangeConfig::read_only();
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_all_three_credentials_are_required() {
        let complete = ExchangeConfig::new(
            "key".to_string(),
            "secret".to_string(),
            "passphrase".to_string(),
        );
        assert!(complete.has_credentials());

        let missing_passphrase =
            ExchangeConfig::new("key".to_string(), "secret".to_string(), String::new());
        assert!(!missing_passphrase.has_credentials());
    }

    #[test]
    fn test_serialized_config_redacts_secrets() {
        let config = ExchangeConfig::new(
            "visible_key".to_string(),
            "super_secret_key".to_string(),
            "super_secret_phrase".to_string(),
        );

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains("visible_key"));
        assert!(!json.contains("super_secret_key"));
        assert!(!json.contains("super_secret_phrase"));
    }
}

#[cfg(test)]
mod instrument_tests {
    use super::*;

    #[test]
    fn test_symbol_resolution_end_to_end() {
        let contracts = sample_contracts();

        let linear = InstrumentMeta::resolve("BTCUSDT", &contracts).unwrap();
        assert_eq!(linear.symbol, "BTCUSDT_UMCBL");
        assert_eq!(linear.margin_coin, "USDT");
        assert!((linear.price_step - 0.5).abs() < 1e-12);
        assert!((linear.qty_step - 0.001).abs() < 1e-12);

        let inverse = InstrumentMeta::resolve("ETHUSD", &contracts).unwrap();
        assert_eq!(inverse.symbol, "ETHUSD_DMCBL");
        assert_eq!(inverse.margin_coin, "ETH");
        assert!(inverse.product_type.is_inverse());
        assert!((inverse.price_step - 0.01).abs() < 1e-12);
        assert!((inverse.qty_step - 0.1).abs() < 1e-12);

        println!(
            "✅ Resolved {} and {} from one listing",
            linear.symbol, inverse.symbol
        );
    }

    #[test]
    fn test_trading_rules_per_product_family() {
        assert_eq!(ProductType::Umcbl.suffix(), "_UMCBL");
        assert_eq!(ProductType::Dmcbl.suffix(), "_DMCBL");
        assert_eq!(ProductType::Umcbl.as_str(), "umcbl");
        assert_eq!(ProductType::Umcbl.inst_type(), "UMCBL");
        assert!((ProductType::Umcbl.min_cost() - 5.0).abs() < 1e-12);
        assert!((ProductType::Dmcbl.min_cost() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_unlisted_symbol_is_rejected() {
        assert!(InstrumentMeta::resolve("SOLUSDT", &sample_contracts()).is_err());
        assert!(ProductType::for_symbol("BTCEUR").is_err());
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_interval_parsing_gates_unsupported_values() {
        for supported in ["1m", "5m", "15m", "30m", "1h", "4h", "12h", "1d", "1w"] {
            let interval = CandleInterval::from_str(supported).unwrap();
            assert_eq!(interval.as_str(), supported);
        }

        assert!(CandleInterval::from_str("3m").is_err());
        assert!(CandleInterval::from_str("2h").is_err());
        assert!(CandleInterval::from_str("1M").is_err());
    }

    #[test]
    fn test_interval_granularity_is_seconds() {
        assert_eq!(CandleInterval::Min1.secs(), 60);
        assert_eq!(CandleInterval::Hour4.secs(), 14_400);
        assert_eq!(CandleInterval::Week1.secs(), 604_800);
    }

    #[test]
    fn test_conversion_price_averages_warm_emas() {
        let estimates = PriceEstimates {
            emas_long: vec![30_000.0, 30_200.0],
            emas_short: vec![29_800.0, 30_000.0],
            book: OrderBookTop {
                bid: 10.0,
                ask: 12.0,
                last: 11.0,
            },
        };
        assert!((estimates.conversion_price() - 30_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_conversion_price_falls_back_to_book_mid_on_cold_ema() {
        let estimates = PriceEstimates {
            emas_long: vec![30_000.0, 0.0],
            emas_short: vec![29_800.0, 30_000.0],
            book: OrderBookTop {
                bid: 29_990.0,
                ask: 30_010.0,
                last: 30_000.0,
            },
        };
        assert!((estimates.conversion_price() - 30_000.0).abs() < 1e-9);

        let empty = PriceEstimates {
            emas_long: vec![],
            emas_short: vec![],
            book: OrderBookTop {
                bid: 100.0,
                ask: 102.0,
                last: 101.0,
            },
        };
        assert!((empty.conversion_price() - 101.0).abs() < 1e-9);
    }
}

#[cfg(test)]
mod direction_tests {
    use super::*;

    #[test]
    fn test_intent_table_round_trips() {
        for (side, position_side, intent) in ORDER_INTENTS {
            assert_eq!(order_intent(side, position_side), intent);
            assert_eq!(intent_direction(intent).unwrap(), (side, position_side));
        }
    }

    #[test]
    fn test_unknown_listed_intent_defaults_to_sell() {
        assert_eq!(listed_order_side("open_long"), Side::Buy);
        assert_eq!(listed_order_side("close_short"), Side::Buy);
        assert_eq!(listed_order_side("something_else"), Side::Sell);
    }

    #[test]
    fn test_wire_side_accepts_plain_and_intent_forms() {
        assert_eq!(side_from_wire("buy").unwrap(), Side::Buy);
        assert_eq!(side_from_wire("sell").unwrap(), Side::Sell);
        assert_eq!(side_from_wire("close_short").unwrap(), Side::Buy);
        assert_eq!(side_from_wire("open_short").unwrap(), Side::Sell);
        assert!(side_from_wire("hold").is_err());
    }
}

#[cfg(test)]
mod ws_pipeline_tests {
    use super::*;

    #[test]
    fn test_trade_push_decodes_to_ticks() {
        let event = decode(
            r#"{"action":"update","arg":{"instType":"mc","channel":"trade","instId":"BTCUSDT"},"data":[["1700000000000","30000.5","0.02","sell"],["1700000000500","30001.0","0.01","buy"]]}"#,
        );

        let ticks = standardize_market_event(&event);
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].timestamp, 1_700_000_000_000);
        assert!((ticks[0].price - 30000.5).abs() < 1e-12);
        assert!((ticks[0].qty - 0.02).abs() < 1e-12);
        assert!(ticks[0].is_buyer_maker);
        assert!(!ticks[1].is_buyer_maker);
    }

    #[test]
    fn test_trade_snapshot_produces_no_ticks() {
        let event = decode(
            r#"{"action":"snapshot","arg":{"instType":"mc","channel":"trade","instId":"BTCUSDT"},"data":[["1700000000000","30000.5","0.02","sell"]]}"#,
        );
        assert!(standardize_market_event(&event).is_empty());
    }

    #[test]
    fn test_order_fill_push_removes_the_order() {
        let event = decode(
            r#"{"arg":{"instType":"UMCBL","channel":"orders","instId":"default"},"data":[{"ordId":"42","instId":"BTCUSDT_UMCBL","status":"full-fill"}]}"#,
        );

        let events = standardize_user_event(&event, &resolved_btcusdt());
        assert_eq!(
            events,
            vec![UserStreamEvent::OrderRemoved {
                order_id: "42".to_string(),
                reason: OrderRemoval::Filled,
            }]
        );
    }

    #[test]
    fn test_new_order_push_standardizes_fully() {
        let event = decode(
            r#"{"arg":{"instType":"UMCBL","channel":"orders","instId":"default"},"data":[{"ordId":"123","instId":"BTCUSDT_UMCBL","status":"new","px":"30000.5","sz":"0.02","ordType":"limit","side":"open_long","posSide":"long","uTime":"1700000000000"}]}"#,
        );

        let events = standardize_user_event(&event, &resolved_btcusdt());
        let [UserStreamEvent::NewOpenOrder(order)] = events.as_slice() else {
            panic!("expected one new order, got {events:?}");
        };
        assert_eq!(order.order_id, "123");
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.position_side, PositionSide::Long);
        assert_eq!(order.order_type, OrderType::Limit);
        assert!((order.price - 30000.5).abs() < 1e-12);
        assert!((order.qty - 0.02).abs() < 1e-12);
        assert_eq!(order.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_rows_for_other_symbols_are_filtered() {
        let event = decode(
            r#"{"arg":{"instType":"UMCBL","channel":"orders","instId":"default"},"data":[{"ordId":"9","instId":"ETHUSDT_UMCBL","status":"full-fill"}]}"#,
        );
        assert!(standardize_user_event(&event, &resolved_btcusdt()).is_empty());
    }

    #[test]
    fn test_position_push_signs_the_short_leg() {
        let event = decode(
            r#"{"arg":{"instType":"UMCBL","channel":"positions","instId":"default"},"data":[{"instId":"BTCUSDT_UMCBL","holdSide":"short","total":"2.5","averageOpenPrice":"30123.46"}]}"#,
        );

        let events = standardize_user_event(&event, &resolved_btcusdt());
        let [UserStreamEvent::PositionUpdate {
            position_side,
            size,
            price,
        }] = events.as_slice()
        else {
            panic!("expected one position update, got {events:?}");
        };
        assert_eq!(*position_side, PositionSide::Short);
        assert!((size + 2.5).abs() < 1e-12);
        assert!((price - 30123.4).abs() < 1e-12);
    }

    #[test]
    fn test_wallet_push_matches_the_margin_coin() {
        let event = decode(
            r#"{"arg":{"instType":"UMCBL","channel":"account","instId":"default"},"data":[{"marginCoin":"USDT","available":"1234.5"},{"marginCoin":"BTC","available":"0.5"}]}"#,
        );

        let events = standardize_user_event(&event, &resolved_btcusdt());
        assert_eq!(
            events,
            vec![UserStreamEvent::WalletBalance { balance: 1234.5 }]
        );
    }
}

#[cfg(test)]
mod signing_tests {
    use super::*;

    /// Helper function to build a signer with throwaway credentials
    fn test_signer() -> Arc<BitgetSigner> {
        Arc::new(BitgetSigner::new(
            "test_key".to_string(),
            "test_secret".to_string(),
            "test_passphrase".to_string(),
        ))
    }

    #[test]
    fn test_signer_works_behind_the_trait_object() {
        let signer: Arc<dyn Signer> = test_signer();

        let (headers, params) = signer
            .sign_request(
                "GET",
                "/api/mix/v1/order/current",
                "symbol=BTCUSDT_UMCBL",
                b"",
                1_700_000_000_000,
            )
            .unwrap();

        assert!(headers.contains_key("ACCESS-KEY"));
        assert!(headers.contains_key("ACCESS-SIGN"));
        assert!(headers.contains_key("ACCESS-TIMESTAMP"));
        assert!(headers.contains_key("ACCESS-PASSPHRASE"));
        assert_eq!(
            params,
            vec![("symbol".to_string(), "BTCUSDT_UMCBL".to_string())]
        );
    }

    #[test]
    fn test_login_frames_carry_a_signed_login_op() {
        let frames = login_frames(test_signer())().unwrap();
        assert_eq!(frames.len(), 1);

        let Message::Text(json) = &frames[0] else {
            panic!("expected a text frame");
        };
        let value: Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["op"], "login");
        assert_eq!(value["args"][0]["apiKey"], "test_key");
        assert_eq!(value["args"][0]["passphrase"], "test_passphrase");
        assert!(value["args"][0]["timestamp"].is_number());
        assert!(value["args"][0]["sign"].is_string());
    }
}

#[cfg(test)]
mod connector_tests {
    use super::*;
    use async_trait::async_trait;
    use bitgetx::core::errors::AdapterError;
    use bitgetx::core::kernel::RestClient;
    use bitgetx::core::traits::{AccountInfo, OrderPlacer};
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned transport: answers each endpoint from a fixed table and
    /// records POST bodies for inspection.
    #[derive(Default)]
    struct CannedRest {
        responses: HashMap<String, Value>,
        posts: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl CannedRest {
        fn with(mut self, endpoint: &str, response: Value) -> Self {
            self.responses.insert(endpoint.to_string(), response);
            self
        }

        fn lookup(&self, endpoint: &str) -> Result<Value, AdapterError> {
            self.responses
                .get(endpoint)
                .cloned()
                .ok_or_else(|| AdapterError::Other(format!("no canned response for {}", endpoint)))
        }
    }

    #[async_trait]
    impl RestClient for CannedRest {
        async fn get(
            &self,
            endpoint: &str,
            _query_params: &[(&str, &str)],
            _authenticated: bool,
        ) -> Result<Value, AdapterError> {
            self.lookup(endpoint)
        }

        async fn get_json<T: DeserializeOwned>(
            &self,
            endpoint: &str,
            _query_params: &[(&str, &str)],
            _authenticated: bool,
        ) -> Result<T, AdapterError> {
            serde_json::from_value(self.lookup(endpoint)?)
                .map_err(|e| AdapterError::DeserializationError(e.to_string()))
        }

        async fn post(
            &self,
            endpoint: &str,
            body: &str,
            _authenticated: bool,
        ) -> Result<Value, AdapterError> {
            self.posts
                .lock()
                .unwrap()
                .push((endpoint.to_string(), body.to_string()));
            self.lookup(endpoint)
        }

        async fn post_json<T: DeserializeOwned>(
            &self,
            endpoint: &str,
            body: &str,
            _authenticated: bool,
        ) -> Result<T, AdapterError> {
            self.posts
                .lock()
                .unwrap()
                .push((endpoint.to_string(), body.to_string()));
            serde_json::from_value(self.lookup(endpoint)?)
                .map_err(|e| AdapterError::DeserializationError(e.to_string()))
        }
    }

    fn canned_connector(canned: CannedRest) -> BitgetConnector<CannedRest> {
        BitgetConnector::new(
            BitgetRestClient::new(canned),
            resolved_btcusdt(),
            "bitgetx".to_string(),
        )
    }

    #[tokio::test]
    async fn test_buy_long_limit_submits_post_only_open_long() {
        let canned = CannedRest::default().with(
            "/api/mix/v1/order/placeOrder",
            json!({"code": "00000", "msg": "success", "requestTime": 0,
                   "data": {"orderId": "777", "clientOid": null}}),
        );
        let posts = Arc::clone(&canned.posts);
        let connector = canned_connector(canned);

        let order = connector
            .place_order(&OrderRequest {
                custom_id: Some("eng1".to_string()),
                price: 30000.5,
                qty: 0.002,
                side: Side::Buy,
                position_side: PositionSide::Long,
                order_type: OrderType::Limit,
            })
            .await
            .unwrap();
        assert_eq!(order.order_id, "777");
        assert_eq!(order.symbol, "BTCUSDT_UMCBL");

        let recorded = posts.lock().unwrap();
        let (endpoint, body) = &recorded[0];
        assert_eq!(endpoint, "/api/mix/v1/order/placeOrder");
        let body: Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["side"], "open_long");
        assert_eq!(body["timeInForceValue"], "post_only");
        assert_eq!(body["price"], "30000.5");
        assert_eq!(body["orderType"], "limit");
        assert_eq!(body["symbol"], "BTCUSDT_UMCBL");
        assert_eq!(body["marginCoin"], "USDT");
        let client_oid = body["clientOid"].as_str().unwrap();
        assert!(client_oid.starts_with("bitgetx#eng1_"));

        println!("✅ Submitted body: {}", body);
    }

    #[tokio::test]
    async fn test_market_orders_submit_without_a_price() {
        let canned = CannedRest::default().with(
            "/api/mix/v1/order/placeOrder",
            json!({"code": "00000", "msg": "success", "requestTime": 0,
                   "data": {"orderId": "778", "clientOid": null}}),
        );
        let posts = Arc::clone(&canned.posts);
        let connector = canned_connector(canned);

        connector
            .place_order(&OrderRequest {
                custom_id: None,
                price: 0.0,
                qty: 0.002,
                side: Side::Sell,
                position_side: PositionSide::Short,
                order_type: OrderType::Market,
            })
            .await
            .unwrap();

        let recorded = posts.lock().unwrap();
        let body: Value = serde_json::from_str(&recorded[0].1).unwrap();
        assert_eq!(body["side"], "open_short");
        assert_eq!(body["timeInForceValue"], "normal");
        assert!(body.get("price").is_none());
    }

    #[tokio::test]
    async fn test_fetch_position_signs_legs_and_merges_balance() {
        let canned = CannedRest::default()
            .with(
                "/api/mix/v1/position/singlePosition",
                json!({"code": "00000", "msg": "success", "requestTime": 0, "data": [
                    {"holdSide": "long", "total": "0.003",
                     "averageOpenPrice": "30000.19", "liquidationPrice": "15000.0"},
                    {"holdSide": "short", "total": "2.5",
                     "averageOpenPrice": "30123.46", "liquidationPrice": "45000.0"}
                ]}),
            )
            .with(
                "/api/mix/v1/account/accounts",
                json!({"code": "00000", "msg": "success", "requestTime": 0, "data": [
                    {"marginCoin": "USDT", "available": "1234.5"}
                ]}),
            );
        let connector = canned_connector(canned);

        let state = connector
            .fetch_position(&PriceEstimates::default())
            .await
            .unwrap();

        assert!(state.long.size >= 0.0);
        assert!(state.short.size <= 0.0);
        assert!((state.long.size - 0.003).abs() < 1e-12);
        assert!((state.short.size + 2.5).abs() < 1e-12);
        assert!((state.long.price - 30000.1).abs() < 1e-9);
        assert!((state.short.price - 30123.4).abs() < 1e-9);
        assert!((state.wallet_balance - 1234.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_inverse_balances_are_valued_in_quote_terms() {
        let canned = CannedRest::default()
            .with(
                "/api/mix/v1/position/singlePosition",
                json!({"code": "00000", "msg": "success", "requestTime": 0, "data": []}),
            )
            .with(
                "/api/mix/v1/account/accounts",
                json!({"code": "00000", "msg": "success", "requestTime": 0, "data": [
                    {"marginCoin": "ETH", "available": "2.0"}
                ]}),
            );
        let meta = InstrumentMeta::resolve("ETHUSD", &sample_contracts()).unwrap();
        let connector = BitgetConnector::new(
            BitgetRestClient::new(canned),
            meta,
            "bitgetx".to_string(),
        );

        let estimates = PriceEstimates {
            emas_long: vec![2000.0],
            emas_short: vec![2000.0],
            book: OrderBookTop::default(),
        };
        let state = connector.fetch_position(&estimates).await.unwrap();

        assert!((state.wallet_balance - 4000.0).abs() < 1e-9);
        assert_eq!(state.long, PositionLeg::default());
        assert_eq!(state.short, PositionLeg::default());
    }
}

#[cfg(test)]
mod subscription_tests {
    use super::*;

    #[test]
    fn test_market_and_user_streams_encode_in_one_frame() {
        let streams = [
            trade_stream("BTCUSDT"),
            user_stream(ProductType::Umcbl, "orders"),
        ];
        let message = BitgetCodec.encode_subscription(&streams).unwrap();

        let Message::Text(json) = message else {
            panic!("expected a text frame");
        };
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["op"], "subscribe");
        assert_eq!(value["args"][0]["instType"], "mc");
        assert_eq!(value["args"][0]["instId"], "BTCUSDT");
        assert_eq!(value["args"][1]["instType"], "UMCBL");
        assert_eq!(value["args"][1]["instId"], "default");

        println!("✅ Subscription frame: {}", json);
    }
}
