use crate::bitget::instrument::ProductType;
use crate::bitget::types::{WsSubscriptionArg, WsSubscriptionRequest};
use crate::core::errors::AdapterError;
use crate::core::kernel::WsCodec;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

/// Stream id for the public trade feed of a bare symbol.
pub fn trade_stream(symbol_stripped: &str) -> String {
    format!("mc:trade:{}", symbol_stripped)
}

/// Stream id for one private channel of a product family.
pub fn user_stream(product_type: ProductType, channel: &str) -> String {
    format!("{}:{}:default", product_type.inst_type(), channel)
}

/// Typed mix v1 stream events.
#[derive(Debug, Clone)]
pub enum BitgetWsEvent {
    /// Reply to an application-level `{"op":"ping"}`, sent as the bare
    /// text `pong`.
    Pong,
    LoginAck { code: String, message: String },
    SubscribeAck { arg: WsSubscriptionArg },
    Error { code: String, message: String },
    /// Public trade push. Rows are positional arrays and are decoded
    /// individually downstream so one bad record cannot poison a batch.
    Trades { action: String, rows: Vec<Value> },
    Orders { rows: Vec<Value> },
    Positions { rows: Vec<Value> },
    Account { rows: Vec<Value> },
    Unknown,
}

/// Codec for the mix v1 stream dialect. Stream ids are
/// `instType:channel:instId` triples, e.g. `mc:trade:BTCUSDT` or
/// `UMCBL:orders:default`.
pub struct BitgetCodec;

fn parse_stream_id(stream: &str) -> Result<WsSubscriptionArg, AdapterError> {
    let mut parts = stream.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(inst_type), Some(channel), Some(inst_id))
            if !inst_type.is_empty() && !channel.is_empty() && !inst_id.is_empty() =>
        {
            Ok(WsSubscriptionArg {
                inst_type: inst_type.to_string(),
                channel: channel.to_string(),
                inst_id: inst_id.to_string(),
            })
        }
        _ => Err(AdapterError::InvalidParameters(format!(
            "invalid stream id '{}', expected instType:channel:instId",
            stream
        ))),
    }
}

fn encode_op(
    op: &str,
    streams: &[impl AsRef<str> + Send + Sync],
) -> Result<Message, AdapterError> {
    let args = streams
        .iter()
        .map(|s| parse_stream_id(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let request = WsSubscriptionRequest {
        op: op.to_string(),
        args,
    };
    let json = serde_json::to_string(&request).map_err(|e| {
        AdapterError::SerializationError(format!("Failed to encode {} request: {}", op, e))
    })?;
    Ok(Message::Text(json))
}

fn field_string(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

impl WsCodec for BitgetCodec {
    type Message = BitgetWsEvent;

    fn encode_subscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<Message, AdapterError> {
        encode_op("subscribe", streams)
    }

    fn encode_unsubscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<Message, AdapterError> {
        encode_op("unsubscribe", streams)
    }

    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, AdapterError> {
        match message {
            Message::Text(text) => {
                if text == "pong" {
                    return Ok(Some(BitgetWsEvent::Pong));
                }

                let Ok(value) = serde_json::from_str::<Value>(&text) else {
                    return Ok(Some(BitgetWsEvent::Unknown));
                };

                if let Some(event) = value.get("event").and_then(Value::as_str) {
                    let decoded = match event {
                        "login" => BitgetWsEvent::LoginAck {
                            code: field_string(&value, "code"),
                            message: field_string(&value, "msg"),
                        },
                        "error" => BitgetWsEvent::Error {
                            code: field_string(&value, "code"),
                            message: field_string(&value, "msg"),
                        },
                        "subscribe" => value
                            .get("arg")
                            .and_then(|arg| {
                                serde_json::from_value::<WsSubscriptionArg>(arg.clone()).ok()
                            })
                            .map_or(BitgetWsEvent::Unknown, |arg| BitgetWsEvent::SubscribeAck {
                                arg,
                            }),
                        _ => BitgetWsEvent::Unknown,
                    };
                    return Ok(Some(decoded));
                }

                if let (Some(arg), Some(data)) = (value.get("arg"), value.get("data")) {
                    let channel = arg.get("channel").and_then(Value::as_str).unwrap_or("");
                    let rows = data.as_array().cloned().unwrap_or_default();
                    let decoded = match channel {
                        "trade" => BitgetWsEvent::Trades {
                            action: value
                                .get("action")
                                .and_then(Value::as_str)
                                .unwrap_or("")
                                .to_string(),
                            rows,
                        },
                        "orders" => BitgetWsEvent::Orders { rows },
                        "positions" => BitgetWsEvent::Positions { rows },
                        "account" => BitgetWsEvent::Account { rows },
                        _ => BitgetWsEvent::Unknown,
                    };
                    return Ok(Some(decoded));
                }

                Ok(Some(BitgetWsEvent::Unknown))
            }
            // The venue only speaks text frames
            Message::Binary(_) => Ok(None),
            _ => Ok(None),
        }
    }
}
