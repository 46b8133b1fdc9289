use crate::core::errors::AdapterError;
use tokio_tungstenite::tungstenite::Message;

/// Codec trait for venue-specific WebSocket message encoding/decoding.
///
/// The transport stays byte-oriented; everything the venue dialect knows
/// (subscription frame shape, event envelopes, application-level pongs)
/// lives behind this trait.
pub trait WsCodec: Send + Sync + 'static {
    /// The type representing parsed messages from the venue
    type Message: Send + Sync;

    /// Encode a subscription request for the given stream identifiers
    fn encode_subscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<Message, AdapterError>;

    /// Encode an unsubscription request for the given stream identifiers
    fn encode_unsubscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<Message, AdapterError>;

    /// Decode a raw WebSocket message into a typed message.
    ///
    /// Transport control frames (ping, pong, close) never reach this
    /// method.
    ///
    /// # Returns
    /// - `Ok(Some(message))` - Successfully decoded message
    /// - `Ok(None)` - Message was ignored/filtered by codec
    /// - `Err(error)` - Failed to decode message
    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, AdapterError>;
}
