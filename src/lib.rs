pub mod bitget;
pub mod core;

pub use crate::bitget::{BitgetConnector, BitgetStreams};
pub use crate::core::config::ExchangeConfig;
pub use crate::core::{errors::AdapterError, traits::ExchangeAdapter, types::*};
