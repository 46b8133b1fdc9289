pub mod config;
pub mod errors;
pub mod kernel;
pub mod numerics;
pub mod time;
pub mod traits;
pub mod types;
