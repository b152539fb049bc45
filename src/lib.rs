//! Game event stream core: classifies pushed payloads, decodes raw chain
//! logs into game events, and folds them into player and tournament state
//! owned by a subscription registry.

pub mod config;
pub mod models;
pub mod service;
pub mod stream_error;
pub mod telemetry;

pub use stream_error::{StreamError, TransportError};
