// Service layer for the game event stream
pub mod classifier;
pub mod event_transformer;
pub mod hex_words;
pub mod log_decoder;
pub mod state_reducer;
pub mod stream_registry;
pub mod stream_transport;

#[cfg(test)]
mod log_decoder_test;

pub use classifier::{classify, describe, Classified, PayloadKind, PayloadSummary};
pub use event_transformer::{EventTransformer, Transformed};
pub use log_decoder::{DecodedLog, FixedRarity, LogDecoder, RaritySource, UniformRarity};
pub use state_reducer::{apply_event, apply_event_at};
pub use stream_registry::StreamRegistry;
pub use stream_transport::{ReplayTransport, StreamTransport, TransportSubscription};
