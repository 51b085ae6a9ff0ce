pub mod sink;
pub mod split;

pub use sink::{DeliveryError, Sink, TelegramSink};
pub use split::{split_text, MESSAGE_LIMIT};
