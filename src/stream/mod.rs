//! Concatenated-JSON stream decoding

mod decoder;

pub use decoder::JsonStreamDecoder;
