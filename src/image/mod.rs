//! Image decoding, transformation and variant rendering
//!
//! Turns embedded-data image strings into decoded payloads, applies one-shot
//! resize/re-encode transforms, and renders the fixed square tiers that are
//! handed to storage.

pub mod codec;
pub mod decoder;
pub mod transformer;
pub mod variants;

pub use codec::ImageCodec;
pub use variants::VariantGenerator;
