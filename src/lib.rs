//! Image variant service for the club administration backend
//!
//! Decodes client-submitted embedded-data images, applies optional transforms,
//! and stores small/medium/large square renditions under deterministic paths
//! that the static-file layer serves.

pub mod error;
pub mod image;
pub mod models;
pub mod service;
pub mod storage;

pub use error::{Error, Result};
pub use service::ImageVariantService;
