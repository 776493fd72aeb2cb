//! HTTP handlers, one per workflow transition.

pub mod content;
pub mod export;
pub mod metadata;
pub mod session;
pub mod word;
