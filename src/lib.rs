#![deny(clippy::unwrap_used)]

pub mod category;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod rename;
pub mod xml;

pub use config::Lang;
