//! Commodity price normalization and USD conversion

pub mod config;
pub mod services;
pub mod types;
