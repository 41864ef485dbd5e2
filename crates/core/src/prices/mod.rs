//! Prices module - the price oracle contract and its cache/durable service.

mod price_model;
mod price_service;
mod price_traits;

pub use price_model::*;
pub use price_service::PriceService;
pub use price_traits::*;

#[cfg(test)]
mod price_service_tests;
