pub mod aggregator;
pub mod api;
pub mod clients;
pub mod config;
pub mod data_models;
pub mod error;
pub mod export;
pub mod fallback;
