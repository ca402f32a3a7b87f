//! sentinel-scan
//!
//! The scanner scheduler (C7): one async worker per active chain, following
//! its head with a confirmation-depth safety margin, pulling logs for every
//! watched contract on that chain, decoding and storing them, and handing
//! the resulting batch to the flow engine (C8) in block order.

pub mod worker;

pub use worker::{ChainWorker, ScanConfig};
