//! Prediction-market integration: market scanning, question matching,
//! pricing, and order execution

pub mod clob;
pub mod executor;
pub mod gamma;
pub mod matcher;
pub mod trader;

pub use clob::PriceClient;
pub use executor::{ExecutionResult, TradeExecutor};
pub use gamma::{MarketInfo, MarketScanner};
pub use matcher::{evaluate, Verdict};
pub use trader::{AutoTrader, TradeReport};
