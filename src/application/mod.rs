//! Application layer: the cost engine that prices and ranks channels, and
//! the ledger analyzer that aggregates past transactions.

pub mod analyzer;
pub mod engine;
