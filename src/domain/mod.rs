//! Domain layer: the reference data (catalog, channels, currencies) and the
//! pure fee and exchange computations over it.

pub mod catalog;
pub mod channel;
pub mod currency;
pub mod exchange;
pub mod fee;
pub mod money;
pub mod ports;
pub mod transaction;
