use super::catalog::Catalog;
use crate::error::Result;
use async_trait::async_trait;

/// Where the channel catalog comes from. Loaded once at start-up.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self) -> Result<Catalog>;

    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;
}

pub type CatalogSourceBox = Box<dyn CatalogSource>;
