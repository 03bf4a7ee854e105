use crate::domain::catalog::Catalog;
use crate::domain::ports::CatalogSource;
use crate::error::Result;
use async_trait::async_trait;

/// Serves the catalog compiled into the binary.
#[derive(Debug, Default, Clone)]
pub struct BuiltinCatalog;

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CatalogSource for BuiltinCatalog {
    async fn load(&self) -> Result<Catalog> {
        let catalog = Catalog::builtin();
        catalog.validate()?;
        Ok(catalog)
    }

    fn describe(&self) -> String {
        "built-in catalog".to_string()
    }
}
