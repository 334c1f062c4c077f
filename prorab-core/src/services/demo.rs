//! Demo service - manage demo mode
//!
//! Demo mode swaps the document database for `demo.duckdb`, filled with
//! sample clients and stock, so the tool can be tried without touching real
//! business data.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::adapters::demo::{generate_demo_ledger, generate_demo_products};
use crate::adapters::duckdb::DuckDbDocumentStore;
use crate::config::Config;
use crate::ports::DocumentStore;

const DEMO_DB: &str = "demo.duckdb";

/// Demo service for managing demo mode
pub struct DemoService {
    data_dir: PathBuf,
}

impl DemoService {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn is_enabled(&self) -> Result<bool> {
        Ok(Config::load(&self.data_dir)?.demo_mode)
    }

    /// Enable demo mode with a freshly seeded demo database
    pub async fn enable(&self) -> Result<usize> {
        self.remove_demo_db()?;

        let mut config = Config::load(&self.data_dir).unwrap_or_default();
        config.enable_demo_mode();
        config.save(&self.data_dir)?;

        let store = DuckDbDocumentStore::new(&self.data_dir.join(DEMO_DB))?;
        store.ensure_schema()?;
        seed(&store).await
    }

    /// Disable demo mode, deleting the demo database when `clean` is set
    pub fn disable(&self, clean: bool) -> Result<()> {
        let mut config = Config::load(&self.data_dir).unwrap_or_default();
        config.disable_demo_mode();
        config.save(&self.data_dir)?;

        if clean {
            self.remove_demo_db()?;
        }
        Ok(())
    }

    fn remove_demo_db(&self) -> Result<()> {
        for name in [DEMO_DB.to_string(), format!("{}.wal", DEMO_DB)] {
            let path = self.data_dir.join(name);
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Write the demo documents into `store`; returns how many were written
pub async fn seed(store: &dyn DocumentStore) -> Result<usize> {
    let seeds = generate_demo_ledger()
        .into_iter()
        .chain(generate_demo_products());

    let mut written = 0;
    for (collection, doc) in seeds {
        store.set(collection, &doc.id, doc.data).await?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::collections;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_enable_and_disable() {
        let dir = tempdir().unwrap();
        let demo = DemoService::new(dir.path());
        assert!(!demo.is_enabled().unwrap());

        let written = demo.enable().await.unwrap();
        assert!(written > 0);
        assert!(demo.is_enabled().unwrap());

        let store = DuckDbDocumentStore::new(&dir.path().join(DEMO_DB)).unwrap();
        assert_eq!(store.count(collections::CLIENTS).unwrap(), 4);
        drop(store);

        demo.disable(true).unwrap();
        assert!(!demo.is_enabled().unwrap());
        assert!(!dir.path().join(DEMO_DB).exists());
    }
}
