//! # Tessera Fjall Adapter
//!
//! Persistent storage for Tessera on top of [fjall](https://github.com/fjall-rs/fjall), an
//! LSM-tree key-value store.
//!
//! The adapter implements [`KvStoreProvider`](tessera::store::KvStoreProvider): ordered keys,
//! point and multi reads, bidirectional range scans and atomic operations with versionstamp
//! checks. Versionstamps are durable and keep increasing across restarts.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tessera::Tessera;
//! use tessera_fjall_adapter::FjallModule;
//!
//! let store = FjallModule::with_config()
//!     .db_path("/path/to/db")
//!     .production_preset()
//!     .build()
//!     .open_store()?;
//!
//! let db = Tessera::builder().store(store).open()?;
//! ```
//!
//! ## Presets
//!
//! - `production_preset()`: large caches, periodic fsync
//! - `low_memory_preset()`: small caches, single workers

mod config;
mod module;
mod store;
mod version;
mod wrapper;

pub use config::*;
pub use module::*;
pub use store::FjallStore;
pub use wrapper::{FjallValue, FjallValueError, FjallValueResult};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tessera::collection::{CollectionBuilder, IdStrategy};
    use tessera::Tessera;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        key: String,
        body: String,
    }

    #[test]
    fn documents_persist_across_reopen() {
        let path = std::env::temp_dir()
            .join(format!("tessera-fjall-db-{}", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .to_string();
        let descriptor = CollectionBuilder::<Entry>::new("entries")
            .id_strategy(IdStrategy::derived(|e: &Entry| e.key.clone()))
            .secondary_index("body", |e: &Entry| e.body.clone())
            .build()
            .unwrap();
        let open = || {
            let store = FjallModule::with_config()
                .db_path(&path)
                .low_memory_preset()
                .build()
                .open_store()
                .unwrap();
            Tessera::builder().store(store).open().unwrap()
        };

        {
            let db = open();
            let entries = db.collection(&descriptor).unwrap();
            for n in 0..5 {
                let entry = Entry {
                    key: format!("k{}", n),
                    body: "same".to_string(),
                };
                assert!(entries.add(entry).unwrap().is_committed());
            }
            db.close().unwrap();
        }

        let db = open();
        let entries = db.collection(&descriptor).unwrap();
        assert_eq!(entries.count().unwrap(), 5);
        assert_eq!(entries.count_by_secondary_index("body", "same").unwrap(), 5);
        assert_eq!(entries.find("k3").unwrap().unwrap().value().key, "k3");
        db.close().unwrap();

        let _ = std::fs::remove_dir_all(&path);
    }
}
