//! Store factory functions for benchmarks

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tessera::Tessera;
use tessera_fjall_adapter::FjallModule;
use uuid::Uuid;

/// Result type for store operations
pub type StoreResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Counter for unique database paths within a run
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The bench-data directory at the workspace root
fn get_bench_data_dir() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let manifest_dir = PathBuf::from(manifest_dir);
    manifest_dir
        .parent()
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
        .join("bench-data")
}

fn create_unique_db_path() -> PathBuf {
    let bench_data_dir = get_bench_data_dir();
    std::fs::create_dir_all(&bench_data_dir).ok();

    let counter = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    bench_data_dir.join(format!("bench_{}_{}", counter, Uuid::new_v4()))
}

/// A database and, for on-disk stores, the directory removed on drop
pub struct BenchContext {
    db: Tessera,
    db_path: Option<PathBuf>,
}

impl BenchContext {
    pub fn db(&self) -> &Tessera {
        &self.db
    }
}

impl Drop for BenchContext {
    fn drop(&mut self) {
        let _ = self.db.close();
        if let Some(ref path) = self.db_path {
            let _ = std::fs::remove_dir_all(path);
        }
    }
}

pub fn create_inmemory_db() -> StoreResult<BenchContext> {
    let db = Tessera::builder().open()?;
    Ok(BenchContext { db, db_path: None })
}

pub fn create_fjall_db() -> StoreResult<BenchContext> {
    let db_path = create_unique_db_path();
    let store = FjallModule::with_config()
        .db_path(&db_path.to_string_lossy())
        .build()
        .open_store()?;
    let db = Tessera::builder().store(store).open()?;

    Ok(BenchContext {
        db,
        db_path: Some(db_path),
    })
}

/// Both backends, labelled for benchmark ids
pub fn backends() -> [(&'static str, fn() -> StoreResult<BenchContext>); 2] {
    [("inmemory", create_inmemory_db), ("fjall", create_fjall_db)]
}
