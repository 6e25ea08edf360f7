//! Tessera Benchmark Library
//!
//! Data generators and database factories shared by the criterion benches, which run every
//! workload against the in-memory store and the fjall store.

pub mod data_gen;
pub mod stores;
