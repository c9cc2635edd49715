pub mod backfill;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod incremental;
pub mod records;
pub mod report;
pub mod resources;
pub mod stage;
pub mod tabular;
pub mod warehouse;

pub use error::{EtlError, Result};
