//! Price series providers and ingestion.

pub mod csv_import;
pub mod ingest;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_import::CsvProvider;
pub use ingest::{canonicalize, Canonicalized};
pub use provider::{DataError, DataSource, FetchResult, PriceProvider};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
