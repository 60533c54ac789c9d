//! Price data sources

pub mod csv_file;
pub mod pacer;
pub mod polygon;
pub mod provider;

pub use csv_file::CsvSource;
pub use pacer::FetchPacer;
pub use polygon::PolygonSource;
pub use provider::{lookback_start, DataError, PriceDataSource};
