//! Services for loading, converting and persisting commodity prices

pub mod atomic_file;
pub mod converter;
pub mod data_loader;
pub mod normalizer;
pub mod pipeline;
pub mod rates;
pub mod sink;
pub mod store;

pub use converter::{convert_batch, convert_batch_at, convert_to_usd};
pub use data_loader::DataLoaderService;
pub use normalizer::normalize_currency;
pub use pipeline::{Pipeline, PipelineOutput, PipelineRequest};
pub use rates::{ExchangeRateTable, RateService, RateSource};
pub use sink::{OutputFormat, RowSink};
pub use store::TableStore;
