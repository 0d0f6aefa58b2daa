//! Access to GFS forecast runs.
//!
//! A [`DatasetGateway`] turns a [`forecast_common::ForecastRun`] into a
//! [`GriddedSource`], opening each run once and serving later requests from
//! its cache. The production opener talks OPeNDAP to NOMADS; tests use
//! [`MemoryOpener`].

pub mod cache;
pub mod gateway;
pub mod memory;
pub mod opendap;
pub mod remote;
pub mod source;

pub use cache::{CacheStats, DatasetCache};
pub use gateway::DatasetGateway;
pub use memory::{MemoryDataset, MemoryOpener};
pub use remote::{dataset_url, NomadsConfig, NomadsOpener, RemoteDataset, DEFAULT_BASE_URL};
pub use source::{DatasetOpener, GriddedSource};
