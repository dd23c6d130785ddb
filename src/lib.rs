pub mod client;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, CliConfig};
pub use core::{engine::HarvestEngine, pipeline::HarvestPipeline};
pub use utils::error::{DqmError, Result};
