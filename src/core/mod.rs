pub mod engine;
pub mod harvester;
pub mod pipeline;
pub mod sequence;

pub use crate::domain::model::{DqmStore, HarvestResult, InstanceReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, SourceKind, Storage};
pub use crate::utils::error::Result;
