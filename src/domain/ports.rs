use crate::domain::model::{DqmStore, HarvestResult};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where the extract phase reads the input store from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Http,
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// File path or URL of the input DQM store, depending on `source_kind`.
    fn input_source(&self) -> &str;
    fn source_kind(&self) -> SourceKind;
    fn output_path(&self) -> &str;
    fn store_filename(&self) -> &str;
    /// Whether to write the per-plot efficiency summary CSV next to the store.
    fn summary_csv(&self) -> bool;
    /// Bundle filename when the output artifacts should be zipped together.
    fn bundle_filename(&self) -> Option<&str>;
    fn timeout_seconds(&self) -> u64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<DqmStore>;
    async fn transform(&self, store: DqmStore) -> Result<HarvestResult>;
    async fn load(&self, result: HarvestResult) -> Result<String>;
}
