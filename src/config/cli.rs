//! Local filesystem storage for harvest jobs.
//!
//! Reads and writes resolve against separate roots: the input store path is
//! taken relative to the invocation directory, while every artifact of the
//! load phase lands under the harvest output directory. Absolute paths are
//! used as given.

use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    input_root: PathBuf,
    output_root: PathBuf,
}

impl LocalStorage {
    /// Storage writing under `output_path`; reads stay relative to the
    /// invocation directory.
    pub fn new(output_path: String) -> Self {
        Self::with_roots(".", output_path)
    }

    pub fn with_roots(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        // join 遇到絕對路徑時直接取代，root 只影響相對路徑
        let full_path = self.input_root.join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.output_root.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}
