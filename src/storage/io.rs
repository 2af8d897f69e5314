use std::fs;
use std::path::Path;

use super::{Document, StoreError};

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io { path: path.display().to_string(), source }
}

/// Read a collection file. A missing file is an empty collection.
pub(crate) fn load_collection(path: &Path) -> Result<Vec<Document>, StoreError> {
    if !path.exists() { return Ok(Vec::new()); }
    let bytes = fs::read(path).map_err(io_err(path))?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) { return Ok(Vec::new()); }
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { path: path.display().to_string(), source })
}

/// Write the whole collection to a temp file next to `path`, then rename over it.
pub(crate) fn save_collection(path: &Path, docs: &[Document]) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(docs).map_err(|source| StoreError::Corrupt { path: path.display().to_string(), source })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(io_err(&tmp))?;
    fs::rename(&tmp, path).map_err(io_err(path))?;
    Ok(())
}
