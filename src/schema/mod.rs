//! Data model shared by the selector, composer and engine.

pub mod agreement;
pub mod catalog;
pub mod collection;
pub mod filter;
pub mod lang;
pub mod recipe;

use ron::extensions::Extensions;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// RON options used for every data file: `Some(..)` may be omitted and
/// newtype variants may be written without the inner parentheses.
fn ron_options() -> ron::Options {
    ron::Options::default()
        .with_default_extension(Extensions::IMPLICIT_SOME)
        .with_default_extension(Extensions::UNWRAP_VARIANT_NEWTYPES)
}

/// Parse any data type from a RON string.
pub fn from_ron_str<T: DeserializeOwned>(input: &str) -> Result<T, LoadError> {
    Ok(ron_options().from_str(input)?)
}

/// Load any data type from a RON file.
pub fn load_ron<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_ron_str(&contents)
}
