//! Scalar reads from NeXus (HDF5) files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{Result, SnapError};

/// A scalar pulled out of a NeXus dataset.
///
/// NeXus stores most scalars as one-element arrays; readers return the
/// first element, with byte strings decoded as UTF-8.
#[derive(Debug, Clone, PartialEq)]
pub enum NexusValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl NexusValue {
    pub fn as_text(&self) -> String {
        match self {
            NexusValue::Text(s) => s.clone(),
            NexusValue::Int(i) => i.to_string(),
            NexusValue::Float(f) => f.to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NexusValue::Text(s) => s.trim().parse().ok(),
            NexusValue::Int(i) => Some(*i as f64),
            NexusValue::Float(f) => Some(*f),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            NexusValue::Text(s) => s.trim().parse().ok(),
            NexusValue::Int(i) => u64::try_from(*i).ok(),
            NexusValue::Float(f) if *f >= 0.0 => Some(*f as u64),
            NexusValue::Float(_) => None,
        }
    }
}

/// An open NeXus file. Missing or unreadable datasets yield `None`.
pub trait NexusFile {
    fn read_scalar(&self, dataset: &str) -> Option<NexusValue>;
}

/// Opens NeXus files.
pub trait NexusReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn NexusFile>>;
}

/// The reader this build supports: HDF5 when compiled in, otherwise a
/// reader that always reports the missing support.
pub fn default_reader() -> Arc<dyn NexusReader> {
    #[cfg(feature = "hdf5")]
    {
        Arc::new(Hdf5Reader)
    }
    #[cfg(not(feature = "hdf5"))]
    {
        Arc::new(UnavailableReader)
    }
}

// =============================================================================
// Unavailable
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableReader;

impl NexusReader for UnavailableReader {
    fn open(&self, _path: &Path) -> Result<Box<dyn NexusFile>> {
        Err(SnapError::Hdf5Unavailable)
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Reader backed by a map of `path -> dataset -> value`.
///
/// Used for demos and tests where no HDF5 files exist; the files still
/// have to exist on disk for discovery to find them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReader {
    files: Arc<RwLock<HashMap<PathBuf, HashMap<String, NexusValue>>>>,
}

impl InMemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, dataset: &str, value: NexusValue) {
        if let Ok(mut files) = self.files.write() {
            files
                .entry(path.into())
                .or_default()
                .insert(dataset.to_string(), value);
        }
    }
}

struct InMemoryFile(HashMap<String, NexusValue>);

impl NexusFile for InMemoryFile {
    fn read_scalar(&self, dataset: &str) -> Option<NexusValue> {
        self.0.get(dataset).cloned()
    }
}

impl NexusReader for InMemoryReader {
    fn open(&self, path: &Path) -> Result<Box<dyn NexusFile>> {
        let files = self
            .files
            .read()
            .map_err(|_| SnapError::Read("reader lock poisoned".to_string()))?;
        let datasets = files
            .get(path)
            .cloned()
            .ok_or_else(|| SnapError::Read(format!("unable to open file {}", path.display())))?;
        Ok(Box::new(InMemoryFile(datasets)))
    }
}

// =============================================================================
// HDF5
// =============================================================================

#[cfg(feature = "hdf5")]
pub use self::h5::Hdf5Reader;

#[cfg(feature = "hdf5")]
mod h5 {
    use std::path::Path;

    use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
    use tracing::debug;

    use super::{NexusFile, NexusReader, NexusValue};
    use crate::error::Result;

    /// Reads NeXus files with libhdf5.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Hdf5Reader;

    impl NexusReader for Hdf5Reader {
        fn open(&self, path: &Path) -> Result<Box<dyn NexusFile>> {
            let file = hdf5::File::open(path)?;
            Ok(Box::new(Hdf5File(file)))
        }
    }

    struct Hdf5File(hdf5::File);

    impl Hdf5File {
        fn read(&self, dataset: &str) -> hdf5::Result<Option<NexusValue>> {
            let ds = self.0.dataset(dataset)?;
            let value = match ds.dtype()?.to_descriptor()? {
                TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) | TypeDescriptor::Boolean => {
                    ds.read_raw::<i64>()?.first().copied().map(NexusValue::Int)
                }
                TypeDescriptor::Float(_) => ds.read_raw::<f64>()?.first().copied().map(NexusValue::Float),
                TypeDescriptor::VarLenUnicode => ds
                    .read_raw::<VarLenUnicode>()?
                    .first()
                    .map(|s| NexusValue::Text(s.as_str().to_string())),
                TypeDescriptor::VarLenAscii => ds
                    .read_raw::<VarLenAscii>()?
                    .first()
                    .map(|s| NexusValue::Text(s.as_str().to_string())),
                TypeDescriptor::FixedUnicode(_) => ds
                    .read_raw::<FixedUnicode<1024>>()?
                    .first()
                    .map(|s| NexusValue::Text(s.as_str().to_string())),
                TypeDescriptor::FixedAscii(_) => ds
                    .read_raw::<FixedAscii<1024>>()?
                    .first()
                    .map(|s| NexusValue::Text(s.as_str().to_string())),
                _ => None,
            };
            Ok(value)
        }
    }

    impl NexusFile for Hdf5File {
        fn read_scalar(&self, dataset: &str) -> Option<NexusValue> {
            match self.read(dataset) {
                Ok(value) => value,
                Err(e) => {
                    debug!(dataset, error = %e, "dataset not readable");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(NexusValue::Text(" 12.5 ".into()).as_f64(), Some(12.5));
        assert_eq!(NexusValue::Int(7).as_f64(), Some(7.0));
        assert_eq!(NexusValue::Float(3.9).as_u64(), Some(3));
        assert_eq!(NexusValue::Int(-1).as_u64(), None);
        assert_eq!(NexusValue::Float(2.0).as_text(), "2");
    }

    #[test]
    fn test_unavailable_reader_errors() {
        let err = UnavailableReader.open(Path::new("/nope")).err().unwrap();
        assert_eq!(err.to_string(), "HDF5 support not enabled");
    }

    #[test]
    fn test_in_memory_reader() {
        let reader = InMemoryReader::new();
        reader.insert("/data/a.h5", "entry/title", NexusValue::Text("Si".into()));
        let file = reader.open(Path::new("/data/a.h5")).unwrap();
        assert_eq!(file.read_scalar("entry/title"), Some(NexusValue::Text("Si".into())));
        assert_eq!(file.read_scalar("entry/duration"), None);
        assert!(reader.open(Path::new("/data/b.h5")).is_err());
    }
}
