//! SNAP instrument data access for neutroNote.
//!
//! Locates raw NeXus run files and SNAPRed reduction outputs under the
//! facility data tree, and extracts the handful of metadata fields the
//! notebook shows on run headers and reduced-data entries.
//!
//! # Data tree
//!
//! | Kind | Path |
//! |------|------|
//! | Native NeXus | `<root>/<IPTS>/nexus/SNAP_<run>.nxs.h5` |
//! | Lite NeXus | `<root>/<IPTS>/shared/lite/SNAP_<run>.lite.nxs.h5` |
//! | Reduced | `<root>/<IPTS>/shared/SNAPRed/<state>/<lite\|native>/<run>/<timestamp>/` |
//!
//! HDF5 access sits behind the [`NexusReader`] trait. Builds without the
//! `hdf5` feature use [`UnavailableReader`], so metadata lookups report an
//! error instead of failing to link.

pub mod error;
pub mod layout;
pub mod metadata;
pub mod nexus;
pub mod reduced;

use std::sync::Arc;

pub use error::{Result, SnapError};
pub use layout::{SnapLayout, DEFAULT_DATA_ROOT};
pub use metadata::{run_number_from_filename, RunMetadata};
pub use nexus::{default_reader, InMemoryReader, NexusFile, NexusReader, NexusValue, UnavailableReader};
pub use reduced::{filter_runs, is_state_id, ReducedRun, StateInfo};

#[cfg(feature = "hdf5")]
pub use nexus::Hdf5Reader;

/// A SNAP data tree paired with the reader used to open its files.
#[derive(Clone)]
pub struct SnapArchive {
    layout: SnapLayout,
    reader: Arc<dyn NexusReader>,
}

impl SnapArchive {
    pub fn new(layout: SnapLayout, reader: Arc<dyn NexusReader>) -> Self {
        Self { layout, reader }
    }

    /// Archive using the best reader this build supports.
    pub fn with_default_reader(layout: SnapLayout) -> Self {
        Self::new(layout, default_reader())
    }

    pub fn layout(&self) -> &SnapLayout {
        &self.layout
    }

    pub fn reader(&self) -> &dyn NexusReader {
        self.reader.as_ref()
    }
}

impl std::fmt::Debug for SnapArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapArchive")
            .field("data_root", &self.layout.data_root())
            .finish_non_exhaustive()
    }
}
