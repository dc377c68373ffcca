//! Path conventions of the SNAP data tree.

use std::path::{Path, PathBuf};

/// Facility location of the SNAP data tree.
pub const DEFAULT_DATA_ROOT: &str = "/SNS/SNAP";

/// Folder under `<IPTS>/shared` where SNAPRed writes reductions.
const SNAPRED_DIR: &str = "SNAPRed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapLayout {
    data_root: PathBuf,
}

impl Default for SnapLayout {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_ROOT)
    }
}

impl SnapLayout {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// `<root>/<IPTS>`
    pub fn ipts_dir(&self, ipts: &str) -> PathBuf {
        self.data_root.join(ipts)
    }

    pub fn native_nexus(&self, ipts: &str, run: u64) -> PathBuf {
        self.ipts_dir(ipts)
            .join("nexus")
            .join(format!("SNAP_{run}.nxs.h5"))
    }

    pub fn lite_nexus(&self, ipts: &str, run: u64) -> PathBuf {
        self.ipts_dir(ipts)
            .join("shared")
            .join("lite")
            .join(format!("SNAP_{run}.lite.nxs.h5"))
    }

    pub fn snapred_root(&self, ipts: &str) -> PathBuf {
        self.ipts_dir(ipts).join("shared").join(SNAPRED_DIR)
    }

    /// `<snapred>/<state>/<lite|native>`
    pub fn state_dir(&self, ipts: &str, state_id: &str, lite: bool) -> PathBuf {
        let mode = if lite { "lite" } else { "native" };
        self.snapred_root(ipts).join(state_id).join(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = SnapLayout::default();
        assert_eq!(
            layout.native_nexus("IPTS-1", 64413),
            PathBuf::from("/SNS/SNAP/IPTS-1/nexus/SNAP_64413.nxs.h5")
        );
        assert_eq!(
            layout.lite_nexus("IPTS-1", 64413),
            PathBuf::from("/SNS/SNAP/IPTS-1/shared/lite/SNAP_64413.lite.nxs.h5")
        );
        assert_eq!(
            layout.state_dir("IPTS-1", "04bd2c53f6bf6754", false),
            PathBuf::from("/SNS/SNAP/IPTS-1/shared/SNAPRed/04bd2c53f6bf6754/native")
        );
    }
}
