//! Host and kernel memory usage.

use serde::Serialize;
use sysinfo::System;

use crate::types::{round1, round2};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// System usage above this percentage raises a warning.
pub const WARNING_PERCENT: f64 = 85.0;
/// System usage above this percentage is critical.
pub const CRITICAL_PERCENT: f64 = 95.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryInfo {
    #[serde(serialize_with = "round2")]
    pub system_total_gb: f64,
    #[serde(serialize_with = "round2")]
    pub system_used_gb: f64,
    #[serde(serialize_with = "round1")]
    pub system_percent: f64,
    #[serde(serialize_with = "round2")]
    pub mantid_used_gb: f64,
    /// Share of total system memory held by workspaces.
    #[serde(serialize_with = "round1")]
    pub mantid_percent: f64,
    pub warning: bool,
    pub critical: bool,
}

impl MemoryInfo {
    pub fn new(total_bytes: u64, used_bytes: u64, mantid_mb: f64) -> Self {
        let system_total_gb = total_bytes as f64 / GIB;
        let system_used_gb = used_bytes as f64 / GIB;
        let system_percent = if total_bytes > 0 {
            used_bytes as f64 / total_bytes as f64 * 100.0
        } else {
            0.0
        };
        let mantid_used_gb = mantid_mb / 1024.0;
        let mantid_percent = if system_total_gb > 0.0 {
            mantid_used_gb / system_total_gb * 100.0
        } else {
            0.0
        };
        Self {
            system_total_gb,
            system_used_gb,
            system_percent,
            mantid_used_gb,
            mantid_percent,
            warning: system_percent > WARNING_PERCENT,
            critical: system_percent > CRITICAL_PERCENT,
        }
    }

    /// Current host figures combined with the kernel's workspace total.
    pub fn sample(mantid_mb: f64) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        Self::new(sys.total_memory(), sys.used_memory(), mantid_mb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let gib = 1u64 << 30;
        let info = MemoryInfo::new(100 * gib, 90 * gib, 2048.0);
        assert!(info.warning);
        assert!(!info.critical);
        assert_eq!(info.mantid_used_gb, 2.0);
        assert!((info.mantid_percent - 2.0).abs() < 1e-9);

        let info = MemoryInfo::new(100 * gib, 96 * gib, 0.0);
        assert!(info.warning && info.critical);

        let info = MemoryInfo::new(0, 0, 10.0);
        assert_eq!(info.system_percent, 0.0);
        assert!(!info.warning);
    }

    #[test]
    fn test_json_is_rounded() {
        let info = MemoryInfo::new(3 * (1u64 << 30), 1 << 30, 100.0);
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["system_total_gb"], 3.0);
        assert_eq!(value["system_percent"], 33.3);
        assert_eq!(value["mantid_used_gb"], 0.1);
    }

    #[test]
    fn test_sample_reads_host() {
        let info = MemoryInfo::sample(0.0);
        assert!(info.system_total_gb > 0.0);
    }
}
