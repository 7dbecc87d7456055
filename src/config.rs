//! Centralized configuration for a salvage session.
//!
//! Goals:
//! - Single place to collect the pager tunables instead of scattering
//!   setter calls through the pipeline.
//! - from_env() keeps the CLI and ad-hoc tooling configurable without
//!   plumbing flags everywhere.
//!
//! All fields have conservative defaults: discover geometry from the
//! header, treat the WAL as important, trust every frame.

use std::fmt;

/// Tunables consumed by `Pager::with_config`.
#[derive(Clone, Debug)]
pub struct SalvageConfig {
    /// Fixed page size; None means discover from the file header.
    pub page_size: Option<u32>,
    /// Fixed reserved-byte count; None means discover from the header.
    pub reserved_bytes: Option<u8>,
    /// If false, a corrupt WAL is discarded instead of failing
    /// initialization. Env: SALVAGE_WAL_OPTIONAL ("1|true|on|yes" => false).
    pub wal_importance: bool,
    /// Cap on trusted WAL frames. Env: SALVAGE_MAX_WAL_FRAME.
    pub max_wal_frame: u32,
}

impl Default for SalvageConfig {
    fn default() -> Self {
        Self {
            page_size: None,
            reserved_bytes: None,
            wal_importance: true,
            max_wal_frame: u32::MAX,
        }
    }
}

impl SalvageConfig {
    /// Defaults with env overrides applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if env_flag("SALVAGE_WAL_OPTIONAL") {
            cfg.wal_importance = false;
        }
        if let Some(n) = env_u32("SALVAGE_MAX_WAL_FRAME") {
            cfg.max_wal_frame = n;
        }
        cfg
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn reserved_bytes(mut self, reserved_bytes: u8) -> Self {
        self.reserved_bytes = Some(reserved_bytes);
        self
    }

    pub fn wal_importance(mut self, important: bool) -> Self {
        self.wal_importance = important;
        self
    }

    pub fn max_wal_frame(mut self, max_frame: u32) -> Self {
        self.max_wal_frame = max_frame;
        self
    }
}

impl fmt::Display for SalvageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page_size={:?} reserved_bytes={:?} wal_importance={} max_wal_frame={}",
            self.page_size, self.reserved_bytes, self.wal_importance, self.max_wal_frame
        )
    }
}

#[inline]
fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|s| s.to_ascii_lowercase())
        .map(|s| s == "1" || s == "true" || s == "yes" || s == "on")
        .unwrap_or(false)
}

#[inline]
fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let cfg = SalvageConfig::default()
            .page_size(4096)
            .reserved_bytes(32)
            .wal_importance(false)
            .max_wal_frame(10);
        assert_eq!(cfg.page_size, Some(4096));
        assert_eq!(cfg.reserved_bytes, Some(32));
        assert!(!cfg.wal_importance);
        assert_eq!(cfg.max_wal_frame, 10);
    }

    #[test]
    fn defaults_are_conservative() {
        let cfg = SalvageConfig::default();
        assert!(cfg.page_size.is_none());
        assert!(cfg.wal_importance);
        assert_eq!(cfg.max_wal_frame, u32::MAX);
    }
}
