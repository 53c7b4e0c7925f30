//! Self-update housekeeping.
//!
//! Update delivery belongs to the deployment tooling; the bridge only needs
//! to notice that an update has begun and get out of the way. The tooling
//! signals that by creating a marker file, and the monitor latches on first
//! sight of it: once an update is in progress the flag never clears until
//! the process is restarted.

use std::path::PathBuf;

use tracing::info;

/// Housekeeping hook serviced first in every loop iteration.
pub trait UpdateService: Send {
    /// Returns true while an update is in progress.
    fn service(&mut self) -> bool;
}

/// Marker-file based update monitor.
pub struct UpdateMonitor {
    marker: PathBuf,
    in_progress: bool,
}

impl UpdateMonitor {
    pub fn new(marker: PathBuf) -> Self {
        Self {
            marker,
            in_progress: false,
        }
    }
}

impl UpdateService for UpdateMonitor {
    fn service(&mut self) -> bool {
        if !self.in_progress && self.marker.exists() {
            info!("update marker {} present, suspending bridge", self.marker.display());
            self.in_progress = true;
        }
        self.in_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = UpdateMonitor::new(dir.path().join("update"));
        assert!(!monitor.service());
        assert!(!monitor.service());
    }

    #[test]
    fn latches_once_marker_appears() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("update");
        let mut monitor = UpdateMonitor::new(marker.clone());
        assert!(!monitor.service());

        std::fs::write(&marker, b"").unwrap();
        assert!(monitor.service());

        // stays latched even after the marker goes away
        std::fs::remove_file(&marker).unwrap();
        assert!(monitor.service());
    }
}
