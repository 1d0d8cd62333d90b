//! Mounted volume enumeration.
//!
//! [`list_drives`] asks `sysinfo` for the mounted disks and turns them into
//! [`DriveInfo`] values the CLI prints for `drives` and scans for
//! `dupes --all-drives`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use serde::Serialize;
use sysinfo::Disks;

/// One mounted volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveInfo {
    /// Where the volume is mounted.
    pub mount_point: PathBuf,
    /// Volume name as reported by the OS, possibly empty.
    pub name: String,
    /// Whether the OS reports the volume as removable.
    pub removable: bool,
    /// Capacity in bytes.
    pub total_bytes: u64,
    /// Free space available to the current user, in bytes.
    pub available_bytes: u64,
}

impl DriveInfo {
    /// Display label, e.g. `"/media/usb - STICK (Removable)"`.
    #[must_use]
    pub fn label(&self) -> String {
        drive_label(&self.mount_point, &self.name, self.removable)
    }

    /// Used space in bytes.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    /// `"12.3 GiB free of 100.0 GiB"`.
    #[must_use]
    pub fn space_display(&self) -> String {
        format!(
            "{} free of {}",
            ByteSize::b(self.available_bytes),
            ByteSize::b(self.total_bytes)
        )
    }
}

/// Build the label shown next to a mount point.
#[must_use]
pub fn drive_label(mount_point: &Path, name: &str, removable: bool) -> String {
    let mount = mount_point.display();
    match (name.trim(), removable) {
        ("", true) => format!("{mount} - Removable Drive"),
        ("", false) => mount.to_string(),
        (name, true) => format!("{mount} - {name} (Removable)"),
        (name, false) => format!("{mount} - {name}"),
    }
}

/// List mounted volumes.
///
/// Mount points that do not exist or were already listed are skipped.
#[must_use]
pub fn list_drives() -> Vec<DriveInfo> {
    let disks = Disks::new_with_refreshed_list();
    let mut seen = HashSet::new();
    let mut drives = Vec::new();

    for disk in disks.iter() {
        let mount_point = disk.mount_point().to_path_buf();
        if mount_point.as_os_str().is_empty() || !mount_point.exists() {
            log::trace!("Skipping unavailable mount point {}", mount_point.display());
            continue;
        }
        if !seen.insert(mount_point.clone()) {
            continue;
        }

        drives.push(DriveInfo {
            mount_point,
            name: disk.name().to_string_lossy().into_owned(),
            removable: disk.is_removable(),
            total_bytes: disk.total_space(),
            available_bytes: disk.available_space(),
        });
    }

    log::debug!("Found {} mounted volume(s)", drives.len());
    drives
}

/// Mount points of every listed volume, for scanning all drives.
#[must_use]
pub fn drive_roots() -> Vec<PathBuf> {
    list_drives().into_iter().map(|d| d.mount_point).collect()
}
