//! `--list`: a human-readable inventory of `/dev/input/event*`.
//!
//! Helps the user pick indices for `--device`.  Each line shows the index,
//! vendor/product/version, the kernel device name and whether X knows a
//! device by that name (`+`), which is what `--mute-x11` needs.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::infrastructure::input::MAX_EVENT_DEVICES;
use crate::infrastructure::xinput::{device_names, DeviceMuter};

/// What could be learned about one event node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceInfo {
    PermissionDenied,
    Present {
        vendor: u16,
        product: u16,
        version: u16,
        name: String,
        known_to_x11: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub index: u8,
    pub info: DeviceInfo,
}

impl fmt::Display for DeviceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info {
            DeviceInfo::PermissionDenied => write!(f, "{:2}:\t[permission denied]", self.index),
            DeviceInfo::Present {
                vendor,
                product,
                version,
                name,
                known_to_x11,
            } => write!(
                f,
                "{:2}\t[{vendor:04x}:{product:04x}.{version:04x}] '{name}' ({})",
                self.index,
                if *known_to_x11 { "+" } else { "-" }
            ),
        }
    }
}

/// Probes `dir/event0`, `dir/event1`, ... until the first missing node.
pub fn scan(dir: &Path, x11_names: &[String]) -> Vec<DeviceEntry> {
    let mut entries = Vec::new();
    for index in 0..MAX_EVENT_DEVICES {
        let path = dir.join(format!("event{index}"));
        match evdev::Device::open(&path) {
            Ok(device) => {
                let id = device.input_id();
                let name = device.name().unwrap_or_default().to_string();
                let known_to_x11 = x11_names.iter().any(|n| *n == name);
                entries.push(DeviceEntry {
                    index,
                    info: DeviceInfo::Present {
                        vendor: id.vendor(),
                        product: id.product(),
                        version: id.version(),
                        name,
                        known_to_x11,
                    },
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => entries.push(DeviceEntry {
                index,
                info: DeviceInfo::PermissionDenied,
            }),
            Err(e) => debug!(path = %path.display(), "skipped: {e}"),
        }
    }
    entries
}

/// Writes the device table to `out`.
///
/// # Errors
///
/// Only write failures on `out` are returned.
pub fn print_devices(dir: &Path, muter: &impl DeviceMuter, out: &mut impl Write) -> io::Result<()> {
    let x11_names = match muter.list() {
        Ok(listing) => device_names(&listing),
        Err(e) => {
            writeln!(out, "\tx11-mutable information not available ({e}).")?;
            Vec::new()
        }
    };
    writeln!(out, "List of available input devices:")?;
    writeln!(out, "num\tVendor/Product, Name, -x compatible (+/-)")?;
    for entry in scan(dir, &x11_names) {
        writeln!(out, "{entry}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::xinput::MockDeviceMuter;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("bthid-devices-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_present_entry_formats_ids_and_x11_marker() {
        let entry = DeviceEntry {
            index: 3,
            info: DeviceInfo::Present {
                vendor: 0x046d,
                product: 0xc077,
                version: 0x0111,
                name: "Logitech USB Optical Mouse".to_string(),
                known_to_x11: true,
            },
        };
        assert_eq!(
            entry.to_string(),
            " 3\t[046d:c077.0111] 'Logitech USB Optical Mouse' (+)"
        );
    }

    #[test]
    fn test_denied_entry_formats_marker() {
        let entry = DeviceEntry {
            index: 12,
            info: DeviceInfo::PermissionDenied,
        };
        assert_eq!(entry.to_string(), "12:\t[permission denied]");
    }

    #[test]
    fn test_scan_of_empty_directory_finds_nothing() {
        let dir = temp_dir("empty");
        assert!(scan(&dir, &[]).is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_scan_skips_nodes_that_are_not_input_devices() {
        // Arrange: a regular file fails the evdev ioctls; event1 is absent.
        let dir = temp_dir("plain");
        std::fs::write(dir.join("event0"), b"not a device").unwrap();
        std::fs::write(dir.join("event2"), b"never reached").unwrap();

        // Act
        let entries = scan(&dir, &[]);

        // Assert
        assert!(entries.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_print_devices_writes_header_without_xinput() {
        let dir = temp_dir("print");
        let mut muter = MockDeviceMuter::new();
        muter
            .expect_list()
            .returning(|| Err(io::Error::from(io::ErrorKind::NotFound)));
        let mut out = Vec::new();

        print_devices(&dir, &muter, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("x11-mutable information not available"));
        assert!(text.contains("List of available input devices:"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
