//! Keeping the local X session from also reacting to forwarded input.
//!
//! When this machine's own keyboard is forwarded to a remote host, the X
//! server on this machine still sees every keystroke.  `--mute-x11` disables
//! the matching X input devices for the lifetime of the process by shelling
//! out to `xinput`, and re-enables them on the way out.
//!
//! Everything here is best effort: a missing `xinput` binary or an unknown
//! device is logged and otherwise ignored.

use std::io;
use std::process::Command;

use tracing::{info, warn};

/// Names shorter than this are too ambiguous to look up.
const MIN_NAME_LEN: usize = 4;

/// Access to the X input device list.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceMuter {
    /// Raw output of `xinput --list --short`.
    fn list(&self) -> io::Result<String>;

    /// Enables or disables the X input device `id`.
    fn set_enabled(&self, id: u32, enabled: bool) -> io::Result<()>;
}

/// [`DeviceMuter`] backed by the `xinput` command-line tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct XinputMuter;

impl DeviceMuter for XinputMuter {
    fn list(&self) -> io::Result<String> {
        let out = Command::new("xinput").args(["--list", "--short"]).output()?;
        if !out.status.success() {
            return Err(io::Error::other(format!("xinput --list exited with {}", out.status)));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn set_enabled(&self, id: u32, enabled: bool) -> io::Result<()> {
        let status = Command::new("xinput")
            .args(["set-int-prop", &id.to_string(), "Device Enabled", "8"])
            .arg(if enabled { "1" } else { "0" })
            .status()?;
        if !status.success() {
            return Err(io::Error::other(format!("xinput set-int-prop exited with {status}")));
        }
        Ok(())
    }
}

/// Finds the id of the device called `name` in `xinput --list --short` output.
///
/// A line matches when `name` is followed (after optional padding spaces) by
/// a tab and `id=`.
pub fn find_device_id(listing: &str, name: &str) -> Option<u32> {
    if name.len() < MIN_NAME_LEN {
        return None;
    }
    listing.lines().find_map(|line| {
        line.match_indices(name).find_map(|(pos, _)| {
            let rest = line[pos + name.len()..].trim_start_matches(' ');
            let digits = rest.strip_prefix("\tid=")?;
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse().ok()
        })
    })
}

/// Device names in `xinput --list --short` output, without the tree decoration.
pub fn device_names(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let (head, _) = line.split_once("\tid=")?;
            let name = head
                .trim_start_matches(|c: char| !c.is_alphanumeric())
                .trim_end();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// X devices disabled by [`MutedDevices::mute`]; re-enabled when dropped.
pub struct MutedDevices<M: DeviceMuter> {
    muter: M,
    ids: Vec<u32>,
}

impl<M: DeviceMuter> MutedDevices<M> {
    /// Disables every X device whose name is in `names`.
    pub fn mute<'a>(muter: M, names: impl IntoIterator<Item = &'a str>) -> Self {
        let listing = match muter.list() {
            Ok(listing) => listing,
            Err(e) => {
                warn!("x11-mutable information not available: {e}");
                return Self {
                    muter,
                    ids: Vec::new(),
                };
            }
        };

        let mut ids = Vec::new();
        for name in names {
            let Some(id) = find_device_id(&listing, name) else {
                continue;
            };
            match muter.set_enabled(id, false) {
                Ok(()) => {
                    info!(device = name, id, "x11 input muted");
                    ids.push(id);
                }
                Err(e) => warn!(device = name, id, "failed to x11-mute: {e}"),
            }
        }
        Self { muter, ids }
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }
}

impl<M: DeviceMuter> Drop for MutedDevices<M> {
    fn drop(&mut self) {
        for &id in &self.ids {
            match self.muter.set_enabled(id, true) {
                Ok(()) => info!(id, "x11 input unmuted"),
                Err(e) => warn!(id, "failed to x11-unmute: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    const LISTING: &str = "\
⎡ Virtual core pointer                    \tid=2\t[master pointer  (3)]
⎜   ↳ Logitech USB Optical Mouse          \tid=10\t[slave  pointer  (2)]
⎣ Virtual core keyboard                   \tid=3\t[master keyboard (2)]
    ↳ AT Translated Set 2 keyboard        \tid=13\t[slave  keyboard (3)]
";

    #[test]
    fn test_find_device_id_matches_padded_name() {
        assert_eq!(find_device_id(LISTING, "Logitech USB Optical Mouse"), Some(10));
        assert_eq!(find_device_id(LISTING, "AT Translated Set 2 keyboard"), Some(13));
    }

    #[test]
    fn test_find_device_id_requires_tab_id_after_name() {
        // "Virtual core" is a prefix of two names but never directly followed by the id.
        assert_eq!(find_device_id(LISTING, "Virtual core"), None);
    }

    #[test]
    fn test_find_device_id_rejects_short_names() {
        assert_eq!(find_device_id("abc\tid=4\n", "abc"), None);
    }

    #[test]
    fn test_device_names_strips_tree_decoration() {
        let names = device_names(LISTING);
        assert_eq!(
            names,
            vec![
                "Virtual core pointer",
                "Logitech USB Optical Mouse",
                "Virtual core keyboard",
                "AT Translated Set 2 keyboard",
            ]
        );
    }

    #[test]
    fn test_mute_disables_known_devices_and_drop_reenables_them() {
        // Arrange
        let mut muter = MockDeviceMuter::new();
        muter.expect_list().returning(|| Ok(LISTING.to_string()));
        muter
            .expect_set_enabled()
            .with(eq(13), eq(false))
            .times(1)
            .returning(|_, _| Ok(()));
        muter
            .expect_set_enabled()
            .with(eq(13), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));

        // Act
        let muted = MutedDevices::mute(muter, ["AT Translated Set 2 keyboard", "Unknown Gadget"]);

        // Assert
        assert_eq!(muted.ids(), &[13]);
        drop(muted);
    }

    #[test]
    fn test_mute_without_xinput_mutes_nothing() {
        let mut muter = MockDeviceMuter::new();
        muter
            .expect_list()
            .returning(|| Err(io::Error::from(io::ErrorKind::NotFound)));
        muter.expect_set_enabled().never();

        let muted = MutedDevices::mute(muter, ["AT Translated Set 2 keyboard"]);

        assert!(muted.ids().is_empty());
    }

    #[test]
    fn test_failed_mute_is_not_unmuted_later() {
        let mut muter = MockDeviceMuter::new();
        muter.expect_list().returning(|| Ok(LISTING.to_string()));
        muter
            .expect_set_enabled()
            .with(eq(10), eq(false))
            .times(1)
            .returning(|_, _| Err(io::Error::other("no display")));

        let muted = MutedDevices::mute(muter, ["Logitech USB Optical Mouse"]);

        assert!(muted.ids().is_empty());
    }
}
