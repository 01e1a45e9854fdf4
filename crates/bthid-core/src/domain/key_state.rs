//! Held-key, modifier and mouse-button state reconstructed from discrete events.
//!
//! # Why track state at all? (for beginners)
//!
//! The kernel tells us *changes*: "A went down", "A went up".  A HID host wants
//! *snapshots*: "right now A and B are held, with Left Shift".  [`KeyState`]
//! turns the first into the second.  Every translated event mutates it, and
//! every outgoing report is a copy of it.
//!
//! The key list keeps press order, holds at most eight entries (the width of
//! the report's key array) and never contains duplicates.  A ninth key is
//! dropped, the same way a real keyboard with 8-key rollover would ignore it.

use crate::keymap::hid::HidKeyCode;
use crate::protocol::report::{KeyboardReport, ModifierFlags, MouseButtons, KEY_SLOTS};

/// Snapshot of everything currently held down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyState {
    keys: [u8; KEY_SLOTS],
    len: usize,
    modifiers: ModifierFlags,
    buttons: MouseButtons,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key press.
    ///
    /// No-op if the key is already held or if all eight slots are taken.
    pub fn press(&mut self, usage: HidKeyCode) {
        let code = usage.as_u8();
        if code == 0 || self.keys().contains(&code) {
            return;
        }
        if self.len == KEY_SLOTS {
            tracing::debug!(key = ?usage, "key array full, press dropped");
            return;
        }
        self.keys[self.len] = code;
        self.len += 1;
    }

    /// Records a key release, shifting later keys left to keep press order.
    ///
    /// No-op if the key is not held.
    pub fn release(&mut self, usage: HidKeyCode) {
        let code = usage.as_u8();
        let Some(pos) = self.keys().iter().position(|&k| k == code) else {
            return;
        };
        self.keys.copy_within(pos + 1..self.len, pos);
        self.len -= 1;
        self.keys[self.len] = 0;
    }

    /// Sets or clears one modifier bit (see [`ModifierFlags`] constants).
    pub fn set_modifier(&mut self, bit: u8, down: bool) {
        if down {
            self.modifiers.0 |= bit;
        } else {
            self.modifiers.0 &= !bit;
        }
    }

    /// Sets or clears one mouse button bit (see [`MouseButtons`] constants).
    pub fn set_mouse_button(&mut self, bit: u8, down: bool) {
        let bit = bit & MouseButtons::MASK;
        if down {
            self.buttons.0 |= bit;
        } else {
            self.buttons.0 &= !bit;
        }
    }

    /// Releases everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Held keys, oldest press first.
    pub fn keys(&self) -> &[u8] {
        &self.keys[..self.len]
    }

    /// All eight report slots, zero-padded.
    pub fn key_slots(&self) -> [u8; KEY_SLOTS] {
        self.keys
    }

    pub fn modifiers(&self) -> ModifierFlags {
        self.modifiers
    }

    pub fn buttons(&self) -> MouseButtons {
        self.buttons
    }

    /// Builds the keyboard report for the current state.
    pub fn keyboard_report(&self) -> KeyboardReport {
        KeyboardReport {
            modifiers: self.modifiers,
            keys: self.keys,
        }
    }
}
