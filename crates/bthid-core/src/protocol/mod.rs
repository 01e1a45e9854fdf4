//! Protocol module containing the HID report types and their binary codec.

pub mod codec;
pub mod report;

pub use codec::{encode_keyboard, encode_mouse};
pub use report::*;
