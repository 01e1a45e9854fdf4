//! Linux input subsystem (evdev) key code to USB HID Usage ID translation table.
//!
//! Reference: `linux/input-event-codes.h` and USB HID Usage Tables 1.3.
//!
//! # What is an evdev key code? (for beginners)
//!
//! The Linux kernel reports every key on every keyboard through the *evdev*
//! interface (`/dev/input/eventN`).  Each key has a number such as
//! `KEY_A = 30` or `KEY_ENTER = 28`.  These numbers follow the layout of the
//! original IBM PC scan codes, which is why they look scrambled: `KEY_Q` is 16
//! while `KEY_A` is 30, because Q sits on the row above A.
//!
//! A Bluetooth HID host does not understand evdev codes.  It expects USB HID
//! Usage IDs, so every key event is translated through this table on its way
//! into a keyboard report.
//!
//! # How this table works
//!
//! `EVDEV_TO_HID_TABLE` is a compile-time array of 128 [`HidKeyCode`] values
//! indexed by evdev code.  Every key this bridge forwards has an evdev code
//! below 128.  Codes beyond the table, and codes inside it with no mapping,
//! produce [`HidKeyCode::Unknown`] and are ignored by the translator.

use super::hid::HidKeyCode;

/// Number of evdev codes covered by the lookup table.
pub const TABLE_LEN: usize = 128;

/// Translates an evdev key code to a HID Usage ID.
///
/// Returns [`HidKeyCode::Unknown`] for codes that have no keyboard mapping,
/// including every code at or above [`TABLE_LEN`].
pub fn evdev_to_hid(code: u16) -> HidKeyCode {
    EVDEV_TO_HID_TABLE
        .get(code as usize)
        .copied()
        .unwrap_or(HidKeyCode::Unknown)
}

/// evdev → HID mapping table indexed by evdev key code (0–127).
const EVDEV_TO_HID_TABLE: [HidKeyCode; TABLE_LEN] = {
    use HidKeyCode::*;
    let mut t = [Unknown; TABLE_LEN];

    // ── Top row ───────────────────────────────────────────────────────────────
    t[1] = Escape;
    t[2] = Digit1;
    t[3] = Digit2;
    t[4] = Digit3;
    t[5] = Digit4;
    t[6] = Digit5;
    t[7] = Digit6;
    t[8] = Digit7;
    t[9] = Digit8;
    t[10] = Digit9;
    t[11] = Digit0;
    t[12] = Minus;
    t[13] = Equal;
    t[14] = Backspace;

    // ── QWERTY row ────────────────────────────────────────────────────────────
    t[15] = Tab;
    t[16] = KeyQ;
    t[17] = KeyW;
    t[18] = KeyE;
    t[19] = KeyR;
    t[20] = KeyT;
    t[21] = KeyY;
    t[22] = KeyU;
    t[23] = KeyI;
    t[24] = KeyO;
    t[25] = KeyP;
    t[26] = BracketLeft;
    t[27] = BracketRight;
    t[28] = Enter;

    // ── Home row ──────────────────────────────────────────────────────────────
    t[29] = ControlLeft;
    t[30] = KeyA;
    t[31] = KeyS;
    t[32] = KeyD;
    t[33] = KeyF;
    t[34] = KeyG;
    t[35] = KeyH;
    t[36] = KeyJ;
    t[37] = KeyK;
    t[38] = KeyL;
    t[39] = Semicolon;
    t[40] = Quote;
    t[41] = Backquote;

    // ── Bottom row ────────────────────────────────────────────────────────────
    t[42] = ShiftLeft;
    t[43] = Backslash;
    t[44] = KeyZ;
    t[45] = KeyX;
    t[46] = KeyC;
    t[47] = KeyV;
    t[48] = KeyB;
    t[49] = KeyN;
    t[50] = KeyM;
    t[51] = Comma;
    t[52] = Period;
    t[53] = Slash;
    t[54] = ShiftRight;
    t[55] = NumpadMultiply;
    t[56] = AltLeft;
    t[57] = Space;
    t[58] = CapsLock;

    // ── Function keys ─────────────────────────────────────────────────────────
    t[59] = F1;
    t[60] = F2;
    t[61] = F3;
    t[62] = F4;
    t[63] = F5;
    t[64] = F6;
    t[65] = F7;
    t[66] = F8;
    t[67] = F9;
    t[68] = F10;
    t[87] = F11;
    t[88] = F12;

    // ── Numpad ────────────────────────────────────────────────────────────────
    t[69] = NumLock;
    t[70] = ScrollLock;
    t[71] = Numpad7;
    t[72] = Numpad8;
    t[73] = Numpad9;
    t[74] = NumpadSubtract;
    t[75] = Numpad4;
    t[76] = Numpad5;
    t[77] = Numpad6;
    t[78] = NumpadAdd;
    t[79] = Numpad1;
    t[80] = Numpad2;
    t[81] = Numpad3;
    t[82] = Numpad0;
    t[83] = NumpadDecimal;
    t[96] = NumpadEnter;
    t[98] = NumpadDivide;

    // ISO key between left Shift and Z
    t[86] = NonUsHash;

    // ── Right-hand modifiers and system keys ──────────────────────────────────
    t[97] = ControlRight;
    t[99] = PrintScreen;
    t[100] = AltRight;
    t[119] = Pause;
    t[125] = MetaLeft;
    t[126] = MetaRight;

    // ── Navigation cluster ────────────────────────────────────────────────────
    t[102] = Home;
    t[103] = ArrowUp;
    t[104] = PageUp;
    t[105] = ArrowLeft;
    t[106] = ArrowRight;
    t[107] = End;
    t[108] = ArrowDown;
    t[109] = PageDown;
    t[110] = Insert;
    t[111] = Delete;

    t
};

#[cfg(test)]
mod tests {
    use super::*;
    use HidKeyCode::*;

    /// Pairs of (evdev code, expected HID code) for a standard US keyboard.
    const STANDARD_MAPPINGS: &[(u16, HidKeyCode)] = &[
        // Letters
        (30, KeyA), (48, KeyB), (46, KeyC), (32, KeyD), (18, KeyE), (33, KeyF),
        (34, KeyG), (35, KeyH), (23, KeyI), (36, KeyJ), (37, KeyK), (38, KeyL),
        (50, KeyM), (49, KeyN), (24, KeyO), (25, KeyP), (16, KeyQ), (19, KeyR),
        (31, KeyS), (20, KeyT), (22, KeyU), (47, KeyV), (17, KeyW), (45, KeyX),
        (21, KeyY), (44, KeyZ),
        // Digits
        (2, Digit1), (3, Digit2), (4, Digit3), (5, Digit4), (6, Digit5),
        (7, Digit6), (8, Digit7), (9, Digit8), (10, Digit9), (11, Digit0),
        // Control and punctuation
        (28, Enter), (1, Escape), (14, Backspace), (15, Tab), (57, Space),
        (12, Minus), (13, Equal), (26, BracketLeft), (27, BracketRight),
        (43, Backslash), (86, NonUsHash), (39, Semicolon), (40, Quote),
        (41, Backquote), (51, Comma), (52, Period), (53, Slash), (58, CapsLock),
        // Function keys
        (59, F1), (60, F2), (61, F3), (62, F4), (63, F5), (64, F6),
        (65, F7), (66, F8), (67, F9), (68, F10), (87, F11), (88, F12),
        // System and navigation
        (99, PrintScreen), (70, ScrollLock), (119, Pause),
        (110, Insert), (102, Home), (104, PageUp), (111, Delete), (107, End),
        (109, PageDown), (106, ArrowRight), (105, ArrowLeft), (108, ArrowDown),
        (103, ArrowUp),
        // Numpad
        (69, NumLock), (98, NumpadDivide), (55, NumpadMultiply),
        (74, NumpadSubtract), (78, NumpadAdd), (96, NumpadEnter),
        (79, Numpad1), (80, Numpad2), (81, Numpad3), (75, Numpad4),
        (76, Numpad5), (77, Numpad6), (71, Numpad7), (72, Numpad8),
        (73, Numpad9), (82, Numpad0), (83, NumpadDecimal),
        // Modifiers
        (29, ControlLeft), (42, ShiftLeft), (56, AltLeft), (125, MetaLeft),
        (97, ControlRight), (54, ShiftRight), (100, AltRight), (126, MetaRight),
    ];

    #[test]
    fn test_all_standard_evdev_codes_map_to_correct_hid() {
        for &(code, expected_hid) in STANDARD_MAPPINGS {
            let result = evdev_to_hid(code);
            assert_eq!(
                result, expected_hid,
                "evdev_to_hid({code}) should return {expected_hid:?}"
            );
        }
    }

    #[test]
    fn test_unmapped_codes_return_unknown() {
        // KEY_RESERVED, KEY_ZENKAKUHANKAKU, KEY_MUTE, KEY_COMPOSE, and codes past the table.
        for code in [0u16, 85, 113, 127, 128, 0x110, u16::MAX] {
            assert_eq!(
                evdev_to_hid(code),
                HidKeyCode::Unknown,
                "evdev_to_hid({code}) should be Unknown"
            );
        }
    }

    #[test]
    fn test_every_table_entry_is_either_unknown_or_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in 0..TABLE_LEN as u16 {
            let hid = evdev_to_hid(code);
            if hid != HidKeyCode::Unknown {
                assert!(seen.insert(hid), "{hid:?} is mapped from more than one evdev code");
            }
        }
    }
}
