//! One-event-at-a-time translation from raw input to HID reports.
//!
//! [`translate`] is a pure state-machine step.  It updates the [`KeyState`]
//! and returns at most one report together with a [`ControlSignal`] telling
//! the session loop whether to keep going.
//!
//! | Event                           | State change            | Report   |
//! |---------------------------------|-------------------------|----------|
//! | `EV_REL` X / Y / Z / wheel      | none                    | mouse    |
//! | `BTN_LEFT/RIGHT/MIDDLE`         | button bit              | mouse    |
//! | modifier key                    | modifier bit            | keyboard |
//! | mapped key, press / release     | key list                | keyboard |
//! | mapped key, repeat              | none                    | keyboard |
//! | `KEY_PAUSE` release             | none                    | released keyboard, then stop |
//! | sync, unmapped, other types     | none                    | none     |
//!
//! Relative axes are forwarded as-is, one report per axis event.  Deltas
//! outside `-128..=127` wrap when narrowed to the report's signed byte.

use crate::domain::input_event::{
    EventKind, RawInputEvent, BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, KEY_PAUSE, KEY_PRESSED,
    KEY_RELEASED, REL_WHEEL, REL_X, REL_Y, REL_Z,
};
use crate::domain::key_state::KeyState;
use crate::keymap::evdev::evdev_to_hid;
use crate::keymap::hid::HidKeyCode;
use crate::protocol::report::{HidReport, KeyboardReport, ModifierFlags, MouseButtons, MouseReport};

/// Left Ctrl plus Left Alt held while Pause is released ends the process.
pub const KILL_CHORD: u8 = ModifierFlags::LEFT_CTRL | ModifierFlags::LEFT_ALT;

/// What the session loop should do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Continue,
    /// Close the current session and go back to listening.
    Disconnect,
    /// Close the current session and shut the process down.
    Terminate,
}

/// Outcome of translating a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub report: Option<HidReport>,
    pub signal: ControlSignal,
}

impl Translation {
    fn none() -> Self {
        Self {
            report: None,
            signal: ControlSignal::Continue,
        }
    }

    fn report(report: HidReport) -> Self {
        Self {
            report: Some(report),
            signal: ControlSignal::Continue,
        }
    }

    fn stop(signal: ControlSignal) -> Self {
        Self {
            report: Some(HidReport::Keyboard(KeyboardReport::RELEASED)),
            signal,
        }
    }
}

/// Translates one raw event, updating `state`.
pub fn translate(event: &RawInputEvent, state: &mut KeyState) -> Translation {
    match event.kind {
        EventKind::RelativeMove => translate_motion(event, state),
        EventKind::Key => translate_key(event, state),
        EventKind::Sync | EventKind::Other(_) => Translation::none(),
    }
}

fn translate_motion(event: &RawInputEvent, state: &KeyState) -> Translation {
    let delta = event.value as i8;
    let mut report = MouseReport {
        buttons: state.buttons(),
        ..MouseReport::default()
    };
    match event.code {
        REL_X => report.dx = delta,
        REL_Y => report.dy = delta,
        REL_Z | REL_WHEEL => report.wheel = delta,
        _ => return Translation::none(),
    }
    Translation::report(HidReport::Mouse(report))
}

fn translate_key(event: &RawInputEvent, state: &mut KeyState) -> Translation {
    if event.code == KEY_PAUSE {
        return translate_pause(event, state);
    }

    if let Some(bit) = mouse_button_bit(event.code) {
        state.set_mouse_button(bit, event.value == KEY_PRESSED);
        return Translation::report(HidReport::Mouse(MouseReport {
            buttons: state.buttons(),
            ..MouseReport::default()
        }));
    }

    let usage = evdev_to_hid(event.code);
    if usage == HidKeyCode::Unknown {
        tracing::trace!(code = event.code, "unmapped key ignored");
        return Translation::none();
    }

    if let Some(bit) = usage.modifier_bit() {
        state.set_modifier(bit, event.value >= KEY_PRESSED);
    } else {
        match event.value {
            KEY_PRESSED => state.press(usage),
            KEY_RELEASED => state.release(usage),
            _ => {} // autorepeat is the host's job
        }
    }
    Translation::report(HidReport::Keyboard(state.keyboard_report()))
}

fn translate_pause(event: &RawInputEvent, state: &KeyState) -> Translation {
    if event.value != KEY_RELEASED {
        return Translation::none();
    }
    if state.modifiers().contains(KILL_CHORD) {
        Translation::stop(ControlSignal::Terminate)
    } else {
        Translation::stop(ControlSignal::Disconnect)
    }
}

fn mouse_button_bit(code: u16) -> Option<u8> {
    match code {
        BTN_LEFT => Some(MouseButtons::LEFT),
        BTN_RIGHT => Some(MouseButtons::RIGHT),
        BTN_MIDDLE => Some(MouseButtons::MIDDLE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::input_event::{EV_SYN, KEY_LEFTALT, KEY_LEFTCTRL, KEY_REPEATED};

    const KEY_A: u16 = 30;
    const KEY_B: u16 = 48;
    const KEY_LEFTSHIFT: u16 = 42;
    const KEY_RIGHTMETA: u16 = 126;

    fn keyboard(t: &Translation) -> KeyboardReport {
        match t.report {
            Some(HidReport::Keyboard(k)) => k,
            other => panic!("expected keyboard report, got {other:?}"),
        }
    }

    fn mouse(t: &Translation) -> MouseReport {
        match t.report {
            Some(HidReport::Mouse(m)) => m,
            other => panic!("expected mouse report, got {other:?}"),
        }
    }

    #[test]
    fn test_key_press_emits_keyboard_report_with_key() {
        // Arrange
        let mut state = KeyState::new();

        // Act
        let t = translate(&RawInputEvent::key_down(KEY_A), &mut state);

        // Assert
        assert_eq!(t.signal, ControlSignal::Continue);
        assert_eq!(keyboard(&t).keys[0], HidKeyCode::KeyA.as_u8());
        assert_eq!(state.keys(), &[HidKeyCode::KeyA.as_u8()]);
    }

    #[test]
    fn test_key_repeat_emits_report_without_changing_state() {
        let mut state = KeyState::new();
        translate(&RawInputEvent::key_down(KEY_A), &mut state);
        let before = state.clone();

        let t = translate(
            &RawInputEvent::new(EventKind::Key, KEY_A, KEY_REPEATED),
            &mut state,
        );

        assert_eq!(state, before);
        assert_eq!(keyboard(&t).keys[0], HidKeyCode::KeyA.as_u8());
    }

    #[test]
    fn test_modifier_sets_bit_and_keeps_key_list() {
        let mut state = KeyState::new();
        translate(&RawInputEvent::key_down(KEY_B), &mut state);

        let t = translate(&RawInputEvent::key_down(KEY_LEFTSHIFT), &mut state);

        let report = keyboard(&t);
        assert_eq!(report.modifiers.0, ModifierFlags::LEFT_SHIFT);
        assert_eq!(report.keys[0], HidKeyCode::KeyB.as_u8());
        assert!(state.keys().len() == 1, "modifiers never enter the key list");
    }

    #[test]
    fn test_modifier_repeat_keeps_bit_set() {
        let mut state = KeyState::new();
        translate(&RawInputEvent::key_down(KEY_RIGHTMETA), &mut state);
        translate(
            &RawInputEvent::new(EventKind::Key, KEY_RIGHTMETA, KEY_REPEATED),
            &mut state,
        );
        assert_eq!(state.modifiers().0, ModifierFlags::RIGHT_META);

        translate(&RawInputEvent::key_up(KEY_RIGHTMETA), &mut state);
        assert_eq!(state.modifiers().0, 0);
    }

    #[test]
    fn test_mouse_button_press_and_release() {
        let mut state = KeyState::new();

        let down = translate(&RawInputEvent::key_down(BTN_RIGHT), &mut state);
        let up = translate(&RawInputEvent::key_up(BTN_RIGHT), &mut state);

        assert_eq!(mouse(&down).buttons.0, MouseButtons::RIGHT);
        assert_eq!(mouse(&up).buttons.0, 0);
        assert_eq!((mouse(&down).dx, mouse(&down).dy, mouse(&down).wheel), (0, 0, 0));
    }

    #[test]
    fn test_each_axis_lands_in_its_own_field() {
        let mut state = KeyState::new();
        let x = mouse(&translate(&RawInputEvent::relative(REL_X, 3), &mut state));
        let y = mouse(&translate(&RawInputEvent::relative(REL_Y, -4), &mut state));
        let z = mouse(&translate(&RawInputEvent::relative(REL_Z, 1), &mut state));
        let w = mouse(&translate(&RawInputEvent::relative(REL_WHEEL, -1), &mut state));

        assert_eq!((x.dx, x.dy, x.wheel), (3, 0, 0));
        assert_eq!((y.dx, y.dy, y.wheel), (0, -4, 0));
        assert_eq!((z.dx, z.dy, z.wheel), (0, 0, 1));
        assert_eq!((w.dx, w.dy, w.wheel), (0, 0, -1));
    }

    #[test]
    fn test_large_delta_wraps_to_signed_byte() {
        let mut state = KeyState::new();
        let m = mouse(&translate(&RawInputEvent::relative(REL_X, 200), &mut state));
        assert_eq!(m.dx, -56);
    }

    #[test]
    fn test_unsupported_axis_produces_nothing() {
        let mut state = KeyState::new();
        let t = translate(&RawInputEvent::relative(0x06, 1), &mut state); // REL_HWHEEL
        assert_eq!(t, Translation::none());
    }

    #[test]
    fn test_sync_and_unmapped_keys_produce_nothing() {
        let mut state = KeyState::new();
        let sync = translate(&RawInputEvent::new(EventKind::from_type(EV_SYN), 0, 0), &mut state);
        let unmapped = translate(&RawInputEvent::key_down(113), &mut state); // KEY_MUTE
        assert_eq!(sync, Translation::none());
        assert_eq!(unmapped, Translation::none());
        assert!(state.keys().is_empty());
    }

    #[test]
    fn test_pause_press_does_nothing() {
        let mut state = KeyState::new();
        let t = translate(&RawInputEvent::key_down(KEY_PAUSE), &mut state);
        assert_eq!(t, Translation::none());
    }

    #[test]
    fn test_pause_release_alone_disconnects_with_released_report() {
        let mut state = KeyState::new();
        translate(&RawInputEvent::key_down(KEY_A), &mut state);

        let t = translate(&RawInputEvent::key_up(KEY_PAUSE), &mut state);

        assert_eq!(t.signal, ControlSignal::Disconnect);
        assert_eq!(keyboard(&t), KeyboardReport::RELEASED);
    }

    #[test]
    fn test_pause_release_with_left_ctrl_and_left_alt_terminates() {
        let mut state = KeyState::new();
        translate(&RawInputEvent::key_down(KEY_LEFTCTRL), &mut state);
        translate(&RawInputEvent::key_down(KEY_LEFTALT), &mut state);

        let t = translate(&RawInputEvent::key_up(KEY_PAUSE), &mut state);

        assert_eq!(t.signal, ControlSignal::Terminate);
        assert_eq!(keyboard(&t), KeyboardReport::RELEASED);
    }

    #[test]
    fn test_pause_release_with_only_left_ctrl_disconnects() {
        let mut state = KeyState::new();
        translate(&RawInputEvent::key_down(KEY_LEFTCTRL), &mut state);

        let t = translate(&RawInputEvent::key_up(KEY_PAUSE), &mut state);

        assert_eq!(t.signal, ControlSignal::Disconnect);
    }
}
