//! Integration tests for the session lifecycle.
//!
//! Drives `SessionManager` through its public API with the in-tree scripted
//! input and mock transport.  No Bluetooth adapter or input device is needed.

use std::time::Duration;

use bthid_client::application::session::{Phase, SessionConfig, SessionManager, Step};
use bthid_client::application::shutdown::ShutdownFlag;
use bthid_client::infrastructure::bluetooth::mock::{Accept, ChannelLog, MockTransport};
use bthid_client::infrastructure::input::mock::ScriptedInput;
use bthid_core::domain::input_event::{BTN_LEFT, KEY_LEFTALT, KEY_LEFTCTRL, KEY_PAUSE, REL_X};
use bthid_core::{HidKeyCode, RawInputEvent};

const KEY_A: u16 = 30;
const KEY_B: u16 = 48;

type Manager = SessionManager<ScriptedInput, MockTransport>;

fn config() -> SessionConfig {
    SessionConfig {
        cooldown: Duration::ZERO,
        ..SessionConfig::default()
    }
}

fn connecting(log: &ChannelLog) -> MockTransport {
    MockTransport::new()
        .with_control(Accept::Connect)
        .with_interrupt(Accept::Connect)
        .with_log(log.clone())
}

fn step_until(m: &mut Manager, phase: Phase) {
    for _ in 0..8 {
        if m.phase() == phase {
            return;
        }
        m.step().unwrap();
    }
    assert_eq!(m.phase(), phase);
}

fn kill_chord() -> Vec<RawInputEvent> {
    vec![
        RawInputEvent::key_down(KEY_LEFTCTRL),
        RawInputEvent::key_down(KEY_LEFTALT),
        RawInputEvent::key_down(KEY_PAUSE),
        RawInputEvent::key_up(KEY_PAUSE),
    ]
}

// ── Idle drain and activation ─────────────────────────────────────────────────

#[test]
fn test_input_without_session_updates_state_but_sends_nothing() {
    // Arrange: one key press queued while nobody is connected.
    let log = ChannelLog::default();
    let mut input = ScriptedInput::new();
    input.push_batch(vec![RawInputEvent::key_down(KEY_A)]);
    input.push_batch(vec![]);
    input.push_batch(vec![RawInputEvent::key_down(KEY_B)]);
    let mut m = SessionManager::new(input, connecting(&log), config(), ShutdownFlag::new());

    // Act: idle drain.
    m.step().unwrap();

    // Assert
    assert_eq!(m.phase(), Phase::AwaitingControl);
    assert_eq!(m.key_state().keys(), &[HidKeyCode::KeyA.as_u8()]);
    assert!(log.sent_on("interrupt").is_empty());

    // Act: handshake; the backlog (KEY_B) is drained at activation.
    step_until(&mut m, Phase::Active);

    // Assert
    assert!(m.key_state().keys().is_empty());
    assert!(m.key_state().modifiers().0 == 0);
    assert_eq!(m.input().pending_batches(), 0);
    assert!(log.sent_on("interrupt").is_empty());
    assert!(m.input().waits.contains(&Duration::ZERO));
}

#[test]
fn test_idle_drain_uses_short_wait() {
    let mut m = SessionManager::new(
        ScriptedInput::new(),
        MockTransport::new(),
        config(),
        ShutdownFlag::new(),
    );

    m.step().unwrap();

    assert_eq!(m.input().waits, vec![Duration::from_micros(500)]);
}

// ── Handshake failures ────────────────────────────────────────────────────────

#[test]
fn test_interrupt_timeout_closes_control_and_listens_again() {
    // Arrange: the host opens control but never interrupt.
    let log = ChannelLog::default();
    let transport = MockTransport::new()
        .with_control(Accept::Connect)
        .with_log(log.clone());
    let mut m = SessionManager::new(ScriptedInput::new(), transport, config(), ShutdownFlag::new());

    // Act
    step_until(&mut m, Phase::AwaitingInterrupt);
    m.step().unwrap();

    // Assert
    assert_eq!(m.phase(), Phase::Listening);
    assert_eq!(log.closed(), vec!["control".to_string()]);
    assert!(log.sent_on("interrupt").is_empty());
    let timeouts: Vec<Duration> = m.transport().accept_calls.iter().map(|(_, t)| *t).collect();
    assert_eq!(timeouts, vec![Duration::from_secs(1), Duration::from_secs(3)]);
}

#[test]
fn test_failed_accept_keeps_listening() {
    let log = ChannelLog::default();
    let transport = MockTransport::new()
        .with_control(Accept::Fail)
        .with_control(Accept::Connect)
        .with_interrupt(Accept::Connect)
        .with_log(log.clone());
    let mut m = SessionManager::new(ScriptedInput::new(), transport, config(), ShutdownFlag::new());

    step_until(&mut m, Phase::Active);

    assert!(log.closed().is_empty());
}

// ── Active session ────────────────────────────────────────────────────────────

#[test]
fn test_mouse_motion_with_left_button_is_sent_on_interrupt() {
    let log = ChannelLog::default();
    let mut m = SessionManager::new(ScriptedInput::new(), connecting(&log), config(), ShutdownFlag::new());
    step_until(&mut m, Phase::Active);

    m.input_mut().push_batch(vec![
        RawInputEvent::key_down(BTN_LEFT),
        RawInputEvent::relative(REL_X, 5),
    ]);
    m.step().unwrap();

    assert_eq!(
        log.sent_on("interrupt"),
        vec![
            vec![0xA1, 0x01, 0x01, 0x00, 0x00, 0x00],
            vec![0xA1, 0x01, 0x01, 0x05, 0x00, 0x00],
        ]
    );
}

#[test]
fn test_disconnect_then_second_host_is_served() {
    // Arrange
    let log = ChannelLog::default();
    let transport = MockTransport::new()
        .with_control(Accept::Connect)
        .with_control(Accept::Connect)
        .with_interrupt(Accept::Connect)
        .with_interrupt(Accept::Connect)
        .with_log(log.clone());
    let mut m = SessionManager::new(ScriptedInput::new(), transport, config(), ShutdownFlag::new());
    step_until(&mut m, Phase::Active);

    // Act: first host dropped with PAUSE.
    m.input_mut().push_batch(vec![
        RawInputEvent::key_down(KEY_PAUSE),
        RawInputEvent::key_up(KEY_PAUSE),
    ]);
    m.step().unwrap();
    step_until(&mut m, Phase::Listening);
    step_until(&mut m, Phase::Active);
    m.input_mut().push_batch(vec![RawInputEvent::key_down(KEY_A)]);
    m.step().unwrap();

    // Assert
    assert_eq!(log.closed(), vec!["interrupt".to_string(), "control".to_string()]);
    let frames = log.sent_on("interrupt");
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], vec![0xA1, 0x02, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(frames[1][..4], [0xA1, 0x02, 0x00, 0x04]);
}

// ── Whole-loop runs ───────────────────────────────────────────────────────────

#[test]
fn test_kill_chord_during_session_ends_run_cleanly() {
    // Arrange: empty batches end the idle and activation drains.
    let log = ChannelLog::default();
    let mut input = ScriptedInput::new();
    input.push_batch(vec![]);
    input.push_batch(vec![]);
    input.push_batch(kill_chord());
    let shutdown = ShutdownFlag::new();
    let mut m = SessionManager::new(input, connecting(&log), config(), shutdown.clone());

    // Act
    let result = m.run();

    // Assert
    assert!(result.is_ok());
    assert!(shutdown.is_requested());
    let frames = log.sent_on("interrupt");
    assert_eq!(frames.last().unwrap(), &vec![0xA1, 0x02, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(frames[0][..3], [0xA1, 0x02, 0x01]);
    assert_eq!(log.closed().len(), 2);
}

#[test]
fn test_kill_chord_while_idle_stops_before_accepting() {
    let mut input = ScriptedInput::new();
    input.push_batch(kill_chord());
    let mut m = SessionManager::new(input, MockTransport::new(), config(), ShutdownFlag::new());

    let step = m.step().unwrap();

    assert_eq!(step, Step::Stopped);
    assert!(m.transport().accept_calls.is_empty());
}

#[test]
fn test_requested_shutdown_stops_idle_loop() {
    let shutdown = ShutdownFlag::new();
    shutdown.request();
    let mut m = SessionManager::new(ScriptedInput::new(), MockTransport::new(), config(), shutdown);

    assert!(m.run().is_ok());
    assert!(m.input().waits.is_empty());
}
