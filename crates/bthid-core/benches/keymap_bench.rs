//! Criterion benchmarks for the evdev → HID key table.
//!
//! Every key event goes through `evdev_to_hid`, so it must stay a plain
//! array index.
//!
//! Run with:
//! ```bash
//! cargo bench --package bthid-core --bench keymap_bench
//! ```

use bthid_core::keymap::evdev::evdev_to_hid;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

// ── Representative key codes for benchmarking ─────────────────────────────────

/// evdev codes for common keys plus a few with no mapping.
const BENCH_EVDEV_CODES: &[u16] = &[
    30,  // KEY_A
    44,  // KEY_Z
    28,  // KEY_ENTER
    1,   // KEY_ESC
    14,  // KEY_BACKSPACE
    15,  // KEY_TAB
    57,  // KEY_SPACE
    59,  // KEY_F1
    88,  // KEY_F12
    29,  // KEY_LEFTCTRL
    42,  // KEY_LEFTSHIFT
    56,  // KEY_LEFTALT
    105, // KEY_LEFT
    106, // KEY_RIGHT
    103, // KEY_UP
    108, // KEY_DOWN
    2,   // KEY_1
    11,  // KEY_0
    113, // KEY_MUTE (unmapped)
    0x110, // BTN_LEFT (outside table)
];

fn bench_evdev_to_hid(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_evdev");

    // Single lookup (typical per-event cost)
    group.bench_function("evdev_to_hid_single", |b| {
        b.iter(|| evdev_to_hid(black_box(30)))
    });

    // Burst of 20 diverse codes
    group.bench_function("evdev_to_hid_batch_20", |b| {
        b.iter(|| {
            BENCH_EVDEV_CODES
                .iter()
                .map(|&code| evdev_to_hid(black_box(code)))
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_evdev_to_hid);
criterion_main!(benches);
