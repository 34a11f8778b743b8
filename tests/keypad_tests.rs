//! Key decoder against the simulated ladder

mod common;

use rust_bluebox::audio::Synth;
use rust_bluebox::keypad::get_key;
use rust_bluebox::{BlueboxConfig, KeyCode, KeypadLayout};

use common::{leak_engine, reading, Script, SimBoard};

fn synth_for(script: Script) -> Synth<'static, SimBoard> {
    let engine = leak_engine();
    Synth::new(engine, SimBoard::new(engine, script))
}

#[test]
fn test_stable_reading_is_idempotent() {
    let config = BlueboxConfig::DEFAULT;
    for key in KeyCode::ALL {
        let mut synth = synth_for(Script::new().press(key, 500));
        for _ in 0..10 {
            assert_eq!(get_key(&mut synth, &config), Some(key));
        }
    }
}

#[test]
fn test_below_noise_floor_is_no_key() {
    let config = BlueboxConfig::DEFAULT;
    for value in 0..config.noise_floor {
        let mut synth = synth_for(Script::new().level(value, 500));
        for _ in 0..5 {
            assert_eq!(get_key(&mut synth, &config), None);
        }
    }
}

#[test]
fn test_get_key_waits_debounce_interval() {
    let config = BlueboxConfig::DEFAULT;
    let mut synth = synth_for(Script::new().press(KeyCode::Four, 500));
    get_key(&mut synth, &config);
    assert_eq!(synth.board().now_ms(), config.debounce_wait_ms() as u64);
}

#[test]
fn test_bounce_is_retried() {
    let config = BlueboxConfig::DEFAULT;
    // Reading changes between the two samples, then settles
    let script = Script::new()
        .level(reading(KeyCode::Two), 4)
        .level(reading(KeyCode::Three), 4)
        .press(KeyCode::Six, 200);
    let mut synth = synth_for(script);
    assert_eq!(get_key(&mut synth, &config), Some(KeyCode::Six));
    assert!(synth.board().now_ms() > config.debounce_wait_ms() as u64);
}

#[test]
fn test_reversed_ladder() {
    let config = BlueboxConfig {
        layout: KeypadLayout::REVERSED,
        ..BlueboxConfig::DEFAULT
    };
    // Standard SEIZE voltage reads as KEY_1 on the reversed ladder
    let mut synth = synth_for(Script::new().press(KeyCode::Seize, 100));
    assert_eq!(get_key(&mut synth, &config), Some(KeyCode::One));
}
