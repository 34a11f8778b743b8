//! # RustBluebox
//!
//! Tone generator firmware for a resistor-ladder keypad on a single ADC pin.
//!
//! ## Architecture
//!
//! Two execution contexts share one [`ToneEngine`]:
//! - the carrier-timer ISR calls [`ToneEngine::on_carrier_tick`]: it mixes the
//!   two oscillators into the PWM level, counts milliseconds and runs the
//!   long-press countdown
//! - the control loop ([`control::Bluebox`]) consumes those flags through the
//!   blocking [`audio::Synth::sleep_ms`], decodes keys, plays tones and
//!   records/replays keystroke memories
//!
//! Everything here is portable. Peripherals live behind [`hal::Board`] and
//! [`hal::OutputLevel`]; `main.rs` binds them on ESP32.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod audio;
pub mod timing;
pub mod hal;
pub mod keypad;
pub mod dispatch;
pub mod chirp;
pub mod ring;
pub mod memory;
pub mod control;
pub mod logging;
pub mod log_globals;
pub mod fault;
pub mod uart_logger;

pub use config::{BlueboxConfig, SeizePolicy, ToneLength};
pub use audio::{Synth, ToneEngine};
pub use keypad::{KeyCode, KeypadLayout};
pub use dispatch::{ToneMode, ToneSink};
pub use ring::KeyRing;
pub use control::Bluebox;
pub use fault::{Error, FaultCode, FaultState};
pub use log_globals::LOG_STREAM;
