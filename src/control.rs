//! Module: control
//!
//! Purpose: The keypad state machine.
//!
//! ```text
//! STARTUP ─▶ WAIT_KEY ─▶ DISPATCH ─▶ HOLD_ARBITRATION ─┐
//!               ▲                                      │
//!               └──────────── epilogue ◀───────────────┘
//! ```
//!
//! - STARTUP: validate the stored header, then look at the key held at power-on
//!   (SEIZE: set-default protocol, 1-5: one-boot mode override)
//! - DISPATCH: live tone, or memory playback when playback mode is on
//! - HOLD_ARBITRATION: long SEIZE toggles playback mode, any other long press
//!   stores the key history into that key's memory
//! - epilogue: short presses outside playback mode join the key history
//!
//! All waiting happens inside [`Synth::sleep_ms`]; there is no other scheduler.

use crate::audio::{Synth, ToneEngine};
use crate::chirp::Chirp;
use crate::config::{BlueboxConfig, SeizePolicy, ToneLength};
use crate::dispatch::{dispatch, ToneMode};
use crate::fault::{Error, FaultState};
use crate::hal::Board;
use crate::keypad::{get_key, KeyCode};
use crate::memory::{self, Header};
use crate::ring::KeyHistory;
use crate::{log_debug, log_error, log_info, log_warn, LOG_STREAM};

/// What a long press did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldOutcome {
    /// Released before the threshold
    Short,
    /// SEIZE held: playback mode toggled
    Flipped,
    /// Digit held outside playback mode: memory stored (or attempted)
    Wrote,
    /// Digit held in playback mode: nothing to do
    Ignored,
}

pub struct Bluebox<'e, B: Board> {
    synth: Synth<'e, B>,
    config: BlueboxConfig,
    faults: &'e FaultState,
    history: KeyHistory,
    mode: ToneMode,
    tone_length: ToneLength,
    playback_mode: bool,
}

impl<'e, B: Board> Bluebox<'e, B> {
    pub fn new(
        engine: &'e ToneEngine,
        board: B,
        config: BlueboxConfig,
        faults: &'e FaultState,
    ) -> Self {
        Self {
            synth: Synth::new(engine, board),
            config,
            faults,
            history: KeyHistory::new(),
            mode: config.default_mode,
            tone_length: config.default_tone_length,
            playback_mode: false,
        }
    }

    /// Boot, then serve keys forever.
    pub fn run(&mut self) -> ! {
        self.boot();
        loop {
            self.step();
        }
    }

    /// STARTUP state.
    pub fn boot(&mut self) {
        let raw = match memory::read_header(self.synth.board_mut()) {
            Ok(raw) => raw,
            Err(e) => {
                self.report(&e);
                [memory::ERASED; 2]
            }
        };

        let check = memory::validate_header(raw, &self.config);
        self.mode = check.header.mode;
        self.tone_length = check.header.tone_length;

        if let Some(e) = check.mode_error {
            self.report(&e);
            Chirp::ModeFallback.play(&mut self.synth);
        }
        if let Some(e) = check.length_error {
            self.report(&e);
            Chirp::LengthFallback.play(&mut self.synth);
        }

        self.history.init();
        self.playback_mode = false;

        let held = get_key(&mut self.synth, &self.config);
        match held {
            Some(KeyCode::Seize) => self.set_defaults(),
            Some(key) => {
                if let Some(mode) = ToneMode::from_selector_key(key) {
                    self.mode = mode;
                    log_info!(LOG_STREAM, self.synth.now_ms(), "override mode={}", mode.name());
                    Chirp::Acknowledge.play(&mut self.synth);
                }
                self.wait_release(key);
            }
            None => {}
        }

        let faults = self.faults.snapshot();
        if faults.active {
            log_warn!(
                LOG_STREAM,
                self.synth.now_ms(),
                "fault {:?} data=0x{:02X} total={}",
                faults.code,
                faults.data,
                faults.count
            );
        }

        log_info!(
            LOG_STREAM,
            self.synth.now_ms(),
            "ready mode={} len={}",
            self.mode.name(),
            self.tone_length.ms()
        );
    }

    /// Set-default protocol, entered with SEIZE held at power-on.
    ///
    /// The next key picks the persisted startup mode (1-5) or toggles the
    /// persisted tone length (#). Anything else is rejected.
    fn set_defaults(&mut self) {
        Chirp::Acknowledge.play(&mut self.synth);
        self.wait_release(KeyCode::Seize);

        let key = self.wait_key();
        let mut header = Header {
            mode: self.mode,
            tone_length: self.tone_length,
        };
        if let Some(mode) = ToneMode::from_selector_key(key) {
            header.mode = mode;
        } else if key == KeyCode::Hash {
            header.tone_length = header.tone_length.toggled();
        } else {
            log_warn!(LOG_STREAM, self.synth.now_ms(), "set-default: rejected {:?}", key);
            Chirp::Error.play(&mut self.synth);
            self.wait_release(key);
            return;
        }

        match memory::write_header(self.synth.board_mut(), header) {
            Ok(()) => {
                // A freshly written header supersedes any fallback from this boot
                self.faults.clear();
                self.mode = header.mode;
                self.tone_length = header.tone_length;
                log_info!(
                    LOG_STREAM,
                    self.synth.now_ms(),
                    "defaults saved mode={} len={}",
                    header.mode.name(),
                    header.tone_length.ms()
                );
                Chirp::Saved.play(&mut self.synth);
            }
            Err(e) => {
                self.report(&e);
                Chirp::Error.play(&mut self.synth);
            }
        }
        self.wait_release(key);
    }

    /// One WAIT_KEY → DISPATCH → HOLD_ARBITRATION → epilogue cycle.
    pub fn step(&mut self) -> (KeyCode, HoldOutcome) {
        let key = self.wait_key();
        log_debug!(LOG_STREAM, self.synth.now_ms(), "key {:?}", key);

        self.dispatch_key(key);
        let outcome = self.hold(key);

        if !self.playback_mode && outcome == HoldOutcome::Short {
            if self.history.insert(key.code()) {
                log_debug!(LOG_STREAM, self.synth.now_ms(), "history full, oldest dropped");
            }
        }
        (key, outcome)
    }

    /// DISPATCH state.
    fn dispatch_key(&mut self, key: KeyCode) {
        if !self.playback_mode {
            dispatch(&mut self.synth, self.mode, key, self.tone_length, false);
            return;
        }

        if key == KeyCode::Seize {
            if self.config.seize_in_playback == SeizePolicy::Live {
                dispatch(&mut self.synth, self.mode, key, self.tone_length, false);
            }
            return;
        }

        self.history.init();
        match memory::playback(&mut self.synth, key, &mut self.mode, self.tone_length) {
            Ok(n) => log_info!(LOG_STREAM, self.synth.now_ms(), "played {:?}: {} keys", key, n),
            Err(Error::EmptySlot) => {
                log_debug!(LOG_STREAM, self.synth.now_ms(), "memory {:?} empty", key);
            }
            Err(e) => {
                self.report(&e);
                Chirp::Error.play(&mut self.synth);
            }
        }
    }

    /// HOLD_ARBITRATION state.
    fn hold(&mut self, key: KeyCode) -> HoldOutcome {
        let long_press = self.synth.engine().long_press();
        long_press.arm(self.config.longpress_ms);

        let mut fired = false;
        loop {
            if long_press.take() {
                fired = true;
                break;
            }
            if get_key(&mut self.synth, &self.config) != Some(key) {
                break;
            }
        }

        let outcome = if !fired {
            HoldOutcome::Short
        } else if key == KeyCode::Seize {
            self.toggle_playback();
            HoldOutcome::Flipped
        } else if !self.playback_mode {
            self.store(key);
            HoldOutcome::Wrote
        } else {
            HoldOutcome::Ignored
        };

        if fired {
            self.wait_release(key);
        }
        long_press.disarm();
        outcome
    }

    fn toggle_playback(&mut self) {
        self.playback_mode = !self.playback_mode;
        self.history.init();
        log_info!(LOG_STREAM, self.synth.now_ms(), "playback {}", if self.playback_mode { "on" } else { "off" });
        if self.playback_mode {
            Chirp::PlaybackOn.play(&mut self.synth);
        } else {
            Chirp::PlaybackOff.play(&mut self.synth);
        }
    }

    fn store(&mut self, key: KeyCode) {
        match memory::store(&mut self.synth, &self.history, self.mode, key) {
            Ok(n) => log_info!(LOG_STREAM, self.synth.now_ms(), "stored {:?}: {} keys", key, n),
            Err(e) => {
                self.report(&e);
                Chirp::Error.play(&mut self.synth);
            }
        }
    }

    /// Block until a key is down.
    fn wait_key(&mut self) -> KeyCode {
        loop {
            if let Some(key) = get_key(&mut self.synth, &self.config) {
                return key;
            }
        }
    }

    /// Block while `key` is still down.
    fn wait_release(&mut self, key: KeyCode) {
        while get_key(&mut self.synth, &self.config) == Some(key) {}
    }

    fn report(&self, error: &Error) {
        self.faults.record(error);
        log_error!(LOG_STREAM, self.synth.now_ms(), "{}", error);
    }

    #[inline]
    pub fn mode(&self) -> ToneMode {
        self.mode
    }

    #[inline]
    pub fn tone_length(&self) -> ToneLength {
        self.tone_length
    }

    #[inline]
    pub fn playback_mode(&self) -> bool {
        self.playback_mode
    }

    #[inline]
    pub fn faults(&self) -> &FaultState {
        self.faults
    }

    #[inline]
    pub fn history(&self) -> &KeyHistory {
        &self.history
    }

    #[inline]
    pub fn synth(&self) -> &Synth<'e, B> {
        &self.synth
    }

    #[inline]
    pub fn synth_mut(&mut self) -> &mut Synth<'e, B> {
        &mut self.synth
    }
}
