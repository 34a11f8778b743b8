//! Global log stream instance.
//!
//! Written by the control loop (and boot code), drained by the UART task.

use crate::logging::LogStream;

pub static LOG_STREAM: LogStream = LogStream::new();
