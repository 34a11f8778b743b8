//! UART log output.
//!
//! Drains [`LOG_STREAM`] to a TX-only UART through an external USB-UART
//! adapter, so the console UART stays free and the control loop never
//! waits on serial I/O.
//!
//! ```text
//! ESP32 GPIO (TX) ──────▶ USB-UART RX
//!                          └─▶ PC Serial Monitor
//! ```

use core::fmt::Write;

use crate::logging::{BufWriter, LogEntry};

#[cfg(target_os = "espidf")]
use crate::LOG_STREAM;

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::peripheral::Peripheral;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::uart::{self, UartTxDriver};

/// UART configuration for logging.
pub struct UartLoggerConfig {
    pub baud_rate: u32,
}

impl Default for UartLoggerConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
        }
    }
}

/// Format log entry to text.
///
/// Format: `[timestamp_ms] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_ms,
        entry.level.as_str(),
        entry.text()
    );
    writer.pos
}

/// Format the periodic dropped-messages notice.
pub fn format_dropped(dropped: u32, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = write!(writer, "[WARN] Dropped: {}\n", dropped);
    writer.pos
}

/// Initialize UART1 TX-only for logging output.
#[cfg(target_os = "espidf")]
pub fn init_uart_logger<'d>(
    uart: impl Peripheral<P = esp_idf_svc::hal::uart::UART1> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    config: &UartLoggerConfig,
) -> Result<UartTxDriver<'d>, esp_idf_svc::sys::EspError> {
    let uart_config = uart::config::Config::default()
        .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

    UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )
}

/// UART log consumer task.
///
/// Drains LOG_STREAM, writes to UART, reports drops every 10 seconds.
#[cfg(target_os = "espidf")]
pub fn uart_logger_task(uart: &mut UartTxDriver<'_>) -> ! {
    let mut format_buf = [0u8; 128];
    let mut last_dropped_report = 0i64;

    loop {
        let mut work_done = false;

        while let Some(entry) = LOG_STREAM.drain() {
            let len = format_log_entry(&entry, &mut format_buf);
            let _ = uart.write(&format_buf[..len]);
            work_done = true;
        }

        let now = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        if now - last_dropped_report > 10_000_000 {
            let dropped = LOG_STREAM.dropped();
            if dropped > 0 {
                let len = format_dropped(dropped, &mut format_buf);
                let _ = uart.write(&format_buf[..len]);
                LOG_STREAM.reset_dropped();
            }
            last_dropped_report = now;
        }

        if !work_done {
            unsafe {
                esp_idf_svc::sys::vTaskDelay(10);
            }
        }
    }
}
