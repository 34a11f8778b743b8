//! RustBluebox - Main entry point
//!
//! 1. Start the UART log drain task
//! 2. Open NVS and load the memory image
//! 3. Configure keypad ADC, PWM output and amplifier enable
//! 4. Start the carrier timer (ISR drives `ENGINE`)
//! 5. Hand the board to the control loop, which never returns

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(target_os = "espidf")]
mod firmware {
    use core::ffi::c_void;
    use core::ptr;

    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::{self as esp_idf_sys, esp, EspError};

    use rust_bluebox::config::nvs::{NvsError, NvsImage};
    use rust_bluebox::hal::{Board, OutputLevel};
    use rust_bluebox::uart_logger::{init_uart_logger, uart_logger_task, UartLoggerConfig};
    use rust_bluebox::{log_error, log_info, Bluebox, BlueboxConfig, FaultState, ToneEngine, LOG_STREAM};

    const CONFIG: BlueboxConfig = BlueboxConfig::DEFAULT;

    /// GPTimer tick resolution; carrier period = TIMER_RESOLUTION_HZ / carrier_hz
    const TIMER_RESOLUTION_HZ: u32 = 8_000_000;

    /// 8-bit LEDC runs well above the carrier so each sample is one duty update
    const PWM_FREQ_HZ: u32 = 156_250;

    #[cfg(feature = "esp32s3")]
    mod pins {
        /// ADC1 channel 0 (GPIO1): keypad ladder
        pub const KEYPAD_ADC_CHANNEL: u32 = 0;
        /// PWM tone output
        pub const TONE_PWM_GPIO: i32 = 4;
        /// Amplifier shutdown (active high enable)
        pub const AMP_ENABLE_GPIO: i32 = 5;
    }

    static ENGINE: ToneEngine = ToneEngine::new(CONFIG.carrier_hz);
    static FAULT_STATE: FaultState = FaultState::new();

    /// LEDC duty writer used from the carrier ISR.
    struct LedcLevel;

    impl OutputLevel for LedcLevel {
        #[inline]
        fn set_output_level(&mut self, level: u8) {
            // SAFETY: channel configured before the timer starts; duty calls
            // are placed in IRAM (CONFIG_LEDC_CTRL_FUNC_IN_IRAM)
            unsafe {
                esp_idf_sys::ledc_set_duty(
                    esp_idf_sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
                    esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0,
                    level as u32,
                );
                esp_idf_sys::ledc_update_duty(
                    esp_idf_sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
                    esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0,
                );
            }
        }
    }

    unsafe extern "C" fn on_carrier_alarm(
        _timer: esp_idf_sys::gptimer_handle_t,
        _edata: *const esp_idf_sys::gptimer_alarm_event_data_t,
        _ctx: *mut c_void,
    ) -> bool {
        ENGINE.on_carrier_tick(&mut LedcLevel);
        false
    }

    /// Peripherals seen by the control loop.
    struct EspBoard {
        adc: esp_idf_sys::adc_oneshot_unit_handle_t,
        image: NvsImage,
    }

    impl Board for EspBoard {
        type Error = NvsError;

        fn read_adc(&mut self) -> u8 {
            let mut raw: i32 = 0;
            // SAFETY: unit handle created in init_adc, channel configured
            let result = unsafe {
                esp_idf_sys::adc_oneshot_read(self.adc, pins::KEYPAD_ADC_CHANNEL, &mut raw)
            };
            if result != esp_idf_sys::ESP_OK {
                return 0;
            }
            // 12-bit to 8-bit
            (raw.clamp(0, 4095) >> 4) as u8
        }

        fn enable_output(&mut self) {
            unsafe {
                esp_idf_sys::gpio_set_level(pins::AMP_ENABLE_GPIO, 1);
            }
        }

        fn disable_output(&mut self) {
            unsafe {
                esp_idf_sys::gpio_set_level(pins::AMP_ENABLE_GPIO, 0);
            }
        }

        fn read_persistent(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), NvsError> {
            self.image.read(addr, buf)
        }

        fn write_persistent(&mut self, addr: usize, data: &[u8]) -> Result<(), NvsError> {
            self.image.write(addr, data)
        }
    }

    unsafe extern "C" fn logger_task(_arg: *mut c_void) {
        if let Ok(peripherals) = Peripherals::take() {
            if let Ok(mut uart) = init_uart_logger(
                peripherals.uart1,
                peripherals.pins.gpio17,
                &UartLoggerConfig::default(),
            ) {
                uart_logger_task(&mut uart);
            }
        }
        esp_idf_sys::vTaskDelete(ptr::null_mut());
    }

    fn start_logger() {
        // SAFETY: static task entry, no argument
        unsafe {
            esp_idf_sys::xTaskCreatePinnedToCore(
                Some(logger_task),
                c"uart_log".as_ptr(),
                4096,
                ptr::null_mut(),
                2,
                ptr::null_mut(),
                1,
            );
        }
    }

    fn init_adc() -> Result<esp_idf_sys::adc_oneshot_unit_handle_t, EspError> {
        let mut handle: esp_idf_sys::adc_oneshot_unit_handle_t = ptr::null_mut();
        let unit = esp_idf_sys::adc_oneshot_unit_init_cfg_t {
            unit_id: esp_idf_sys::adc_unit_t_ADC_UNIT_1,
            ..Default::default()
        };
        let channel = esp_idf_sys::adc_oneshot_chan_cfg_t {
            atten: esp_idf_sys::adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: esp_idf_sys::adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        unsafe {
            esp!(esp_idf_sys::adc_oneshot_new_unit(&unit, &mut handle))?;
            esp!(esp_idf_sys::adc_oneshot_config_channel(
                handle,
                pins::KEYPAD_ADC_CHANNEL,
                &channel
            ))?;
        }
        Ok(handle)
    }

    fn init_output() -> Result<(), EspError> {
        let timer = esp_idf_sys::ledc_timer_config_t {
            speed_mode: esp_idf_sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
            duty_resolution: esp_idf_sys::ledc_timer_bit_t_LEDC_TIMER_8_BIT,
            timer_num: esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
            freq_hz: PWM_FREQ_HZ,
            clk_cfg: esp_idf_sys::soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        let channel = esp_idf_sys::ledc_channel_config_t {
            gpio_num: pins::TONE_PWM_GPIO,
            speed_mode: esp_idf_sys::ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0,
            intr_type: esp_idf_sys::ledc_intr_type_t_LEDC_INTR_DISABLE,
            timer_sel: esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
            duty: rust_bluebox::audio::SILENCE_LEVEL as u32,
            hpoint: 0,
            ..Default::default()
        };
        unsafe {
            esp!(esp_idf_sys::ledc_timer_config(&timer))?;
            esp!(esp_idf_sys::ledc_channel_config(&channel))?;
            esp!(esp_idf_sys::gpio_set_direction(
                pins::AMP_ENABLE_GPIO,
                esp_idf_sys::gpio_mode_t_GPIO_MODE_OUTPUT
            ))?;
            esp!(esp_idf_sys::gpio_set_level(pins::AMP_ENABLE_GPIO, 0))?;
        }
        Ok(())
    }

    fn start_carrier(carrier_hz: u32) -> Result<(), EspError> {
        let mut timer: esp_idf_sys::gptimer_handle_t = ptr::null_mut();
        let config = esp_idf_sys::gptimer_config_t {
            clk_src: esp_idf_sys::soc_periph_gptimer_clk_src_t_GPTIMER_CLK_SRC_DEFAULT,
            direction: esp_idf_sys::gptimer_count_direction_t_GPTIMER_COUNT_UP,
            resolution_hz: TIMER_RESOLUTION_HZ,
            ..Default::default()
        };
        let callbacks = esp_idf_sys::gptimer_event_callbacks_t {
            on_alarm: Some(on_carrier_alarm),
        };
        let mut alarm = esp_idf_sys::gptimer_alarm_config_t {
            alarm_count: (TIMER_RESOLUTION_HZ / carrier_hz.max(1)) as u64,
            reload_count: 0,
            ..Default::default()
        };
        alarm.flags.set_auto_reload_on_alarm(1);

        unsafe {
            esp!(esp_idf_sys::gptimer_new_timer(&config, &mut timer))?;
            esp!(esp_idf_sys::gptimer_register_event_callbacks(
                timer,
                &callbacks,
                ptr::null_mut()
            ))?;
            esp!(esp_idf_sys::gptimer_set_alarm_action(timer, &alarm))?;
            esp!(esp_idf_sys::gptimer_enable(timer))?;
            esp!(esp_idf_sys::gptimer_start(timer))?;
        }
        Ok(())
    }

    fn bring_up() -> Result<EspBoard, NvsError> {
        let partition = EspDefaultNvsPartition::take().map_err(NvsError::InitFailed)?;
        let (image, migration) = NvsImage::open(partition)?;
        log_info!(LOG_STREAM, ENGINE.uptime_ms(), "nvs: {:?}", migration);

        let adc = init_adc().map_err(NvsError::InitFailed)?;
        init_output().map_err(NvsError::InitFailed)?;
        start_carrier(CONFIG.carrier_hz).map_err(NvsError::InitFailed)?;

        Ok(EspBoard { adc, image })
    }

    pub fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        start_logger();

        match bring_up() {
            Ok(board) => {
                log_info!(LOG_STREAM, ENGINE.uptime_ms(), "{}", env!("VERSION_STRING"));
                Bluebox::new(&ENGINE, board, CONFIG, &FAULT_STATE).run();
            }
            Err(e) => {
                log_error!(LOG_STREAM, ENGINE.uptime_ms(), "bring-up failed: {:?}", e);
                loop {
                    unsafe {
                        esp_idf_sys::vTaskDelay(1000);
                    }
                }
            }
        }
    }
}

#[cfg(target_os = "espidf")]
#[no_mangle]
fn main() {
    firmware::main();
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("bluebox: firmware image, build for an espidf target");
}
