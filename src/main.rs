//! PulseMeter Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspUart ×2        FsSdCard (FAT on SPI)   NvsConfigStore      │
//! │  GpioKeyboard      PULSE_ARENA ◀── GPIO ISRs (BNC A–D)         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │         InstrumentService (pure logic)                 │    │
//! │  │  Keyboard debounce · MeasurementCoordinator            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Fixed-period loop · Task watchdog                             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use esp_idf_svc::fs::fatfs::Fatfs;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyInputPin, Input, InputPin, PinDriver, Pull};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::sd::spi::SdSpiHostDriver;
use esp_idf_svc::hal::sd::{SdCardConfiguration, SdCardDriver};
use esp_idf_svc::hal::spi::{SpiDriver, SpiDriverConfig};
use esp_idf_svc::hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::io::vfs::MountedFatfs;
use log::{error, info, warn};

use pulsemeter::adapters::esp_uart::EspUart;
use pulsemeter::adapters::nvs::NvsConfigStore;
use pulsemeter::adapters::sd_card_fs::{FsSdCard, SD_MOUNT_POINT};
use pulsemeter::app::coordinator::MeasurementCoordinator;
use pulsemeter::app::ports::UartId;
use pulsemeter::app::service::{InstrumentService, LogKeySink};
use pulsemeter::config::InstrumentConfig;
use pulsemeter::device::{
    Keyboard, PulseCounterSource, SdCardRecorder, UartRecorder, UartSource, WiFiRecorder,
};
use pulsemeter::drivers::watchdog::{Watchdog, timeout_for_tick};
use pulsemeter::drivers::{GpioKeyboardDriver, PulseChannel, PulseCounterDriver, hw_init};
use pulsemeter::error::Error;
use pulsemeter::measurement::DeviceId;

const UART_BAUD: u32 = 115_200;

/// Four pulse channels plus the UART measurement input.
const MAX_SOURCES: usize = 5;
/// SD card, WiFi link, USB.
const MAX_RECORDERS: usize = 3;

/// Log a one-line health summary every this many ticks.
const STATUS_EVERY_TICKS: u64 = 600;

type KeyPin = PinDriver<'static, AnyInputPin, Input>;

fn key_pin(pin: AnyInputPin) -> Result<KeyPin> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(Pull::Up)?;
    Ok(driver)
}

fn load_config() -> InstrumentConfig {
    match NvsConfigStore::new() {
        Ok(store) => store.load(),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            InstrumentConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PulseMeter v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Pulse inputs and their interrupts ──────────────────
    hw_init::init_peripherals()?;
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {}; pulse counts will stay at zero", e);
    }

    // ── 3. Configuration ──────────────────────────────────────
    let config = load_config();
    info!(
        "Config: tick={}ms long_press={} mode={:?} sd={} wifi={}",
        config.tick_period_ms,
        config.keyboard.long_press_threshold_ticks,
        config.pulse.sample_mode,
        config.recorder.sd_enabled,
        config.recorder.wifi_enabled
    );
    let watchdog = Watchdog::new(timeout_for_tick(config.tick_period_ms));

    // ── 4. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let keypad = GpioKeyboardDriver::new([
        key_pin(pins.gpio15.downgrade_input())?,
        key_pin(pins.gpio16.downgrade_input())?,
        key_pin(pins.gpio17.downgrade_input())?,
        key_pin(pins.gpio18.downgrade_input())?,
    ]);
    let keyboard = Keyboard::with_threshold(keypad, config.keyboard.long_press_threshold_ticks);

    let uart_config = UartConfig::default().baudrate(Hertz(UART_BAUD));
    let rx_uart = UartDriver::new(
        peripherals.uart1,
        pins.gpio39,
        pins.gpio40,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;
    let wifi_uart = UartDriver::new(
        peripherals.uart2,
        pins.gpio41,
        pins.gpio42,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;

    // The mount must outlive the SD recorder.
    let sd_mount = if config.recorder.sd_enabled {
        let mounted = (|| -> Result<_> {
            let spi = SpiDriver::new(
                peripherals.spi2,
                pins.gpio12,
                pins.gpio11,
                Some(pins.gpio13),
                &SpiDriverConfig::default(),
            )?;
            let host = SdSpiHostDriver::new(
                spi,
                Some(pins.gpio10),
                AnyIOPin::none(),
                AnyIOPin::none(),
                AnyIOPin::none(),
                None,
            )?;
            let card = SdCardDriver::new_spi(host, &SdCardConfiguration::new())?;
            Ok(MountedFatfs::mount(Fatfs::new_sdcard(0, card)?, SD_MOUNT_POINT, 4)?)
        })();
        match mounted {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("SD card mount failed ({}); recording to SD disabled", e);
                None
            }
        }
    } else {
        None
    };

    // ── 5. Sources ────────────────────────────────────────────
    let sample_mode = config.pulse.sample_mode;
    let mut pulse_sources = PulseChannel::ALL
        .map(|ch| PulseCounterSource::with_mode(PulseCounterDriver::new(ch), sample_mode));
    let mut uart_source =
        UartSource::new(EspUart::new(UartId::MeasurementReceiver, rx_uart), DeviceId::Uart1);

    // ── 6. Recorders ──────────────────────────────────────────
    let mut sd_recorder: SdCardRecorder<FsSdCard> = SdCardRecorder::with_file_name(
        FsSdCard::new(SD_MOUNT_POINT),
        config.recorder.sd_file_name.clone(),
    );
    let mut wifi_recorder = WiFiRecorder::with_timeout(
        EspUart::new(UartId::TransmitViaWifi, wifi_uart),
        config.recorder.uart_tx_timeout_ms,
    );
    let mut usb_recorder = UartRecorder::new();

    // ── 7. Coordinator and service ────────────────────────────
    let mut coordinator: MeasurementCoordinator<'_, MAX_SOURCES, MAX_RECORDERS> =
        MeasurementCoordinator::new();
    for (i, source) in pulse_sources.iter_mut().enumerate() {
        if config.channel_enabled(i) {
            coordinator.add_source(source).map_err(Error::from)?;
        }
    }
    coordinator.add_source(&mut uart_source).map_err(Error::from)?;

    if sd_mount.is_some() && Path::new(SD_MOUNT_POINT).is_dir() {
        coordinator.add_recorder(&mut sd_recorder).map_err(Error::from)?;
    }
    if config.recorder.wifi_enabled {
        coordinator.add_recorder(&mut wifi_recorder).map_err(Error::from)?;
    }
    coordinator.add_recorder(&mut usb_recorder).map_err(Error::from)?;

    let mut service = InstrumentService::new(keyboard, coordinator);
    service.initialize()?;
    service.start()?;

    info!(
        "System ready: {} sources, {} recorders. Entering measurement loop.",
        service.coordinator().source_count(),
        service.coordinator().recorder_count()
    );

    // ── 8. Measurement loop ───────────────────────────────────
    let period = Duration::from_millis(u64::from(config.tick_period_ms));
    let mut sink = LogKeySink;
    let mut failed_deliveries: u64 = 0;

    loop {
        let started = Instant::now();

        match service.tick(&mut sink) {
            Ok(report) => failed_deliveries += report.failures as u64,
            Err(e) => error!("tick failed: {}", e),
        }

        if service.tick_count() % STATUS_EVERY_TICKS == 0 {
            info!(
                "STATUS | ticks={} failed_deliveries={}",
                service.tick_count(),
                failed_deliveries
            );
        }

        watchdog.feed();

        if let Some(rest) = period.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
}
