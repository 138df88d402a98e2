use embassy_executor::Spawner;
use nutri_scale::input::InputSignals;

static SIGNALS: InputSignals = InputSignals::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    #[cfg(target_os = "espidf")]
    appliance::run(spawner).await;

    #[cfg(not(target_os = "espidf"))]
    simulation::run(spawner).await;
}

#[cfg(target_os = "espidf")]
mod appliance {
    use super::SIGNALS;
    use anyhow::anyhow;
    use embassy_executor::Spawner;
    use embassy_time::{Duration, Timer};
    use esp_idf_svc::hal::gpio::{IOPin, OutputPin};
    use esp_idf_svc::hal::prelude::Peripherals;
    use log::{error, info, warn};
    use nutri_scale::controller::{sample_loop, NutritionController};
    use nutri_scale::hardware::oled;
    use nutri_scale::hardware::OledRenderer;
    use nutri_scale::input::keypad::ButtonScanner;
    use nutri_scale::input::InputSignals;
    use nutri_scale::scales::hx711::Hx711;
    use nutri_scale::storage::{CsvLedgerStore, LedgerStore, MemoryLedgerStore};
    use nutri_scale::system::{AppConfig, ConfigManager, SystemClock};
    use nutri_scale::types::LOAD_CELL_COUNTS_PER_GRAM;
    use nutri_scale::workflow::WorkflowEngine;
    use std::path::Path;

    const SD_MOUNT: &str = "/sdcard";
    const KEYPAD_SCAN_MS: u64 = 10;

    pub async fn run(spawner: Spawner) {
        // It is necessary to call this function once. Otherwise some patches to the runtime
        // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
        esp_idf_svc::sys::link_patches();

        // Bind the log crate to the ESP Logging facilities
        esp_idf_svc::log::EspLogger::initialize_default();

        info!("Starting Nutrition Scale Controller");

        if let Err(e) = start(spawner).await {
            error!("Controller start failed: {:?}", e);
        }
    }

    async fn start(spawner: Spawner) -> anyhow::Result<()> {
        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        let config_manager = ConfigManager::load_or_default(&Path::new(SD_MOUNT).join("config.json"))
            .unwrap_or_else(|e| {
                warn!("Config unreadable ({:?}), using defaults", e);
                ConfigManager::default()
            });
        let config = config_manager.get_config().await;

        let panel = oled::create_panel(peripherals.i2c0, pins.gpio21, pins.gpio22)?;
        let mut renderer = OledRenderer::new(panel);
        renderer.show_boot_screen()?;

        let cell = Hx711::new(
            pins.gpio32.downgrade(),
            pins.gpio33.downgrade_output(),
            LOAD_CELL_COUNTS_PER_GRAM,
        )?;

        let scanner = ButtonScanner::new(
            [
                pins.gpio13.downgrade(),
                pins.gpio14.downgrade(),
                pins.gpio15.downgrade(),
                pins.gpio16.downgrade(),
                pins.gpio17.downgrade(),
            ],
            [
                pins.gpio18.downgrade_output(),
                pins.gpio19.downgrade_output(),
                pins.gpio23.downgrade_output(),
                pins.gpio25.downgrade_output(),
            ],
            [
                pins.gpio26.downgrade(),
                pins.gpio27.downgrade(),
                pins.gpio4.downgrade(),
                pins.gpio5.downgrade(),
                pins.gpio2.downgrade(),
            ],
        )?;

        let store: Box<dyn LedgerStore> = match CsvLedgerStore::open(Path::new(SD_MOUNT).join("ledger.csv")) {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!("📒 SD ledger unavailable ({}), meals will not survive a reboot", e);
                Box::new(MemoryLedgerStore::new())
            }
        };

        spawner
            .spawn(scale_task(cell, &SIGNALS, config))
            .map_err(|_| anyhow!("Failed to spawn scale task"))?;
        spawner
            .spawn(keypad_task(scanner, &SIGNALS))
            .map_err(|_| anyhow!("Failed to spawn keypad task"))?;

        let engine = WorkflowEngine::new(config, store, SystemClock);
        let mut controller = NutritionController::new(engine, renderer, &SIGNALS);
        controller.run().await
    }

    #[embassy_executor::task]
    async fn scale_task(cell: Hx711, signals: &'static InputSignals, config: AppConfig) {
        info!("⚖️ Scale task started");
        sample_loop(cell, signals, config).await
    }

    #[embassy_executor::task]
    async fn keypad_task(mut scanner: ButtonScanner, signals: &'static InputSignals) {
        info!("🔘 Keypad task started");
        loop {
            Timer::after(Duration::from_millis(KEYPAD_SCAN_MS)).await;
            match scanner.scan() {
                Ok(presses) => {
                    for press in presses {
                        signals.publish_button(press);
                    }
                }
                Err(e) => warn!("🔘 Scan failed: {}", e),
            }
        }
    }
}

/// Host build: drives the real controller with a scripted scale and keypad.
#[cfg(not(target_os = "espidf"))]
mod simulation {
    use super::SIGNALS;
    use embassy_executor::Spawner;
    use embassy_futures::select::{select, Either};
    use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
    use embassy_time::{Duration, Instant, Timer};
    use log::{error, info};
    use nutri_scale::controller::{sample_loop, NutritionController};
    use nutri_scale::hardware::{FrameBuffer, OledRenderer};
    use nutri_scale::input::{ButtonPress, InputSignals, KeypadButton};
    use nutri_scale::scales::ScriptedLoadCell;
    use nutri_scale::storage::CsvLedgerStore;
    use nutri_scale::system::{AppConfig, ConfigManager, SystemClock};
    use nutri_scale::workflow::WorkflowEngine;
    use std::path::PathBuf;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    static SCRIPT_DONE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

    /// (time since start in ms, button)
    const PRESSES: [(u64, ButtonPress); 6] = [
        (3_200, ButtonPress::Matrix(7)),
        (5_200, ButtonPress::Keypad(KeypadButton::Raw)),
        (9_200, ButtonPress::Keypad(KeypadButton::AddDish)),
        (10_200, ButtonPress::Keypad(KeypadButton::AddDish)),
        (14_200, ButtonPress::Keypad(KeypadButton::Save)),
        (15_200, ButtonPress::Keypad(KeypadButton::Save)),
    ];
    const SCRIPT_END_MS: u64 = 22_000;

    /// Empty scale, a 150 g bowl, 80 g of food, then everything lifted.
    fn scale_script(period_ms: u64) -> Vec<f32> {
        let ticks = |ms: u64| (ms / period_ms.max(1)) as usize;
        let mut readings = Vec::new();
        readings.extend(std::iter::repeat(0.0).take(ticks(1_000)));
        readings.extend(std::iter::repeat(150.0).take(ticks(6_000)));
        readings.extend(std::iter::repeat(230.0).take(ticks(10_000)));
        readings.push(0.0);
        readings
    }

    pub async fn run(spawner: Spawner) {
        // `log` records from the library reach the fmt layer through the tracing-log bridge
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "nutri_scale=info".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
        info!("Starting Nutrition Scale simulation");

        let config = match std::env::var_os("NUTRI_SCALE_CONFIG") {
            Some(path) => ConfigManager::load_or_default(&PathBuf::from(path)),
            None => Ok(ConfigManager::default()),
        };
        let config = match config {
            Ok(manager) => manager.get_config().await,
            Err(e) => {
                error!("Config unreadable: {:?}", e);
                return;
            }
        };

        let ledger_path = std::env::var_os("NUTRI_SCALE_LEDGER")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("nutri-scale-ledger.csv"));
        let store = match CsvLedgerStore::open(&ledger_path) {
            Ok(store) => store,
            Err(e) => {
                error!("📒 Cannot open {}: {}", ledger_path.display(), e);
                return;
            }
        };

        let cell = ScriptedLoadCell::new(scale_script(config.scale.sample_period_ms));
        if spawner.spawn(scale_task(cell, &SIGNALS, config)).is_err()
            || spawner.spawn(keypad_task(&SIGNALS)).is_err()
        {
            error!("Failed to spawn simulation tasks");
            return;
        }

        let engine = WorkflowEngine::new(config, store, SystemClock);
        let mut controller = NutritionController::new(engine, OledRenderer::new(FrameBuffer::new()), &SIGNALS);

        let finished = matches!(select(controller.run(), SCRIPT_DONE.wait()).await, Either::Second(()));
        if finished {
            let engine = controller.engine();
            let day = engine.ledger().totals();
            info!(
                "Simulation finished in {:?}: {} meals today, {:.0} kcal, ledger at {}",
                engine.state(),
                engine.ledger().meal_count(),
                day.kcal,
                ledger_path.display()
            );
        }
        std::process::exit(0);
    }

    #[embassy_executor::task]
    async fn scale_task(cell: ScriptedLoadCell, signals: &'static InputSignals, config: AppConfig) {
        sample_loop(cell, signals, config).await
    }

    #[embassy_executor::task]
    async fn keypad_task(signals: &'static InputSignals) {
        let started = Instant::now();
        for (at_ms, press) in PRESSES {
            Timer::at(started + Duration::from_millis(at_ms)).await;
            info!("🔘 Pressed {:?}", press);
            signals.publish_button(press);
        }
        Timer::at(started + Duration::from_millis(SCRIPT_END_MS)).await;
        SCRIPT_DONE.signal(());
    }
}
