//! WiFi bring-up binary.
//!
//! Initializes the radio, joins the configured network and exits with 0 on
//! success or 1 on failure.
//!
//! # Usage
//!
//! ESP32 (credentials baked in at compile time):
//!
//! ```bash
//! WIFI_SSID="MyNetwork" WIFI_PASSWORD="secret" cargo build --release --features esp32
//! ```
//!
//! Host (no radio; join outcomes are simulated):
//!
//! ```bash
//! WIFI_SSID="MyNetwork" WIFI_PASSWORD="secret" WIFI_SIMULATE="timeout,ok" cargo run
//! ```

#[cfg(feature = "esp32")]
fn build_time_var(key: &str) -> Option<String> {
    use jartis_wifi::config::env;

    let value = match key {
        env::SSID => option_env!("WIFI_SSID"),
        env::PASSWORD => option_env!("WIFI_PASSWORD"),
        env::AUTH => option_env!("WIFI_AUTH"),
        env::COUNTRY => option_env!("WIFI_COUNTRY"),
        env::CONNECT_TIMEOUT_MS => option_env!("WIFI_CONNECT_TIMEOUT_MS"),
        env::MAX_RETRIES => option_env!("WIFI_MAX_RETRIES"),
        env::BACKOFF_BASE_MS => option_env!("WIFI_BACKOFF_BASE_MS"),
        env::MAX_BACKOFF_MS => option_env!("WIFI_MAX_BACKOFF_MS"),
        _ => None,
    };
    value.map(str::to_string)
}

#[cfg(feature = "esp32")]
fn main() {
    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    println!("=== jartis-wifi starting ===");

    let code = run();

    // Brief pause to ensure serial output is flushed before process exits
    std::thread::sleep(std::time::Duration::from_secs(2));
    std::process::exit(code);
}

#[cfg(feature = "esp32")]
fn run() -> i32 {
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use jartis_wifi::report::{self, EXIT_FAILURE};
    use jartis_wifi::{ConnectionConfig, ConnectionManager, EspRadio};
    use log::{error, info};

    let config = match ConnectionConfig::from_lookup(build_time_var) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid WiFi configuration: {}", e);
            return EXIT_FAILURE;
        }
    };

    let peripherals = match Peripherals::take() {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to take peripherals: {:?}", e);
            return EXIT_FAILURE;
        }
    };
    let radio = match EspSystemEventLoop::take()
        .and_then(|sysloop| EspRadio::new(peripherals.modem, sysloop))
    {
        Ok(radio) => radio,
        Err(e) => {
            error!("WiFi driver unavailable: {:?}", e);
            return EXIT_FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return EXIT_FAILURE;
        }
    };

    runtime.block_on(async move {
        info!(
            "Joining {} ({}, country {})",
            config.ssid(),
            config.auth_mode(),
            config.country_code()
        );

        let mut manager = ConnectionManager::new(config, radio);
        let mut watcher = manager.watcher();

        let outcome = async {
            manager.initialize().await.map_err(|e| e.to_string())?;
            manager.connect().await.map_err(|e| e.to_string())?;
            Ok::<(), String>(())
        };
        let logger = async {
            while let Some(state) = watcher.changed().await {
                report::log_state(&state);
                if state.phase.is_terminal() {
                    break;
                }
            }
        };
        let (outcome, ()) = tokio::join!(outcome, logger);

        if let Err(e) = outcome {
            error!("WiFi bring-up failed: {}", e);
        }
        report::exit_code(&manager.current_state())
    })
}

#[cfg(not(feature = "esp32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("=== jartis-wifi (host) starting ===");

    std::process::exit(run().await);
}

#[cfg(not(feature = "esp32"))]
async fn run() -> i32 {
    use jartis_wifi::radio::SIMULATE_ENV;
    use jartis_wifi::report::{self, EXIT_FAILURE};
    use jartis_wifi::{ConnectionConfig, ConnectionManager, ScriptedRadio};
    use log::{error, info, warn};
    use tokio_util::sync::CancellationToken;

    let config = match ConnectionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid WiFi configuration: {}", e);
            return EXIT_FAILURE;
        }
    };

    let radio = match std::env::var(SIMULATE_ENV) {
        Ok(script) => match ScriptedRadio::from_script(&script) {
            Ok(radio) => radio,
            Err(e) => {
                error!("Invalid simulation script: {}", e);
                return EXIT_FAILURE;
            }
        },
        Err(_) => ScriptedRadio::always_ok(),
    };

    info!(
        "Joining {} ({}, country {}, {} retries)",
        config.ssid(),
        config.auth_mode(),
        config.country_code(),
        config.max_retries()
    );

    let mut manager = ConnectionManager::new(config, radio);
    let logger = tokio::spawn(report::log_transitions(manager.watcher()));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling connection");
                cancel.cancel();
            }
        });
    }

    if let Err(e) = manager.initialize().await {
        error!("WiFi bring-up failed: {}", e);
    } else if let Err(e) = manager.connect_with_cancel(&cancel).await {
        error!("WiFi connection failed: {}", e);
    }

    let state = manager.current_state();
    drop(manager);
    if let Err(e) = logger.await {
        warn!("State logger stopped abnormally: {}", e);
    }

    println!("{}", report::to_json(&state));
    report::exit_code(&state)
}
