//! ESP-IDF radio driver.
//!
//! Wraps the ESP-IDF WiFi driver so the connection manager can drive it.
//! The underlying calls block the calling task. Association and DHCP waits
//! share the join timeout passed to [`RadioDriver::connect`].
//!
//! Failure reasons come from station-disconnected events on the system event
//! loop, so a rejected passphrase ends the attempt as soon as the access
//! point reports it.

use super::join::{error_for_disconnect, DisconnectLog, JoinDeadline};
use super::{JoinError, RadioDriver, RadioError};
use crate::config::{AuthMode, CountryCode};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::wifi::{
    AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi, WifiEvent,
};
use esp_idf_sys::{EspError, ESP_ERR_TIMEOUT, ESP_ERR_WIFI_PASSWORD, ESP_ERR_WIFI_SSID};
use log::{debug, info, warn};
use std::time::Duration;

/// Station-mode WiFi driver backed by ESP-IDF.
pub struct EspRadio<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
    disconnects: DisconnectLog,
    _events: EspSubscription<'static, System>,
}

impl<'a> EspRadio<'a> {
    /// Take ownership of the modem peripheral.
    pub fn new(modem: Modem, sysloop: EspSystemEventLoop) -> Result<Self, EspError> {
        let disconnects = DisconnectLog::new();
        let handler = disconnects.clone();
        let events = sysloop.subscribe::<WifiEvent, _>(move |event| {
            if let WifiEvent::StaDisconnected(info) = event {
                handler.record(info.reason());
            }
        })?;

        let esp_wifi = EspWifi::new(modem, sysloop.clone(), None)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        Ok(Self {
            wifi,
            disconnects,
            _events: events,
        })
    }

    /// Current station IP address, if the interface is up.
    pub fn ip(&self) -> Option<String> {
        if !self.wifi.is_connected().unwrap_or(false) {
            return None;
        }
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| format!("{}", info.ip))
    }
}

fn auth_method(auth_mode: AuthMode) -> AuthMethod {
    match auth_mode {
        AuthMode::Open => AuthMethod::None,
        AuthMode::Wpa2Psk => AuthMethod::WPA2Personal,
        AuthMode::Wpa3Psk => AuthMethod::WPA3Personal,
    }
}

fn join_error(e: EspError) -> JoinError {
    match e.code() as u32 {
        ESP_ERR_TIMEOUT => JoinError::Timeout,
        // Malformed passphrase, refused before any association attempt.
        ESP_ERR_WIFI_PASSWORD => JoinError::AuthRejected,
        ESP_ERR_WIFI_SSID => JoinError::NoNetwork,
        _ => JoinError::Failed,
    }
}

fn radio_error(e: EspError) -> RadioError {
    RadioError::new(format!("{:?}", e))
}

impl<'a> EspRadio<'a> {
    /// Stop a join that is still in progress.
    fn abort_join(&mut self) {
        if let Err(e) = self.wifi.wifi_mut().disconnect() {
            debug!("Aborting join: {:?}", e);
        }
    }
}

impl<'a> RadioDriver for EspRadio<'a> {
    async fn init(&mut self, country: CountryCode) -> Result<(), RadioError> {
        let [a, b] = country.as_bytes();
        let code = [a as core::ffi::c_char, b as core::ffi::c_char, 0];

        // SAFETY: `code` is NUL-terminated and outlives the call.
        esp_idf_sys::esp!(unsafe { esp_idf_sys::esp_wifi_set_country_code(code.as_ptr(), true) })
            .map_err(|e| {
                warn!("Failed to set country code {}: {:?}", country, e);
                radio_error(e)
            })?;

        info!("WiFi radio initialized for country {}", country);
        Ok(())
    }

    async fn enable_station_mode(&mut self) -> Result<(), RadioError> {
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(radio_error)?;
        self.wifi.start().map_err(radio_error)?;

        info!("WiFi station mode enabled");
        Ok(())
    }

    async fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        auth_mode: AuthMode,
        timeout: Duration,
    ) -> Result<(), JoinError> {
        info!("Connecting to WiFi: {} ({})", ssid, auth_mode);
        debug!("Join timeout {} ms", timeout.as_millis());

        let deadline = JoinDeadline::after(timeout);

        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| JoinError::Failed)?,
            password: password.try_into().map_err(|_| JoinError::AuthRejected)?,
            auth_method: auth_method(auth_mode),
            ..Default::default()
        });

        self.wifi.set_configuration(&wifi_config).map_err(|e| {
            warn!("Rejected client configuration: {:?}", e);
            join_error(e)
        })?;

        self.disconnects.clear();
        self.wifi.wifi_mut().connect().map_err(|e| {
            warn!("WiFi association failed: {:?}", e);
            join_error(e)
        })?;

        let wifi = &self.wifi;
        let disconnects = &self.disconnects;
        let associated = wifi.wifi_wait_while(
            || Ok(!wifi.is_connected()? && disconnects.last().is_none()),
            Some(deadline.remaining()),
        );

        if let Some(code) = self.disconnects.last() {
            let err = error_for_disconnect(code);
            warn!("WiFi association failed: reason {} ({})", code, err);
            return Err(err);
        }
        if let Err(e) = associated {
            warn!("WiFi association did not finish in time: {:?}", e);
            self.abort_join();
            return Err(join_error(e));
        }

        // Wait for DHCP
        let wifi = &self.wifi;
        let addressed = wifi.ip_wait_while(
            || wifi.is_up().map(|up| !up),
            Some(deadline.remaining()),
        );
        if let Err(e) = addressed {
            warn!("DHCP failed: {:?}", e);
            self.abort_join();
            return Err(join_error(e));
        }

        if let Some(ip) = self.ip() {
            info!("Connected to WiFi, IP: {}", ip);
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        info!("Disconnecting from WiFi");
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi disconnect failed: {:?}", e);
        }
    }
}
