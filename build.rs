fn main() {
    // The ESP-IDF environment is only needed for the esp32 feature on an
    // ESP-IDF target; host builds and tests skip it.
    let esp32 = std::env::var_os("CARGO_FEATURE_ESP32").is_some();
    let espidf = std::env::var("CARGO_CFG_TARGET_OS")
        .map(|os| os == "espidf")
        .unwrap_or(false);

    if esp32 && espidf {
        embuild::espidf::sysenv::output();
    }
}
