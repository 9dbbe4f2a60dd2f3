fn main() {
    for var in [
        "IRRIGATION_WIFI_SSID",
        "IRRIGATION_WIFI_PASS",
        "IRRIGATION_MQTT_URL",
        "IRRIGATION_MQTT_USER",
        "IRRIGATION_MQTT_PASS",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
