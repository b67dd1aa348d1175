fn main() {
    // Wi-Fi credentials are baked in via option_env! in src/config.rs.
    println!("cargo:rerun-if-env-changed=SMARTPARK_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=SMARTPARK_WIFI_PASS");

    // Device certificates are embedded with include_str! by the binary.
    for cert in [
        "certs/AmazonRootCA1.pem",
        "certs/Node1certificate.crt",
        "certs/Node1private.key",
    ] {
        println!("cargo:rerun-if-changed={cert}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
