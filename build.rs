use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Pass CPU frequency for timing calculations
    println!("cargo:rustc-env=MCU_FREQ_HZ=16000000");

    // Debug builds get verbose diagnostics by default
    if env::var("PROFILE").map(|p| p == "debug").unwrap_or(false) {
        println!("cargo:rustc-cfg=feature=\"debug\"");
    }

    // Host builds only carry the portable library for testing
    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega328p");
        println!("cargo:warning=Building DuckWatch for ATmega328P at 16MHz");
    }
}
