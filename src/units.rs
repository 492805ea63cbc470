//! Fixed-point unit conversions

/// Centi-degrees Celsius to centi-degrees Fahrenheit, 2204 -> 7167
pub fn centi_celsius_to_fahrenheit(centi_celsius: i32) -> i32 {
    (centi_celsius * 9 + 16_000) / 5
}

/// Q22.10 %RH to hundredths of a percent, 40495 -> 3954
pub fn humidity_to_centi_percent(humidity: u32) -> u32 {
    (humidity * 100) >> 10
}
