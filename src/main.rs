//! DuckWatch station firmware entry point
//!
//! Brings up the console, sensors and lane interrupts, then runs the
//! station loop once per second. Host builds only get an empty `main` so
//! the library can be tested with `cargo test`.

#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
use panic_halt as _;

#[cfg(target_arch = "avr")]
#[avr_device::entry]
fn main() -> ! {
    use avr_device::atmega328p::Peripherals;
    use embedded_hal::blocking::delay::DelayMs;

    use duckwatch_firmware::application::{Probe, Station};
    use duckwatch_firmware::config;
    use duckwatch_firmware::diagnostics::{subcode, Diagnostics, ErrorCode, Hex8};
    use duckwatch_firmware::drivers::{
        BitBangOneWire, Bme280, Bme280Error, Ds18b20, Lane, SerialConsole, TiltBall,
        UvIndexSensor,
    };
    use duckwatch_firmware::hal::adc::Adc0;
    use duckwatch_firmware::hal::{
        board, lane_irq, Adc, AdcPrescaler, AdcReference, Delay, LaneTimer, Twi, Uart,
    };
    use duckwatch_firmware::{diag, trace};

    // SAFETY: this is the first and only time the peripherals are taken
    let dp = unsafe { Peripherals::steal() };
    let mut delay = Delay::new();

    let console = SerialConsole::new(Uart::new(dp.USART0, config::UART_BAUD));
    let mut diag = Diagnostics::new(console, config::VERBOSE_DIAGNOSTICS);
    diag!(diag, "\r\nDuckWatch starting\r\n");

    // Environmental sensor
    let twi = Twi::new(dp.TWI, config::TWI_FREQ_HZ);
    let mut bme280 = Bme280::new(
        twi,
        config::BME280_ADDRESS,
        config::BME280_TEMPERATURE_OFFSET,
    );
    match bme280.init() {
        Ok(()) => diag!(diag, "BME280 <{}> ALIVE\r\n", Hex8(bme280.address())),
        Err(error) => {
            let code = match error {
                Bme280Error::InitFailed(step) => step.error_code(),
                _ => ErrorCode::SensorError,
            };
            diag.report(code, subcode::BME280);
            diag!(diag, "BME280 <{}> DEAD\r\n", Hex8(bme280.address()));
        }
    }

    // Supplemental sensors
    let mut surface = Ds18b20::new(BitBangOneWire::new(board::surface_probe(), Delay::new()));
    let mut underwater = Ds18b20::new(BitBangOneWire::new(board::underwater_probe(), Delay::new()));
    let mut tilt = TiltBall::new(board::tilt_ball());
    let mut adc = Adc::new(dp.ADC, AdcReference::Aref, AdcPrescaler::Div128);
    let mut uv = UvIndexSensor::new(Adc0, board::uv_enable());

    // Lane detection
    let _lane_inputs = board::lane_inputs();
    let mut lane_timer = LaneTimer::new(dp.TC0);
    diag!(diag, "PIR warm-up\r\n");
    delay.delay_ms(config::PIR_WARMUP_MS);
    lane_irq::start(dp.EXINT, &mut lane_timer);

    // SAFETY: all shared state is initialized
    unsafe { avr_device::interrupt::enable() };
    diag!(diag, "Ready\r\n");

    let mut station = Station::new();
    loop {
        if bme280.task(&mut diag) {
            station.record_environment(&bme280.reading());
        }

        match surface.task() {
            Ok(temperature) => station.record_probe(Probe::Surface, temperature),
            Err(_) => diag.report(ErrorCode::SensorError, subcode::SURFACE_PROBE),
        }
        match underwater.task() {
            Ok(temperature) => station.record_probe(Probe::Underwater, temperature),
            Err(_) => diag.report(ErrorCode::SensorError, subcode::UNDERWATER_PROBE),
        }

        match tilt.task() {
            Ok(windy) => station.record_wind(windy),
            Err(_) => diag.report(ErrorCode::SensorError, subcode::TILT_BALL),
        }

        match uv.read(&mut adc, &mut delay) {
            Ok(uv_index) => station.record_uv_index(uv_index),
            Err(_) => diag.report(ErrorCode::SensorError, subcode::UV_INDEX),
        }

        let lane_1 = lane_irq::is_active(Lane::Lane1);
        let lane_2 = lane_irq::is_active(Lane::Lane2);
        station.record_lanes(lane_1, lane_2);
        trace!(diag, "Lanes {} {}\r\n", u8::from(lane_1), u8::from(lane_2));

        if station.tick() {
            let _ = station.send_report(diag.sink());
        }

        delay.delay_ms(config::LOOP_PERIOD_MS);
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {}
