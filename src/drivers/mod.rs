pub mod bme280;
pub mod bus;
pub mod ds18b20;
pub mod lane;
pub mod one_wire;
pub mod serial_console;
pub mod tilt_ball;
pub mod uv_index;

pub use bme280::{Bme280, Bme280Error, CompensatedReading};
pub use bus::RegisterDevice;
pub use ds18b20::{Ds18b20, Ds18b20Error, Temperature};
pub use lane::{Lane, LaneDetector, LaneEvent, Occupancy};
pub use one_wire::{BitBangOneWire, OneWire};
pub use serial_console::SerialConsole;
pub use tilt_ball::{TiltBall, WindMonitor};
pub use uv_index::{UvIndexError, UvIndexSensor};
