//! Register-level support for the ATmega328P

pub mod adc;
pub mod delay;
pub mod gpio;
pub mod lane_irq;
pub mod timer;
pub mod twi;
pub mod uart;

// Re-export commonly used types
pub use adc::{Adc, AdcPrescaler, AdcReference};
pub use delay::Delay;
pub use gpio::{board, Input, OpenDrain, Output, Pin};
pub use timer::{LaneTimer, Prescaler};
pub use twi::{Twi, TwiError};
pub use uart::Uart;
