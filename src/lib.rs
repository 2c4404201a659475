/*!
    driver for smart servos chained on a half-duplex serial bus

    one host addresses up to 32 servos by their local id on the same single-wire line. The host drives the line direction with a gpio, writes a command frame, then reads back the servo's answer.

    - [host::Host] implements the exchanges and all public servo commands
    - [record::EepromRecord] is the structured view of a servo's persistent configuration
    - [servo::VirtualBus] emulates servos for testing without hardware
*/

#![no_std]
#[cfg(any(test, feature = "std"))]
extern crate std;

mod utils;

pub mod error;
pub mod command;
pub mod registers;
pub mod record;
pub mod host;
pub mod servo;
#[cfg(feature = "std")]
pub mod serial;

pub use error::{Error, RetCode};
