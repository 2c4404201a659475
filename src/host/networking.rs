use core::{
    fmt::Debug,
    convert::Infallible,
    };
use embedded_hal::{
    digital::{self, OutputPin},
    delay::DelayNs,
    };
use log::*;

use crate::{
    Error,
    command::Frame,
    record::BaudRate,
    };


/// duration the direction pin is held high at startup, selecting serial mode instead of pwm mode on the servos
pub const MODE_SELECT_DELAY_MS: u32 = 550;

/// uart parity
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}
/// uart character framing
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Framing {
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}
/// framing used by the servos, it is not configurable on their side
pub const FRAMING: Framing = Framing {
    data_bits: 8,
    parity: Parity::Even,
    stop_bits: 1,
    };

/**
    byte transport of the bus

    this is the uart peripheral, or anything behaving like one. Reads and writes are blocking, reads are bounded by a timeout owned by the transport.
*/
pub trait Transport {
    type Error: Debug;

    fn set_baud_rate(&mut self, rate: u32) -> Result<(), Self::Error>;
    fn set_framing(&mut self, framing: Framing) -> Result<(), Self::Error>;
    /// queue bytes for sending, returning the number of bytes accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;
    /// block until every written byte left the transmitter
    fn flush(&mut self) -> Result<(), Self::Error>;
    /// receive until `data` is full or the timeout elapsed, returning the number of bytes received
    fn read(&mut self, data: &mut [u8]) -> Result<usize, Self::Error>;
    /// drop any byte already received and not read yet
    fn discard_input(&mut self) -> Result<(), Self::Error>;
}

/**
    what to do with bytes received between the end of a command and the start of its answer

    depending on the bus wiring (pull-up resistor value), the transmitted bytes may loop back to the receiver, or the servo's answer may already be arriving.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DrainPolicy {
    /// discard pending bytes before reading the answer, needed when the bus echoes commands
    #[default]
    Discard,
    /// keep pending bytes as the start of the answer
    Keep,
}

/// host settings
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// initial communication speed, it must match the servos' eeprom
    pub baud: BaudRate,
    /// hold the direction pin high for [MODE_SELECT_DELAY_MS] at startup, not needed for servos with pwm inhibited
    pub mode_select: bool,
    pub drain: DrainPolicy,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            baud: BaudRate::B115200,
            mode_select: true,
            drain: DrainPolicy::Discard,
        }
    }
}

/// direction pin for buses not needing one, like full-duplex adapters
#[derive(Copy, Clone, Debug, Default)]
pub struct NoDirection;
impl digital::ErrorType for NoDirection {
    type Error = Infallible;
}
impl OutputPin for NoDirection {
    fn set_low(&mut self) -> Result<(), Infallible> {Ok(())}
    fn set_high(&mut self) -> Result<(), Infallible> {Ok(())}
}


/**
    servo bus host

    it owns the byte transport and the direction pin, which is high while transmitting and low while receiving.
*/
pub struct Host<T, P> {
    bus: T,
    direction: P,
    config: Config,
}
impl<T: Transport, P: OutputPin> Host<T, P> {
    /// initialize the bus, blocking during the mode selection if enabled
    pub fn new(mut bus: T, mut direction: P, config: Config, delay: &mut impl DelayNs) -> Result<Self, Error> {
        if config.mode_select {
            direction.set_high().map_err(pin_error)?;
            delay.delay_ms(MODE_SELECT_DELAY_MS);
            direction.set_low().map_err(pin_error)?;
        }
        bus.set_baud_rate(config.baud.rate()).map_err(config_error)?;
        bus.set_framing(FRAMING).map_err(config_error)?;
        info!("servo bus initialized at {} baud, mode select {}, drain {:?}",
            config.baud.rate(), config.mode_select, config.drain);
        Ok(Self {bus, direction, config})
    }

    pub fn config(&self) -> &Config {&self.config}
    pub fn bus(&self) -> &T {&self.bus}
    pub fn bus_mut(&mut self) -> &mut T {&mut self.bus}
    /// give back the transport and direction pin
    pub fn release(self) -> (T, P) {
        (self.bus, self.direction)
    }

    /// change the communication speed of the host, it must match the servos' eeprom
    pub fn set_baud_rate(&mut self, baud: BaudRate) -> Result<(), Error> {
        self.bus.set_baud_rate(baud.rate()).map_err(config_error)?;
        self.config.baud = baud;
        info!("servo bus switched to {} baud", baud.rate());
        Ok(())
    }
    pub fn set_drain(&mut self, drain: DrainPolicy) {
        self.config.drain = drain;
    }

    /**
        send a command and receive its answer, filling the whole response buffer

        both buffers are zeroed at the end of the command transmission, so on failure no byte of a previous exchange remains in them. There is no retry.
    */
    pub fn exchange(&mut self, command: &mut [u8], response: &mut [u8]) -> Result<(), Error> {
        debug!("send {:02x?}", command);
        let sent = self.transmit(command);
        command.fill(0);
        response.fill(0);
        let sent = sent?;
        if sent != command.len() {
            warn!("sent {} bytes out of {}", sent, command.len());
            return Err(Error::Write)
        }

        if self.config.drain == DrainPolicy::Discard {
            self.bus.discard_input().map_err(|error| {
                warn!("failed to drain the bus: {:?}", error);
                Error::Read
                })?;
        }
        let received = match self.bus.read(response) {
            Ok(received) => received,
            Err(error) => {
                warn!("failed to receive: {:?}", error);
                response.fill(0);
                return Err(Error::Read)
            },
        };
        if received != response.len() {
            warn!("received {} bytes out of {}", received, response.len());
            response.fill(0);
            return Err(Error::Read)
        }
        debug!("receive {:02x?}", response);
        Ok(())
    }

    /// drive the bus while writing, the direction pin is released whatever the outcome of the write
    fn transmit(&mut self, command: &[u8]) -> Result<usize, Error> {
        self.direction.set_high().map_err(pin_error)?;
        // the line must stay driven until the last stop bit is out
        let sent = self.bus.write(command)
            .and_then(|sent| self.bus.flush().map(|_| sent));
        self.direction.set_low().map_err(pin_error)?;
        sent.map_err(|error| {
            warn!("failed to send: {:?}", error);
            Error::Write
            })
    }

    /// exchange a frame, returning its fixed size answer
    pub(super) fn request<const N: usize>(&mut self, frame: Frame) -> Result<[u8; N], Error> {
        debug_assert_eq!(frame.answer_size(), N);
        let mut command = frame.bytes();
        let mut answer = [0; N];
        self.exchange(&mut command, &mut answer)?;
        Ok(answer)
    }
}

fn pin_error(error: impl Debug) -> Error {
    warn!("failed to drive the direction pin: {:?}", error);
    Error::Write
}
fn config_error(error: impl Debug) -> Error {
    warn!("failed to configure the bus: {:?}", error);
    Error::Write
}
