/*!
    servo bus over a serial port of the operating system

    the port is typically an usb adapter wired to the half-duplex line. Its direction is either switched by the adapter itself (use [crate::host::NoDirection]), or by the RTS line with [RtsDirection].
*/

use std::{
    io,
    path::Path,
    thread,
    time::Duration,
    };
use serial2::{SerialPort, Settings, CharSize, StopBits};
use embedded_hal::{
    digital::{self, OutputPin},
    delay::DelayNs,
    };
use log::*;

use crate::host::{Framing, Parity, Transport, FRAMING};


/// default time waited for an answer, the longest answer takes about 6ms at 115200 baud
pub const TIMEOUT: Duration = Duration::from_millis(100);


/// bus transport over a serial port
pub struct SerialTransport {
    port: SerialPort,
}
impl SerialTransport {
    /// open a serial port with the servo framing, the baud rate is set by the [crate::host::Host]
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> io::Result<Self> {
        let path = path.as_ref();
        let mut port = SerialPort::open(path, |mut settings: Settings| {
                settings.set_raw();
                apply_framing(&mut settings, FRAMING)?;
                Ok(settings)
                })?;
        port.set_read_timeout(timeout)?;
        info!("opened serial port {}", path.display());
        Ok(Self {port})
    }
    pub fn port(&self) -> &SerialPort {&self.port}
    /// pin driving the RTS line of this port
    pub fn rts(&self) -> io::Result<RtsDirection> {
        Ok(RtsDirection {port: self.port.try_clone()?})
    }
}

impl Transport for SerialTransport {
    type Error = io::Error;

    fn set_baud_rate(&mut self, rate: u32) -> io::Result<()> {
        let mut settings = self.port.get_configuration()?;
        settings.set_baud_rate(rate)?;
        self.port.set_configuration(&settings)
    }
    fn set_framing(&mut self, framing: Framing) -> io::Result<()> {
        let mut settings = self.port.get_configuration()?;
        apply_framing(&mut settings, framing)?;
        self.port.set_configuration(&settings)
    }
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.port.write_all(data)?;
        Ok(data.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        // waits for the output queue to drain, not only for the driver to accept it
        self.port.flush()
    }
    fn read(&mut self, data: &mut [u8]) -> io::Result<usize> {
        let mut received = 0;
        while received < data.len() {
            match self.port.read(&mut data[received ..]) {
                Ok(0) => break,
                Ok(count) => received += count,
                Err(error) if error.kind() == io::ErrorKind::TimedOut => break,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            }
        }
        Ok(received)
    }
    fn discard_input(&mut self) -> io::Result<()> {
        self.port.discard_input_buffer()
    }
}

fn apply_framing(settings: &mut Settings, framing: Framing) -> io::Result<()> {
    settings.set_char_size(match framing.data_bits {
        5 => CharSize::Bits5,
        6 => CharSize::Bits6,
        7 => CharSize::Bits7,
        8 => CharSize::Bits8,
        _ => return Err(io::Error::new(io::ErrorKind::InvalidInput, "unsupported number of data bits")),
    });
    settings.set_stop_bits(match framing.stop_bits {
        1 => StopBits::One,
        2 => StopBits::Two,
        _ => return Err(io::Error::new(io::ErrorKind::InvalidInput, "unsupported number of stop bits")),
    });
    settings.set_parity(match framing.parity {
        Parity::None => serial2::Parity::None,
        Parity::Even => serial2::Parity::Even,
        Parity::Odd => serial2::Parity::Odd,
    });
    Ok(())
}


/// direction pin on the RTS line of a serial port
pub struct RtsDirection {
    port: SerialPort,
}
/// failure to drive a serial control line
#[derive(Debug)]
pub struct PinError(pub io::Error);
impl digital::Error for PinError {
    fn kind(&self) -> digital::ErrorKind {digital::ErrorKind::Other}
}
impl digital::ErrorType for RtsDirection {
    type Error = PinError;
}
impl OutputPin for RtsDirection {
    fn set_low(&mut self) -> Result<(), PinError> {
        self.port.set_rts(false).map_err(PinError)
    }
    fn set_high(&mut self) -> Result<(), PinError> {
        self.port.set_rts(true).map_err(PinError)
    }
}


/// blocking delay of the current thread
#[derive(Copy, Clone, Debug, Default)]
pub struct StdDelay;
impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
