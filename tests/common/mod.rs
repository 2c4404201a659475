#![allow(unused)]

use std::{
    cell::RefCell,
    collections::VecDeque,
    convert::Infallible,
    rc::Rc,
    vec::Vec,
    };
use embedded_hal::{
    digital::{ErrorType, OutputPin},
    delay::DelayNs,
    };

use icsbus::{
    command::ServoId,
    host::{Config, DrainPolicy, Framing, Host, Transport},
    registers::EepromBlock,
    servo::VirtualServo,
    };


pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// sequence of bus and pin accesses, shared between a transport and a pin
pub type Trace = Rc<RefCell<Vec<&'static str>>>;

fn record(trace: &Option<Trace>, event: &'static str) {
    if let Some(trace) = trace {
        trace.borrow_mut().push(event);
    }
}

/// transport answering a script of responses, one per read, and recording what the host does
#[derive(Default, Debug)]
pub struct Scripted {
    /// frames written, in order
    pub written: Vec<Vec<u8>>,
    /// responses given to the next reads
    pub answers: VecDeque<Vec<u8>>,
    /// number of bytes accepted by writes, all if unset
    pub short_write: Option<usize>,
    pub reads: usize,
    pub flushes: usize,
    pub discards: usize,
    pub trace: Option<Trace>,
    pub baud: Option<u32>,
    pub framing: Option<Framing>,
}
impl Scripted {
    pub fn new(answers: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            .. Self::default()
        }
    }
    /// number of bus accesses of any kind
    pub fn activity(&self) -> usize {
        self.written.len() + self.reads + self.discards
    }
}
impl Transport for Scripted {
    type Error = Infallible;

    fn set_baud_rate(&mut self, rate: u32) -> Result<(), Infallible> {
        self.baud = Some(rate);
        Ok(())
    }
    fn set_framing(&mut self, framing: Framing) -> Result<(), Infallible> {
        self.framing = Some(framing);
        Ok(())
    }
    fn write(&mut self, data: &[u8]) -> Result<usize, Infallible> {
        self.written.push(data.to_vec());
        record(&self.trace, "write");
        Ok(self.short_write.unwrap_or(data.len()).min(data.len()))
    }
    fn flush(&mut self) -> Result<(), Infallible> {
        self.flushes += 1;
        record(&self.trace, "flush");
        Ok(())
    }
    fn read(&mut self, data: &mut [u8]) -> Result<usize, Infallible> {
        self.reads += 1;
        record(&self.trace, "read");
        let Some(answer) = self.answers.pop_front()
            else {return Ok(0)};
        let count = answer.len().min(data.len());
        data[.. count].copy_from_slice(&answer[.. count]);
        Ok(count)
    }
    fn discard_input(&mut self) -> Result<(), Infallible> {
        self.discards += 1;
        record(&self.trace, "discard");
        Ok(())
    }
}

/// direction pin recording its successive states
#[derive(Default, Debug)]
pub struct RecordingPin {
    pub states: Vec<bool>,
    pub trace: Option<Trace>,
}
impl ErrorType for RecordingPin {
    type Error = Infallible;
}
impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.states.push(false);
        record(&self.trace, "low");
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.states.push(true);
        record(&self.trace, "high");
        Ok(())
    }
}

/// delay returning immediately, recording the time requested
#[derive(Default, Debug)]
pub struct NoDelay {
    pub ns: u64,
}
impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ns += u64::from(ns);
    }
}

/// host on a scripted bus, without startup mode selection
pub fn scripted(answers: impl IntoIterator<Item = Vec<u8>>) -> Host<Scripted, RecordingPin> {
    init_logger();
    let config = Config {mode_select: false, .. Config::default()};
    Host::new(Scripted::new(answers), RecordingPin::default(), config, &mut NoDelay::default())
        .expect("scripted bus cannot fail")
}

/// eeprom read answer of a factory servo
pub fn eeprom_answer(id: u8) -> Vec<u8> {
    let id = ServoId::new(id).unwrap();
    let mut block = VirtualServo::new(id).eeprom().clone();
    block.set_header([0x20 | id.value(), 0x00]);
    block.to_vec()
}
