/*!
    software servos speaking the device side of the bus protocol

    a [VirtualBus] gathers [VirtualServo]s and implements [Transport], so a [crate::host::Host] can drive it as it would drive a real bus. It is meant for testing and for developing without hardware.
*/

use core::convert::Infallible;
use bilge::prelude::*;
use log::*;

use crate::{
    command::{Header, Opcode, Parameter, ServoId, SubCommand, ID_MAX},
    registers::{self, EepromBlock, Nibbles, EEPROM_SIZE, MARKER_VALUE},
    record::{BaudRate, EepromRecord},
    host::{Framing, Transport, FRAMING},
    };


/// maximum number of servos on a virtual bus
pub const MAX_SERVOS: usize = ID_MAX as usize + 1;
/// bytes the host can leave unread on a virtual bus
const BUFFER: usize = 4 * EEPROM_SIZE;
/// answer bytes of a servo
type Answer = heapless::Vec<u8, EEPROM_SIZE>;


/**
    a servo emulated in memory

    its id and communication speed come from its eeprom, like real servos. Parameters written are reported back as is, including the current and temperature limits.
*/
#[derive(Clone, Debug)]
pub struct VirtualServo {
    eeprom: EepromBlock,
    baud: BaudRate,
    position: u16,
    free: bool,
    /// volatile parameters, indexed by sub command code minus one
    parameters: [u8; 4],
}
impl VirtualServo {
    /// servo with factory settings at the given id
    pub fn new(id: ServoId) -> Self {
        let mut eeprom = EepromBlock::default();
        // reserved bytes hold an arbitrary pattern that must survive eeprom writes
        for (i, byte) in eeprom.iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(7) & 0x0f;
        }
        eeprom.set(registers::MARKER, Nibbles(MARKER_VALUE));
        let factory = EepromRecord {
            stretch: Some(60),
            speed: Some(127),
            punch: Some(1),
            deadband: Some(2),
            dumping: Some(40),
            safetimer: Some(10),
            slave: Some(false),
            rotation: Some(false),
            pwm_inhibit: Some(false),
            reverse: Some(false),
            position_limit_high: Some(11500),
            position_limit_low: Some(3500),
            comm_speed: Some(BaudRate::B115200),
            temperature_limit: Some(80),
            current_limit: Some(63),
            response: Some(1),
            offset: Some(0),
            id: Some(id.value()),
            char_stretch: [Some(60); 3],
            .. EepromRecord::unchanged()
            };
        let mut eeprom = factory.encode(&eeprom, id);
        eeprom.set_header([0, 0]);
        Self::with_eeprom(eeprom)
    }
    /// servo powered on with the given eeprom content, header bytes are ignored
    pub fn with_eeprom(eeprom: EepromBlock) -> Self {
        let mut servo = Self {
            eeprom,
            baud: BaudRate::default(),
            position: 7500,
            free: true,
            parameters: [0; 4],
        };
        servo.power_cycle();
        servo
    }
    /// reload the volatile state from the eeprom, as real servos do at power on
    pub fn power_cycle(&mut self) {
        let record = EepromRecord::decode(&self.eeprom);
        self.baud = record.comm_speed.unwrap_or_default();
        self.free = true;
        self.parameters = [
            record.stretch.unwrap_or(60),
            record.speed.unwrap_or(127),
            record.current_limit.unwrap_or(63),
            record.temperature_limit.unwrap_or(80),
            ];
    }

    /// current id, from the eeprom
    pub fn id(&self) -> u8 {
        self.eeprom.get(registers::ID).0 & ID_MAX
    }
    pub fn eeprom(&self) -> &EepromBlock {&self.eeprom}
    pub fn eeprom_mut(&mut self) -> &mut EepromBlock {&mut self.eeprom}
    /// communication speed the servo is currently listening at
    pub fn baud(&self) -> BaudRate {self.baud}
    pub fn position(&self) -> u16 {self.position}
    pub fn set_position(&mut self, position: u16) {self.position = position}
    /// true if the torque is released
    pub fn is_free(&self) -> bool {self.free}
    pub fn parameter(&self, parameter: Parameter) -> u8 {
        self.parameters[parameter.sub() as usize - 1]
    }

    /// process one frame, returning the answer if it is addressed to this servo
    pub fn handle(&mut self, frame: &[u8]) -> Option<Answer> {
        let (&first, _) = frame.split_first()?;
        let header = Header::from(first);
        let id = self.id();
        let mut answer = Answer::new();

        if header.opcode() == Opcode::Id {
            match frame {
                [0xff, 0, 0, 0] => {},
                [_, 1, 1, 1] => {
                    let id = header.id().value();
                    self.eeprom.set(registers::ID, Nibbles(id));
                },
                _ => return None,
            }
            answer.push(Header::new(u5::new(self.id()), Opcode::Id).byte()).ok()?;
            return Some(answer)
        }
        if header.id().value() != id
            {return None}
        let reply = |opcode| Header::new(header.id(), opcode).byte();

        match (header.opcode(), frame) {
            (Opcode::Position, &[_, high, low]) => {
                let target = (u16::from(high) << 7) | u16::from(low);
                answer.extend_from_slice(&[
                    reply(Opcode::PositionAnswer),
                    (self.position >> 7) as u8 & 0x7f,
                    self.position as u8 & 0x7f,
                    ]).ok()?;
                if target == 0
                    {self.free = true}
                else {
                    self.free = false;
                    self.position = target;
                }
            },
            (Opcode::Read, &[_, sub]) if sub == SubCommand::Eeprom as u8 => {
                answer.extend_from_slice(&self.eeprom[..]).ok()?;
                answer[0] = reply(Opcode::ReadAnswer);
                answer[1] = sub;
            },
            (Opcode::Read, &[_, sub]) => {
                let parameter = Parameter::try_from(sub).ok()?;
                answer.extend_from_slice(&[reply(Opcode::ReadAnswer), sub, self.parameter(parameter)]).ok()?;
            },
            (Opcode::Write, &[_, sub, ref content @ ..])
            if sub == SubCommand::Eeprom as u8 && content.len() == EEPROM_SIZE - 2 => {
                self.eeprom[2 ..].copy_from_slice(content);
                answer.extend_from_slice(&[reply(Opcode::WriteAnswer), sub]).ok()?;
            },
            (Opcode::Write, &[_, sub, value]) => {
                let parameter = Parameter::try_from(sub).ok()?;
                self.parameters[parameter.sub() as usize - 1] = value;
                answer.extend_from_slice(&[reply(Opcode::WriteAnswer), sub, value]).ok()?;
            },
            _ => {
                debug!("servo {} ignores frame {:02x?}", id, frame);
                return None
            },
        }
        Some(answer)
    }
}


/**
    bus of emulated servos

    every frame written is processed by all servos at once, and their answers are received by the host when it starts reading. Servos not listening at the bus speed or framing ignore everything.
*/
#[derive(Clone, Debug)]
pub struct VirtualBus {
    servos: heapless::Vec<VirtualServo, MAX_SERVOS>,
    baud: u32,
    framing: Framing,
    echo: bool,
    /// bytes arrived in the host receiver
    received: heapless::Deque<u8, BUFFER>,
    /// answers not yet arrived
    pending: heapless::Deque<u8, BUFFER>,
}
impl VirtualBus {
    pub fn new() -> Self {
        Self {
            servos: heapless::Vec::new(),
            baud: BaudRate::default().rate(),
            framing: FRAMING,
            echo: false,
            received: heapless::Deque::new(),
            pending: heapless::Deque::new(),
        }
    }
    /// bus with one factory servo per id given
    pub fn with_servos(ids: &[u8]) -> Self {
        let mut bus = Self::new();
        for &id in ids {
            if let Ok(id) = ServoId::new(id) {
                bus.add(VirtualServo::new(id));
            }
        }
        bus
    }
    /// loop every transmitted byte back to the host receiver, like a weakly pulled-up half-duplex line
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
    /// plug a servo, returning false if the bus is full
    pub fn add(&mut self, servo: VirtualServo) -> bool {
        self.servos.push(servo).is_ok()
    }
    /// first servo with the given id
    pub fn servo(&self, id: u8) -> Option<&VirtualServo> {
        self.servos.iter().find(|servo| servo.id() == id)
    }
    pub fn servo_mut(&mut self, id: u8) -> Option<&mut VirtualServo> {
        self.servos.iter_mut().find(|servo| servo.id() == id)
    }
    pub fn servos(&self) -> &[VirtualServo] {&self.servos}
    pub fn baud(&self) -> u32 {self.baud}
}
impl Default for VirtualBus {
    fn default() -> Self {Self::new()}
}

impl Transport for VirtualBus {
    type Error = Infallible;

    fn set_baud_rate(&mut self, rate: u32) -> Result<(), Infallible> {
        self.baud = rate;
        Ok(())
    }
    fn set_framing(&mut self, framing: Framing) -> Result<(), Infallible> {
        self.framing = framing;
        Ok(())
    }
    fn write(&mut self, data: &[u8]) -> Result<usize, Infallible> {
        if self.echo {
            for &byte in data {
                // overflowing bytes are lost, as in a uart
                self.received.push_back(byte).ok();
            }
        }
        if self.framing != FRAMING
            {return Ok(data.len())}
        for servo in self.servos.iter_mut() {
            if servo.baud().rate() != self.baud
                {continue}
            if let Some(answer) = servo.handle(data) {
                for byte in answer {
                    self.pending.push_back(byte).ok();
                }
            }
        }
        Ok(data.len())
    }
    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
    fn read(&mut self, data: &mut [u8]) -> Result<usize, Infallible> {
        while let Some(byte) = self.pending.pop_front() {
            self.received.push_back(byte).ok();
        }
        let mut count = 0;
        for slot in data.iter_mut() {
            let Some(byte) = self.received.pop_front()
                else {break};
            *slot = byte;
            count += 1;
        }
        Ok(count)
    }
    fn discard_input(&mut self) -> Result<(), Infallible> {
        self.received.clear();
        Ok(())
    }
}
