/*!
    frames exchanged on the bus

    every frame starts with a header byte concatenating a 3 bit opcode and the 5 bit servo id. Commands are built by [Frame], answers are checked by the functions of this module.
*/

use bilge::prelude::*;
use core::ops::RangeInclusive;

use crate::Error;


/// highest servo id a bus can address
pub const ID_MAX: u8 = 31;
/// lowest position a servo can be commanded to
pub const POSITION_MIN: u16 = 3500;
/// highest position a servo can be commanded to
pub const POSITION_MAX: u16 = 11500;
/// position value releasing the servo's torque
pub const POSITION_WEAK: u16 = 0;

/// size of the answer to [Frame::Position]
pub const POSITION_ANSWER: usize = 3;
/// size of the answer to [Frame::ReadParameter]
pub const READ_ANSWER: usize = 3;
/// size of the answer to [Frame::WriteParameter]
pub const WRITE_ANSWER: usize = 3;
/// size of the answer to [Frame::ReadEeprom], and of the eeprom write command
pub const EEPROM_ANSWER: usize = 66;
/// size of the answer to an eeprom write
pub const EEPROM_WRITE_ANSWER: usize = 2;
/// size of the answer to [Frame::ReadId] and [Frame::WriteId]
pub const ID_ANSWER: usize = 1;

/// biggest command except eeprom writes
pub const MAX_FRAME: usize = 4;
/// command bytes, eeprom writes are handled by [crate::registers::EepromBlock]
pub type FrameBytes = heapless::Vec<u8, MAX_FRAME>;


/// local id of a servo on the bus, in `0 ..= 31`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ServoId(u5);
impl ServoId {
    pub fn new(id: u8) -> Result<Self, Error> {
        if id > ID_MAX
            {return Err(Error::InvalidOption)}
        Ok(Self(u5::new(id)))
    }
    pub fn value(self) -> u8 {self.0.value()}
}
impl TryFrom<u8> for ServoId {
    type Error = Error;
    fn try_from(id: u8) -> Result<Self, Error> {
        Self::new(id)
    }
}
impl From<ServoId> for u8 {
    fn from(id: ServoId) -> u8 {id.value()}
}

/// type of frame, in the upper bits of every header byte
#[bitsize(3)]
#[derive(FromBits, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Opcode {
    /// answer to a position command
    PositionAnswer = 0b000,
    /// answer to a parameter or eeprom read
    ReadAnswer = 0b001,
    /// answer to a parameter or eeprom write
    WriteAnswer = 0b010,
    Reserved = 0b011,
    /// set target position
    Position = 0b100,
    /// read a parameter or the eeprom
    Read = 0b101,
    /// write a parameter or the eeprom
    Write = 0b110,
    /// read or set the id of the only servo on the bus
    Id = 0b111,
}

/// first byte of every frame
#[bitsize(8)]
#[derive(FromBits, DebugBits, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u5,
    pub opcode: Opcode,
}
impl Header {
    pub fn with(opcode: Opcode, id: ServoId) -> Self {
        Self::new(id.0, opcode)
    }
    pub fn byte(self) -> u8 {
        u8::from(self)
    }
    /// check this answer header is from the given servo, with the expected opcode
    fn expect(self, id: ServoId, opcode: Opcode) -> bool {
        self.opcode() == opcode && self.id() == id.0
    }
}

/// sub command of read and write frames, telling which value is accessed
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SubCommand {
    /// the whole persistent configuration
    Eeprom = 0x00,
    Stretch = 0x01,
    Speed = 0x02,
    Current = 0x03,
    Temperature = 0x04,
}

/**
    volatile servo parameter, lost at power off

    eeprom access is deliberately not a parameter, use the eeprom methods of [crate::host::Host] for it
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parameter {
    /// holding stiffness
    Stretch,
    /// moving speed
    Speed,
    /// reads the current consumption, writes the current limit
    Current,
    /// reads the temperature, writes the temperature limit
    Temperature,
}
impl Parameter {
    pub const ALL: [Self; 4] = [Self::Stretch, Self::Speed, Self::Current, Self::Temperature];

    pub const fn sub(self) -> SubCommand {
        match self {
            Self::Stretch => SubCommand::Stretch,
            Self::Speed => SubCommand::Speed,
            Self::Current => SubCommand::Current,
            Self::Temperature => SubCommand::Temperature,
        }
    }
    /// values accepted when writing this parameter
    pub const fn range(self) -> RangeInclusive<u8> {
        match self {
            Self::Stretch => 1 ..= 127,
            Self::Speed => 1 ..= 127,
            Self::Current => 1 ..= 63,
            Self::Temperature => 1 ..= 127,
        }
    }
}
impl TryFrom<u8> for Parameter {
    type Error = Error;
    /// parameter from its sub command code, the eeprom code is refused
    fn try_from(code: u8) -> Result<Self, Error> {
        Self::ALL.into_iter()
            .find(|parameter| parameter.sub() as u8 == code)
            .ok_or(Error::InvalidOption)
    }
}


/// commands a host can send, eeprom writes excepted
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// move to position, or release torque with [POSITION_WEAK]
    Position {id: ServoId, position: u16},
    ReadParameter {id: ServoId, parameter: Parameter},
    WriteParameter {id: ServoId, parameter: Parameter, value: u8},
    ReadEeprom {id: ServoId},
    /// every servo on the bus answers, only valid with a single servo
    ReadId,
    /// every servo on the bus is assigned the id, only valid with a single servo
    WriteId {id: ServoId},
}
impl Frame {
    pub fn bytes(self) -> FrameBytes {
        let mut frame = FrameBytes::new();
        // cannot fail, all frames fit in MAX_FRAME
        let _ = match self {
            Self::Position {id, position} => frame.extend_from_slice(&[
                Header::with(Opcode::Position, id).byte(),
                (position >> 7) as u8 & 0x7f,
                position as u8 & 0x7f,
                ]),
            Self::ReadParameter {id, parameter} => frame.extend_from_slice(&[
                Header::with(Opcode::Read, id).byte(),
                parameter.sub() as u8,
                ]),
            Self::WriteParameter {id, parameter, value} => frame.extend_from_slice(&[
                Header::with(Opcode::Write, id).byte(),
                parameter.sub() as u8,
                value,
                ]),
            Self::ReadEeprom {id} => frame.extend_from_slice(&[
                Header::with(Opcode::Read, id).byte(),
                SubCommand::Eeprom as u8,
                ]),
            Self::ReadId => frame.extend_from_slice(&[
                0xff, 0x00, 0x00, 0x00,
                ]),
            Self::WriteId {id} => frame.extend_from_slice(&[
                Header::with(Opcode::Id, id).byte(),
                0x01, 0x01, 0x01,
                ]),
        };
        frame
    }
    /// number of bytes the servo answers to this frame
    pub const fn answer_size(self) -> usize {
        match self {
            Self::Position {..} => POSITION_ANSWER,
            Self::ReadParameter {..} => READ_ANSWER,
            Self::WriteParameter {..} => WRITE_ANSWER,
            Self::ReadEeprom {..} => EEPROM_ANSWER,
            Self::ReadId | Self::WriteId {..} => ID_ANSWER,
        }
    }
}

/// header of an eeprom write command, the rest of the command is the full eeprom block
pub fn eeprom_write_header(id: ServoId) -> [u8; 2] {
    [Header::with(Opcode::Write, id).byte(), SubCommand::Eeprom as u8]
}


/// position reported in a position answer
pub fn position_answer(id: ServoId, answer: &[u8; POSITION_ANSWER]) -> Result<u16, Error> {
    // highest bit of the header is not significant in this answer
    if answer[0] & 0x7f != id.value()
        {return Err(Error::IdMismatch)}
    Ok((u16::from(answer[1]) << 7) + u16::from(answer[2]))
}
/// value reported in a parameter read answer
pub fn read_answer(id: ServoId, parameter: Parameter, answer: &[u8; READ_ANSWER]) -> Result<u8, Error> {
    if !Header::from(answer[0]).expect(id, Opcode::ReadAnswer) || answer[1] != parameter.sub() as u8
        {return Err(Error::ReturnDataWrong)}
    Ok(answer[2])
}
/// check a parameter write answer
pub fn write_answer(id: ServoId, parameter: Parameter, answer: &[u8; WRITE_ANSWER]) -> Result<(), Error> {
    if !Header::from(answer[0]).expect(id, Opcode::WriteAnswer) || answer[1] != parameter.sub() as u8
        {return Err(Error::ReturnDataWrong)}
    Ok(())
}
/// check the header of an eeprom read answer, the marker is checked by [crate::registers::EepromBlock]
pub fn eeprom_read_answer(id: ServoId, answer: &[u8; EEPROM_ANSWER]) -> Result<(), Error> {
    if !Header::from(answer[0]).expect(id, Opcode::ReadAnswer) || answer[1] != SubCommand::Eeprom as u8
        {return Err(Error::ReturnDataWrong)}
    Ok(())
}
/// check an eeprom write answer
pub fn eeprom_write_answer(id: ServoId, answer: &[u8; EEPROM_WRITE_ANSWER]) -> Result<(), Error> {
    if !Header::from(answer[0]).expect(id, Opcode::WriteAnswer) || answer[1] != SubCommand::Eeprom as u8
        {return Err(Error::ReturnDataWrong)}
    Ok(())
}
/// id reported by the only servo on the bus
pub fn id_answer(answer: &[u8; ID_ANSWER]) -> Result<ServoId, Error> {
    let header = Header::from(answer[0]);
    if header.opcode() != Opcode::Id
        {return Err(Error::IdMismatch)}
    Ok(ServoId(header.id()))
}
/// id acknowledged by the only servo on the bus, it must be the requested one
pub fn write_id_answer(id: ServoId, answer: &[u8; ID_ANSWER]) -> Result<ServoId, Error> {
    let answered = id_answer(answer)?;
    if answered != id
        {return Err(Error::IdMismatch)}
    Ok(answered)
}
