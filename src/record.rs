/*!
    structured view of a servo's persistent configuration

    an [EepromRecord] is decoded from an eeprom block freshly read, optionally modified, then encoded over a freshly read block again. Every field is optional: `None` means unknown when decoding, and left untouched when encoding.
*/

use core::{
    fmt,
    ops::RangeInclusive,
    };
use log::*;

use crate::{
    Error,
    command::{self, ServoId, POSITION_MIN, POSITION_MAX},
    registers::{self, EepromBlock, Register, Nibbles, Wide},
    };


/// communication speeds supported by the servos
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum BaudRate {
    #[default]
    B115200,
    B625000,
    B1250000,
}
impl BaudRate {
    pub const ALL: [Self; 3] = [Self::B115200, Self::B625000, Self::B1250000];

    /// bits per second
    pub const fn rate(self) -> u32 {
        match self {
            Self::B115200 => 115_200,
            Self::B625000 => 625_000,
            Self::B1250000 => 1_250_000,
        }
    }
    pub fn from_rate(rate: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|baud| baud.rate() == rate)
    }
    /// code in [registers::COMM_SPEED]
    pub const fn code(self) -> u8 {
        match self {
            Self::B115200 => 0x0a,
            Self::B625000 => 0x01,
            Self::B1250000 => 0x00,
        }
    }
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|baud| baud.code() == code)
    }
}
impl TryFrom<u32> for BaudRate {
    type Error = Error;
    fn try_from(rate: u32) -> Result<Self, Error> {
        Self::from_rate(rate).ok_or(Error::InvalidOption)
    }
}


/// field of an [EepromRecord], used to report invalid values
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Stretch,
    Speed,
    Punch,
    Deadband,
    Dumping,
    Safetimer,
    Slave,
    Rotation,
    PwmInhibit,
    Free,
    Reverse,
    PositionLimitHigh,
    PositionLimitLow,
    CommSpeed,
    TemperatureLimit,
    CurrentLimit,
    Response,
    Offset,
    Id,
    CharStretch1,
    CharStretch2,
    CharStretch3,
}
/// number of fields in a record
pub const FIELDS: usize = 22;

impl Field {
    /// valid values of numeric fields, flags and communication speed are valid by type
    pub const fn range(self) -> Option<RangeInclusive<i32>> {
        Some(match self {
            Self::Stretch => 1 ..= 127,
            Self::Speed => 1 ..= 127,
            Self::Punch => 0 ..= 10,
            Self::Deadband => 0 ..= 16,
            Self::Dumping => 1 ..= 255,
            Self::Safetimer => 1 ..= 255,
            Self::PositionLimitHigh => 8000 ..= POSITION_MAX as i32,
            Self::PositionLimitLow => POSITION_MIN as i32 ..= 7000,
            Self::TemperatureLimit => 1 ..= 127,
            Self::CurrentLimit => 1 ..= 63,
            Self::Response => 1 ..= 5,
            Self::Offset => -127 ..= 127,
            Self::Id => 0 ..= command::ID_MAX as i32,
            Self::CharStretch1 | Self::CharStretch2 | Self::CharStretch3 => 1 ..= 127,
            Self::Slave | Self::Rotation | Self::PwmInhibit | Self::Free | Self::Reverse
            | Self::CommSpeed => return None,
        })
    }
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stretch => "stretch",
            Self::Speed => "speed",
            Self::Punch => "punch",
            Self::Deadband => "deadband",
            Self::Dumping => "dumping",
            Self::Safetimer => "safetimer",
            Self::Slave => "slave",
            Self::Rotation => "rotation",
            Self::PwmInhibit => "pwm inhibit",
            Self::Free => "free",
            Self::Reverse => "reverse",
            Self::PositionLimitHigh => "position limit high",
            Self::PositionLimitLow => "position limit low",
            Self::CommSpeed => "comm speed",
            Self::TemperatureLimit => "temperature limit",
            Self::CurrentLimit => "current limit",
            Self::Response => "response",
            Self::Offset => "offset",
            Self::Id => "id",
            Self::CharStretch1 => "char stretch 1",
            Self::CharStretch2 => "char stretch 2",
            Self::CharStretch3 => "char stretch 3",
        }
    }
}

/// fields of a record that are out of their range
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Invalid {
    pub fields: heapless::Vec<Field, FIELDS>,
}
impl From<Invalid> for Error {
    fn from(_: Invalid) -> Self {
        Error::EepromDataWrong
    }
}


/**
    persistent servo configuration

    `None` fields are unknown in a decoded record, and left as they are on the servo when written.
*/
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EepromRecord {
    pub stretch: Option<u8>,
    pub speed: Option<u8>,
    pub punch: Option<u8>,
    pub deadband: Option<u8>,
    pub dumping: Option<u8>,
    pub safetimer: Option<u8>,

    pub slave: Option<bool>,
    pub rotation: Option<bool>,
    pub pwm_inhibit: Option<bool>,
    /// read only, never written to the servo
    pub free: Option<bool>,
    pub reverse: Option<bool>,

    pub position_limit_high: Option<u16>,
    pub position_limit_low: Option<u16>,
    pub comm_speed: Option<BaudRate>,
    pub temperature_limit: Option<u8>,
    pub current_limit: Option<u8>,
    pub response: Option<u8>,
    /// position offset, its on-device range leaves room for 128 that is refused by validation
    pub offset: Option<i16>,
    pub id: Option<u8>,
    pub char_stretch: [Option<u8>; 3],
}

impl EepromRecord {
    /// record with all fields unset
    pub const fn unchanged() -> Self {
        Self {
            stretch: None,
            speed: None,
            punch: None,
            deadband: None,
            dumping: None,
            safetimer: None,
            slave: None,
            rotation: None,
            pwm_inhibit: None,
            free: None,
            reverse: None,
            position_limit_high: None,
            position_limit_low: None,
            comm_speed: None,
            temperature_limit: None,
            current_limit: None,
            response: None,
            offset: None,
            id: None,
            char_stretch: [None; 3],
        }
    }

    /// decode every field of an eeprom block, header and marker are not checked here
    pub fn decode(block: &EepromBlock) -> Self {
        let byte = |register: Register<Nibbles>| block.get(register).0;
        let flags = block.get(registers::FLAGS);
        Self {
            stretch: Some(halve(byte(registers::STRETCH))),
            speed: Some(byte(registers::SPEED)),
            punch: Some(byte(registers::PUNCH)),
            deadband: Some(byte(registers::DEADBAND)),
            dumping: Some(byte(registers::DUMPING)),
            safetimer: Some(byte(registers::SAFETIMER)),

            slave: Some(flags.slave()),
            rotation: Some(flags.rotation()),
            pwm_inhibit: Some(flags.pwm_inhibit()),
            free: Some(flags.free()),
            reverse: Some(flags.reverse()),

            position_limit_high: Some(block.get(registers::POSITION_LIMIT_HIGH).0),
            position_limit_low: Some(block.get(registers::POSITION_LIMIT_LOW).0),
            comm_speed: BaudRate::from_code(byte(registers::COMM_SPEED)),
            temperature_limit: Some(byte(registers::TEMPERATURE_LIMIT)),
            current_limit: Some(byte(registers::CURRENT_LIMIT)),
            response: Some(byte(registers::RESPONSE)),
            offset: Some(decode_offset(byte(registers::OFFSET))),
            id: Some(byte(registers::ID)),
            char_stretch: registers::CHAR_STRETCH.map(|register| Some(halve(byte(register)))),
        }
    }

    /**
        write the set fields of this record over `baseline`, which must be a freshly read block of the servo `id`

        reserved bytes and unset fields keep their baseline value, the free flag is never written, and the header is replaced by the eeprom write header.

        the record must pass [Self::validate] first, out of range values are truncated to their wire width.
    */
    pub fn encode(&self, baseline: &EepromBlock, id: ServoId) -> EepromBlock {
        debug_assert!(self.validate().is_ok(), "encoding an invalid eeprom record");
        let mut block = baseline.clone();
        block.set_header(command::eeprom_write_header(id));

        let mut byte = |register: Register<Nibbles>, value: Option<u8>| {
            if let Some(value) = value {
                block.set(register, Nibbles(value));
            }
        };
        byte(registers::STRETCH, self.stretch.map(double));
        byte(registers::SPEED, self.speed);
        byte(registers::PUNCH, self.punch);
        byte(registers::DEADBAND, self.deadband);
        byte(registers::DUMPING, self.dumping);
        byte(registers::SAFETIMER, self.safetimer);
        byte(registers::COMM_SPEED, self.comm_speed.map(BaudRate::code));
        byte(registers::TEMPERATURE_LIMIT, self.temperature_limit);
        byte(registers::CURRENT_LIMIT, self.current_limit);
        byte(registers::RESPONSE, self.response);
        byte(registers::OFFSET, self.offset.map(encode_offset));
        byte(registers::ID, self.id);
        for (register, value) in registers::CHAR_STRETCH.into_iter().zip(self.char_stretch) {
            byte(register, value.map(double));
        }

        if self.slave.is_some() || self.rotation.is_some() || self.pwm_inhibit.is_some() || self.reverse.is_some() {
            let mut flags = block.get(registers::FLAGS);
            if let Some(slave) = self.slave        {flags.set_slave(slave)}
            if let Some(rotation) = self.rotation  {flags.set_rotation(rotation)}
            if let Some(pwm) = self.pwm_inhibit    {flags.set_pwm_inhibit(pwm)}
            if let Some(reverse) = self.reverse    {flags.set_reverse(reverse)}
            block.set(registers::FLAGS, flags);
        }

        if let Some(limit) = self.position_limit_high {
            block.set(registers::POSITION_LIMIT_HIGH, Wide(limit));
        }
        if let Some(limit) = self.position_limit_low {
            block.set(registers::POSITION_LIMIT_LOW, Wide(limit));
        }
        block
    }

    /// numeric fields and their value
    fn numbers(&self) -> [(Field, Option<i32>); 17] {
        let int = |value: Option<u8>| value.map(i32::from);
        [
            (Field::Stretch, int(self.stretch)),
            (Field::Speed, int(self.speed)),
            (Field::Punch, int(self.punch)),
            (Field::Deadband, int(self.deadband)),
            (Field::Dumping, int(self.dumping)),
            (Field::Safetimer, int(self.safetimer)),
            (Field::PositionLimitHigh, self.position_limit_high.map(i32::from)),
            (Field::PositionLimitLow, self.position_limit_low.map(i32::from)),
            (Field::TemperatureLimit, int(self.temperature_limit)),
            (Field::CurrentLimit, int(self.current_limit)),
            (Field::Response, int(self.response)),
            (Field::Offset, self.offset.map(i32::from)),
            (Field::Id, int(self.id)),
            (Field::CharStretch1, int(self.char_stretch[0])),
            (Field::CharStretch2, int(self.char_stretch[1])),
            (Field::CharStretch3, int(self.char_stretch[2])),
            (Field::CommSpeed, self.comm_speed.map(|baud| baud.rate() as i32)),
        ]
    }
    fn flags(&self) -> [(Field, Option<bool>); 5] {
        [
            (Field::Slave, self.slave),
            (Field::Rotation, self.rotation),
            (Field::PwmInhibit, self.pwm_inhibit),
            (Field::Free, self.free),
            (Field::Reverse, self.reverse),
        ]
    }

    /// check every set field is in its range, all invalid fields are reported
    pub fn validate(&self) -> Result<(), Invalid> {
        let mut invalid = Invalid::default();
        for (field, value) in self.numbers() {
            let (Some(value), Some(range)) = (value, field.range())
                else {continue};
            if !range.contains(&value) {
                warn!("eeprom {} out of range: {} not in {:?}", field.name(), value, range);
                // cannot overflow, there is room for all fields
                invalid.fields.push(field).ok();
            }
        }
        if invalid.fields.is_empty()
            {Ok(())}
        else
            {Err(invalid)}
    }
}

/// human readable dump, one field per line with its valid range
impl fmt::Display for EepromRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (field, value) in self.numbers() {
            write!(f, "{:<20}", field.name())?;
            match value {
                Some(value) => write!(f, "{:>8}", value)?,
                None => write!(f, "{:>8}", "-")?,
            }
            match field.range() {
                Some(range) => writeln!(f, "  ({} - {})", range.start(), range.end())?,
                None => writeln!(f, "  (115200/625000/1250000)")?,
            }
        }
        for (field, value) in self.flags() {
            write!(f, "{:<20}", field.name())?;
            match value {
                Some(value) => writeln!(f, "{:>8}  (0/1)", u8::from(value))?,
                None => writeln!(f, "{:>8}  (0/1)", "-")?,
            }
        }
        Ok(())
    }
}

/// stretches are stored doubled
fn halve(wire: u8) -> u8 {wire / 2}
fn double(value: u8) -> u8 {value.wrapping_mul(2)}

/// the offset is stored negated, so that the stored byte is the two's complement of the opposite of the offset
fn decode_offset(wire: u8) -> i16 {
    if wire & 0x80 != 0
        {i16::from(!wire & 0x7f) + 1}
    else
        {-i16::from(wire)}
}
fn encode_offset(offset: i16) -> u8 {
    (offset as u8).wrapping_neg()
}
