/*!
    layout of the servos' persistent configuration

    the eeprom is always read and written as a whole block of [EEPROM_SIZE] bytes. Every logical byte in it is split over two wire bytes carrying 4 significant bits each, high nibble first. Each field is described by a [Register] giving its position in the block and its wire type.

    bytes not covered by a register are reserved and must be written back as they were read.
*/

use core::{
    marker::PhantomData,
    ops::{Deref, DerefMut},
    };
use bilge::prelude::*;
use packbytes::{FromBytes, ToBytes, ByteArray};

use crate::pack_nibbles;


/// number of bytes of an eeprom read answer or write command, including the 2 header bytes
pub const EEPROM_SIZE: usize = 66;
/// value expected in [MARKER] of any valid eeprom block
pub const MARKER_VALUE: u8 = 0x5a;


/// reconstruct one logical byte from two wire bytes carrying 4 significant bits each
pub const fn combine(high: u8, low: u8) -> u8 {
    (high << 4) | low
}

/**
    a register is a typed pointer in the eeprom block

    it only holds the index of the starting byte of the referenced value, hence can be created, copied or destroyed at no cost
*/
#[derive(PartialEq, Eq, Hash, Debug)]
pub struct Register<T> {
    addr: usize,
    ty: PhantomData<T>,
}
impl<T> Register<T> {
    /// create a register from its starting byte
    pub const fn new(address: usize) -> Self {
        Self{addr: address, ty: PhantomData}
    }
    /// starting byte in the block
    pub const fn address(&self) -> usize {self.addr}
}
impl<T: FromBytes> Register<T> {
    /// number of wire bytes
    pub const fn size(&self) -> usize {T::Bytes::SIZE}
}
impl<T> Clone for Register<T> {
    fn clone(&self) -> Self {
        Self::new(self.address())
    }
}
impl<T> Copy for Register<T> {}


/// one logical byte on two wire bytes
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Nibbles(pub u8);
impl From<u8> for Nibbles {
    fn from(byte: u8) -> Self {Self(byte)}
}
impl From<Nibbles> for u8 {
    fn from(nibbles: Nibbles) -> u8 {nibbles.0}
}
pack_nibbles!(Nibbles);

/// one logical 16 bit word on four wire bytes, high byte first
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Wide(pub u16);
impl ToBytes for Wide {
    type Bytes = [u8; 4];

    fn to_le_bytes(self) -> Self::Bytes {
        let [a, b, c, d] = self.to_be_bytes();
        [d, c, b, a]
    }
    fn to_be_bytes(self) -> Self::Bytes {
        let [high, low] = self.0.to_be_bytes();
        let [a, b] = Nibbles(high).to_be_bytes();
        let [c, d] = Nibbles(low).to_be_bytes();
        [a, b, c, d]
    }
}
impl FromBytes for Wide {
    type Bytes = [u8; 4];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        let [a, b, c, d] = bytes;
        Self::from_be_bytes([d, c, b, a])
    }
    fn from_be_bytes(bytes: Self::Bytes) -> Self {
        let [a, b, c, d] = bytes;
        Self(u16::from_be_bytes([combine(a, b), combine(c, d)]))
    }
}

/// servo behavior flags, on two wire bytes
#[bitsize(8)]
#[derive(FromBits, DebugBits, Copy, Clone, PartialEq, Eq, Default)]
pub struct Flags {
    /// reverse rotation direction
    pub reverse: bool,
    /// servo is currently released, read only
    pub free: bool,
    reserved_2: u1,
    /// ignore pwm signals, only serial commands are accepted
    pub pwm_inhibit: bool,
    /// continuous rotation mode
    pub rotation: bool,
    reserved_5: u2,
    /// slave mode
    pub slave: bool,
}
pack_nibbles!(Flags);


/// marker identifying a valid block
pub const MARKER: Register<Nibbles> = Register::new(2);
/// holding stiffness, stored doubled
pub const STRETCH: Register<Nibbles> = Register::new(4);
pub const SPEED: Register<Nibbles> = Register::new(6);
pub const PUNCH: Register<Nibbles> = Register::new(8);
pub const DEADBAND: Register<Nibbles> = Register::new(10);
pub const DUMPING: Register<Nibbles> = Register::new(12);
pub const SAFETIMER: Register<Nibbles> = Register::new(14);
pub const FLAGS: Register<Flags> = Register::new(16);
pub const POSITION_LIMIT_HIGH: Register<Wide> = Register::new(18);
pub const POSITION_LIMIT_LOW: Register<Wide> = Register::new(22);
/// communication speed code, see [crate::record::BaudRate]
pub const COMM_SPEED: Register<Nibbles> = Register::new(28);
pub const TEMPERATURE_LIMIT: Register<Nibbles> = Register::new(30);
pub const CURRENT_LIMIT: Register<Nibbles> = Register::new(32);
pub const RESPONSE: Register<Nibbles> = Register::new(52);
/// position offset, stored negated
pub const OFFSET: Register<Nibbles> = Register::new(54);
pub const ID: Register<Nibbles> = Register::new(58);
/// characteristic stretches, stored doubled
pub const CHAR_STRETCH: [Register<Nibbles>; 3] = [
    Register::new(60),
    Register::new(62),
    Register::new(64),
    ];


/// raw eeprom block as exchanged on the bus, header bytes included
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EepromBlock {
    buffer: [u8; EEPROM_SIZE],
}
impl EepromBlock {
    pub const fn new(buffer: [u8; EEPROM_SIZE]) -> Self {
        Self {buffer}
    }
    /// get the current register's value
    pub fn get<T: FromBytes>(&self, register: Register<T>) -> T {
        let mut dst = T::Bytes::zeroed();
        dst.as_mut().copy_from_slice(&self.buffer[register.address() ..][.. T::Bytes::SIZE]);
        T::from_be_bytes(dst)
    }
    /// set the given register's value
    pub fn set<T: ToBytes>(&mut self, register: Register<T>, value: T) {
        let src = value.to_be_bytes();
        let src = src.as_ref();
        self.buffer[register.address() ..][.. src.len()].copy_from_slice(src);
    }
    /// true if the block carries the marker of valid eeprom content
    pub fn has_marker(&self) -> bool {
        self.get(MARKER).0 == MARKER_VALUE
    }
    /// the two header bytes, from the frame this block was received in or will be sent in
    pub fn header(&self) -> [u8; 2] {
        [self.buffer[0], self.buffer[1]]
    }
    pub fn set_header(&mut self, header: [u8; 2]) {
        self.buffer[.. 2].copy_from_slice(&header);
    }
    pub fn into_bytes(self) -> [u8; EEPROM_SIZE] {
        self.buffer
    }
}
impl Default for EepromBlock {
    fn default() -> Self {
        Self::new([0; EEPROM_SIZE])
    }
}
impl From<[u8; EEPROM_SIZE]> for EepromBlock {
    fn from(buffer: [u8; EEPROM_SIZE]) -> Self {
        Self::new(buffer)
    }
}
impl Deref for EepromBlock {
    type Target = [u8; EEPROM_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}
impl DerefMut for EepromBlock {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}
