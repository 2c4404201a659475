use embedded_hal::digital::OutputPin;

use crate::{
    Error,
    command::{self, Frame, Parameter, ServoId, POSITION_MIN, POSITION_MAX, POSITION_WEAK},
    };
use super::networking::{Host, Transport};


/// position commands answer the servo's current position
impl<T: Transport, P: OutputPin> Host<T, P> {
    /**
        move a servo to the given position in `3500 ..= 11500`, returning its current position

        the returned position may be slightly out of the command range
    */
    pub fn set_position(&mut self, id: u8, position: u16) -> Result<u16, Error> {
        let id = ServoId::new(id)?;
        if !(POSITION_MIN ..= POSITION_MAX).contains(&position)
            {return Err(Error::InvalidOption)}
        self.position(id, position)
    }
    /// release the servo's torque, returning its current position
    pub fn set_position_weak(&mut self, id: u8) -> Result<u16, Error> {
        let id = ServoId::new(id)?;
        self.position(id, POSITION_WEAK)
    }
    /**
        release the servo's torque then immediately command it at the position it reported, returning the position answered to that second command

        this samples the current position without leaving the servo limp
    */
    pub fn set_position_weak_and_keep(&mut self, id: u8) -> Result<u16, Error> {
        let id = ServoId::new(id)?;
        let current = self.position(id, POSITION_WEAK)?;
        // the sampled position is kept even slightly out of the command range
        self.position(id, current)
    }
    fn position(&mut self, id: ServoId, position: u16) -> Result<u16, Error> {
        let answer = self.request(Frame::Position {id, position})?;
        command::position_answer(id, &answer)
    }

    /// read a volatile parameter
    pub fn read_parameter(&mut self, id: u8, parameter: Parameter) -> Result<u8, Error> {
        let id = ServoId::new(id)?;
        let answer = self.request(Frame::ReadParameter {id, parameter})?;
        command::read_answer(id, parameter, &answer)
    }
    /// write a volatile parameter, the value must be in [Parameter::range]
    pub fn write_parameter(&mut self, id: u8, parameter: Parameter, value: u8) -> Result<(), Error> {
        let id = ServoId::new(id)?;
        if !parameter.range().contains(&value)
            {return Err(Error::InvalidOption)}
        let answer = self.request(Frame::WriteParameter {id, parameter, value})?;
        command::write_answer(id, parameter, &answer)
    }

    pub fn stretch(&mut self, id: u8) -> Result<u8, Error> {
        self.read_parameter(id, Parameter::Stretch)
    }
    pub fn speed(&mut self, id: u8) -> Result<u8, Error> {
        self.read_parameter(id, Parameter::Speed)
    }
    /// current consumption
    pub fn current(&mut self, id: u8) -> Result<u8, Error> {
        self.read_parameter(id, Parameter::Current)
    }
    /// current temperature
    pub fn temperature(&mut self, id: u8) -> Result<u8, Error> {
        self.read_parameter(id, Parameter::Temperature)
    }

    pub fn set_stretch(&mut self, id: u8, value: u8) -> Result<(), Error> {
        self.write_parameter(id, Parameter::Stretch, value)
    }
    pub fn set_speed(&mut self, id: u8, value: u8) -> Result<(), Error> {
        self.write_parameter(id, Parameter::Speed, value)
    }
    pub fn set_current_limit(&mut self, id: u8, value: u8) -> Result<(), Error> {
        self.write_parameter(id, Parameter::Current, value)
    }
    pub fn set_temperature_limit(&mut self, id: u8, value: u8) -> Result<(), Error> {
        self.write_parameter(id, Parameter::Temperature, value)
    }
}
