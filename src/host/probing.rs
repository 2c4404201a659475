use embedded_hal::digital::OutputPin;
use log::*;

use crate::{
    Error,
    command::{self, Frame, ServoId},
    };
use super::networking::{Host, Transport};


/// number of eeprom reads a servo must pass to be considered alive
pub const ALIVE_PROBES: usize = 10;

impl<T: Transport, P: OutputPin> Host<T, P> {
    /**
        id of the servo on the bus

        all servos on the bus answer this command at the same time, so this must only be used with exactly one servo connected
    */
    pub fn id(&mut self) -> Result<u8, Error> {
        let answer = self.request(Frame::ReadId)?;
        command::id_answer(&answer).map(ServoId::value)
    }
    /**
        assign an id to the servo on the bus, returning the id it acknowledged

        all servos on the bus take the new id, so this must only be used with exactly one servo connected. The servo needs about the duration of an eeprom write before accepting an other command.
    */
    pub fn set_id(&mut self, id: u8) -> Result<u8, Error> {
        let id = ServoId::new(id)?;
        let answer = self.request(Frame::WriteId {id})?;
        command::write_id_answer(id, &answer).map(ServoId::value)
    }
    /**
        heuristic presence check of a servo

        the eeprom is read [ALIVE_PROBES] times, every read must pass the eeprom checks and report the probed id. Any failure gives `false`, there is no distinction between a missing servo and a faulty bus.
    */
    pub fn is_alive(&mut self, id: u8) -> bool {
        for _ in 0 .. ALIVE_PROBES {
            match self.read_eeprom(id) {
                Ok(record) if record.id == Some(id) => {},
                Ok(record) => {
                    debug!("servo {} answered with eeprom id {:?}", id, record.id);
                    return false
                },
                Err(error) => {
                    debug!("servo {} probe failed: {}", id, error);
                    return false
                },
            }
        }
        true
    }
}
