use embedded_hal::digital::OutputPin;
use log::*;

use crate::{
    Error,
    command::{self, Frame, ServoId, EEPROM_ANSWER, EEPROM_WRITE_ANSWER},
    registers::EepromBlock,
    record::EepromRecord,
    };
use super::networking::{Host, Transport};


impl<T: Transport, P: OutputPin> Host<T, P> {
    /// read the raw eeprom block of a servo, its header and marker are checked
    pub fn read_eeprom_raw(&mut self, id: u8) -> Result<EepromBlock, Error> {
        let id = ServoId::new(id)?;
        self.fetch_eeprom(id)
    }
    /// read and decode the eeprom of a servo, all its fields must be valid
    pub fn read_eeprom(&mut self, id: u8) -> Result<EepromRecord, Error> {
        let id = ServoId::new(id)?;
        let record = EepromRecord::decode(&self.fetch_eeprom(id)?);
        record.validate()?;
        Ok(record)
    }
    /**
        write the set fields of `record` to the servo's eeprom

        the record is validated before any bus activity. Then the eeprom is freshly read so that the unset fields and reserved bytes are written back as they currently are on the servo. Two exchanges are performed: read then write.
    */
    pub fn write_eeprom(&mut self, id: u8, record: &EepromRecord) -> Result<(), Error> {
        let id = ServoId::new(id)?;
        record.validate()?;
        let baseline = self.fetch_eeprom(id)?;
        let mut block = record.encode(&baseline, id);
        let mut answer = [0; EEPROM_WRITE_ANSWER];
        self.exchange(&mut block[..], &mut answer)?;
        command::eeprom_write_answer(id, &answer)
    }

    fn fetch_eeprom(&mut self, id: ServoId) -> Result<EepromBlock, Error> {
        let answer: [u8; EEPROM_ANSWER] = self.request(Frame::ReadEeprom {id})?;
        command::eeprom_read_answer(id, &answer)?;
        let block = EepromBlock::from(answer);
        if !block.has_marker() {
            warn!("eeprom of servo {} misses its marker", id.value());
            return Err(Error::EepromDataWrong)
        }
        Ok(block)
    }
}
