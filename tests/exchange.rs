mod common;

use icsbus::{
    Error, RetCode,
    command::Parameter,
    host::{Config, DrainPolicy, Host, FRAMING},
    record::{BaudRate, EepromRecord},
    registers::{self, EepromBlock, Nibbles},
    };
use common::*;


#[test]
fn initialization() {
    init_logger();
    let mut delay = NoDelay::default();
    let host = Host::new(Scripted::default(), RecordingPin::default(), Config::default(), &mut delay).unwrap();
    assert_eq!(delay.ns, 550_000_000);
    let (bus, pin) = host.release();
    assert_eq!(pin.states, [true, false]);
    assert_eq!(bus.baud, Some(115_200));
    assert_eq!(bus.framing, Some(FRAMING));
    assert_eq!(bus.activity(), 0);

    let mut delay = NoDelay::default();
    let config = Config {baud: BaudRate::B1250000, mode_select: false, drain: DrainPolicy::Keep};
    let mut host = Host::new(Scripted::default(), RecordingPin::default(), config, &mut delay).unwrap();
    assert_eq!(delay.ns, 0);
    assert_eq!(host.bus().baud, Some(1_250_000));
    host.set_baud_rate(BaudRate::B625000).unwrap();
    assert_eq!(host.bus().baud, Some(625_000));
    assert_eq!(host.config().baud, BaudRate::B625000);
}

#[test]
fn exchange_toggles_direction() {
    let mut host = scripted([vec![0x21, 0x02, 0x05]]);
    let mut command = [0xa1, 0x02];
    let mut response = [0; 3];
    host.exchange(&mut command, &mut response).unwrap();
    assert_eq!(response, [0x21, 0x02, 0x05]);
    // command buffer is cleared after sending
    assert_eq!(command, [0, 0]);
    assert_eq!(host.bus().written, [vec![0xa1, 0x02]]);
    assert_eq!(host.bus().discards, 1);
    let (_, pin) = host.release();
    assert_eq!(pin.states, [true, false]);
}

#[test]
fn direction_held_until_sent() {
    init_logger();
    let trace = Trace::default();
    let bus = Scripted {
        answers: [vec![0x21, 0x02, 0x05]].into_iter().collect(),
        trace: Some(trace.clone()),
        .. Scripted::default()
        };
    let pin = RecordingPin {trace: Some(trace.clone()), .. RecordingPin::default()};
    let config = Config {mode_select: false, .. Config::default()};
    let mut host = Host::new(bus, pin, config, &mut NoDelay::default()).unwrap();
    host.exchange(&mut [0xa1, 0x02], &mut [0; 3]).unwrap();
    // the line is released only once the transmitter is empty, and the echo drained after
    assert_eq!(*trace.borrow(), ["high", "write", "flush", "low", "discard", "read"]);
    assert_eq!(host.bus().flushes, 1);
}

#[test]
fn short_write() {
    let mut host = scripted([vec![0x01, 0x3a, 0x4c]]);
    host.bus_mut().short_write = Some(2);
    let mut command = [0x81, 0x3a, 0x4c];
    let mut response = [0xaa; 3];
    assert_eq!(host.exchange(&mut command, &mut response), Err(Error::Write));
    assert_eq!(command, [0; 3]);
    assert_eq!(response, [0; 3]);
    // nothing is read after a failed write
    assert_eq!(host.bus().reads, 0);
    assert_eq!(host.set_position(1, 7500), Err(Error::Write));
}

#[test]
fn short_read() {
    let mut host = scripted([vec![0x01, 0x3a], vec![]]);
    let mut command = [0x81, 0x3a, 0x4c];
    let mut response = [0xaa; 3];
    assert_eq!(host.exchange(&mut command, &mut response), Err(Error::Read));
    assert_eq!(command, [0; 3]);
    assert_eq!(response, [0; 3]);
    // no answer at all
    assert_eq!(host.read_parameter(1, Parameter::Speed), Err(Error::Read));
}

#[test]
fn drain_policy() {
    let mut host = scripted([vec![0x21, 0x02, 0x05], vec![0x21, 0x02, 0x06]]);
    assert_eq!(host.speed(1), Ok(5));
    assert_eq!(host.bus().discards, 1);
    host.set_drain(DrainPolicy::Keep);
    assert_eq!(host.speed(1), Ok(6));
    assert_eq!(host.bus().discards, 1);
}

#[test]
fn invalid_arguments_do_not_touch_the_bus() {
    let mut host = scripted([]);
    let record = EepromRecord::unchanged();
    for id in [32, 100, 255] {
        assert_eq!(host.set_position(id, 7500), Err(Error::InvalidOption));
        assert_eq!(host.set_position_weak(id), Err(Error::InvalidOption));
        assert_eq!(host.set_position_weak_and_keep(id), Err(Error::InvalidOption));
        assert_eq!(host.read_parameter(id, Parameter::Stretch), Err(Error::InvalidOption));
        assert_eq!(host.write_parameter(id, Parameter::Stretch, 10), Err(Error::InvalidOption));
        assert_eq!(host.current(id), Err(Error::InvalidOption));
        assert_eq!(host.set_speed(id, 10), Err(Error::InvalidOption));
        assert_eq!(host.read_eeprom_raw(id), Err(Error::InvalidOption));
        assert_eq!(host.read_eeprom(id), Err(Error::InvalidOption));
        assert_eq!(host.write_eeprom(id, &record), Err(Error::InvalidOption));
        assert_eq!(host.set_id(id), Err(Error::InvalidOption));
        assert!(!host.is_alive(id));
    }
    assert_eq!(host.set_position(1, 3499), Err(Error::InvalidOption));
    assert_eq!(host.set_position(1, 11501), Err(Error::InvalidOption));
    assert_eq!(host.set_stretch(1, 0), Err(Error::InvalidOption));
    assert_eq!(host.set_stretch(1, 128), Err(Error::InvalidOption));
    assert_eq!(host.set_speed(1, 0), Err(Error::InvalidOption));
    assert_eq!(host.set_current_limit(1, 64), Err(Error::InvalidOption));
    assert_eq!(host.set_temperature_limit(1, 128), Err(Error::InvalidOption));
    let invalid = EepromRecord {response: Some(6), .. EepromRecord::unchanged()};
    assert_eq!(host.write_eeprom(1, &invalid), Err(Error::EepromDataWrong));

    assert_eq!(host.bus().activity(), 0);
    let (_, pin) = host.release();
    assert!(pin.states.is_empty());
}

#[test]
fn positions() {
    let mut host = scripted([
        vec![0x82, 0x3a, 0x4c],
        vec![0x02, 0x1b, 0x39],
        vec![0x03, 0x1b, 0x39],
        ]);
    assert_eq!(host.set_position(2, 3500), Ok(7500));
    assert_eq!(host.set_position_weak(2), Ok(3513));
    assert_eq!(host.set_position_weak(2), Err(Error::IdMismatch));
    assert_eq!(host.bus().written, [
        vec![0x82, 0x1b, 0x2c],
        vec![0x82, 0x00, 0x00],
        vec![0x82, 0x00, 0x00],
        ]);
}

#[test]
fn weak_and_keep() {
    // sampled position is slightly out of the command range, it is commanded anyway
    let mut host = scripted([vec![0x04, 0x1b, 0x19], vec![0x04, 0x1b, 0x19]]);
    assert_eq!(host.set_position_weak_and_keep(4), Ok(3481));
    assert_eq!(host.bus().written, [
        vec![0x84, 0x00, 0x00],
        vec![0x84, 0x1b, 0x19],
        ]);

    // the second exchange is not attempted when the first fails
    let mut host = scripted([vec![0x05, 0x1b, 0x19]]);
    assert_eq!(host.set_position_weak_and_keep(4), Err(Error::IdMismatch));
    assert_eq!(host.bus().written.len(), 1);

    // failure of the second is reported
    let mut host = scripted([vec![0x04, 0x1b, 0x19]]);
    assert_eq!(host.set_position_weak_and_keep(4), Err(Error::Read));
    assert_eq!(host.bus().written.len(), 2);
}

#[test]
fn parameters() {
    let mut host = scripted([
        vec![0x43, 0x03, 20],
        vec![0x23, 0x03, 20],
        vec![0x23, 0x04, 20],
        vec![0x43, 0x01, 20],
        ]);
    assert_eq!(host.set_current_limit(3, 20), Ok(()));
    assert_eq!(host.current(3), Ok(20));
    assert_eq!(host.current(3), Err(Error::ReturnDataWrong));
    assert_eq!(host.set_speed(3, 20), Err(Error::ReturnDataWrong));
    assert_eq!(host.bus().written, [
        vec![0xc3, 0x03, 20],
        vec![0xa3, 0x03],
        vec![0xa3, 0x03],
        vec![0xc3, 0x02, 20],
        ]);
}

#[test]
fn raw_eeprom_checks() {
    let valid = eeprom_answer(6);
    let mut wrong_header = valid.clone();
    wrong_header[0] = 0x27;
    let mut wrong_sub = valid.clone();
    wrong_sub[1] = 0x01;
    let mut no_marker = valid.clone();
    no_marker[3] = 0x0b;

    let mut host = scripted([valid.clone(), wrong_header, wrong_sub, no_marker]);
    let block = host.read_eeprom_raw(6).unwrap();
    assert_eq!(&block[..], &valid[..]);
    assert_eq!(host.read_eeprom_raw(6), Err(Error::ReturnDataWrong));
    assert_eq!(host.read_eeprom_raw(6), Err(Error::ReturnDataWrong));
    assert_eq!(host.read_eeprom_raw(6), Err(Error::EepromDataWrong));
    assert_eq!(host.bus().written[0], [0xa6, 0x00]);
}

#[test]
fn read_eeprom_validates() {
    let mut out_of_range = EepromBlock::from(<[u8; 66]>::try_from(eeprom_answer(6)).unwrap());
    out_of_range.set(registers::RESPONSE, Nibbles(9));

    let mut host = scripted([eeprom_answer(6), out_of_range.to_vec()]);
    let record = host.read_eeprom(6).unwrap();
    assert_eq!(record.id, Some(6));
    assert_eq!(record.comm_speed, Some(BaudRate::B115200));
    assert_eq!(host.read_eeprom(6), Err(Error::EepromDataWrong));
}

#[test]
fn write_eeprom_reads_then_writes() {
    let read = eeprom_answer(2);
    let mut host = scripted([read.clone(), vec![0x42, 0x00]]);
    let record = EepromRecord {speed: Some(100), .. EepromRecord::unchanged()};
    assert_eq!(host.write_eeprom(2, &record), Ok(()));

    let written = &host.bus().written;
    assert_eq!(written.len(), 2);
    assert_eq!(written[0], [0xa2, 0x00]);
    let write = &written[1];
    assert_eq!(write.len(), 66);
    assert_eq!(&write[.. 2], &[0xc2, 0x00]);
    // speed is 100 = 0x64
    assert_eq!(&write[6 .. 8], &[0x06, 0x04]);
    for i in 2 .. 66 {
        if !(6 .. 8).contains(&i) {
            assert_eq!(write[i], read[i], "byte {}", i);
        }
    }
}

#[test]
fn write_eeprom_failures() {
    let record = EepromRecord {speed: Some(100), .. EepromRecord::unchanged()};

    // nothing written if the fresh read fails
    let mut no_marker = eeprom_answer(2);
    no_marker[2] = 0;
    let mut host = scripted([no_marker]);
    assert_eq!(host.write_eeprom(2, &record), Err(Error::EepromDataWrong));
    assert_eq!(host.bus().written.len(), 1);

    let mut host = scripted([eeprom_answer(2), vec![0x43, 0x00]]);
    assert_eq!(host.write_eeprom(2, &record), Err(Error::ReturnDataWrong));
    let mut host = scripted([eeprom_answer(2)]);
    assert_eq!(host.write_eeprom(2, &record), Err(Error::Read));
    assert_eq!(host.bus().written.len(), 2);
}

#[test]
fn ids() {
    let mut host = scripted([vec![0xe9], vec![0x09], vec![0xe4], vec![0xe5]]);
    assert_eq!(host.id(), Ok(9));
    assert_eq!(host.id(), Err(Error::IdMismatch));
    assert_eq!(host.set_id(4), Ok(4));
    assert_eq!(host.set_id(4), Err(Error::IdMismatch));
    assert_eq!(host.bus().written, [
        vec![0xff, 0x00, 0x00, 0x00],
        vec![0xff, 0x00, 0x00, 0x00],
        vec![0xe4, 0x01, 0x01, 0x01],
        vec![0xe4, 0x01, 0x01, 0x01],
        ]);
}

#[test]
fn liveness() {
    let mut host = scripted(std::iter::repeat_n(eeprom_answer(3), 10));
    assert!(host.is_alive(3));
    assert_eq!(host.bus().written.len(), 10);

    // one answer of ten reports an other id in a valid eeprom
    let mut impostor = eeprom_answer(4);
    impostor[0] = 0x23;
    let mut answers = vec![eeprom_answer(3); 10];
    answers[4] = impostor;
    let mut host = scripted(answers);
    assert!(!host.is_alive(3));
    assert_eq!(host.bus().written.len(), 5);

    // last probe fails
    let mut host = scripted(std::iter::repeat_n(eeprom_answer(3), 9));
    assert!(!host.is_alive(3));
    assert_eq!(host.bus().written.len(), 10);
}

#[test]
fn return_code_of_operations() {
    let mut host = scripted([vec![0x21, 0x02, 0x05]]);
    assert_eq!(RetCode::of(&host.speed(1)), RetCode::Ok);
    assert_eq!(RetCode::of(&host.speed(1)) as i16, -1001);
    assert_eq!(RetCode::of(&host.speed(40)) as i16, -1004);
}
