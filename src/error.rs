use thiserror::Error;


/// error regarding a servo command
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// transport failed to read, or timed out before the full response arrived
    #[error("failed to receive the servo's response")]
    Read,
    /// transport did not send the full command
    #[error("failed to send the command")]
    Write,
    /// the servo answering is not the one addressed
    #[error("response comes from an other servo id")]
    IdMismatch,
    /// argument out of its domain, nothing was sent
    #[error("invalid option")]
    InvalidOption,
    /// response header is inconsistent with the command
    #[error("response header mismatch")]
    ReturnDataWrong,
    /// eeprom content is out of range or misses its marker
    #[error("eeprom data is invalid")]
    EepromDataWrong,
}
impl Error {
    /// signed return code of this error, see [RetCode]
    pub const fn code(self) -> i16 {
        RetCode::from_error(self) as i16
    }
}

/**
    signed result discriminant, positive for success and negative for errors

    it is meant for callers exposing results over a C-like interface, in Rust use the `Result` returned by each operation instead
*/
#[repr(i16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RetCode {
    Ok = 1,
    ReadError = -1001,
    WriteError = -1002,
    IdMismatch = -1003,
    InvalidOption = -1004,
    ReturnDataWrong = -1005,
    EepromDataWrong = -1006,
}
impl RetCode {
    /// discriminant of a servo command's result
    pub fn of<T>(result: &Result<T, Error>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(error) => Self::from_error(*error),
        }
    }
    const fn from_error(error: Error) -> Self {
        match error {
            Error::Read => Self::ReadError,
            Error::Write => Self::WriteError,
            Error::IdMismatch => Self::IdMismatch,
            Error::InvalidOption => Self::InvalidOption,
            Error::ReturnDataWrong => Self::ReturnDataWrong,
            Error::EepromDataWrong => Self::EepromDataWrong,
        }
    }
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}
impl From<Error> for RetCode {
    fn from(error: Error) -> Self {
        Self::from_error(error)
    }
}
