//! Protocol errors

use hognet_core::tick::Tick;

pub type Result<T> = core::result::Result<T, ProtocolError>;

#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("could not encode message: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("could not decode message: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("message of {0} bytes exceeds the maximum payload size")]
    TooLarge(usize),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Reasons for discarding an inbound message at the boundary
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("field {field} is not a finite number")]
    NonFinite { field: &'static str },
    #[error("field {field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },
    #[error("tick {tick} is too far ahead of the current tick {current}")]
    FutureTick { tick: Tick, current: Tick },
    #[error("orientation is not a valid rotation")]
    DegenerateOrientation,
}
