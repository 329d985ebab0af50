//! Binary encoding of [`Message`]s
use crate::error::{ProtocolError, Result};
use crate::message::Message;
use bytes::Bytes;

/// Maximum transmission units; maximum size in bytes of an encoded message
pub const MTU: usize = 1472;

fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

pub fn encode(message: &Message) -> Result<Bytes> {
    let bytes = bincode::serde::encode_to_vec(message, config())?;
    if bytes.len() > MTU {
        return Err(ProtocolError::TooLarge(bytes.len()));
    }
    Ok(Bytes::from(bytes))
}

pub fn decode(bytes: &[u8]) -> Result<Message> {
    if bytes.len() > MTU {
        return Err(ProtocolError::TooLarge(bytes.len()));
    }
    let (message, _) = bincode::serde::decode_from_slice(bytes, config())?;
    Ok(message)
}
