use std::ops::Deref;

use nom::bytes::complete::take;
use nom::IResult;

use crate::rng::SeededRng;
use crate::AbortReason;

pub const RANDOM_LEN: usize = 32;

/// Length of the downgrade sentinel sub-field at the end of the random.
pub const SENTINEL_LEN: usize = 8;

/// The 32 byte nonce a server puts in its hello.
///
/// Generated and owned by the server. The last [`SENTINEL_LEN`] bytes are
/// overwritten by [`embed_sentinel`][crate::embed_sentinel] when the server
/// negotiated below its own maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerRandom {
    bytes: [u8; RANDOM_LEN],
}

impl ServerRandom {
    pub fn new(rng: &mut SeededRng) -> Self {
        let mut bytes = [0u8; RANDOM_LEN];
        rng.fill(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; RANDOM_LEN]) -> Self {
        Self { bytes }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ServerRandom> {
        let (input, data) = take(RANDOM_LEN)(input)?;
        let mut bytes = [0u8; RANDOM_LEN];
        bytes.copy_from_slice(data);
        Ok((input, ServerRandom { bytes }))
    }

    /// Parse a random from raw bytes, short input is a malformed hello.
    pub fn decode(input: &[u8]) -> Result<Self, AbortReason> {
        Self::parse(input)
            .map(|(_, random)| random)
            .map_err(|_| AbortReason::MalformedVersionField)
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.bytes);
    }

    /// The trailing sentinel bytes.
    pub fn sentinel(&self) -> &[u8; SENTINEL_LEN] {
        // unwrap: the slice is exactly SENTINEL_LEN long
        self.bytes[RANDOM_LEN - SENTINEL_LEN..].try_into().unwrap()
    }

    pub(crate) fn set_sentinel(&mut self, pattern: &[u8; SENTINEL_LEN]) {
        self.bytes[RANDOM_LEN - SENTINEL_LEN..].copy_from_slice(pattern);
    }
}

impl Deref for ServerRandom {
    type Target = [u8; RANDOM_LEN];

    fn deref(&self) -> &Self::Target {
        &self.bytes
    }
}
