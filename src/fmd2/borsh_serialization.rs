//! Borsh serialization.
//!
//! Keys and flags go over the wire as their canonical byte encodings
//! behind a u32 length prefix, the same layout borsh gives a byte
//! vector. Only borsh's primitive codecs and io traits are used, so the
//! impls hold up in `no_std` builds.

use alloc::string::ToString;
use alloc::vec::Vec;

use borsh::io::{Error, ErrorKind, Read, Result, Write};
use borsh::{BorshDeserialize, BorshSerialize};

use super::{DeserializationError, DetectionKey, FlagCiphertexts, PublicKey, SecretKey};

// Payloads are copied out in bounded chunks so a forged length prefix
// cannot force a huge up-front allocation.
const READ_CHUNK: usize = 1024;

fn write_framed<W: Write>(writer: &mut W, encoding: &[u8]) -> Result<()> {
    let prefix = u32::try_from(encoding.len()).map_err(|_| {
        Error::new(
            ErrorKind::InvalidData,
            "encoding exceeds the u32 length prefix".to_string(),
        )
    })?;

    BorshSerialize::serialize(&prefix, writer)?;
    writer.write_all(encoding)
}

fn read_framed<R, T>(
    reader: &mut R,
    decode: impl FnOnce(&[u8]) -> core::result::Result<T, DeserializationError>,
) -> Result<T>
where
    R: Read,
{
    let mut remaining = u32::deserialize_reader(reader)? as usize;

    let mut encoding = Vec::new();
    let mut buf = [0u8; READ_CHUNK];
    while remaining > 0 {
        let take = remaining.min(READ_CHUNK);
        reader.read_exact(&mut buf[..take])?;
        encoding.extend_from_slice(&buf[..take]);
        remaining -= take;
    }

    decode(&encoding).map_err(|err| Error::new(ErrorKind::InvalidData, err.to_string()))
}

impl BorshSerialize for SecretKey {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_framed(writer, &self.to_bytes_flattened())
    }
}

impl BorshDeserialize for SecretKey {
    fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self> {
        read_framed(reader, Self::from_canonical_bytes_flattened)
    }
}

impl BorshSerialize for PublicKey {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_framed(writer, &self.to_bytes_flattened())
    }
}

impl BorshDeserialize for PublicKey {
    fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self> {
        read_framed(reader, Self::from_bytes_flattened)
    }
}

impl BorshSerialize for DetectionKey {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_framed(writer, &self.to_bytes_flattened())
    }
}

impl BorshDeserialize for DetectionKey {
    fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self> {
        read_framed(reader, Self::from_bytes_flattened)
    }
}

impl BorshSerialize for FlagCiphertexts {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_framed(writer, &self.to_bytes())
    }
}

impl BorshDeserialize for FlagCiphertexts {
    fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self> {
        read_framed(reader, Self::from_bytes)
    }
}
