use crate::errors::CoreError;

use super::encryption::{KdfParams, NONCE_LEN, SALT_LEN};

/// Magic bytes identifying a dashboard snapshot.
pub const MAGIC: &[u8; 4] = b"STKD";

/// Current snapshot format version.
pub const CURRENT_VERSION: u16 = 1;

/// magic(4) + version(2) + kdf(12) + salt(16) + nonce(12) + payload_len(8)
pub const HEADER_LEN: usize = 4 + 2 + 12 + SALT_LEN + NONCE_LEN + 8;

/// Fixed-size header in front of the encrypted payload.
///
/// ```text
/// [STKD][version u16 LE][memory_cost u32 LE][time_cost u32 LE][parallelism u32 LE]
/// [salt 16B][nonce 12B][payload_len u64 LE][payload: ciphertext || tag]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub version: u16,
    pub kdf: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
}

impl SnapshotHeader {
    /// Frame `payload` behind this header.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.kdf.memory_cost.to_le_bytes());
        buf.extend_from_slice(&self.kdf.time_cost.to_le_bytes());
        buf.extend_from_slice(&self.kdf.parallelism.to_le_bytes());
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    /// Parse and validate a header, returning it with the payload slice.
    pub fn decode(data: &[u8]) -> Result<(Self, &[u8]), CoreError> {
        if data.len() < HEADER_LEN {
            return Err(CoreError::InvalidFileFormat(format!(
                "snapshot is {} bytes, shorter than the {HEADER_LEN}-byte header",
                data.len()
            )));
        }

        let mut reader = Reader { data, pos: 0 };
        if &reader.take::<4>() != MAGIC {
            return Err(CoreError::InvalidFileFormat(
                "bad magic bytes, not a dashboard snapshot".into(),
            ));
        }

        let version = u16::from_le_bytes(reader.take());
        if version == 0 || version > CURRENT_VERSION {
            return Err(CoreError::UnsupportedVersion(version));
        }

        let kdf = KdfParams {
            memory_cost: u32::from_le_bytes(reader.take()),
            time_cost: u32::from_le_bytes(reader.take()),
            parallelism: u32::from_le_bytes(reader.take()),
        };
        kdf.validate()?;

        let salt = reader.take::<SALT_LEN>();
        let nonce = reader.take::<NONCE_LEN>();
        let payload_len = u64::from_le_bytes(reader.take());

        let rest = &data[reader.pos..];
        let payload_len = usize::try_from(payload_len)
            .ok()
            .filter(|len| *len <= rest.len())
            .ok_or_else(|| {
                CoreError::InvalidFileFormat(format!(
                    "snapshot truncated: header announces {payload_len} payload bytes, {} present",
                    rest.len()
                ))
            })?;

        Ok((
            Self {
                version,
                kdf,
                salt,
                nonce,
            },
            &rest[..payload_len],
        ))
    }
}

/// Sequential fixed-width reads over a buffer already checked to be
/// at least `HEADER_LEN` long.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        out
    }
}
