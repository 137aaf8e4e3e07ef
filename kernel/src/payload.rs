//! Serialized form of recursor registrations.
//!
//! A single [`RecursorInfo`] is encoded with `bincode`. A module exports its
//! persistent registrations as a list of such records followed by a small
//! trailer, so the payload can be appended to other module data and found
//! again from the end of the buffer.

use crate::env::Env;
use crate::error::{RecursorError, RecursorResult};
use crate::recursor::RecursorInfo;

/// Magic footer identifying recursor payloads.
pub const RECURSOR_PAYLOAD_MAGIC: &[u8; 8] = b"LRLRECUR";
/// Version of the recursor payload format.
pub const RECURSOR_PAYLOAD_VERSION: u32 = 1;

const TRAILER_LEN: usize = RECURSOR_PAYLOAD_MAGIC.len() + std::mem::size_of::<u32>() + 8;

impl RecursorInfo {
    pub fn write(&self) -> RecursorResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| {
            RecursorError::Serialization(format!("failed to serialize recursor info: {e}"))
        })
    }

    pub fn read(bytes: &[u8]) -> RecursorResult<RecursorInfo> {
        let info: RecursorInfo = bincode::deserialize(bytes).map_err(|e| {
            RecursorError::Serialization(format!("failed to deserialize recursor info: {e}"))
        })?;
        info.check_layout()?;
        Ok(info)
    }
}

/// Encode records and append the footer.
pub fn encode_recursor_payload(infos: &[RecursorInfo]) -> RecursorResult<Vec<u8>> {
    let data = bincode::serialize(infos).map_err(|e| {
        RecursorError::Serialization(format!("failed to serialize recursor payload: {e}"))
    })?;

    let mut out = Vec::with_capacity(data.len() + TRAILER_LEN);
    out.extend_from_slice(&data);
    out.extend_from_slice(RECURSOR_PAYLOAD_MAGIC);
    out.extend_from_slice(&RECURSOR_PAYLOAD_VERSION.to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    Ok(out)
}

/// Attempt to decode recursor records from the end of `bytes`.
///
/// Returns `Ok(None)` if no payload footer is present.
pub fn decode_recursor_payload(bytes: &[u8]) -> RecursorResult<Option<Vec<RecursorInfo>>> {
    if bytes.len() < TRAILER_LEN {
        return Ok(None);
    }

    let len_offset = bytes.len() - 8;
    let version_offset = len_offset - std::mem::size_of::<u32>();
    let magic_offset = version_offset - RECURSOR_PAYLOAD_MAGIC.len();

    if &bytes[magic_offset..version_offset] != RECURSOR_PAYLOAD_MAGIC {
        return Ok(None);
    }

    let version = u32::from_le_bytes(
        bytes[version_offset..len_offset]
            .try_into()
            .map_err(|_| RecursorError::InvalidPayload("truncated payload footer".into()))?,
    );
    if version != RECURSOR_PAYLOAD_VERSION {
        return Err(RecursorError::UnsupportedPayloadVersion {
            expected: RECURSOR_PAYLOAD_VERSION,
            actual: version,
        });
    }

    let payload_len = u64::from_le_bytes(
        bytes[len_offset..]
            .try_into()
            .map_err(|_| RecursorError::InvalidPayload("truncated payload length".into()))?,
    ) as usize;
    if payload_len > magic_offset {
        return Err(RecursorError::InvalidPayload(format!(
            "payload length {} exceeds available bytes {}",
            payload_len,
            bytes.len()
        )));
    }
    let data = &bytes[magic_offset - payload_len..magic_offset];

    let infos: Vec<RecursorInfo> = bincode::deserialize(data).map_err(|e| {
        RecursorError::Serialization(format!("failed to deserialize recursor payload: {e}"))
    })?;
    for info in &infos {
        info.check_layout()?;
    }
    Ok(Some(infos))
}

/// Payload carrying the persistent registrations of `env`'s session.
pub fn export_recursors(env: &Env) -> RecursorResult<Vec<u8>> {
    let infos: Vec<RecursorInfo> = env.recursors().exported().cloned().collect();
    tracing::debug!(count = infos.len(), "exporting user recursors");
    encode_recursor_payload(&infos)
}

/// Add the records of an imported module payload to `env`.
///
/// A record that is already visible with identical contents is skipped, so
/// the same module can be reached through several imports. A different record
/// under a visible name is a [`RecursorError::DuplicateRecursor`]. Bytes
/// without a payload footer import nothing.
pub fn import_recursors(env: &Env, bytes: &[u8]) -> RecursorResult<Env> {
    let Some(infos) = decode_recursor_payload(bytes)? else {
        return Ok(env.clone());
    };

    let mut fresh: Vec<RecursorInfo> = Vec::with_capacity(infos.len());
    for info in infos {
        let visible = env
            .recursors()
            .get(info.name())
            .or_else(|| fresh.iter().find(|other| other.name() == info.name()));
        match visible {
            Some(existing) if *existing == info => {
                tracing::debug!(recursor = info.name(), "skipping recursor imported twice");
            }
            Some(_) => return Err(RecursorError::DuplicateRecursor(info.name().to_string())),
            None => fresh.push(info),
        }
    }

    if fresh.is_empty() {
        return Ok(env.clone());
    }
    tracing::debug!(count = fresh.len(), "imported user recursors");
    Ok(env.with_recursors(env.recursors().with_imported(fresh)))
}
