//! Persistence Module
//!
//! Saves and loads cache snapshots as JSON files, optionally wrapped in an
//! AES-256-GCM envelope, using write-temp-then-rename so a crash never
//! leaves a partial file behind.
//!
//! Envelope layout (bit-exact, preserved for interoperability):
//! `[12 bytes nonce][16 bytes authentication tag][ciphertext]`. The 256-bit
//! key is derived from the user secret as SHA-256(secret).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

/// Nonce length of the envelope, in bytes.
const NONCE_LEN: usize = 12;
/// Authentication tag length of the envelope, in bytes.
const TAG_LEN: usize = 16;

// == Persisted Entry ==
/// On-disk representation of a single entry.
///
/// Tag sets are stored as sorted sequences so the serialized form is stable.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    key: String,
    value: Value,
    ttl_ms: Option<u64>,
    tags: Vec<String>,
    history: Vec<Value>,
    created_at: u64,
}

// == Save ==
/// Serializes a snapshot to `path`, encrypting when requested.
///
/// The write is atomic: the payload goes to a temporary sibling file which is
/// then renamed over the destination.
///
/// # Errors
/// [`CacheError::Persistence`] on I/O or serialization failure,
/// [`CacheError::Encryption`] on cryptographic setup failure.
pub fn save(
    entries: &[(String, CacheEntry)],
    path: &Path,
    encrypt: bool,
    secret: &str,
) -> Result<()> {
    let persisted: Vec<PersistedEntry> = entries
        .iter()
        .map(|(key, entry)| {
            let mut tags: Vec<String> = entry.tags.iter().cloned().collect();
            tags.sort();
            PersistedEntry {
                key: key.clone(),
                value: entry.value.clone(),
                ttl_ms: entry.ttl_ms,
                tags,
                history: entry.history.iter().cloned().collect(),
                created_at: entry.created_at,
            }
        })
        .collect();

    let payload =
        serde_json::to_vec(&persisted).map_err(|e| CacheError::Persistence(e.to_string()))?;

    let bytes = if encrypt {
        seal(&payload, secret)?
    } else {
        payload
    };

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &bytes)?;
    fs::rename(&temp_path, path)?;

    debug!(path = %path.display(), entries = entries.len(), "snapshot saved");
    Ok(())
}

// == Load ==
/// Loads a previously saved snapshot from `path`.
///
/// Returns `None` when no file exists.
///
/// # Errors
/// [`CacheError::Persistence`] on I/O or parse failure,
/// [`CacheError::Encryption`] when decryption fails (wrong key or corrupted
/// payload), so callers can tell it apart from a plain parse failure.
pub fn load(path: &Path, encrypt: bool, secret: &str) -> Result<Option<Vec<(String, CacheEntry)>>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    let payload = if encrypt {
        open(&bytes, secret)?
    } else {
        bytes
    };

    let persisted: Vec<PersistedEntry> =
        serde_json::from_slice(&payload).map_err(|e| CacheError::Persistence(e.to_string()))?;

    let entries = persisted
        .into_iter()
        .map(|p| {
            let entry = CacheEntry {
                value: p.value,
                ttl_ms: p.ttl_ms,
                tags: p.tags.into_iter().collect::<HashSet<String>>(),
                history: p.history.into(),
                created_at: p.created_at,
            };
            (p.key, entry)
        })
        .collect();

    Ok(Some(entries))
}

// == Encryption Envelope ==
/// Derives the 256-bit cipher key from the user secret.
fn cipher_for(secret: &str) -> Result<Aes256Gcm> {
    let key = Sha256::digest(secret.as_bytes());
    Aes256Gcm::new_from_slice(key.as_slice()).map_err(|e| CacheError::Encryption(e.to_string()))
}

/// Wraps a plaintext payload in the `[nonce][tag][ciphertext]` envelope.
fn seal(payload: &[u8], secret: &str) -> Result<Vec<u8>> {
    let cipher = cipher_for(secret)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    // AEAD output is ciphertext with the tag appended; the envelope keeps
    // the tag up front instead
    let sealed = cipher
        .encrypt(&nonce, payload)
        .map_err(|e| CacheError::Encryption(e.to_string()))?;
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

    let mut envelope = Vec::with_capacity(NONCE_LEN + TAG_LEN + ciphertext.len());
    envelope.extend_from_slice(nonce.as_slice());
    envelope.extend_from_slice(tag);
    envelope.extend_from_slice(ciphertext);
    Ok(envelope)
}

/// Unwraps and authenticates an envelope produced by [`seal`].
fn open(envelope: &[u8], secret: &str) -> Result<Vec<u8>> {
    if envelope.len() < NONCE_LEN + TAG_LEN {
        return Err(CacheError::Encryption(
            "payload too short to hold an encryption envelope".to_string(),
        ));
    }

    let cipher = cipher_for(secret)?;
    let nonce = Nonce::from_slice(&envelope[..NONCE_LEN]);
    let tag = &envelope[NONCE_LEN..NONCE_LEN + TAG_LEN];
    let ciphertext = &envelope[NONCE_LEN + TAG_LEN..];

    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    cipher
        .decrypt(nonce, sealed.as_slice())
        .map_err(|_| CacheError::Encryption("wrong key or corrupted payload".to_string()))
}
