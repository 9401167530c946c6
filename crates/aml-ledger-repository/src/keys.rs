//! Key encoding for record storage.
//!
//! A record is identified by the triple (country, id_number, data_owner).
//! [`KeyScheme`] turns that triple into ledger key bytes:
//!
//! - `LengthPrefixed` (default): `aml~{len}:{country}~{len}:{id_number}~{len}:{data_owner}`,
//!   with lengths in bytes. Field contents never act as separators, so
//!   distinct triples always encode to distinct keys, and keys of one
//!   country share the prefix `aml~{len}:{country}~`.
//! - `Legacy`: `{country}_{id_number}_{data_owner}`. Readable by ledgers
//!   populated with that layout, but two triples collide whenever a field
//!   contains `_`, and there is no sound per-country prefix.
//!
//! Neither scheme normalizes case or whitespace.

use std::{fmt, ops::Range};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Namespace of length-prefixed keys.
pub const KEY_NAMESPACE: &str = "aml";

/// Separator of legacy keys.
pub const LEGACY_SEPARATOR: char = '_';

/// Structured identity of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub country: String,
    pub id_number: String,
    pub data_owner: String,
}

impl RecordKey {
    pub fn new(
        country: impl AsRef<str>,
        id_number: impl AsRef<str>,
        data_owner: impl AsRef<str>,
    ) -> Self {
        Self {
            country: country.as_ref().to_string(),
            id_number: id_number.as_ref().to_string(),
            data_owner: data_owner.as_ref().to_string(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "country:{}, id_number:{}, data_owner:{}",
            self.country, self.id_number, self.data_owner
        )
    }
}

/// Encoding of [`RecordKey`]s into ledger keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyScheme {
    #[default]
    LengthPrefixed,
    Legacy,
}

impl KeyScheme {
    /// Encode a key.
    pub fn encode(&self, key: &RecordKey) -> Vec<u8> {
        match self {
            KeyScheme::LengthPrefixed => {
                let mut out = String::from(KEY_NAMESPACE);
                for field in [&key.country, &key.id_number, &key.data_owner] {
                    out.push('~');
                    out.push_str(&field.len().to_string());
                    out.push(':');
                    out.push_str(field);
                }
                out.into_bytes()
            },
            KeyScheme::Legacy => format!(
                "{}{sep}{}{sep}{}",
                key.country,
                key.id_number,
                key.data_owner,
                sep = LEGACY_SEPARATOR
            )
            .into_bytes(),
        }
    }

    /// Parse key bytes produced by [`encode`](Self::encode).
    ///
    /// Legacy keys parse only when they contain exactly two separators.
    pub fn decode(&self, bytes: &[u8]) -> Option<RecordKey> {
        match self {
            KeyScheme::LengthPrefixed => decode_length_prefixed(bytes),
            KeyScheme::Legacy => {
                let text = std::str::from_utf8(bytes).ok()?;
                let mut parts = text.split(LEGACY_SEPARATOR);
                let (country, id_number, data_owner) = (parts.next()?, parts.next()?, parts.next()?);
                if parts.next().is_some() {
                    return None;
                }
                Some(RecordKey::new(country, id_number, data_owner))
            },
        }
    }

    /// Prefix shared by every key of `country`.
    pub fn country_prefix(&self, country: &str) -> LedgerResult<Vec<u8>> {
        match self {
            KeyScheme::LengthPrefixed => {
                Ok(format!("{KEY_NAMESPACE}~{}:{country}~", country.len()).into_bytes())
            },
            KeyScheme::Legacy => Err(LedgerError::Validation(
                "legacy keys cannot be scanned by country".to_string(),
            )),
        }
    }

    /// Key range covering every key of `country`.
    pub fn country_range(&self, country: &str) -> LedgerResult<Range<Vec<u8>>> {
        let prefix = self.country_prefix(country)?;
        Ok(aml_ledger_store::prefix_range(&prefix)?)
    }
}

/// Build the storage key of a record with the default scheme.
#[inline]
pub fn build_key(country: &str, id_number: &str, data_owner: &str) -> Vec<u8> {
    KeyScheme::default().encode(&RecordKey::new(country, id_number, data_owner))
}

fn decode_length_prefixed(bytes: &[u8]) -> Option<RecordKey> {
    let mut rest = bytes.strip_prefix(KEY_NAMESPACE.as_bytes())?;
    let mut fields: Vec<String> = Vec::with_capacity(3);

    for _ in 0..3 {
        rest = rest.strip_prefix(b"~")?;
        let colon = rest.iter().position(|&b| b == b':')?;
        let digits = &rest[..colon];
        // Canonical decimal only, so each key has exactly one spelling.
        if digits.is_empty()
            || !digits.iter().all(u8::is_ascii_digit)
            || (digits.len() > 1 && digits[0] == b'0')
        {
            return None;
        }
        let len: usize = std::str::from_utf8(digits).ok()?.parse().ok()?;
        rest = &rest[colon + 1..];
        if rest.len() < len {
            return None;
        }
        let (field, tail) = rest.split_at(len);
        fields.push(std::str::from_utf8(field).ok()?.to_string());
        rest = tail;
    }

    if !rest.is_empty() {
        return None;
    }
    let [country, id_number, data_owner]: [String; 3] = fields.try_into().ok()?;
    Some(RecordKey { country, id_number, data_owner })
}
