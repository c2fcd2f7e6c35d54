//! Opaque keyset cursors.
//!
//! Wire form (version 1) is base64url without padding over a compact JSON object:
//!
//! ```text
//! { "v": 1, "k": ["2024-01-01T00:00:00Z", "42"], "s": "-createdAt,-id",
//!   "n": "next", "f": "<filter hash>", "h": "<checksum>" }
//! ```
//!
//! `k` holds one rendered key per sort field (`null` when the row has no value for
//! it), `s` the signed sort the cursor was produced under and `h` a truncated
//! SHA-256 over the payload and the codec secret.
//! A cursor only decodes under the exact sort (and filter) it was produced for.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CursorFault, Error, Result};
use crate::record::Record;
use crate::sort::SortSpec;
use crate::value::{FieldKind, Value};

pub const CURSOR_VERSION: u8 = 1;

/// Stands in for a missing key inside the signed payload.
const NULL_KEY: &str = "\u{0}";

pub mod base64_url {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    pub fn encode(bytes: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(s)
    }
}

/// Which side of the cursor position the next request reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nav {
    Next,
    Prev,
}

impl Nav {
    fn as_str(self) -> &'static str {
        match self {
            Nav::Next => "next",
            Nav::Prev => "prev",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CursorV1 {
    v: u8,
    k: Vec<Option<String>>,
    s: String,
    n: Nav,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    f: Option<String>,
    h: String,
}

impl CursorV1 {
    fn signing_payload(&self) -> String {
        let keys: Vec<&str> = self
            .k
            .iter()
            .map(|k| k.as_deref().unwrap_or(NULL_KEY))
            .collect();
        format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
            self.v,
            keys.join("\u{1e}"),
            self.s,
            self.n.as_str(),
            self.f.as_deref().unwrap_or_default()
        )
    }
}

/// Typed row position a cursor points at.
///
/// Any sort key may be missing except the tie-breaker, which identifies the row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorPosition {
    keys: Vec<Option<Value>>,
    tiebreaker: usize,
    nav: Nav,
}

impl CursorPosition {
    /// Extract the position of `row` under `sort`.
    pub fn from_record<R: Record + ?Sized>(row: &R, sort: &SortSpec, nav: Nav) -> Result<Self> {
        let keys = sort
            .keys()
            .iter()
            .enumerate()
            .map(|(i, key)| match row.field_value(&key.field) {
                None if i == sort.tiebreaker_index() => Err(Error::UnencodableRow {
                    field: key.field.clone(),
                    reason: "is null",
                }),
                Some(value) if value.kind() != key.kind => Err(Error::UnencodableRow {
                    field: key.field.clone(),
                    reason: "has the wrong type",
                }),
                value => Ok(value),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            keys,
            tiebreaker: sort.tiebreaker_index(),
            nav,
        })
    }

    /// One value per sort key, in sort order; `None` for a missing value.
    pub fn keys(&self) -> &[Option<Value>] {
        &self.keys
    }

    /// Value of the primary sort field.
    pub fn leading(&self) -> Option<&Value> {
        self.keys.first().and_then(Option::as_ref)
    }

    /// Value of the tie-breaker field.
    pub fn tie_break(&self) -> Option<&Value> {
        self.keys.get(self.tiebreaker).and_then(Option::as_ref)
    }

    pub fn nav(&self) -> Nav {
        self.nav
    }
}

#[derive(Clone, Default)]
pub struct CursorCodec {
    secret: Option<String>,
}

impl std::fmt::Debug for CursorCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorCodec")
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .finish()
    }
}

impl CursorCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key the checksum so clients cannot forge a cursor that still verifies.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }

    fn checksum(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        if let Some(secret) = &self.secret {
            hasher.update(secret.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(payload.as_bytes());
        hex::encode(&hasher.finalize()[..8])
    }

    pub fn encode<R: Record + ?Sized>(
        &self,
        row: &R,
        sort: &SortSpec,
        nav: Nav,
        filter_hash: Option<&str>,
    ) -> Result<String> {
        let position = CursorPosition::from_record(row, sort, nav)?;
        Ok(self.encode_position(&position, sort, filter_hash))
    }

    pub fn encode_position(
        &self,
        position: &CursorPosition,
        sort: &SortSpec,
        filter_hash: Option<&str>,
    ) -> String {
        let mut wire = CursorV1 {
            v: CURSOR_VERSION,
            k: position
                .keys
                .iter()
                .map(|k| k.as_ref().map(Value::render))
                .collect(),
            s: sort.to_signed_tokens(),
            n: position.nav,
            f: filter_hash.map(str::to_string),
            h: String::new(),
        };
        wire.h = self.checksum(&wire.signing_payload());
        // Serializing a struct of strings cannot fail.
        let json = serde_json::to_vec(&wire).unwrap_or_default();
        base64_url::encode(&json)
    }

    /// Decode a token produced under `sort` (and `filter_hash`), rejecting anything
    /// malformed, tampered with, or produced under a different sort or filter.
    pub fn decode(
        &self,
        token: &str,
        sort: &SortSpec,
        filter_hash: Option<&str>,
    ) -> Result<CursorPosition> {
        let fault = Error::InvalidCursor;

        let bytes = base64_url::decode(token.trim()).map_err(|_| fault(CursorFault::Base64))?;
        let raw: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|_| fault(CursorFault::Json))?;
        if raw.get("v").and_then(serde_json::Value::as_u64) != Some(u64::from(CURSOR_VERSION)) {
            return Err(fault(CursorFault::Version));
        }
        let wire: CursorV1 = serde_json::from_value(raw).map_err(|_| fault(CursorFault::Json))?;

        if self.checksum(&wire.signing_payload()) != wire.h {
            return Err(fault(CursorFault::Checksum));
        }
        if !sort.equals_signed_tokens(&wire.s) {
            return Err(fault(CursorFault::SortMismatch));
        }
        if wire.f.as_deref() != filter_hash {
            return Err(fault(CursorFault::FilterMismatch));
        }
        if wire.k.len() != sort.len() {
            return Err(fault(CursorFault::KeyCount));
        }

        let tiebreaker = sort.tiebreaker_index();
        let keys = wire
            .k
            .iter()
            .zip(sort.keys())
            .enumerate()
            .map(|(i, (raw, key))| match (raw, key.kind) {
                (None, _) if i == tiebreaker => Err(fault(CursorFault::KeyType)),
                (None, _) => Ok(None),
                // Variants are not needed to bound a scan; keep the rendered name.
                (Some(raw), FieldKind::Enum) => Ok(Some(Value::Enum(raw.clone()))),
                (Some(raw), kind) => kind
                    .parse_value(raw, &[])
                    .map(Some)
                    .map_err(|_| fault(CursorFault::KeyType)),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CursorPosition {
            keys,
            tiebreaker,
            nav: wire.n,
        })
    }
}
