//! 商品 id 编解码
//!
//! id 为 12 字节的 object id，对外写成 24 位十六进制：4 字节 Unix 秒、
//! 5 字节进程随机数和 3 字节计数器。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicU32, Ordering},
        OnceLock,
    },
};
use thiserror::Error;
use uuid::Uuid;

const ID_BYTES: usize = 12;
const ID_HEX_LEN: usize = ID_BYTES * 2;
const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_SEED: OnceLock<ProcessSeed> = OnceLock::new();
static COUNTER: AtomicU32 = AtomicU32::new(0);

struct ProcessSeed {
    random: [u8; 5],
    counter_start: u32,
}

impl ProcessSeed {
    fn get() -> &'static ProcessSeed {
        PROCESS_SEED.get_or_init(|| {
            let bytes = Uuid::new_v4().into_bytes();
            let mut random = [0u8; 5];
            random.copy_from_slice(&bytes[..5]);
            let counter_start = u32::from_be_bytes([0, bytes[5], bytes[6], bytes[7]]);
            ProcessSeed {
                random,
                counter_start,
            }
        })
    }
}

/// Why a path segment is not a product id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("product id must be 24 characters, got {0}")]
    Length(usize),
    #[error("product id must contain only hexadecimal characters")]
    Charset,
    /// The router could not hand over the segment at all, e.g. it is not UTF-8.
    #[error("product id segment is unreadable: {0}")]
    Unreadable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId([u8; ID_BYTES]);

impl ProductId {
    /// Allocates a fresh id. Ids from one process never repeat until the
    /// 24-bit counter wraps within the same second.
    pub fn generate() -> Self {
        let seed = ProcessSeed::get();
        let seconds = chrono::Utc::now().timestamp().max(0) as u32;
        let counter = seed
            .counter_start
            .wrapping_add(COUNTER.fetch_add(1, Ordering::Relaxed))
            & COUNTER_MASK;

        let mut bytes = [0u8; ID_BYTES];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&seed.random);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn parse(value: &str) -> Result<Self, IdError> {
        if value.len() != ID_HEX_LEN {
            return Err(IdError::Length(value.len()));
        }

        let mut bytes = [0u8; ID_BYTES];
        hex::decode_to_slice(value, &mut bytes).map_err(|_| IdError::Charset)?;
        Ok(Self(bytes))
    }
}

impl FromStr for ProductId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for ProductId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_well_formed_id() {
        let id: ProductId = "63786439be8ca060c32d1c48".parse().unwrap();
        assert_eq!(id.to_string(), "63786439be8ca060c32d1c48");
        assert_eq!(id.0[..4], [0x63, 0x78, 0x64, 0x39]);
    }

    #[test]
    fn test_parse_accepts_uppercase_and_displays_lowercase() {
        let id = ProductId::parse("63786439BE8CA060C32D1C48").unwrap();
        assert_eq!(id.to_string(), "63786439be8ca060c32d1c48");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(ProductId::parse("asd"), Err(IdError::Length(3)));
        assert_eq!(ProductId::parse(""), Err(IdError::Length(0)));
        assert_eq!(
            ProductId::parse("63786439be8ca060c32d1c4800"),
            Err(IdError::Length(26))
        );
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        assert_eq!(
            ProductId::parse("zz786439be8ca060c32d1c48"),
            Err(IdError::Charset)
        );
    }

    #[test]
    fn test_generated_ids_are_unique_and_parse_back() {
        let ids: Vec<ProductId> = (0..1000).map(|_| ProductId::generate()).collect();
        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());

        for id in ids.iter().take(10) {
            assert_eq!(ProductId::parse(&id.to_string()).unwrap(), *id);
        }
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let id = ProductId::parse("63786439be8ca060c32d1c48").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"63786439be8ca060c32d1c48\"");

        let err = serde_json::from_str::<ProductId>("\"asd\"");
        assert!(err.is_err());
    }
}
