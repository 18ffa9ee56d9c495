//! World Wide Names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use qforge_shared::errors::QforgeError;

/// A 64-bit (NAA 5) or 128-bit (NAA 6) World Wide Name.
///
/// The text form is `0x` followed by uppercase hex digits, which is what
/// QEMU's `wwn` property accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wwn {
    W64([u8; 8]),
    W128([u8; 16]),
}

impl Wwn {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Wwn::W64(b) => b,
            Wwn::W128(b) => b,
        }
    }

    /// NAA type from the high nibble of the first byte.
    pub fn naa(&self) -> u8 {
        self.as_bytes()[0] >> 4
    }
}

impl fmt::Display for Wwn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode_upper(self.as_bytes()))
    }
}

impl FromStr for Wwn {
    type Err = QforgeError;

    /// Parse hex digits with an optional `0x` prefix and `:` separators.
    ///
    /// NAA type 6 must be 16 bytes long; types 1, 2, 5 and 12 to 15 must be
    /// 8 bytes long. Other types are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| QforgeError::InvalidArgument(format!("wwn \"{s}\": {reason}"));
        let cleaned = s.replace(':', "");
        let digits = cleaned
            .strip_prefix("0x")
            .or_else(|| cleaned.strip_prefix("0X"))
            .unwrap_or(&cleaned);
        let bytes = hex::decode(digits).map_err(|e| invalid(e.to_string()))?;
        let Some(first) = bytes.first() else {
            return Err(invalid("expected 8 or 16 bytes, got 0".to_string()));
        };
        let naa = first >> 4;
        let wanted = match naa {
            6 => 16,
            1 | 2 | 5 | 12..=15 => 8,
            _ => return Err(invalid(format!("unrecognized network address authority type {naa}"))),
        };
        if bytes.len() != wanted {
            return Err(invalid(format!(
                "network address authority type {naa} needs {wanted} bytes, got {}",
                bytes.len()
            )));
        }
        if let Ok(value) = <[u8; 16]>::try_from(bytes.as_slice()) {
            return Ok(Wwn::W128(value));
        }
        <[u8; 8]>::try_from(bytes.as_slice())
            .map(Wwn::W64)
            .map_err(|_| invalid(format!("expected 8 or 16 bytes, got {}", bytes.len())))
    }
}

impl Serialize for Wwn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Wwn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_form() {
        let wwn = Wwn::W64([0x55, 0x25, 0x40, 0x0a, 0xbc, 0xde, 0xf0, 0x12]);
        assert_eq!(wwn.to_string(), "0x5525400ABCDEF012");
        assert_eq!(wwn.naa(), 5);
        assert_eq!("0x5525400ABCDEF012".parse::<Wwn>().unwrap(), wwn);
        assert_eq!("5525400abcdef012".parse::<Wwn>().unwrap(), wwn);
    }

    #[test]
    fn test_rejects_bad_length() {
        let err = "0x1234".parse::<Wwn>().unwrap_err();
        assert!(err.to_string().contains("needs 8 bytes, got 2"));
        assert!("".parse::<Wwn>().is_err());
    }

    #[test]
    fn test_colon_separated() {
        let wwn: Wwn = "55:25:40:0a:bc:de:f0:12".parse().unwrap();
        assert_eq!(wwn.to_string(), "0x5525400ABCDEF012");
    }

    #[test]
    fn test_naa_type_must_match_length() {
        let err = "0x6000000000000001".parse::<Wwn>().unwrap_err();
        assert!(err.to_string().contains("type 6 needs 16 bytes, got 8"));

        let err = "0x50000000000000000000000000000001".parse::<Wwn>().unwrap_err();
        assert!(err.to_string().contains("type 5 needs 8 bytes, got 16"));

        let err = "0x3000000000000001".parse::<Wwn>().unwrap_err();
        assert!(err.to_string().contains("unrecognized network address authority type 3"));

        assert_eq!("0x2100000000000001".parse::<Wwn>().unwrap().naa(), 2);
    }

    #[test]
    fn test_serde_as_string() {
        let wwn: Wwn = serde_json::from_str("\"0x60000000000000000000000000000001\"").unwrap();
        assert_eq!(wwn.naa(), 6);
        assert_eq!(
            serde_json::to_string(&wwn).unwrap(),
            "\"0x60000000000000000000000000000001\""
        );
    }
}
