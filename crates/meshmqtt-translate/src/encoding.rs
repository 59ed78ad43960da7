//! Byte field encodings for JSON output

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Serde adapter writing bytes as standard base64.
pub mod base64_bytes {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// Encode bytes as standard base64.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Render a MAC address as colon separated uppercase hex pairs.
pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mac() {
        assert_eq!(
            format_mac(&[0x24, 0xec, 0x4a, 0x30, 0x56, 0x50]),
            "24:EC:4A:30:56:50"
        );
        assert_eq!(format_mac(&[]), "");
    }

    #[test]
    fn test_base64_adapter() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Blob {
            #[serde(with = "base64_bytes")]
            data: Vec<u8>,
        }

        let json = serde_json::to_string(&Blob { data: vec![1, 2, 3] }).unwrap();
        assert_eq!(json, r#"{"data":"AQID"}"#);
        let back: Blob = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data, vec![1, 2, 3]);
    }
}
