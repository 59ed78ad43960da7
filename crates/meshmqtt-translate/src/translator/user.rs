//! Node identity translation

use serde::Serialize;

use crate::encoding::{format_mac, to_base64};
use crate::proto::{self, HardwareModel, Role};

/// Node info as published. Identity strings are always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub long_name: String,
    pub short_name: String,
    /// `AA:BB:CC:DD:EE:FF`, empty when unknown
    pub macaddr: String,
    pub hw_model: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_licensed: bool,
    pub role: String,
    /// Base64 public key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_unmessagable: Option<bool>,
}

impl From<proto::User> for User {
    fn from(user: proto::User) -> Self {
        Self {
            macaddr: format_mac(&user.macaddr),
            hw_model: HardwareModel::name_of(user.hw_model),
            role: Role::name_of(user.role),
            public_key: (!user.public_key.is_empty()).then(|| to_base64(&user.public_key)),
            is_licensed: user.is_licensed,
            is_unmessagable: user.is_unmessagable,
            id: user.id,
            long_name: user.long_name,
            short_name: user.short_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_translation() {
        let user = User::from(proto::User {
            id: "!7c5acf20".into(),
            long_name: "Annerley Junction WSL".into(),
            short_name: "cf20".into(),
            macaddr: vec![0x24, 0x58, 0x7c, 0x5a, 0xcf, 0x20],
            hw_model: HardwareModel::HeltecWslV3 as i32,
            role: Role::Router as i32,
            public_key: vec![1, 2, 3],
            ..Default::default()
        });
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({
                "id": "!7c5acf20",
                "long_name": "Annerley Junction WSL",
                "short_name": "cf20",
                "macaddr": "24:58:7C:5A:CF:20",
                "hw_model": "HELTEC_WSL_V3",
                "role": "ROUTER",
                "public_key": "AQID"
            })
        );
    }

    #[test]
    fn test_missing_identity_is_empty_string() {
        let user = User::from(proto::User::default());
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["id"], "");
        assert_eq!(value["long_name"], "");
        assert_eq!(value["macaddr"], "");
        assert_eq!(value["hw_model"], "UNSET");
        assert_eq!(value["role"], "CLIENT");
        assert!(value.get("public_key").is_none());
        assert!(value.get("is_licensed").is_none());
    }

    #[test]
    fn test_flags() {
        let user = User::from(proto::User {
            is_licensed: true,
            is_unmessagable: Some(false),
            hw_model: 250,
            ..Default::default()
        });
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["is_licensed"], true);
        assert_eq!(value["is_unmessagable"], false);
        assert_eq!(value["hw_model"], "250");
    }
}
