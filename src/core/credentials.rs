//! Join parameters and credential formatting for wpa_supplicant

use std::collections::BTreeMap;

use md4::{Digest, Md4};
use serde::Deserialize;
use serde_json::Value;
use sha1::Sha1;

use crate::core::error::{ServiceError, ServiceResult};

const PSK_ROUNDS: u32 = 4096;
const PSK_LENGTH: usize = 32;

/// Fields wpa_supplicant expects as quoted string literals
const QUOTED_FIELDS: [&str; 4] = ["ssid", "identity", "phase1", "phase2"];

/// Parameters of a connect request, as written by the client
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JoinParams {
    pub ssid: String,
    /// WPA passphrase
    pub psk: Option<String>,
    /// EAP password
    pub password: Option<String>,
    pub identity: Option<String>,
    pub phase1: Option<String>,
    pub phase2: Option<String>,
    /// Any other network field, passed through to wpa_supplicant
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl JoinParams {
    /// Parse and validate a connect payload
    pub fn parse(payload: &[u8]) -> ServiceResult<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| ServiceError::InvalidJoinParams(format!("not UTF-8: {}", e)))?;
        let mut params: JoinParams = serde_json::from_str(text)
            .map_err(|e| ServiceError::InvalidJoinParams(e.to_string()))?;

        params.extra.remove("hashed");
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> ServiceResult<()> {
        for key in self.extra.keys() {
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ServiceError::InvalidJoinParams(format!(
                    "invalid field name {:?}",
                    key
                )));
            }
        }

        let strings = [
            Some(&self.ssid),
            self.psk.as_ref(),
            self.password.as_ref(),
            self.identity.as_ref(),
            self.phase1.as_ref(),
            self.phase2.as_ref(),
        ];
        let extra = self.extra.values().map(raw_value);
        if strings
            .into_iter()
            .flatten()
            .cloned()
            .chain(extra)
            .any(|value| value.contains(['\n', '\r']))
        {
            return Err(ServiceError::InvalidJoinParams(
                "field values must not contain line breaks".into(),
            ));
        }
        Ok(())
    }
}

/// Network fields ready to be set one by one on a new network entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedParams {
    /// `(field, value)` pairs in submission order, `ssid` first
    pub fields: Vec<(String, String)>,
    /// Whether the secret was replaced by a derived key or hash
    pub hashed: bool,
}

impl FormattedParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Derive the 256-bit WPA key from a passphrase, hex encoded
pub fn derive_psk(passphrase: &str, ssid: &str) -> String {
    let mut key = [0u8; PSK_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha1>(passphrase.as_bytes(), ssid.as_bytes(), PSK_ROUNDS, &mut key);
    hex::encode(key)
}

/// MD4 over the UTF-16LE password, in wpa_supplicant's `hash:` notation
pub fn password_hash(password: &str) -> String {
    let utf16: Vec<u8> = password
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    format!("hash:{}", hex::encode(Md4::digest(&utf16)))
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value)
}

fn raw_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Hash the secret and quote string fields for `SET_NETWORK`
pub fn format(params: &JoinParams) -> FormattedParams {
    let mut hashed = false;
    let mut psk = params.psk.clone();
    let mut password = params.password.clone();

    if let Some(passphrase) = params.psk.as_deref() {
        psk = Some(derive_psk(passphrase, &params.ssid));
        hashed = true;
    } else if let Some(secret) = params.password.as_deref() {
        password = Some(password_hash(secret));
        hashed = true;
    }

    let named = [
        ("ssid", Some(params.ssid.clone())),
        ("psk", psk),
        ("password", password),
        ("identity", params.identity.clone()),
        ("phase1", params.phase1.clone()),
        ("phase2", params.phase2.clone()),
    ];

    let mut fields = Vec::new();
    for (key, value) in named {
        let Some(value) = value else { continue };
        let is_secret = key == "psk" || key == "password";
        let value = if QUOTED_FIELDS.contains(&key) || (is_secret && !hashed) {
            quote(&value)
        } else {
            value
        };
        fields.push((key.to_string(), value));
    }

    fields.extend(
        params
            .extra
            .iter()
            .map(|(key, value)| (key.clone(), raw_value(value))),
    );

    FormattedParams { fields, hashed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(json: &str) -> JoinParams {
        JoinParams::parse(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_derive_psk_reference_vector() {
        assert_eq!(
            derive_psk("password", "IEEE"),
            "f42c6fc52df0ebef9ebb4b90b38a5f902e83fe1b135a70e23aed762e9710a12e"
        );
    }

    #[test]
    fn test_password_hash_reference_vector() {
        assert_eq!(
            password_hash("password"),
            "hash:8846f7eaee8fb117ad06bdd830b7586c"
        );
    }

    #[test]
    fn test_format_psk() {
        let formatted = format(&params(r#"{"ssid":"home","psk":"secretpw"}"#));

        assert!(formatted.hashed);
        let psk = formatted.get("psk").unwrap();
        assert_eq!(psk.len(), 64);
        assert!(psk.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(psk, derive_psk("secretpw", "home"));
        assert_eq!(formatted.get("ssid"), Some("\"home\""));
        assert_eq!(formatted.fields[0].0, "ssid");
    }

    #[test]
    fn test_format_password() {
        let formatted = format(&params(
            r#"{"ssid":"corp","password":"secretpw","identity":"alice","phase2":"auth=MSCHAPV2"}"#,
        ));

        assert!(formatted.hashed);
        let password = formatted.get("password").unwrap();
        assert!(password.starts_with("hash:"));
        assert_eq!(password.len(), "hash:".len() + 32);
        assert_eq!(formatted.get("identity"), Some("\"alice\""));
        assert_eq!(formatted.get("phase2"), Some("\"auth=MSCHAPV2\""));
    }

    #[test]
    fn test_format_psk_wins_over_password() {
        let formatted = format(&params(r#"{"ssid":"x","psk":"secretpw","password":"other"}"#));

        assert_eq!(formatted.get("psk"), Some(derive_psk("secretpw", "x").as_str()));
        assert_eq!(formatted.get("password"), Some("other"));
    }

    #[test]
    fn test_format_open_network() {
        let formatted = format(&params(r#"{"ssid":"cafe","key_mgmt":"NONE"}"#));

        assert!(!formatted.hashed);
        assert_eq!(
            formatted.fields,
            vec![
                ("ssid".to_string(), "\"cafe\"".to_string()),
                ("key_mgmt".to_string(), "NONE".to_string()),
            ]
        );
    }

    #[test]
    fn test_format_empty_psk_is_derived() {
        let formatted = format(&params(r#"{"ssid":"cafe","psk":""}"#));

        assert!(formatted.hashed);
        let psk = formatted.get("psk").unwrap();
        assert_eq!(psk.len(), 64);
        assert_eq!(psk, derive_psk("", "cafe"));
    }

    #[test]
    fn test_format_empty_psk_wins_over_password() {
        let formatted = format(&params(r#"{"ssid":"x","psk":"","password":"pw"}"#));

        assert!(formatted.hashed);
        assert_eq!(formatted.get("psk"), Some(derive_psk("", "x").as_str()));
        assert_eq!(formatted.get("password"), Some("pw"));
    }

    #[test]
    fn test_format_empty_password_is_hashed() {
        let formatted = format(&params(r#"{"ssid":"corp","password":""}"#));

        assert!(formatted.hashed);
        assert_eq!(formatted.get("password"), Some(password_hash("").as_str()));
    }

    #[test]
    fn test_format_passes_through_scalars() {
        let formatted = format(&params(r#"{"ssid":"hidden","scan_ssid":1,"eap":"PEAP"}"#));

        assert_eq!(formatted.get("scan_ssid"), Some("1"));
        assert_eq!(formatted.get("eap"), Some("PEAP"));
    }

    #[test]
    fn test_parse_ignores_hashed_flag() {
        let parsed = params(r#"{"ssid":"home","hashed":true}"#);
        assert!(parsed.extra.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        assert!(JoinParams::parse(b"not json").is_err());
        assert!(JoinParams::parse(&[0xff, 0xfe]).is_err());
        assert!(JoinParams::parse(br#"{"psk":"nossid"}"#).is_err());
        assert!(JoinParams::parse(br#"{"ssid":42}"#).is_err());
        assert!(JoinParams::parse(br#"["ssid"]"#).is_err());
    }

    #[test]
    fn test_parse_rejects_command_injection() {
        assert!(JoinParams::parse(br#"{"ssid":"a\nREMOVE_NETWORK all"}"#).is_err());
        assert!(JoinParams::parse(br#"{"ssid":"a","bad key":"x"}"#).is_err());
    }
}
