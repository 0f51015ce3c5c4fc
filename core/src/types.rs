//! Account resource DTOs.
//!
//! # Design
//! Field names follow the accounts API's JSON:API-style envelope
//! (`{"data": {...}}` with snake_case keys). Optional attributes are skipped
//! when `None` so the server applies its own defaults.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level envelope sent to and returned by the accounts API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub data: AccountData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountData {
    pub id: Uuid,
    pub organisation_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AccountAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_id_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joint_account: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_matching_opt_out: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_identification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Account {
    /// A new `accounts` resource with the given ids and attributes.
    pub fn new(id: Uuid, organisation_id: Uuid, attributes: AccountAttributes) -> Self {
        Self {
            data: AccountData {
                id,
                organisation_id,
                kind: "accounts".to_string(),
                version: None,
                attributes: Some(attributes),
            },
        }
    }

    pub fn id(&self) -> Uuid {
        self.data.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes() -> AccountAttributes {
        AccountAttributes {
            country: Some("GB".to_string()),
            base_currency: Some("GBP".to_string()),
            bank_id: Some("400300".to_string()),
            bank_id_code: Some("GBDSC".to_string()),
            bic: Some("NWBKGB22".to_string()),
            name: vec!["Samantha Holder".to_string()],
            alternative_names: vec!["Sam Holder".to_string()],
            account_classification: Some("Personal".to_string()),
            joint_account: Some(false),
            account_matching_opt_out: Some(false),
            secondary_identification: Some("A1B2C3D4".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn account_serializes_with_envelope() {
        let account = Account::new(Uuid::nil(), Uuid::nil(), attributes());
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["data"]["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["data"]["type"], "accounts");
        assert_eq!(json["data"]["attributes"]["country"], "GB");
        assert_eq!(json["data"]["attributes"]["name"][0], "Samantha Holder");
        assert!(json["data"].get("version").is_none());
        assert!(json["data"]["attributes"].get("iban").is_none());
    }

    #[test]
    fn server_response_deserializes() {
        let body = r#"{"data":{
            "id":"f773707e-7f6a-4ef8-9a36-3c7b3c4ab5a6",
            "organisation_id":"4fd712d9-6d1c-4d3a-8f3d-1f1d2e3c4b5a",
            "type":"accounts",
            "version":0,
            "attributes":{"country":"GB","name":["Samantha Holder"]},
            "created_on":"2021-01-01T00:00:00Z"
        }}"#;
        let account: Account = serde_json::from_str(body).unwrap();
        assert_eq!(account.data.version, Some(0));
        assert_eq!(account.data.kind, "accounts");
        let attrs = account.data.attributes.unwrap();
        assert_eq!(attrs.country.as_deref(), Some("GB"));
        assert!(attrs.alternative_names.is_empty());
    }

    #[test]
    fn missing_id_is_rejected() {
        let result: Result<Account, _> =
            serde_json::from_str(r#"{"data":{"organisation_id":"00000000-0000-0000-0000-000000000000","type":"accounts"}}"#);
        assert!(result.is_err());
    }
}
