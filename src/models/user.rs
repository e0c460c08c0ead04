//! User account model for storage and API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User account stored in the JSON document store.
///
/// One account exists per `(externalId, provider)` pair; accounts are never
/// merged across providers, even when the email matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Stable identity key, `"<externalId>@<provider>"` (also the map key)
    #[serde(rename = "id")]
    pub key: String,
    /// Display name from the provider; informational only
    #[serde(rename = "name")]
    pub display_name: String,
    /// Email from the provider; empty when not shared
    #[serde(default)]
    pub email: String,
    /// Spendable credit, in golden units; mutated only by the ledger
    pub golden_balance: u64,
    /// Purchased features, feature name → expiry (RFC3339)
    #[serde(default)]
    pub subscriptions: HashMap<String, String>,
    /// When the account was first created (RFC3339); never updated
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let account = UserAccount {
            key: "123@google".to_string(),
            display_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            golden_balance: 100,
            subscriptions: HashMap::new(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["id"], "123@google");
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["golden_balance"], 100);
        assert!(json["subscriptions"].is_object());
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        // Records written before subscriptions existed must still load.
        let json = r#"{
            "id": "7@github",
            "name": "Grace",
            "golden_balance": 40,
            "created_at": "2026-01-01T00:00:00Z"
        }"#;

        let account: UserAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.key, "7@github");
        assert!(account.email.is_empty());
        assert!(account.subscriptions.is_empty());
    }
}
