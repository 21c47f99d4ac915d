// --- Chainhook Definition Models ---

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CHAINHOOK_NAME: &str = "Timelock Exchange Event Monitor";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainhookDefinition {
    pub name: String,
    pub chain: String,
    pub network: String,
    pub filters: ChainhookFilters,
    #[serde(default)]
    pub options: Value,
    pub action: ChainhookAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainhookFilters {
    pub predicate: Predicate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    PrintEvent { contract_identifier: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainhookAction {
    HttpPost { url: String },
}

impl ChainhookDefinition {
    /// Watch every `print` emitted by `contract_identifier` and POST it to `webhook_url`.
    pub fn print_events(contract_identifier: &str, network: &str, webhook_url: String) -> Self {
        Self {
            name: CHAINHOOK_NAME.to_string(),
            chain: "stacks".to_string(),
            network: network.to_string(),
            filters: ChainhookFilters {
                predicate: Predicate::PrintEvent {
                    contract_identifier: contract_identifier.to_string(),
                },
            },
            options: Value::Object(Default::default()),
            action: ChainhookAction::HttpPost { url: webhook_url },
        }
    }
}

// --- Subscription Models ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredChainhook {
    pub uuid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainhookSubscription {
    pub uuid: String,
    // Everything else the service reports about the hook (definition, status, ...)
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

// --- API Models ---

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub uuid: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
