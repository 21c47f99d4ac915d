// src/chainhooks.rs
use crate::{
    config::Config,
    models::{ChainhookDefinition, ChainhookSubscription, RegisteredChainhook},
};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

const CHAINHOOKS_PATH: &str = "/chainhooks/v1/me/";

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Chainhooks service unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Chainhooks service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed chainhooks response: {0}")]
    Malformed(String),
}

/// Thin client for the hosted chainhooks registration API.
///
/// Holds no subscription state: every call goes straight to the service, so
/// registering twice creates two hooks.
#[derive(Clone, Debug)]
pub struct ChainhooksClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    network: String,
    contract_identifier: Option<String>,
    webhook_url: String,
}

impl ChainhooksClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.chainhooks_base_url.trim_end_matches('/').to_string(),
            api_key: config.chainhooks_api_key.clone(),
            network: config.chainhooks_network.clone(),
            contract_identifier: config.timelock_exchange_contract.clone(),
            webhook_url: config.webhook_url(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CHAINHOOKS_PATH)
    }

    fn api_key(&self) -> Result<&str, RegistrationError> {
        self.api_key
            .as_deref()
            .ok_or(RegistrationError::MissingConfig("CHAINHOOKS_API_KEY"))
    }

    /// The fixed definition this deployment registers.
    pub fn definition(&self) -> Result<ChainhookDefinition, RegistrationError> {
        let contract = self
            .contract_identifier
            .as_deref()
            .ok_or(RegistrationError::MissingConfig("TIMELOCK_EXCHANGE_CONTRACT"))?;
        Ok(ChainhookDefinition::print_events(
            contract,
            &self.network,
            self.webhook_url.clone(),
        ))
    }

    /// Registers the print-event hook and returns the service-assigned uuid.
    pub async fn register(&self) -> Result<String, RegistrationError> {
        let definition = self.definition()?;
        let api_key = self.api_key()?;

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", api_key)
            .json(&definition)
            .send()
            .await?;
        let body = read_success_body(response).await?;

        let registered: RegisteredChainhook = serde_json::from_value(body)
            .map_err(|e| RegistrationError::Malformed(e.to_string()))?;
        info!(
            uuid = %registered.uuid,
            predicate = ?definition.filters.predicate,
            webhook = %self.webhook_url,
            "Chainhook registered"
        );
        Ok(registered.uuid)
    }

    /// The service's listing, untouched.
    pub async fn list_raw(&self) -> Result<Value, RegistrationError> {
        let api_key = self.api_key()?;
        let response = self
            .http
            .get(self.endpoint())
            .header("x-api-key", api_key)
            .send()
            .await?;
        read_success_body(response).await
    }

    pub async fn list(&self) -> Result<Vec<ChainhookSubscription>, RegistrationError> {
        parse_listing(self.list_raw().await?)
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<Value, RegistrationError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), %body, "Chainhooks request rejected");
        return Err(RegistrationError::Status { status: status.as_u16(), body });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RegistrationError::Malformed(e.to_string()))
}

// The service answers either with a bare array or a paginated `{ results: [...] }` envelope.
fn parse_listing(listing: Value) -> Result<Vec<ChainhookSubscription>, RegistrationError> {
    let items = match listing {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("results") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(RegistrationError::Malformed(
                    "listing has no results array".to_string(),
                ))
            }
        },
        other => {
            return Err(RegistrationError::Malformed(format!(
                "unexpected listing: {other}"
            )))
        }
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|e| RegistrationError::Malformed(e.to_string()))
        })
        .collect()
}
