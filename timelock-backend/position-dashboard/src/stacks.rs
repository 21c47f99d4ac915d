// src/stacks.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{debug, info};

use crate::{
    dashboard::PositionSource,
    error::{ConfigError, QueryError},
    position::Position,
};

/// `ADDRESS.contract-name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractId {
    pub address: String,
    pub name: String,
}

impl FromStr for ContractId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('.') {
            Some((address, name))
                if !address.is_empty() && !name.is_empty() && !name.contains('.') =>
            {
                Ok(Self { address: address.to_string(), name: name.to_string() })
            }
            _ => Err(ConfigError::InvalidContract(s.to_string())),
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.address, self.name)
    }
}

// Read-only results are at most a response wrapping an optional; anything deeper is refused.
const MAX_NESTING: usize = 8;

/// The subset of Clarity values the dashboard reads back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Bool(bool),
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    None,
    Some(Box<ClarityValue>),
}

impl ClarityValue {
    pub fn from_hex(s: &str) -> Result<Self, QueryError> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| QueryError::Decode(e.to_string()))?;
        let (value, rest) = Self::decode(&bytes, 0)?;
        if !rest.is_empty() {
            return Err(QueryError::Decode(format!("{} trailing bytes", rest.len())));
        }
        Ok(value)
    }

    fn decode(bytes: &[u8], depth: usize) -> Result<(Self, &[u8]), QueryError> {
        let (&type_id, rest) = bytes
            .split_first()
            .ok_or_else(|| QueryError::Decode("empty value".to_string()))?;
        match type_id {
            0x00 | 0x01 => {
                if rest.len() < 16 {
                    return Err(QueryError::Decode("truncated integer".to_string()));
                }
                let (raw, rest) = rest.split_at(16);
                let mut buf = [0u8; 16];
                buf.copy_from_slice(raw);
                let value = if type_id == 0x00 {
                    ClarityValue::Int(i128::from_be_bytes(buf))
                } else {
                    ClarityValue::UInt(u128::from_be_bytes(buf))
                };
                Ok((value, rest))
            }
            0x03 => Ok((ClarityValue::Bool(true), rest)),
            0x04 => Ok((ClarityValue::Bool(false), rest)),
            0x07 | 0x08 | 0x0a => {
                if depth >= MAX_NESTING {
                    return Err(QueryError::Decode("nesting too deep".to_string()));
                }
                let (inner, rest) = Self::decode(rest, depth + 1)?;
                let inner = Box::new(inner);
                let value = match type_id {
                    0x07 => ClarityValue::ResponseOk(inner),
                    0x08 => ClarityValue::ResponseErr(inner),
                    _ => ClarityValue::Some(inner),
                };
                Ok((value, rest))
            }
            0x09 => Ok((ClarityValue::None, rest)),
            other => Err(QueryError::Decode(format!("unsupported type id 0x{other:02x}"))),
        }
    }

    /// Reads an unsigned count, unwrapping `(ok ...)`.
    pub fn into_count(self) -> Result<u128, QueryError> {
        match self {
            ClarityValue::ResponseOk(inner) => inner.into_count(),
            ClarityValue::ResponseErr(inner) => Err(QueryError::ContractErr(format!("{inner:?}"))),
            ClarityValue::UInt(n) => Ok(n),
            ClarityValue::Int(n) if n >= 0 => Ok(n as u128),
            other => Err(QueryError::Decode(format!("expected a count, got {other:?}"))),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReadOnlyRequest<'a> {
    sender: &'a str,
    arguments: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ReadOnlyResponse {
    okay: bool,
    result: Option<String>,
    cause: Option<String>,
}

/// Read-only access to Stacks contracts through a node or Hiro API.
#[derive(Clone, Debug)]
pub struct StacksClient {
    http: reqwest::Client,
    api_url: String,
}

impl StacksClient {
    pub fn new(api_url: &str, http: reqwest::Client) -> Self {
        Self { http, api_url: api_url.trim_end_matches('/').to_string() }
    }

    /// Calls a read-only function. `arguments` are hex-serialized Clarity values.
    pub async fn call_read_only(
        &self,
        contract: &ContractId,
        function: &str,
        arguments: &[String],
        sender: &str,
    ) -> Result<ClarityValue, QueryError> {
        let url = format!(
            "{}/v2/contracts/call-read/{}/{}/{}",
            self.api_url, contract.address, contract.name, function
        );
        debug!(%url, "Read-only call");
        let response = self
            .http
            .post(&url)
            .json(&ReadOnlyRequest { sender, arguments })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status { status: status.as_u16(), body });
        }
        let body: ReadOnlyResponse = response.json().await?;
        match (body.okay, body.result) {
            (true, Some(result)) => ClarityValue::from_hex(&result),
            (true, None) => Err(QueryError::Decode("okay response without result".to_string())),
            (false, _) => Err(QueryError::Rejected(body.cause.unwrap_or_default())),
        }
    }
}

/// Loads positions from the exchange contract.
///
/// Only the position count is exposed by the contract's read-only surface we
/// know of, so the detail list is always empty.
pub struct StacksPositionSource {
    client: StacksClient,
    exchange: ContractId,
}

impl StacksPositionSource {
    pub fn new(client: StacksClient, exchange: ContractId) -> Self {
        Self { client, exchange }
    }

    pub async fn position_count(&self) -> Result<u128, QueryError> {
        self.client
            .call_read_only(&self.exchange, "get-position-count", &[], &self.exchange.address)
            .await?
            .into_count()
    }
}

#[async_trait]
impl PositionSource for StacksPositionSource {
    async fn load_positions(&self, owner: Option<&str>) -> Result<Vec<Position>, QueryError> {
        let count = self.position_count().await?;
        info!(total_positions = %count, owner = ?owner, contract = %self.exchange, "Total positions");
        // TODO: fetch per-position details once the exchange contract exposes a read-only getter.
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn contract_id_requires_address_and_name() {
        let id: ContractId = "SP2C2YFP12AJZB4MABJBAJ55XECVS7E4PMMZ89YZR.timelock-exchange".parse().unwrap();
        assert_eq!(id.name, "timelock-exchange");
        assert_eq!(id.to_string(), "SP2C2YFP12AJZB4MABJBAJ55XECVS7E4PMMZ89YZR.timelock-exchange");
        assert!("SP123".parse::<ContractId>().is_err());
        assert!(".name".parse::<ContractId>().is_err());
        assert!("a.b.c".parse::<ContractId>().is_err());
    }

    #[test]
    fn decodes_counts_inside_responses() {
        let ok_uint = "0x070100000000000000000000000000000005";
        assert_eq!(ClarityValue::from_hex(ok_uint).unwrap().into_count().unwrap(), 5);

        let bare_uint = "01000000000000000000000000000000ff";
        assert_eq!(ClarityValue::from_hex(bare_uint).unwrap(), ClarityValue::UInt(255));

        let err_uint = "0x080100000000000000000000000000000001";
        assert!(matches!(
            ClarityValue::from_hex(err_uint).unwrap().into_count(),
            Err(QueryError::ContractErr(_))
        ));

        let negative = format!("00{}", hex::encode((-1i128).to_be_bytes()));
        assert!(ClarityValue::from_hex(&negative).unwrap().into_count().is_err());
    }

    #[test]
    fn rejects_truncated_or_unknown_values() {
        assert!(ClarityValue::from_hex("0x01ff").is_err());
        assert!(ClarityValue::from_hex("0x0c").is_err());
        assert!(ClarityValue::from_hex("0x0303").is_err());
        assert_eq!(ClarityValue::from_hex("0x0a03").unwrap(), ClarityValue::Some(Box::new(ClarityValue::Bool(true))));
    }

    #[test]
    fn deeply_nested_responses_are_refused() {
        let uint = "0100000000000000000000000000000005";
        let hostile = format!("{}{uint}", "07".repeat(100_000));
        assert_eq!(
            ClarityValue::from_hex(&hostile),
            Err(QueryError::Decode("nesting too deep".to_string()))
        );

        let at_limit = format!("{}{uint}", "07".repeat(MAX_NESTING));
        assert_eq!(ClarityValue::from_hex(&at_limit).unwrap().into_count().unwrap(), 5);
        let past_limit = format!("{}{uint}", "07".repeat(MAX_NESTING + 1));
        assert!(ClarityValue::from_hex(&past_limit).is_err());
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn source_queries_count_and_yields_no_details() {
        async fn call_read(
            Path((address, name, function)): Path<(String, String, String)>,
            Json(body): Json<Value>,
        ) -> Json<Value> {
            assert_eq!(address, "SP000");
            assert_eq!(name, "timelock-exchange");
            assert_eq!(function, "get-position-count");
            assert_eq!(body, json!({ "sender": "SP000", "arguments": [] }));
            Json(json!({ "okay": true, "result": "0x070100000000000000000000000000000003" }))
        }
        let url = serve(Router::new().route(
            "/v2/contracts/call-read/{address}/{name}/{function}",
            post(call_read),
        ))
        .await;

        let source = StacksPositionSource::new(
            StacksClient::new(&url, reqwest::Client::new()),
            "SP000.timelock-exchange".parse().unwrap(),
        );
        assert_eq!(source.position_count().await.unwrap(), 3);
        assert!(source.load_positions(Some("SP1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_call_surfaces_cause() {
        let url = serve(Router::new().route(
            "/v2/contracts/call-read/{address}/{name}/{function}",
            post(|| async { Json(json!({ "okay": false, "cause": "NoSuchContract" })) }),
        ))
        .await;
        let client = StacksClient::new(&url, reqwest::Client::new());
        let err = client
            .call_read_only(&"SP000.missing".parse().unwrap(), "get-position-count", &[], "SP000")
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::Rejected("NoSuchContract".to_string()));
    }
}
