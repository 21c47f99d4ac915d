use std::env;

use crate::{error::ConfigError, stacks::ContractId};

#[derive(Clone, Debug)]
pub struct ContractAddresses {
    pub timelock_exchange: ContractId,
    pub position_nft: ContractId,
    pub fee_collector: ContractId,
}

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub stacks_api_url: String,
    pub contracts: ContractAddresses,
    pub app_origin: String,
    pub wallet_address: Option<String>,
    pub refresh_interval_secs: u64,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Ok(Self {
            stacks_api_url: env::var("STACKS_API_URL")
                .unwrap_or_else(|_| "https://api.mainnet.hiro.so".to_string()),
            contracts: ContractAddresses {
                timelock_exchange: contract_var("TIMELOCK_EXCHANGE_CONTRACT")?,
                position_nft: contract_var("POSITION_NFT_CONTRACT")?,
                fee_collector: contract_var("FEE_COLLECTOR_CONTRACT")?,
            },
            app_origin: env::var("APP_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            wallet_address: env::var("WALLET_ADDRESS").ok().filter(|v| !v.trim().is_empty()),
            refresh_interval_secs: match env::var("REFRESH_INTERVAL_SECS") {
                Ok(value) => value
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue { key: "REFRESH_INTERVAL_SECS", value })?,
                Err(_) => 30,
            },
        })
    }
}

fn contract_var(key: &'static str) -> Result<ContractId, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key))?.parse()
}
