use std::env;

pub const MAINNET_CHAINHOOKS_URL: &str = "https://api.mainnet.hiro.so";
pub const TESTNET_CHAINHOOKS_URL: &str = "https://api.testnet.hiro.so";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_bind_address: String,
    pub chainhooks_base_url: String,
    // Presence is checked where the key is actually needed, not at start-up.
    pub chainhooks_api_key: Option<String>,
    pub chainhooks_network: String,
    pub public_base_url: String,
    pub timelock_exchange_contract: Option<String>,
    pub position_nft_contract: Option<String>,
    pub fee_collector_contract: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv::dotenv().ok();
        let chainhooks_network =
            env::var("CHAINHOOKS_NETWORK").unwrap_or_else(|_| "mainnet".to_string());
        let default_chainhooks_url = match chainhooks_network.as_str() {
            "testnet" => TESTNET_CHAINHOOKS_URL,
            _ => MAINNET_CHAINHOOKS_URL,
        };
        Ok(Self {
            server_bind_address: env::var("SERVER_BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            chainhooks_base_url: env::var("CHAINHOOKS_BASE_URL")
                .unwrap_or_else(|_| default_chainhooks_url.to_string()),
            chainhooks_api_key: non_empty_var("CHAINHOOKS_API_KEY"),
            chainhooks_network,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            timelock_exchange_contract: non_empty_var("TIMELOCK_EXCHANGE_CONTRACT"),
            position_nft_contract: non_empty_var("POSITION_NFT_CONTRACT"),
            fee_collector_contract: non_empty_var("FEE_COLLECTOR_CONTRACT"),
        })
    }

    /// The URL the indexing service should POST matching events to.
    pub fn webhook_url(&self) -> String {
        format!("{}/api/webhook", self.public_base_url.trim_end_matches('/'))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
pub(crate) fn test_config(chainhooks_base_url: &str) -> Config {
    Config {
        server_bind_address: "127.0.0.1:0".to_string(),
        chainhooks_base_url: chainhooks_base_url.to_string(),
        chainhooks_api_key: Some("test-key".to_string()),
        chainhooks_network: "mainnet".to_string(),
        public_base_url: "https://timelock.example/".to_string(),
        timelock_exchange_contract: Some(
            "SP2C2YFP12AJZB4MABJBAJ55XECVS7E4PMMZ89YZR.timelock-exchange".to_string(),
        ),
        position_nft_contract: None,
        fee_collector_contract: None,
    }
}
