use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::WalletError;

pub const APP_NAME: &str = "TimeLock Exchange";

/// What the wallet is shown during the handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppDetails {
    pub name: String,
    pub icon: String,
    pub scopes: Vec<String>,
}

impl AppDetails {
    pub fn timelock(origin: &str) -> Self {
        Self {
            name: APP_NAME.to_string(),
            icon: format!("{}/logo.png", origin.trim_end_matches('/')),
            scopes: vec!["store_write".to_string(), "publish_data".to_string()],
        }
    }
}

/// Account data handed back by the wallet after a successful handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserData {
    pub mainnet_address: String,
    pub testnet_address: Option<String>,
    pub username: Option<String>,
    /// Unix seconds after which the wallet no longer honours the session.
    pub expires_at: Option<u64>,
}

/// The wallet provider's connect/sign-out protocol.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    async fn connect(&self, app: &AppDetails) -> Result<UserData, WalletError>;

    /// A session the wallet already considers signed in, if any.
    async fn signed_in_user(&self) -> Option<UserData>;

    async fn sign_out(&self) -> Result<(), WalletError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletSession {
    user: UserData,
    scopes: Vec<String>,
    connected_at: u64,
}

impl WalletSession {
    pub fn address(&self) -> &str {
        &self.user.mainnet_address
    }

    pub fn user(&self) -> &UserData {
        &self.user
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn connected_at(&self) -> u64 {
        self.connected_at
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.user.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// `SP2C2Y...9YZR` style rendering of the mainnet address.
    pub fn short_address(&self) -> String {
        let address = self.address();
        let chars: Vec<char> = address.chars().collect();
        if chars.len() <= 10 {
            return address.to_string();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

/// Holds at most one wallet session.
#[derive(Debug, Default)]
pub struct SessionSlot {
    session: Option<WalletSession>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect<W: WalletConnector + ?Sized>(
        &mut self,
        wallet: &W,
        app: &AppDetails,
        now: u64,
    ) -> Result<&WalletSession, WalletError> {
        if self.current(now).is_some() {
            return Err(WalletError::AlreadyConnected);
        }
        let user = wallet.connect(app).await?;
        info!(address = %user.mainnet_address, "Wallet connected");
        Ok(self.session.insert(WalletSession {
            user,
            scopes: app.scopes.clone(),
            connected_at: now,
        }))
    }

    /// Adopts a session the wallet still considers signed in.
    pub async fn restore<W: WalletConnector + ?Sized>(
        &mut self,
        wallet: &W,
        app: &AppDetails,
        now: u64,
    ) -> Option<&WalletSession> {
        if self.current(now).is_none() {
            let user = wallet.signed_in_user().await?;
            let session = WalletSession { user, scopes: app.scopes.clone(), connected_at: now };
            if session.is_expired(now) {
                // The wallet still holds it; clear it there too.
                if let Err(e) = wallet.sign_out().await {
                    warn!(error = %e, "Failed to sign out expired wallet session");
                }
                return None;
            }
            info!(address = %session.address(), "Wallet session restored");
            self.session = Some(session);
        }
        self.session.as_ref()
    }

    pub async fn disconnect<W: WalletConnector + ?Sized>(&mut self, wallet: &W) -> Result<(), WalletError> {
        let session = self.session.take().ok_or(WalletError::NotConnected)?;
        wallet.sign_out().await?;
        info!(address = %session.address(), "Wallet disconnected");
        Ok(())
    }

    /// The live session, dropping it first if it has expired.
    pub fn current(&mut self, now: u64) -> Option<&WalletSession> {
        if self.session.as_ref().is_some_and(|s| s.is_expired(now)) {
            info!("Wallet session expired");
            self.session = None;
        }
        self.session.as_ref()
    }
}

/// A read-only "wallet" that always reports a fixed address. Used by the CLI.
pub struct StaticWallet {
    address: String,
}

impl StaticWallet {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into() }
    }

    fn user(&self) -> UserData {
        UserData {
            mainnet_address: self.address.clone(),
            testnet_address: None,
            username: None,
            expires_at: None,
        }
    }
}

#[async_trait]
impl WalletConnector for StaticWallet {
    async fn connect(&self, _app: &AppDetails) -> Result<UserData, WalletError> {
        Ok(self.user())
    }

    async fn signed_in_user(&self) -> Option<UserData> {
        Some(self.user())
    }

    async fn sign_out(&self) -> Result<(), WalletError> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const ADDRESS: &str = "SP2C2YFP12AJZB4MABJBAJ55XECVS7E4PMMZ89YZR";

    pub(crate) fn session_for(address: &str) -> WalletSession {
        WalletSession {
            user: UserData {
                mainnet_address: address.to_string(),
                testnet_address: None,
                username: None,
                expires_at: None,
            },
            scopes: vec![],
            connected_at: 0,
        }
    }

    #[derive(Default)]
    struct FakeWallet {
        expires_at: Option<u64>,
        already_signed_in: bool,
        reject: bool,
        sign_outs: AtomicUsize,
    }

    #[async_trait]
    impl WalletConnector for FakeWallet {
        async fn connect(&self, _app: &AppDetails) -> Result<UserData, WalletError> {
            if self.reject {
                return Err(WalletError::Handshake("user closed the popup".to_string()));
            }
            Ok(UserData {
                mainnet_address: ADDRESS.to_string(),
                testnet_address: Some("ST2C2YFP12AJZB4MABJBAJ55XECVS7E4PMQWCNW6P".to_string()),
                username: Some("alice.btc".to_string()),
                expires_at: self.expires_at,
            })
        }

        async fn signed_in_user(&self) -> Option<UserData> {
            if self.already_signed_in {
                self.connect(&AppDetails::timelock("")).await.ok()
            } else {
                None
            }
        }

        async fn sign_out(&self) -> Result<(), WalletError> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn only_one_session_per_slot() {
        let wallet = FakeWallet::default();
        let app = AppDetails::timelock("https://timelock.example");
        let mut slot = SessionSlot::new();

        let session = slot.connect(&wallet, &app, 10).await.unwrap();
        assert_eq!(session.address(), ADDRESS);
        assert_eq!(session.scopes(), ["store_write", "publish_data"]);
        assert_eq!(slot.connect(&wallet, &app, 11).await, Err(WalletError::AlreadyConnected));
    }

    #[tokio::test]
    async fn disconnect_signs_out_and_frees_the_slot() {
        let wallet = FakeWallet::default();
        let app = AppDetails::timelock("https://timelock.example");
        let mut slot = SessionSlot::new();

        slot.connect(&wallet, &app, 0).await.unwrap();
        slot.disconnect(&wallet).await.unwrap();
        assert_eq!(wallet.sign_outs.load(Ordering::SeqCst), 1);
        assert!(slot.current(0).is_none());
        assert_eq!(slot.disconnect(&wallet).await, Err(WalletError::NotConnected));
        assert!(slot.connect(&wallet, &app, 1).await.is_ok());
    }

    #[tokio::test]
    async fn expired_session_is_dropped() {
        let wallet = FakeWallet { expires_at: Some(100), ..Default::default() };
        let app = AppDetails::timelock("https://timelock.example");
        let mut slot = SessionSlot::new();

        slot.connect(&wallet, &app, 0).await.unwrap();
        assert!(slot.current(99).is_some());
        assert!(slot.current(100).is_none());
        assert!(slot.connect(&wallet, &app, 101).await.is_ok());
    }

    #[tokio::test]
    async fn restore_adopts_existing_wallet_session() {
        let app = AppDetails::timelock("https://timelock.example");
        let mut slot = SessionSlot::new();
        assert!(slot.restore(&FakeWallet::default(), &app, 0).await.is_none());

        let wallet = FakeWallet { already_signed_in: true, ..Default::default() };
        let restored = slot.restore(&wallet, &app, 0).await.unwrap();
        assert_eq!(restored.user().username.as_deref(), Some("alice.btc"));
    }

    #[tokio::test]
    async fn restore_signs_out_expired_wallet_session() {
        let wallet = FakeWallet { already_signed_in: true, expires_at: Some(5), ..Default::default() };
        let app = AppDetails::timelock("https://timelock.example");
        let mut slot = SessionSlot::new();

        assert!(slot.restore(&wallet, &app, 10).await.is_none());
        assert_eq!(wallet.sign_outs.load(Ordering::SeqCst), 1);
        assert!(slot.current(10).is_none());
    }

    #[tokio::test]
    async fn failed_handshake_leaves_slot_empty() {
        let wallet = FakeWallet { reject: true, ..Default::default() };
        let mut slot = SessionSlot::new();
        let err = slot
            .connect(&wallet, &AppDetails::timelock("https://timelock.example"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Handshake(_)));
        assert!(slot.current(0).is_none());
    }

    #[test]
    fn short_address_keeps_head_and_tail() {
        assert_eq!(session_for(ADDRESS).short_address(), "SP2C2Y...9YZR");
        assert_eq!(session_for("SP1").short_address(), "SP1");
    }

    #[test]
    fn app_details_point_icon_at_origin() {
        let app = AppDetails::timelock("https://timelock.example/");
        assert_eq!(app.icon, "https://timelock.example/logo.png");
        assert_eq!(app.name, "TimeLock Exchange");
    }
}
