// src/dashboard.rs
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::{
    error::{DashboardError, QueryError, SubmissionError, ValidationError},
    passkey::{Challenge, CreationOptions, CredentialCeremony, PasskeyAssertion, PasskeyCredential, RequestOptions},
    position::{LockDuration, Position, DEFAULT_ASSET},
    session::WalletSession,
    view::{reduce, Action, Alert, DashboardState},
};

/// Read side of the exchange contract.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn load_positions(&self, owner: Option<&str>) -> Result<Vec<Position>, QueryError>;
}

/// Write side of the exchange contract.
#[async_trait]
pub trait PositionSubmitter: Send + Sync {
    async fn submit(&self, request: &CreatePositionRequest) -> Result<Submission, SubmissionError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePositionRequest {
    pub owner: String,
    pub amount: Decimal,
    pub asset: String,
    pub duration: LockDuration,
    pub assertion: Option<PasskeyAssertion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Accepted locally but never broadcast.
    Placeholder,
    Broadcast { txid: String },
}

impl Submission {
    fn alert(&self) -> Alert {
        match self {
            Submission::Placeholder => Alert::info("Position creation functionality would be implemented here"),
            Submission::Broadcast { txid } => Alert::info(format!("Position submitted: {txid}")),
        }
    }
}

/// Records the request and reports that nothing was sent to the chain.
pub struct PlaceholderSubmitter;

#[async_trait]
impl PositionSubmitter for PlaceholderSubmitter {
    async fn submit(&self, request: &CreatePositionRequest) -> Result<Submission, SubmissionError> {
        info!(
            owner = %request.owner,
            amount = %request.amount,
            asset = %request.asset,
            duration_days = request.duration.days(),
            passkey = request.assertion.is_some(),
            "Creating position"
        );
        Ok(Submission::Placeholder)
    }
}

/// Input for one position creation.
#[derive(Debug, Clone)]
pub struct PositionDraft {
    pub amount: String,
    pub duration: LockDuration,
    pub use_passkey: bool,
    /// Required when `use_passkey` is set.
    pub challenge: Option<Challenge>,
}

impl PositionDraft {
    pub fn validated_amount(&self) -> Result<Decimal, ValidationError> {
        let invalid = || ValidationError("Please enter a valid amount".to_string());
        let amount: Decimal = self.amount.trim().parse().map_err(|_| invalid())?;
        if amount <= Decimal::ZERO {
            return Err(invalid());
        }
        Ok(amount)
    }
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Drives [`DashboardState`] from user commands, talking to the contract,
/// the submitter and the passkey platform.
///
/// The state lock is never held across a network call, so overlapping
/// refreshes are not serialized: the last one to resolve wins.
pub struct PositionDashboard<S, W, C> {
    source: S,
    submitter: W,
    ceremony: C,
    state: Mutex<DashboardState>,
    clock: fn() -> u64,
}

impl<S, W, C> PositionDashboard<S, W, C>
where
    S: PositionSource,
    W: PositionSubmitter,
    C: CredentialCeremony,
{
    pub fn new(source: S, submitter: W, ceremony: C) -> Self {
        Self { source, submitter, ceremony, state: Mutex::new(DashboardState::default()), clock: now_unix }
    }

    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub async fn state(&self) -> DashboardState {
        self.state.lock().await.clone()
    }

    pub async fn dispatch(&self, action: Action) -> DashboardState {
        let mut state = self.state.lock().await;
        *state = reduce(std::mem::take(&mut *state), action);
        state.clone()
    }

    async fn fail(&self, err: impl Into<DashboardError>, message: String) -> DashboardError {
        let err = err.into();
        error!(error = %err, "{message}");
        self.dispatch(Action::ShowAlert(Alert::error(message))).await;
        err
    }

    /// Reloads positions from the contract, for the session's account when there is one.
    pub async fn refresh(&self, session: Option<&WalletSession>) -> Result<Vec<Position>, DashboardError> {
        self.dispatch(Action::LoadStarted).await;
        match self.source.load_positions(session.map(WalletSession::address)).await {
            Ok(positions) => {
                let observed_at = (self.clock)();
                self.dispatch(Action::PositionsLoaded { positions: positions.clone(), observed_at }).await;
                Ok(positions)
            }
            Err(e) => {
                error!(error = %e, "Error loading positions");
                self.dispatch(Action::LoadFailed(e.to_string())).await;
                Err(e.into())
            }
        }
    }

    pub async fn create_position(
        &self,
        session: &WalletSession,
        draft: PositionDraft,
    ) -> Result<Submission, DashboardError> {
        let amount = match draft.validated_amount() {
            Ok(amount) => amount,
            Err(e) => {
                let message = e.0.clone();
                return Err(self.fail(e, message).await);
            }
        };

        let assertion = if draft.use_passkey {
            let Some(challenge) = draft.challenge else {
                let e = ValidationError("Passkey authentication needs a server-issued challenge".to_string());
                let message = e.0.clone();
                return Err(self.fail(e, message).await);
            };
            match self.ceremony.authenticate(&RequestOptions::new(challenge)).await {
                Ok(assertion) => Some(assertion),
                Err(e) => return Err(self.fail(e, "Passkey authentication failed".to_string()).await),
            }
        } else {
            None
        };

        let request = CreatePositionRequest {
            owner: session.address().to_string(),
            amount,
            asset: DEFAULT_ASSET.to_string(),
            duration: draft.duration,
            assertion,
        };

        self.dispatch(Action::SubmitStarted).await;
        match self.submitter.submit(&request).await {
            Ok(submission) => {
                self.dispatch(Action::SubmitFinished { alert: submission.alert() }).await;
                Ok(submission)
            }
            Err(e) => {
                error!(error = %e, "Error creating position");
                self.dispatch(Action::SubmitFinished { alert: Alert::error("Error creating position") }).await;
                Err(e.into())
            }
        }
    }

    /// Submits the create form; a successful submission clears and closes it.
    pub async fn submit_form(
        &self,
        session: &WalletSession,
        challenge: Option<Challenge>,
    ) -> Result<Submission, DashboardError> {
        let form = self.state.lock().await.form.clone();
        let draft = PositionDraft {
            amount: form.amount,
            duration: form.duration,
            use_passkey: form.use_passkey,
            challenge,
        };
        let submission = self.create_position(session, draft).await?;
        self.dispatch(Action::FormSubmitted).await;
        Ok(submission)
    }

    pub async fn register_passkey(
        &self,
        session: &WalletSession,
        challenge: Challenge,
    ) -> Result<PasskeyCredential, DashboardError> {
        let options = CreationOptions::for_session(session, challenge);
        match self.ceremony.create(&options).await {
            Ok(credential) => {
                info!(credential = %credential.id, address = %session.address(), "Passkey registered");
                self.dispatch(Action::ShowAlert(Alert::info("Passkey registered successfully!"))).await;
                Ok(credential)
            }
            Err(e) => Err(self.fail(e, "Passkey registration failed".to_string()).await),
        }
    }
}
