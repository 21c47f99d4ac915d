//! Dashboard state and the pure update function that drives it.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::position::{LockDuration, Position, PositionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertLevel {
    Info,
    Error,
}

/// A message the user must acknowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: AlertLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: AlertLevel::Error, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedPosition {
    pub position: Position,
    pub status: PositionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct CreateForm {
    pub amount: String,
    pub duration: LockDuration,
    pub use_passkey: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DashboardState {
    pub positions: Vec<TrackedPosition>,
    pub loading: bool,
    pub show_create_form: bool,
    pub form: CreateForm,
    pub last_refreshed_at: Option<u64>,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_positions: usize,
    pub active_positions: usize,
    /// Sum of amounts still locked, by the positions' own denomination.
    pub value_locked: Decimal,
}

impl DashboardState {
    pub fn stats(&self) -> Stats {
        let active = self.positions.iter().filter(|p| p.status == PositionStatus::Active);
        Stats {
            total_positions: self.positions.len(),
            active_positions: active.clone().count(),
            value_locked: active.map(|p| p.position.amount).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ToggleCreateForm,
    CloseCreateForm,
    SetAmount(String),
    SetDuration(LockDuration),
    SetUsePasskey(bool),
    LoadStarted,
    PositionsLoaded { positions: Vec<Position>, observed_at: u64 },
    LoadFailed(String),
    SubmitStarted,
    SubmitFinished { alert: Alert },
    FormSubmitted,
    ShowAlert(Alert),
    DismissAlert,
}

pub fn reduce(mut state: DashboardState, action: Action) -> DashboardState {
    match action {
        Action::ToggleCreateForm => state.show_create_form = !state.show_create_form,
        Action::CloseCreateForm => state.show_create_form = false,
        Action::SetAmount(amount) => state.form.amount = amount,
        Action::SetDuration(duration) => state.form.duration = duration,
        Action::SetUsePasskey(use_passkey) => state.form.use_passkey = use_passkey,
        Action::LoadStarted | Action::SubmitStarted => state.loading = true,
        Action::PositionsLoaded { positions, observed_at } => {
            // Replaces whatever an earlier refresh stored, whichever order they were issued in.
            state.positions = positions
                .into_iter()
                .map(|position| TrackedPosition { status: position.status_at(observed_at), position })
                .collect();
            state.last_refreshed_at = Some(observed_at);
            state.loading = false;
        }
        Action::LoadFailed(message) => {
            state.loading = false;
            state.alert = Some(Alert::error(format!("Error loading positions: {message}")));
        }
        Action::SubmitFinished { alert } => {
            state.loading = false;
            state.alert = Some(alert);
        }
        Action::FormSubmitted => {
            state.form = CreateForm::default();
            state.show_create_form = false;
        }
        Action::ShowAlert(alert) => state.alert = Some(alert),
        Action::DismissAlert => state.alert = None,
    }
    state
}
