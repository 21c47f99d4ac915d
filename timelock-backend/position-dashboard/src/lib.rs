pub mod config;
pub mod dashboard;
pub mod error;
pub mod passkey;
pub mod position;
pub mod session;
pub mod stacks;
pub mod view;

pub use config::DashboardConfig;
pub use dashboard::{PlaceholderSubmitter, PositionDashboard, PositionDraft, PositionSource, PositionSubmitter};
pub use error::{DashboardError, PasskeyError, QueryError, ValidationError, WalletError};
pub use position::{LockDuration, Position, PositionStatus};
pub use session::{SessionSlot, WalletConnector, WalletSession};
pub use view::{Action, DashboardState};
