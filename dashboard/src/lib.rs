pub mod actions;
pub mod config;
pub mod notifications;
pub mod repay;
pub mod server;
pub mod state;
pub mod view;

#[cfg(test)]
mod mock;

pub use actions::{Action, ActionError, Dashboard};
pub use config::Config;
pub use notifications::{Notification, NotificationKind};
pub use repay::{ApproveThenRepay, RepayError, RepayPhase};
pub use server::create_router;
pub use state::{AppState, FormField, Store};
pub use view::{render, render_text, DashboardView};
