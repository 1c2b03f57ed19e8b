//! LED device model.
//!
//! # Data Flow
//! ```text
//! "on" / "off" token
//!     → command.rs (LedCommand, or ControlError::InvalidStateToken)
//!     → controller.rs (set state + broadcast under the control lock)
//!     → state.rs (LedState, the single authoritative flag)
//! ```

pub mod command;
pub mod controller;
pub mod state;

pub use command::{ControlError, LedCommand};
pub use controller::{ControlOutcome, LedController};
pub use state::{state_label, state_message, LedState};
