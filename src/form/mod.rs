//! The form's state store: current document, edit history, and the latest validation report.

mod actions;
mod reducers;
mod state;

pub use actions::FormCommand;
pub use reducers::apply_command;
pub use state::{FormSession, ValidationTicket};
