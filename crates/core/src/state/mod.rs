pub mod form;
pub mod io;
pub mod store;

pub use form::IdeationForm;
pub use store::{Action, AgentActivity, Disposition, IdeationState};
