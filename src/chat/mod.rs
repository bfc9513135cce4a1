pub mod controller;
pub mod conversation;
pub mod session;
pub mod topic;
pub mod turn;

pub use controller::{ControllerError, Submission};
pub use conversation::ConversationEvent;
pub use session::Sessions;
pub use turn::TurnId;
