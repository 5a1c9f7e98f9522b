pub mod conversation;
pub mod message;
pub mod user;

pub use conversation::Conversation;
pub use message::{DirectMessage, NewMessage};
pub use user::User;
