//! Built-in envelope handlers.

pub mod chat;
pub mod typing;
pub mod userlist;

pub use chat::{ChatHandler, PrivateHandler, SystemHandler};
pub use typing::TypingHandler;
pub use userlist::UserListHandler;
