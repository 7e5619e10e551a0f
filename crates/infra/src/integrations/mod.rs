//! External service integrations

pub mod notify;
pub mod openai;
pub mod recommendation;
