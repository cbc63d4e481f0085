pub mod flow;
pub mod middleware;
pub mod session_auth;
pub mod token;

pub use flow::{Effect, Event, LoginFlow, VerificationState};
pub use token::TokenDecoder;
