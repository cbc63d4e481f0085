pub mod record;
pub mod session;
pub mod user;

pub use record::{Embarcadora, Transportadora};
pub use session::AuthSession;
pub use user::User;
