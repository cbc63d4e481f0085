pub mod admin_handlers;
pub mod auth_handlers;
pub mod dashboard_handlers;
pub mod forms;

pub use admin_handlers::{admin_page, create_user_handler};
pub use auth_handlers::{
    back_handler, login_page, login_submit_handler, logout_handler, resend_handler, verify_handler,
};
pub use dashboard_handlers::dashboard_handler;
