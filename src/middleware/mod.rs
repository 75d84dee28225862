pub mod auth_context;
pub mod auth_redirect;
pub mod role_guard;
