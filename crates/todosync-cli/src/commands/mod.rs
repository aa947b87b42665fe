pub mod account;
pub mod auth;
pub mod context;
pub mod status;
pub mod todos;
