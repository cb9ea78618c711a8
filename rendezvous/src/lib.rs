pub mod application;
mod authentication;
pub mod settings;
