pub mod alert;
pub mod config;
pub mod error;
pub mod notify;
pub mod scanner;
