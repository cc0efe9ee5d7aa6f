pub mod store;

pub use store::{AlertState, AlertStore};
