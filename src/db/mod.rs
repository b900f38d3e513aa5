pub mod models;
pub mod services;
pub mod store;

pub use store::{JsonStore, StoreError};
