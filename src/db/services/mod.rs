//! Data-access functions over the JSON store, one sub-module per entity.
//! Handlers call these instead of touching `Database` collections directly.
//! Everything is re-exported under `crate::db::services::`.

pub mod agent_service;
pub mod history_service;
pub mod logistics_base_service;
pub mod record_service;
pub mod settings_service;

pub use agent_service::*;
pub use history_service::*;
pub use logistics_base_service::*;
pub use record_service::*;
pub use settings_service::*;
