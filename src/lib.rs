pub mod db;
pub mod server;
pub mod timocom;
pub mod version;
pub mod web;
