pub mod bootstrap;
#[path = "config/mod.rs"]
pub mod config_mod;
pub use config_mod as config;
pub mod db;
pub mod evidence;
pub mod llm_clients;
pub mod report;
pub mod response;
pub mod security;
pub mod spreadsheet;
pub mod storage;
