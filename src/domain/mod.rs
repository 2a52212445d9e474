pub mod automation;
pub mod chat;
pub mod error;
pub mod llm_config;
pub mod project;
pub mod report;
pub mod requirement;
pub mod test_case;
pub mod view;
