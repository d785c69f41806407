pub mod history;
pub mod orchestrator;
