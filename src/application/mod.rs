pub mod use_cases;

pub use use_cases::model_gateway::ModelGateway;
pub use use_cases::retry::RetryPolicy;
pub use use_cases::simulator::ExecutionSimulator;
pub use use_cases::view_controller::ViewController;
