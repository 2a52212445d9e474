pub mod conversation;
pub mod model_gateway;
pub mod requirement_import;
pub mod retry;
pub mod simulator;
pub mod test_cases;
pub mod view_controller;

#[cfg(test)]
pub(crate) mod test_support;
