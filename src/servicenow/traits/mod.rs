pub mod action;
pub mod varset;

pub use action::FlowActionOperations;
pub use varset::VariableSetOperations;
