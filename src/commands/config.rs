pub mod model;
pub mod show;
