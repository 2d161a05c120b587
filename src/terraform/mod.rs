pub mod client;
pub mod credentials;
pub mod definitions;
pub mod model;
pub mod sync;

pub use client::TfcClient;
