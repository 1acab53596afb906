pub mod capture;
pub mod config;
pub mod pipeline;
pub mod recognition;
pub mod shared;
