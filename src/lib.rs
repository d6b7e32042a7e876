pub mod config;
pub mod engine;
pub mod orchestration;
pub mod responses;
pub mod selector;
pub mod shared;
pub mod tracker;
