// nutralingo - Food label and meal analysis backend
// Author: kelexine (https://github.com/kelexine)

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod upstream;
pub mod utils;
pub mod vision;
