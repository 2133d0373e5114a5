pub mod context;
pub mod error;
pub mod file_name;
pub mod model;
pub mod pipeline;
pub mod service;
pub mod steps;
