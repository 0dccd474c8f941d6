pub mod compare;
pub mod config;
pub mod errors;
pub mod filter;
pub mod model;
pub mod providers;
pub mod report;
pub mod repository;
pub mod storage;
pub mod submit;
