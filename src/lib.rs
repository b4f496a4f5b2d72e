pub mod config;
pub mod crawl;
pub mod dataset;
pub mod discovery;
pub mod dispatch;
pub mod errors;
pub mod extraction;
pub mod filter;
pub mod scan;
pub mod types;
