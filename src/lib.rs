pub mod aggregate;
pub mod assemble;
pub mod collector;
pub mod completeness;
pub mod config;
pub mod model;
pub mod report;
pub mod sanitize;
pub mod shopify;
pub mod submission;
