// Library exports for mailminer crate
// This allows tests and other crates to use the modules

pub mod classifier;
pub mod config;
pub mod contact;
pub mod filter;
pub mod mail_client;
pub mod message;
pub mod normalizer;
pub mod pipeline;
pub mod processor;
pub mod rules;
pub mod storage;

// Field extraction rule chains
pub mod extract;
