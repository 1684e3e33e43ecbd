//! devnet-memecoins - create and trade demo tokens on a Solana test cluster
//!
//! This crate drives a connected wallet through funding checks, token mint
//! creation, balance refresh and simple transfers against a ledger client.

pub mod types;
pub mod workflow;

// Re-export main types for convenience
pub use types::{TokenCatalog, TokenDefinition, TokenInstance};
pub use workflow::{Session, SessionSnapshot, WorkflowBuilder, WorkflowConfig};
