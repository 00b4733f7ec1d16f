//! hashledger - a minimal append-only ledger built on hash linking and proof-of-work
//!
//! # Architecture
//!
//! ## Ledger Engine
//! - [`blockchain`] - Blocks, the chain, tamper and validation
//! - [`miner`] - Proof-of-work nonce search with optional bounds
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use hashledger::blockchain::Blockchain;
//!
//! let mut chain = Blockchain::new(1)?;
//! chain.create_genesis_block()?;
//! chain.mine_and_append("A")?;
//! chain.mine_and_append("B")?;
//! assert!(chain.is_chain_valid());
//!
//! chain.tamper_block(1, "X")?;
//! assert!(!chain.is_chain_valid());
//! # Ok::<(), hashledger::error::ChainError>(())
//! ```

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Engine
// ============================================================================
pub mod blockchain;
pub mod miner;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
