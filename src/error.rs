//! Error types for hashledger

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    NotInitialized,
    AlreadyInitialized,
    EmptyData,
    BlockNotFound(u64),
    InvalidDifficulty(usize),
    MiningAborted { attempts: u64, reason: AbortReason },
    ConfigError(String),
    IoError(String),
    SerializationError(String),
}

/// Why a nonce search stopped before finding a valid hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    AttemptLimit,
    Timeout,
    Cancelled,
    NonceExhausted,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AbortReason::AttemptLimit => write!(f, "attempt limit reached"),
            AbortReason::Timeout => write!(f, "timed out"),
            AbortReason::Cancelled => write!(f, "cancelled"),
            AbortReason::NonceExhausted => write!(f, "nonce space exhausted"),
        }
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::NotInitialized => write!(f, "Chain is not initialized: create the genesis block first"),
            ChainError::AlreadyInitialized => write!(f, "Chain already has a genesis block"),
            ChainError::EmptyData => write!(f, "Block data must not be empty"),
            ChainError::BlockNotFound(index) => write!(f, "Block not found: #{}", index),
            ChainError::InvalidDifficulty(d) => {
                write!(f, "Invalid difficulty: {} (a SHA-256 hex digest has 64 characters)", d)
            }
            ChainError::MiningAborted { attempts, reason } => {
                write!(f, "Mining aborted after {} attempts: {}", attempts, reason)
            }
            ChainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ChainError::IoError(msg) => write!(f, "IO error: {}", msg),
            ChainError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
