use sha2::{Digest, Sha256};

/// Linkage value stored in the genesis block in place of a predecessor hash.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Textual form every timestamp is recorded in. Hashes depend on these exact bytes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Current UTC time in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub data: String,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: impl Into<String>,
        data: impl Into<String>,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self::with_nonce(index, timestamp, data, previous_hash, 0)
    }

    pub fn with_nonce(
        index: u64,
        timestamp: impl Into<String>,
        data: impl Into<String>,
        previous_hash: impl Into<String>,
        nonce: u64,
    ) -> Self {
        let mut block = Block {
            index,
            timestamp: timestamp.into(),
            data: data.into(),
            previous_hash: previous_hash.into(),
            nonce,
            hash: String::new(),
        };
        block.rehash();
        block
    }

    /// SHA-256 over `index ‖ timestamp ‖ data ‖ previous_hash ‖ nonce`, each in
    /// its plain textual form, as lowercase hex.
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_string());
        hasher.update(&self.timestamp);
        hasher.update(&self.data);
        hasher.update(&self.previous_hash);
        hasher.update(self.nonce.to_string());
        hex::encode(hasher.finalize())
    }

    pub fn rehash(&mut self) {
        self.hash = self.calculate_hash();
    }

    pub fn is_hash_consistent(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        hash_meets_difficulty(&self.hash, difficulty)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

/// True when the first `difficulty` hex characters of `hash` are all `'0'`.
pub fn hash_meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
