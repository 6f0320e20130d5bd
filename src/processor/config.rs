//! Chunking configuration

/// Configuration for chunking text
#[derive(Debug, Clone)]
pub struct ChunkOptions {
    /// Maximum chunk length in characters
    pub max_len: usize,

    /// Characters shared between adjacent chunks
    pub overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_len: 1000,
            overlap: 100,
        }
    }
}

impl ChunkOptions {
    pub fn new(max_len: usize, overlap: usize) -> Self {
        Self { max_len, overlap }
    }
}
