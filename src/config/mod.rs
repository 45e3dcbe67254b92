#[derive(Debug, Clone, Copy)]
pub struct BufferPoolConfig {
    pub pool_size: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        BufferPoolConfig {
            pool_size: crate::buffer::BUFFER_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LockManagerConfig {
    /// Lower bound of the randomized acquisition deadline in milliseconds.
    pub min_wait_ms: u64,
    /// Upper bound of the randomized acquisition deadline in milliseconds.
    pub max_wait_ms: u64,
}

impl Default for LockManagerConfig {
    fn default() -> Self {
        LockManagerConfig {
            min_wait_ms: 100,
            max_wait_ms: 1000,
        }
    }
}
