//! Buffer pool: bounded in-memory page cache with pluggable eviction.
//!
//! The buffer pool caches pages in memory to reduce I/O and defers writes
//! until a page is evicted or flushed. Which page leaves the pool under
//! pressure is decided by a replacement policy (LRU, FIFO or Clock).

mod clock;
mod fifo;
mod lru;
mod policy;
mod pool;

pub use clock::ClockReplacer;
pub use fifo::FifoReplacer;
pub use lru::LruReplacer;
pub use policy::{PolicyKind, ReplacementPolicy, Replacer};
pub use pool::{BufferPool, PoolStats};
