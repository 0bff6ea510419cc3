//! Storage layer: page-addressable backing stores.
//!
//! Page `i` always maps to bytes `[i * PAGE_SIZE, (i + 1) * PAGE_SIZE)` of the
//! backing resource. One page is one unit of I/O.

mod memory;
mod page_store;

pub use memory::MemoryPageStore;
pub use page_store::{FilePageStore, PageStore};
