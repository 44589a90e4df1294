pub mod http;
pub mod storage;

pub use http::HttpBackendAdapter;
pub use storage::{FileStore, MemoryStore};
