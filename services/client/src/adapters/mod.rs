pub mod remote;
pub mod storage;

pub use remote::HttpProgressAdapter;
pub use storage::FileStore;
