pub mod store;
pub mod accounts;
pub mod tasks;
pub mod board;
pub mod portability;

pub use store::{open_store, KvStore, MemoryStore, FileStore, RedisStore, SharedStore};
pub use accounts::AccountDirectory;
pub use tasks::TaskDirectory;
pub use board::TaskBoard;
pub use portability::{DataPortability, ExportDocument, ImportOutcome};
