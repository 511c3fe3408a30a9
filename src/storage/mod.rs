pub mod cached;
pub mod sqlite;
pub mod trait_def;

pub use cached::CachedRepository;
pub use sqlite::SqliteStore;
pub use trait_def::{ClickRecorder, LinkRepository};
