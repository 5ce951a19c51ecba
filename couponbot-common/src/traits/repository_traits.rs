use async_trait::async_trait;
use crate::error::Error;
use crate::models::RecordBook;

/// Durable storage for the registration book.
///
/// The store is deliberately dumb: it loads and saves the whole book. Caching,
/// uniqueness checks and authorization live in the registry that owns it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads the full book. A store that has never been written returns an empty book.
    async fn load(&self) -> Result<RecordBook, Error>;

    /// Replaces the persisted book with `records`.
    async fn save(&self, records: &RecordBook) -> Result<(), Error>;
}
