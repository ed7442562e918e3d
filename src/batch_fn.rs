use async_trait::async_trait;

/// A bulk fetch for one entity or relationship type.
///
/// `load` receives distinct keys and must return exactly one value per key,
/// in the same order. "Not found" belongs in `V` (an `Option`, or an empty
/// `Vec` for one-to-many relationships); `Err` is reserved for failures of
/// the whole batch.
#[async_trait]
pub trait BatchFn<K, V> {
    type Error;

    async fn load(&self, keys: &[K]) -> Result<Vec<V>, Self::Error>;
}
