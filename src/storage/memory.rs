//! Map-backed [`ArrayStorage`] implementation.

use std::collections::HashMap;

use super::{ArrayStorage, StorageError};

/// Array storage held entirely in memory.
///
/// Ids that were never inserted fail with [`StorageError::ArrayNotFound`],
/// which makes it straightforward to simulate unreadable pulses.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArrayStorage {
    arrays: HashMap<u64, Vec<f64>>,
}

impl InMemoryArrayStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an array under `array_id`
    pub fn insert(&mut self, array_id: u64, values: Vec<f64>) -> Option<Vec<f64>> {
        self.arrays.insert(array_id, values)
    }

    /// Remove an array, making subsequent reads of `array_id` fail
    pub fn remove(&mut self, array_id: u64) -> Option<Vec<f64>> {
        self.arrays.remove(&array_id)
    }

    /// Number of arrays held
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Whether the store holds no arrays
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

impl ArrayStorage for InMemoryArrayStorage {
    fn element_count(&self, array_id: u64) -> Result<u64, StorageError> {
        self.arrays
            .get(&array_id)
            .map(|values| values.len() as u64)
            .ok_or(StorageError::ArrayNotFound(array_id))
    }

    fn read_doubles(&self, array_id: u64) -> Result<Vec<f64>, StorageError> {
        self.arrays
            .get(&array_id)
            .cloned()
            .ok_or(StorageError::ArrayNotFound(array_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_inserted_array() {
        let mut storage = InMemoryArrayStorage::new();
        storage.insert(7, vec![1.0, 2.0, 3.0]);

        assert_eq!(storage.element_count(7).unwrap(), 3);
        assert_eq!(storage.read_doubles(7).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_array() {
        let mut storage = InMemoryArrayStorage::new();
        storage.insert(1, vec![0.5]);
        storage.remove(1);

        assert!(storage.is_empty());
        assert!(matches!(
            storage.read_doubles(1),
            Err(StorageError::ArrayNotFound(1))
        ));
    }
}
