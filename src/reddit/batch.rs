// src/reddit/batch.rs

/// Media items per post in a thread
pub const BATCH_SIZE: usize = 4;

/// One post's worth of media, numbered from 1 across the whole thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    pub first_number: usize,
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    pub fn last_number(&self) -> usize {
        self.first_number + self.items.len() - 1
    }
}

/// Splits `items` into contiguous batches of at most [`BATCH_SIZE`], keeping order.
pub fn batches<T: Clone>(items: &[T]) -> Vec<Batch<T>> {
    items
        .chunks(BATCH_SIZE)
        .enumerate()
        .map(|(i, chunk)| Batch { first_number: i * BATCH_SIZE + 1, items: chunk.to_vec() })
        .collect()
}
