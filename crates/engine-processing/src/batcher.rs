use model::records::{
    batch::{Batch, BatchMember},
    row::Row,
};

/// Groups dialable rows into fixed-size batches in arrival order.
#[derive(Debug)]
pub struct Batcher {
    capacity: usize,
    next_id: u64,
    members: Vec<BatchMember>,
}

impl Batcher {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Batcher {
            capacity,
            next_id: 0,
            members: Vec::with_capacity(capacity),
        }
    }

    /// Adds a member and returns the batch once it is full.
    pub fn push(&mut self, index: u64, number: impl Into<String>) -> Option<Batch> {
        self.members.push(BatchMember {
            index,
            number: number.into(),
        });

        if self.members.len() >= self.capacity {
            self.flush()
        } else {
            None
        }
    }

    /// Rows without a canonical number are skipped.
    pub fn push_row(&mut self, row: &Row) -> Option<Batch> {
        match row.canonical_number.as_deref() {
            Some(number) if !number.is_empty() => self.push(row.index, number),
            _ => None,
        }
    }

    /// Emits whatever is buffered, even if the batch is not full.
    pub fn flush(&mut self) -> Option<Batch> {
        if self.members.is_empty() {
            return None;
        }

        let members = std::mem::replace(&mut self.members, Vec::with_capacity(self.capacity));
        let batch = Batch::new(self.next_id, members);
        self.next_id += 1;
        Some(batch)
    }

    pub fn pending(&self) -> usize {
        self.members.len()
    }

    pub fn batches_emitted(&self) -> u64 {
        self.next_id
    }
}
