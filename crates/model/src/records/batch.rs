/// One row's contribution to a batch: its ingestion index and the number sent
/// to the provider on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMember {
    pub index: u64,
    pub number: String,
}

/// A fixed group of numbers verified by a single provider exchange.
///
/// Membership is decided when the batch is created and never changes after
/// it is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub id: u64,
    members: Vec<BatchMember>,
}

impl Batch {
    pub fn new(id: u64, members: Vec<BatchMember>) -> Self {
        Batch { id, members }
    }

    pub fn members(&self) -> &[BatchMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Numbers in first-seen order, as carried in the request payload.
    pub fn numbers(&self) -> Vec<String> {
        self.members.iter().map(|m| m.number.clone()).collect()
    }

    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.members.iter().map(|m| m.index)
    }
}
