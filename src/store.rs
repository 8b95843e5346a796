use crate::models::{ExpenseId, ExpenseRecord};

/// Authoritative in-memory copy of the session's expense records.
///
/// Every change bumps `revision`, which derived views compare against to know
/// they are stale.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    records: Vec<ExpenseRecord>,
    revision: u64,
}

impl RecordStore {
    #[cfg(test)]
    pub fn new(records: Vec<ExpenseRecord>) -> Self {
        Self { records, revision: 0 }
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &ExpenseId) -> Option<&ExpenseRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &ExpenseId) -> bool {
        self.get(id).is_some()
    }

    /// Replace everything with a fresh fetch.
    pub fn replace_all(&mut self, records: Vec<ExpenseRecord>) {
        self.records = records;
        self.bump();
    }

    pub fn append(&mut self, record: ExpenseRecord) {
        self.records.push(record);
        self.bump();
    }

    /// Swap the record with the same id in place. Returns false if absent.
    pub fn replace(&mut self, record: ExpenseRecord) -> bool {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                self.bump();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &ExpenseId) -> Option<ExpenseRecord> {
        let idx = self.records.iter().position(|r| &r.id == id)?;
        let removed = self.records.remove(idx);
        self.bump();
        Some(removed)
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::record;

    fn store() -> RecordStore {
        RecordStore::new(vec![
            record("a", "2024-01-01", "1", None),
            record("b", "2024-01-02", "2", None),
            record("c", "2024-01-03", "3", None),
        ])
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut s = store();
        let mut updated = s.get(&ExpenseId::new("b")).unwrap().clone();
        updated.item = "changed".into();
        assert!(s.replace(updated));
        assert_eq!(s.records()[1].item, "changed");
        assert_eq!(s.revision(), 1);
    }

    #[test]
    fn test_replace_missing_is_noop() {
        let mut s = store();
        assert!(!s.replace(record("zzz", "2024-01-01", "1", None)));
        assert_eq!(s.revision(), 0);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_remove_and_append() {
        let mut s = store();
        let removed = s.remove(&ExpenseId::new("a")).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert!(!s.contains(&ExpenseId::new("a")));
        s.append(record("d", "2024-01-04", "4", None));
        assert_eq!(s.records().last().unwrap().id.as_str(), "d");
        assert_eq!(s.revision(), 2);
    }
}
