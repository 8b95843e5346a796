use crate::api::ExpenseBackend;
use crate::error::{Result, SpendError};
use crate::models::{ExpenseId, ExpensePatch, ExpenseRecord, NewExpense};
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub enum MutationIntent {
    Create(NewExpense),
    Update { id: ExpenseId, patch: ExpensePatch },
    Delete(ExpenseId),
}

impl MutationIntent {
    fn verb(&self) -> &'static str {
        match self {
            MutationIntent::Create(_) => "create",
            MutationIntent::Update { .. } => "update",
            MutationIntent::Delete(_) => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Created(ExpenseRecord),
    /// The backend did not echo the new record, so the store was refetched.
    Reloaded { count: usize },
    /// The backend stored the new record but the refetch failed. The store
    /// is stale until the next reload.
    Accepted,
    Updated(ExpenseRecord),
    Deleted(ExpenseRecord),
}

/// Applies create/update/delete against the backend first and only then
/// touches the local store, so a failed call leaves the store as it was.
///
/// Edits to the same id are last-write-wins; there is no version check.
pub struct MutationCoordinator<B> {
    backend: B,
    phase: MutationPhase,
}

impl<B: ExpenseBackend> MutationCoordinator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            phase: MutationPhase::Idle,
        }
    }

    pub fn phase(&self) -> MutationPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Load the store from the backend.
    pub fn load(&mut self, store: &mut RecordStore) -> Result<()> {
        let records = self.backend.fetch_expenses()?;
        store.replace_all(records);
        Ok(())
    }

    /// Caller has shown the result; go back to `Idle`.
    pub fn acknowledge(&mut self) {
        self.phase = MutationPhase::Idle;
    }

    /// `&mut self` keeps submissions one at a time; `Submitting` only lasts
    /// for the duration of this call.
    pub fn submit(
        &mut self,
        store: &mut RecordStore,
        intent: MutationIntent,
    ) -> Result<MutationOutcome> {
        self.acknowledge();

        // local checks: nothing goes over the wire when these fail
        match &intent {
            MutationIntent::Update { id, patch } => {
                if !store.contains(id) {
                    return Err(SpendError::NotFound(id.to_string()));
                }
                if patch.is_empty() {
                    return Err(SpendError::validation("Nothing to change"));
                }
            }
            MutationIntent::Delete(id) if !store.contains(id) => {
                return Err(SpendError::NotFound(id.to_string()));
            }
            _ => {}
        }

        let verb = intent.verb();
        self.phase = MutationPhase::Submitting;
        tracing::debug!(verb, "submitting mutation");

        let result = self.apply(store, intent);
        match &result {
            Ok(_) => {
                self.phase = MutationPhase::Succeeded;
                tracing::info!(verb, "mutation succeeded");
            }
            Err(e) => {
                self.phase = MutationPhase::Failed;
                tracing::warn!(verb, "mutation failed: {e}");
            }
        }
        result
    }

    fn apply(&mut self, store: &mut RecordStore, intent: MutationIntent) -> Result<MutationOutcome> {
        match intent {
            MutationIntent::Create(new) => match self.backend.create_expense(&new)? {
                Some(record) => {
                    store.append(record.clone());
                    Ok(MutationOutcome::Created(record))
                }
                // the create already happened; a failed refetch is not a failed create
                None => match self.backend.fetch_expenses() {
                    Ok(records) => {
                        let count = records.len();
                        store.replace_all(records);
                        Ok(MutationOutcome::Reloaded { count })
                    }
                    Err(e) => {
                        tracing::warn!("created expense but could not refetch: {e}");
                        Ok(MutationOutcome::Accepted)
                    }
                },
            },
            MutationIntent::Update { id, patch } => {
                let current = store
                    .get(&id)
                    .ok_or_else(|| SpendError::NotFound(id.to_string()))?;
                let merged = patch.apply_to(current);
                self.backend.update_expense(&merged)?;
                store.replace(merged.clone());
                Ok(MutationOutcome::Updated(merged))
            }
            MutationIntent::Delete(id) => {
                self.backend.delete_expense(&id)?;
                let removed = store
                    .remove(&id)
                    .ok_or_else(|| SpendError::NotFound(id.to_string()))?;
                Ok(MutationOutcome::Deleted(removed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::api::testing::FakeBackend;
    use crate::filter::{filter, FilterCriteria};
    use crate::models::testing::record;
    use crate::models::{ExpenseDate, TransferMode};

    fn seeded() -> (MutationCoordinator<FakeBackend>, RecordStore) {
        let backend = FakeBackend {
            remote: vec![
                record("1", "2024-01-05", "100", Some("Food")),
                record("2", "2024-01-20", "50", Some("Food")),
            ],
            echo_create: true,
            ..Default::default()
        };
        let mut coord = MutationCoordinator::new(backend);
        let mut store = RecordStore::default();
        coord.load(&mut store).unwrap();
        (coord, store)
    }

    fn new_expense() -> NewExpense {
        NewExpense {
            date: ExpenseDate::parse_wire("2024-01-25").unwrap(),
            item: "Bus".into(),
            category: None,
            transfer_mode: TransferMode::Cash,
            bank_name: "SBI".into(),
            amount: Decimal::from_str("12.50").unwrap(),
        }
    }

    #[test]
    fn test_create_appends_echoed_record() {
        let (mut coord, mut store) = seeded();
        let out = coord
            .submit(&mut store, MutationIntent::Create(new_expense()))
            .unwrap();
        assert!(matches!(out, MutationOutcome::Created(ref r) if r.id.as_str() == "new-1"));
        assert_eq!(store.len(), 3);
        assert_eq!(coord.phase(), MutationPhase::Succeeded);
    }

    #[test]
    fn test_create_without_echo_reloads() {
        let (mut coord, mut store) = seeded();
        coord.backend_mut().echo_create = false;
        let out = coord
            .submit(&mut store, MutationIntent::Create(new_expense()))
            .unwrap();
        assert_eq!(out, MutationOutcome::Reloaded { count: 3 });
        assert!(store.contains(&ExpenseId::new("new-1")));
    }

    #[test]
    fn test_create_counts_once_when_refetch_fails() {
        let (mut coord, mut store) = seeded();
        coord.backend_mut().echo_create = false;
        coord.backend_mut().fail_fetch = true;
        let before = store.records().to_vec();

        let out = coord
            .submit(&mut store, MutationIntent::Create(new_expense()))
            .unwrap();
        assert_eq!(out, MutationOutcome::Accepted);
        assert_eq!(coord.phase(), MutationPhase::Succeeded);
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(coord.backend_mut().remote.len(), 3);

        coord.backend_mut().fail_fetch = false;
        coord.load(&mut store).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_update_merges_and_keeps_other_fields() {
        let (mut coord, mut store) = seeded();
        let patch = ExpensePatch {
            amount: Some(Decimal::from(75)),
            ..Default::default()
        };
        coord
            .submit(
                &mut store,
                MutationIntent::Update {
                    id: ExpenseId::new("2"),
                    patch,
                },
            )
            .unwrap();
        let updated = store.get(&ExpenseId::new("2")).unwrap();
        assert_eq!(updated.amount, Decimal::from(75));
        assert_eq!(updated.item, "item 2");
        assert_eq!(updated.date.iso(), "2024-01-20");
        assert_eq!(coord.backend_mut().remote[1].amount, Decimal::from(75));
    }

    #[test]
    fn test_delete_then_filter_excludes_id() {
        let (mut coord, mut store) = seeded();
        coord
            .submit(&mut store, MutationIntent::Delete(ExpenseId::new("1")))
            .unwrap();
        let view = filter(store.records(), &FilterCriteria::default());
        assert!(view.iter().all(|r| r.id.as_str() != "1"));
    }

    #[test]
    fn test_remote_failure_leaves_store_unchanged() {
        let (mut coord, mut store) = seeded();
        let before = store.records().to_vec();
        let revision = store.revision();
        coord.backend_mut().fail = true;

        let err = coord
            .submit(&mut store, MutationIntent::Delete(ExpenseId::new("1")))
            .unwrap_err();
        assert!(err.is_remote());
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(store.revision(), revision);
        assert_eq!(coord.phase(), MutationPhase::Failed);

        coord.acknowledge();
        assert_eq!(coord.phase(), MutationPhase::Idle);
    }

    #[test]
    fn test_unknown_id_makes_no_remote_call() {
        let (mut coord, mut store) = seeded();
        let calls = coord.backend_mut().calls;
        let err = coord
            .submit(&mut store, MutationIntent::Delete(ExpenseId::new("nope")))
            .unwrap_err();
        assert!(matches!(err, SpendError::NotFound(_)));
        assert_eq!(coord.backend_mut().calls, calls);
        assert_eq!(coord.phase(), MutationPhase::Idle);
    }

    #[test]
    fn test_update_can_clear_category() {
        let (mut coord, mut store) = seeded();
        let patch = ExpensePatch {
            category: Some(None),
            ..Default::default()
        };
        coord
            .submit(
                &mut store,
                MutationIntent::Update {
                    id: ExpenseId::new("1"),
                    patch,
                },
            )
            .unwrap();
        assert_eq!(store.get(&ExpenseId::new("1")).unwrap().category, None);
        assert_eq!(coord.backend_mut().remote[0].category, None);
    }

    #[test]
    fn test_phase_settles_after_each_submit() {
        let (mut coord, mut store) = seeded();
        coord
            .submit(&mut store, MutationIntent::Delete(ExpenseId::new("2")))
            .unwrap();
        assert_eq!(coord.phase(), MutationPhase::Succeeded);

        coord.backend_mut().fail = true;
        coord
            .submit(&mut store, MutationIntent::Delete(ExpenseId::new("1")))
            .unwrap_err();
        assert_eq!(coord.phase(), MutationPhase::Failed);

        // the next submit starts from Idle; local rejections leave it there
        coord
            .submit(&mut store, MutationIntent::Delete(ExpenseId::new("nope")))
            .unwrap_err();
        assert_eq!(coord.phase(), MutationPhase::Idle);
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        let (mut coord, mut store) = seeded();
        let err = coord
            .submit(
                &mut store,
                MutationIntent::Update {
                    id: ExpenseId::new("1"),
                    patch: ExpensePatch::default(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, SpendError::Validation(_)));
    }
}
