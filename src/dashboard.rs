use rust_decimal::Decimal;

use crate::api::ExpenseBackend;
use crate::error::Result;
use crate::filter::{available_years, filter, FilterCriteria};
use crate::models::ExpenseRecord;
use crate::mutation::{MutationCoordinator, MutationIntent, MutationOutcome};
use crate::paginate::Paginator;
use crate::reports;
use crate::store::RecordStore;

/// Store + criteria + page state. The filtered list is recomputed whenever
/// the store or the criteria change, and every recompute returns to page 1.
pub struct Dashboard {
    store: RecordStore,
    criteria: FilterCriteria,
    paginator: Paginator,
    filtered: Vec<ExpenseRecord>,
}

impl Dashboard {
    pub fn new(store: RecordStore, criteria: FilterCriteria, page_size: usize) -> Result<Self> {
        let paginator = Paginator::new(page_size)?;
        let filtered = filter(store.records(), &criteria);
        Ok(Self {
            store,
            criteria,
            paginator,
            filtered,
        })
    }

    fn recompute(&mut self) {
        self.filtered = filter(self.store.records(), &self.criteria);
        self.paginator.reset();
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.recompute();
    }

    pub fn set_search(&mut self, term: Option<String>) {
        let term = term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self.criteria.search_term = term;
        self.recompute();
    }

    pub fn filtered(&self) -> &[ExpenseRecord] {
        &self.filtered
    }

    pub fn filtered_total(&self) -> Decimal {
        reports::total(&self.filtered)
    }

    pub fn years(&self) -> Vec<i32> {
        available_years(self.store.records())
    }

    // -- pagination --------------------------------------------------------

    pub fn page(&self) -> &[ExpenseRecord] {
        self.paginator.page(&self.filtered)
    }

    pub fn current_page(&self) -> usize {
        self.paginator.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages(self.filtered.len())
    }

    pub fn page_size(&self) -> usize {
        self.paginator.page_size()
    }

    pub fn next_page(&mut self) -> bool {
        self.paginator.next(self.filtered.len())
    }

    pub fn prev_page(&mut self) -> bool {
        self.paginator.prev()
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.paginator.go_to(page, self.filtered.len())
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        self.paginator.set_page_size(page_size)
    }

    // -- store changes -----------------------------------------------------

    pub fn reload<B: ExpenseBackend>(&mut self, coord: &mut MutationCoordinator<B>) -> Result<()> {
        coord.load(&mut self.store)?;
        self.recompute();
        Ok(())
    }

    /// Run a mutation and refresh the derived views if the store changed.
    pub fn apply<B: ExpenseBackend>(
        &mut self,
        coord: &mut MutationCoordinator<B>,
        intent: MutationIntent,
    ) -> Result<MutationOutcome> {
        let before = self.store.revision();
        let result = coord.submit(&mut self.store, intent);
        if self.store.revision() != before {
            self.recompute();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::record;

    fn dashboard(n: usize, page_size: usize) -> Dashboard {
        let records = (0..n)
            .map(|i| {
                let month = i % 2 + 1;
                record(&i.to_string(), &format!("2024-0{month}-10"), "1", None)
            })
            .collect();
        Dashboard::new(RecordStore::new(records), FilterCriteria::default(), page_size).unwrap()
    }

    #[test]
    fn test_paging_over_filtered_view() {
        let mut d = dashboard(125, 60);
        assert_eq!(d.total_pages(), 3);
        assert!(d.next_page());
        assert!(d.next_page());
        assert_eq!(d.page().len(), 5);
        assert!(!d.next_page());
    }

    #[test]
    fn test_criteria_change_resets_page() {
        let mut d = dashboard(125, 10);
        d.go_to_page(5);
        d.set_criteria(FilterCriteria::new(Some(1), Some(2024), None).unwrap());
        assert_eq!(d.current_page(), 1);
        assert_eq!(d.filtered().len(), 63);
    }

    #[test]
    fn test_search_change_resets_page() {
        let mut d = dashboard(30, 10);
        d.next_page();
        d.set_search(Some("2024-02".into()));
        assert_eq!(d.current_page(), 1);
        assert_eq!(d.filtered().len(), 15);
    }

    #[test]
    fn test_filtered_total() {
        let d = dashboard(7, 60);
        assert_eq!(d.filtered_total(), Decimal::from(7));
        assert_eq!(d.years(), vec![2024]);
    }
}
