use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use schoolfinder_core::school::Coordinates;
use schoolfinder_core::{
    Criterion, CriterionField, FilterCriteria, PageRequest, PageToken, RecordSource, School,
    SchoolId, SessionId,
};

use crate::error::DirectoryError;
use crate::filter;
use crate::selection::{CompareSelection, ComparisonTable, Favorites, SelectionChange, SelectionError};

/// Shared "fetch in flight" flag. Clones observe the same flag, so a scroll
/// trigger running elsewhere can check it before asking for the next page.
#[derive(Clone, Debug, Default)]
pub struct FetchStatus(Arc<AtomicBool>);

impl FetchStatus {
    pub fn is_fetching(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn begin(&self) -> FetchGuard {
        self.0.store(true, Ordering::Release);
        FetchGuard(self.0.clone())
    }
}

/// Clears the flag on every exit path, including a dropped future.
struct FetchGuard(Arc<AtomicBool>);

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Append requested with no cursor; nothing was fetched.
    Exhausted,
    Loaded {
        received: usize,
        total: usize,
        has_more: bool,
    },
}

/// One browsing session's view of the directory.
pub struct DirectoryState {
    session_id: SessionId,
    source: Arc<dyn RecordSource>,
    records: Vec<School>,
    filtered: Vec<School>,
    criteria: FilterCriteria,
    query: Option<String>,
    page_cursor: Option<PageToken>,
    status: FetchStatus,
    compare: CompareSelection,
    favorites: Favorites,
}

impl DirectoryState {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            session_id: SessionId::new(),
            source,
            records: Vec::new(),
            filtered: Vec::new(),
            criteria: FilterCriteria::default(),
            query: None,
            page_cursor: None,
            status: FetchStatus::default(),
            compare: CompareSelection::default(),
            favorites: Favorites::default(),
        }
    }

    /// Start from records already in hand, e.g. a bundled catalog.
    pub fn with_records(source: Arc<dyn RecordSource>, records: Vec<School>) -> Self {
        let mut state = Self::new(source);
        state.filtered = records.clone();
        state.records = records;
        state
    }

    /// Load one page. `append` continues from the cursor and concatenates;
    /// otherwise the first page replaces the record set. The current
    /// criteria are re-applied afterwards. On failure nothing changes.
    #[instrument(skip(self), fields(session_id = %self.session_id, source = self.source.name()))]
    pub async fn fetch(&mut self, append: bool) -> Result<FetchOutcome, DirectoryError> {
        let token = match (append, &self.page_cursor) {
            (true, None) => {
                debug!("no cursor, nothing to append");
                return Ok(FetchOutcome::Exhausted);
            }
            (true, Some(cursor)) => Some(cursor.clone()),
            (false, _) => None,
        };
        let request = PageRequest {
            token,
            query: self.query.clone(),
        };

        let result = {
            let _guard = self.status.begin();
            self.source.fetch_page(&request).await
        };

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), append, "fetch failed");
                return Err(e.into());
            }
        };

        let received = page.results.len();
        if append {
            self.records.extend(page.results);
        } else {
            self.records = page.results;
        }
        self.page_cursor = page.next_page_token;
        self.apply_filters();

        debug!(received, total = self.records.len(), filtered = self.filtered.len(), "page loaded");
        Ok(FetchOutcome::Loaded {
            received,
            total: self.records.len(),
            has_more: self.page_cursor.is_some(),
        })
    }

    /// Replace one criterion. Call [`apply_filters`](Self::apply_filters)
    /// to see the effect.
    pub fn set_criterion(&mut self, criterion: Criterion) {
        self.criteria.set(criterion);
    }

    /// Flip one value of a multi-value criterion. Returns whether the value
    /// is now selected. Does not recompute.
    pub fn toggle_criterion_value(
        &mut self,
        field: CriterionField,
        value: impl Into<String>,
    ) -> Result<bool, DirectoryError> {
        let values = self
            .criteria
            .values_mut(field)
            .ok_or(DirectoryError::NotToggleable(field))?;
        let value = value.into();
        if values.remove(&value) {
            Ok(false)
        } else {
            values.insert(value);
            Ok(true)
        }
    }

    /// Free-text query sent with the next fetch. Blank clears it.
    pub fn set_query(&mut self, query: Option<String>) {
        self.query = query.filter(|q| !q.trim().is_empty());
    }

    pub fn apply_filters(&mut self) {
        self.filtered = filter::apply(&self.records, &self.criteria);
    }

    pub fn reset_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.filtered = self.records.clone();
    }

    pub fn toggle_compare(&mut self, school: &School) -> Result<SelectionChange, SelectionError> {
        let result = self.compare.toggle(school);
        if let Err(e) = &result {
            info!(session_id = %self.session_id, school_id = %school.id, "{e}");
        }
        result
    }

    pub fn clear_compare(&mut self) {
        self.compare.clear();
    }

    pub fn toggle_favorite(&mut self, school: &School) -> bool {
        self.favorites.toggle(school)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn records(&self) -> &[School] {
        &self.records
    }

    pub fn filtered(&self) -> &[School] {
        &self.filtered
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn page_cursor(&self) -> Option<&PageToken> {
        self.page_cursor.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.page_cursor.is_some()
    }

    pub fn is_fetching(&self) -> bool {
        self.status.is_fetching()
    }

    pub fn fetch_status(&self) -> FetchStatus {
        self.status.clone()
    }

    pub fn compare(&self) -> &CompareSelection {
        &self.compare
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn is_favorite(&self, id: &SchoolId) -> bool {
        self.favorites.contains(id)
    }

    pub fn in_compare(&self, id: &SchoolId) -> bool {
        self.compare.contains(id)
    }

    /// First loaded record with this id.
    pub fn find(&self, id: &SchoolId) -> Option<&School> {
        self.records.iter().find(|s| &s.id == id)
    }

    pub fn comparison_table(&self) -> ComparisonTable {
        ComparisonTable::build(self.compare.as_slice())
    }

    /// Where a map of the filtered view should center.
    pub fn map_center(&self) -> Coordinates {
        self.filtered
            .first()
            .map(|s| s.coordinates)
            .unwrap_or(Coordinates::LAGOS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use schoolfinder_core::SourceError;
    use schoolfinder_places::{MockResponse, MockSource, StaticSource};

    fn school(id: &str) -> School {
        School::new(id, format!("School {id}"), "Lekki")
    }

    fn page(ids: &[&str], next: Option<&str>) -> MockResponse {
        MockResponse::page(ids.iter().map(|id| school(id)).collect(), next)
    }

    fn ids(schools: &[School]) -> Vec<&str> {
        schools.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn first_fetch_replaces_and_append_accumulates() {
        let source = Arc::new(MockSource::new(vec![
            page(&["a", "b"], Some("t1")),
            page(&["c", "a"], None),
        ]));
        let mut state = DirectoryState::new(source.clone());

        let outcome = state.fetch(false).await.unwrap();
        assert_eq!(
            outcome,
            FetchOutcome::Loaded { received: 2, total: 2, has_more: true }
        );
        assert_eq!(state.page_cursor().unwrap().as_str(), "t1");

        let outcome = state.fetch(true).await.unwrap();
        assert_eq!(
            outcome,
            FetchOutcome::Loaded { received: 2, total: 4, has_more: false }
        );
        // Duplicates across pages pass through.
        assert_eq!(ids(state.records()), ["a", "b", "c", "a"]);
        assert_eq!(ids(state.filtered()), ["a", "b", "c", "a"]);
        assert!(!state.has_more());
        assert_eq!(source.requests()[1].token.as_ref().unwrap().as_str(), "t1");
    }

    #[tokio::test]
    async fn append_without_cursor_never_calls_source() {
        let source = Arc::new(MockSource::new(vec![]));
        let mut state = DirectoryState::new(source.clone());
        assert_eq!(state.fetch(true).await.unwrap(), FetchOutcome::Exhausted);
        assert_eq!(source.call_count(), 0);
        assert!(!state.is_fetching());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_state_unchanged() {
        let source = Arc::new(MockSource::new(vec![
            page(&["a", "b"], Some("t1")),
            MockResponse::Error(SourceError::Unavailable("reset".into())),
        ]));
        let mut state = DirectoryState::new(source);
        state.fetch(false).await.unwrap();

        let err = state.fetch(true).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Source(SourceError::Unavailable(_))));
        assert!(err.is_retryable());
        assert!(!state.is_fetching());
        assert_eq!(ids(state.records()), ["a", "b"]);
        assert_eq!(ids(state.filtered()), ["a", "b"]);
        assert_eq!(state.page_cursor().unwrap().as_str(), "t1");
    }

    #[tokio::test(start_paused = true)]
    async fn fetching_flag_is_observable_during_fetch() {
        let source = Arc::new(MockSource::new(vec![MockResponse::delayed(
            Duration::from_secs(1),
            page(&["a"], None),
        )]));
        let mut state = DirectoryState::new(source);
        let status = state.fetch_status();

        let handle = tokio::spawn(async move {
            state.fetch(false).await.unwrap();
            state
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(status.is_fetching());

        let state = handle.await.unwrap();
        assert!(!status.is_fetching());
        assert_eq!(state.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_fetch_clears_flag() {
        let source = Arc::new(MockSource::new(vec![MockResponse::delayed(
            Duration::from_secs(60),
            page(&["a"], None),
        )]));
        let mut state = DirectoryState::new(source);
        let status = state.fetch_status();

        let timed_out = tokio::time::timeout(Duration::from_secs(1), state.fetch(false)).await;
        assert!(timed_out.is_err());
        assert!(!status.is_fetching());
        assert!(state.records().is_empty());
    }

    #[tokio::test]
    async fn accumulated_pages_respect_current_criteria() {
        let mut ikeja = school("c");
        ikeja.address.lga = "Ikeja".into();
        let source = Arc::new(MockSource::new(vec![
            page(&["a", "b"], Some("t1")),
            MockResponse::page(vec![ikeja], None),
        ]));
        let mut state = DirectoryState::new(source);
        state.fetch(false).await.unwrap();
        state.set_criterion(Criterion::Locations(["Ikeja".to_string()].into()));
        state.apply_filters();
        assert!(state.filtered().is_empty());

        state.fetch(true).await.unwrap();
        assert_eq!(ids(state.filtered()), ["c"]);
    }

    #[tokio::test]
    async fn query_is_forwarded() {
        let source = Arc::new(MockSource::new(vec![page(&[], None)]));
        let mut state = DirectoryState::new(source.clone());
        state.set_query(Some("lekki".into()));
        state.fetch(false).await.unwrap();
        assert_eq!(source.requests()[0].query.as_deref(), Some("lekki"));

        state.set_query(Some("  ".into()));
        assert!(state.query().is_none());
    }

    #[tokio::test]
    async fn walks_offset_pages_until_exhausted() {
        let schools: Vec<School> = (0..25).map(|i| school(&format!("s{i}"))).collect();
        let mut state = DirectoryState::new(Arc::new(StaticSource::new(schools)));
        state.fetch(false).await.unwrap();
        while state.has_more() {
            state.fetch(true).await.unwrap();
        }
        assert_eq!(state.records().len(), 25);
        assert_eq!(state.fetch(true).await.unwrap(), FetchOutcome::Exhausted);
    }

    #[test]
    fn set_criterion_does_not_recompute() {
        let mut state = DirectoryState::with_records(
            Arc::new(MockSource::new(vec![])),
            vec![school("a"), school("b")],
        );
        state.set_criterion(Criterion::Locations(["Ikeja".to_string()].into()));
        assert_eq!(state.filtered().len(), 2);
        state.apply_filters();
        assert!(state.filtered().is_empty());
    }

    #[test]
    fn toggle_criterion_value_flips_membership() {
        let mut state = DirectoryState::new(Arc::new(MockSource::new(vec![])));
        assert!(state.toggle_criterion_value(CriterionField::Curriculum, "British").unwrap());
        assert!(state.criteria().curriculum.contains("British"));
        assert!(!state.toggle_criterion_value(CriterionField::Curriculum, "British").unwrap());
        assert!(state.criteria().is_empty());

        let err = state
            .toggle_criterion_value(CriterionField::MinPrice, "100")
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotToggleable(CriterionField::MinPrice)));
    }

    #[test]
    fn end_to_end_filter_then_reset() {
        let mut a = school("A");
        a.curriculum = Some(vec!["British".into()]);
        a.school_type = Some("Day".into());
        a.facilities = Some(vec!["Pool".into(), "Bus".into()]);
        let mut b = school("B");
        b.curriculum = Some(vec!["Nigerian".into()]);
        b.school_type = Some("Boarding".into());
        b.facilities = Some(vec!["Pool".into()]);

        let mut state =
            DirectoryState::with_records(Arc::new(MockSource::new(vec![])), vec![a, b]);
        state.set_criterion(Criterion::Curriculum(["British".to_string()].into()));
        state.apply_filters();
        assert_eq!(ids(state.filtered()), ["A"]);

        state.set_criterion(Criterion::Facilities(
            ["Pool".to_string(), "Bus".to_string()].into(),
        ));
        state.set_criterion(Criterion::MaxPrice(Some(10)));
        state.apply_filters();
        assert!(state.filtered().is_empty());

        state.reset_filters();
        assert_eq!(ids(state.filtered()), ["A", "B"]);
        assert_eq!(state.criteria(), &FilterCriteria::default());
    }

    #[test]
    fn apply_filters_is_idempotent() {
        let mut records = vec![school("a"), school("b"), school("c")];
        records[1].address.lga = "Ikeja".into();
        let mut state = DirectoryState::with_records(Arc::new(MockSource::new(vec![])), records);
        state.set_criterion(Criterion::Locations(["Lekki".to_string()].into()));
        state.apply_filters();
        let first = state.filtered().to_vec();
        state.apply_filters();
        assert_eq!(state.filtered(), first.as_slice());
    }

    #[test]
    fn compare_and_favorites_through_state() {
        let mut state = DirectoryState::new(Arc::new(MockSource::new(vec![])));
        for id in ["a", "b", "c"] {
            state.toggle_compare(&school(id)).unwrap();
        }
        assert!(state.toggle_compare(&school("d")).is_err());
        assert_eq!(state.compare().len(), 3);
        assert!(state.in_compare(&SchoolId::from_raw("a")));
        assert_eq!(state.comparison_table().schools.len(), 3);
        state.clear_compare();
        assert!(state.compare().is_empty());

        assert!(state.toggle_favorite(&school("a")));
        assert!(state.is_favorite(&SchoolId::from_raw("a")));
        assert!(!state.toggle_favorite(&school("a")));
        assert!(state.favorites().is_empty());
    }

    #[test]
    fn lookup_and_map_center() {
        let mut a = school("a");
        a.coordinates = Coordinates { lat: 6.6, lng: 3.5 };
        let mut state = DirectoryState::new(Arc::new(MockSource::new(vec![])));
        assert_eq!(state.map_center(), Coordinates::LAGOS);

        state = DirectoryState::with_records(Arc::new(MockSource::new(vec![])), vec![a]);
        assert_eq!(state.map_center(), Coordinates { lat: 6.6, lng: 3.5 });
        assert_eq!(state.find(&SchoolId::from_raw("a")).unwrap().name, "School a");
        assert!(state.find(&SchoolId::from_raw("zz")).is_none());
    }
}
