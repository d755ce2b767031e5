use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use schoolfinder_core::paging::{self, DEFAULT_PAGE_SIZE};
use schoolfinder_core::{Page, PageRequest, PageToken, RecordSource, School, SourceError};

/// Pre-programmed responses for deterministic testing without a network.
pub enum MockResponse {
    Page(Page),
    Error(SourceError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    /// Page of `results` followed by `next` (if any).
    pub fn page(results: Vec<School>, next: Option<&str>) -> Self {
        Self::Page(Page {
            results,
            next_page_token: next.map(PageToken::from_raw),
        })
    }

    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Source that replays responses in sequence and records every request.
pub struct MockSource {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<PageRequest>>,
    call_count: AtomicUsize,
}

impl MockSource {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl RecordSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().push(request.clone());

        let next = self.responses.lock().pop_front();
        let Some(mut current) = next else {
            return Err(SourceError::Unavailable(format!(
                "no more mock responses (call {idx})"
            )));
        };

        loop {
            match current {
                MockResponse::Page(page) => return Ok(page),
                MockResponse::Error(e) => return Err(e),
                MockResponse::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    current = *inner;
                }
            }
        }
    }
}

/// In-memory listing served with offset tokens, like the catalog but
/// without a database.
pub struct StaticSource {
    schools: Vec<School>,
    page_size: usize,
}

impl StaticSource {
    pub fn new(schools: Vec<School>) -> Self {
        Self::with_page_size(schools, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(schools: Vec<School>, page_size: usize) -> Self {
        Self {
            schools,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let offset = paging::offset_from(request.token.as_ref())?;
        let matching: Vec<&School> = match request.query.as_deref() {
            Some(q) => {
                let q = q.trim().to_lowercase();
                self.schools
                    .iter()
                    .filter(|s| {
                        s.name.to_lowercase().contains(&q) || s.address.lga.to_lowercase().contains(&q)
                    })
                    .collect()
            }
            None => self.schools.iter().collect(),
        };

        let results = matching
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|s| (*s).clone())
            .collect();

        Ok(Page {
            results,
            next_page_token: paging::next_token(offset, self.page_size, matching.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schools(n: usize) -> Vec<School> {
        (1..=n)
            .map(|i| School::new(format!("s{i}"), format!("School {i}"), if i % 2 == 0 { "Lekki" } else { "Ikeja" }))
            .collect()
    }

    #[tokio::test]
    async fn replays_in_order_then_runs_dry() {
        let source = MockSource::new(vec![
            MockResponse::page(schools(2), Some("t1")),
            MockResponse::Error(SourceError::Unavailable("boom".into())),
        ]);

        let page = source.fetch_page(&PageRequest::first()).await.unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.next_page_token.unwrap().as_str(), "t1");

        let err = source
            .fetch_page(&PageRequest::after(PageToken::from_raw("t1")))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));

        let err = source.fetch_page(&PageRequest::first()).await.unwrap_err();
        assert!(err.to_string().contains("no more mock responses"));
        assert_eq!(source.call_count(), 3);
        assert_eq!(source.requests()[1].token.as_ref().unwrap().as_str(), "t1");
    }

    #[tokio::test(start_paused = true)]
    async fn delay_unwraps_nested() {
        let source = MockSource::new(vec![MockResponse::delayed(
            Duration::from_millis(500),
            MockResponse::delayed(Duration::from_millis(500), MockResponse::page(vec![], None)),
        )]);
        let started = tokio::time::Instant::now();
        let page = source.fetch_page(&PageRequest::first()).await.unwrap();
        assert!(!page.has_more());
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn static_source_pages_and_filters() {
        let source = StaticSource::with_page_size(schools(7), 3);
        let first = source.fetch_page(&PageRequest::first()).await.unwrap();
        assert_eq!(first.results.len(), 3);
        let token = first.next_page_token.unwrap();
        assert_eq!(token.as_str(), "3");

        let last = source
            .fetch_page(&PageRequest::after(PageToken::from_raw("6")))
            .await
            .unwrap();
        assert_eq!(last.results.len(), 1);
        assert!(!last.has_more());

        let lekki = source
            .fetch_page(&PageRequest::first().with_query(Some("LEKKI".into())))
            .await
            .unwrap();
        assert_eq!(lekki.results.len(), 3);
        assert!(!lekki.has_more());
        assert!(lekki.results.iter().all(|s| s.address.lga == "Lekki"));
    }
}
