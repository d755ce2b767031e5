use async_trait::async_trait;
use tracing::debug;

use schoolfinder_core::paging::{self, DEFAULT_PAGE_SIZE};
use schoolfinder_core::{Page, PageRequest, RecordSource, SourceError};

use crate::schools::SchoolRepo;

/// Serves the stored catalog in fixed-size pages. The continuation token
/// is the decimal offset of the next page.
pub struct CatalogSource {
    repo: SchoolRepo,
    page_size: usize,
}

impl CatalogSource {
    pub fn new(repo: SchoolRepo) -> Self {
        Self::with_page_size(repo, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(repo: SchoolRepo, page_size: usize) -> Self {
        Self {
            repo,
            page_size: page_size.max(1),
        }
    }

    pub fn repo(&self) -> &SchoolRepo {
        &self.repo
    }
}

#[async_trait]
impl RecordSource for CatalogSource {
    fn name(&self) -> &str {
        "catalog"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let offset = paging::offset_from(request.token.as_ref())?;

        let (results, total) = match request.query.as_deref() {
            Some(query) => (
                self.repo.search(query, offset, self.page_size)?,
                self.repo.count_matching(query)?,
            ),
            None => (self.repo.page(offset, self.page_size)?, self.repo.count()?),
        };

        debug!(offset, returned = results.len(), total, "catalog page served");

        Ok(Page {
            results,
            next_page_token: paging::next_token(offset, self.page_size, total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::seed::generate_catalog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use schoolfinder_core::PageToken;

    fn source(count: usize) -> CatalogSource {
        let repo = SchoolRepo::new(Database::in_memory().unwrap());
        repo.replace_all(&generate_catalog(count, &mut StdRng::seed_from_u64(9)))
            .unwrap();
        CatalogSource::new(repo)
    }

    #[tokio::test]
    async fn walks_all_pages_until_token_is_absent() {
        let source = source(60);
        let mut request = PageRequest::first();
        let mut seen = Vec::new();
        let mut pages = 0;
        loop {
            let page = source.fetch_page(&request).await.unwrap();
            pages += 1;
            seen.extend(page.results.into_iter().map(|s| s.id));
            match page.next_page_token {
                Some(token) => request = PageRequest::after(token),
                None => break,
            }
        }
        assert_eq!(pages, 6);
        assert_eq!(seen.len(), 60);
        assert_eq!(seen[10].as_str(), "gmap-11");
    }

    #[tokio::test]
    async fn short_last_page() {
        let source = source(15);
        let page = source
            .fetch_page(&PageRequest::after(PageToken::from_raw("10")))
            .await
            .unwrap();
        assert_eq!(page.results.len(), 5);
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn query_narrows_and_paginates_matches() {
        let source = source(40);
        // Every fourth generated record is in Surulere.
        let page = source
            .fetch_page(&PageRequest::first().with_query(Some("surulere".into())))
            .await
            .unwrap();
        assert_eq!(page.results.len(), 10);
        assert!(page.results.iter().all(|s| s.address.lga == "Surulere"));
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let source = source(5);
        let err = source
            .fetch_page(&PageRequest::after(PageToken::from_raw("CqQCF2f")))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn out_of_range_offset_is_rejected() {
        let source = source(5);
        let err = source
            .fetch_page(&PageRequest::after(PageToken::from_raw("18446744073709551615")))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn empty_catalog_yields_empty_final_page() {
        let source = CatalogSource::new(SchoolRepo::new(Database::in_memory().unwrap()));
        let page = source.fetch_page(&PageRequest::first()).await.unwrap();
        assert!(page.results.is_empty());
        assert!(!page.has_more());
        assert_eq!(source.name(), "catalog");
    }
}
