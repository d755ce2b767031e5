use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::SourceError;
use crate::ids::PageToken;
use crate::school::School;

/// One page request. `token == None` asks for the first page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub token: Option<PageToken>,
    pub query: Option<String>,
}

impl PageRequest {
    pub fn first() -> Self {
        Self::default()
    }

    pub fn after(token: PageToken) -> Self {
        Self {
            token: Some(token),
            query: None,
        }
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.trim().is_empty());
        self
    }
}

/// One page of records. This is also the `/api/places` response body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub results: Vec<School>,
    /// `None` when the source has nothing further.
    #[serde(default)]
    pub next_page_token: Option<PageToken>,
}

impl Page {
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// A paginated supplier of school records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &str;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError>;
}
