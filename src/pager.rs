use crate::data::{Cursor, PageReference};
use crate::source::{CatalogSource, SourceError};
use tracing::{debug, info};

/// Result of one listing request.
#[derive(Debug, Clone)]
pub struct PageLoad {
    pub references: Vec<PageReference>,
    pub next: Cursor,
    pub total: Option<u64>,
}

/// Fetches the page the cursor points at. Returns `Ok(None)` without touching
/// the network once the cursor is exhausted.
pub async fn load_next_page<S>(source: &S, cursor: &Cursor) -> Result<Option<PageLoad>, SourceError>
where
    S: CatalogSource + ?Sized,
{
    let Some(url) = cursor.url() else {
        debug!("listing exhausted, nothing to fetch");
        return Ok(None);
    };
    let page = source.fetch_page(url).await?;
    info!(
        %url,
        references = page.results.len(),
        has_next = page.next.is_some(),
        "Loaded listing page"
    );
    Ok(Some(PageLoad {
        references: page.results,
        next: Cursor::from_next(page.next),
        total: page.count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{MemorySource, record_url};

    const FIRST: &str = "mem://pokemon?limit=2";
    const SECOND: &str = "mem://pokemon?offset=2&limit=2";

    #[tokio::test]
    async fn follows_next_cursor() {
        let source = MemorySource::new()
            .page(FIRST, Some(SECOND), &["bulbasaur", "ivysaur"])
            .page(SECOND, None, &["venusaur"]);

        let first = load_next_page(&source, &Cursor::start(FIRST))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.references.len(), 2);
        assert_eq!(first.references[0].url, record_url("bulbasaur"));
        assert_eq!(first.next.url(), Some(SECOND));
        assert_eq!(first.total, Some(151));

        let second = load_next_page(&source, &first.next).await.unwrap().unwrap();
        assert!(second.next.is_exhausted());
    }

    #[tokio::test]
    async fn exhausted_cursor_skips_the_network() {
        let source = MemorySource::new();
        let result = load_next_page(&source, &Cursor::exhausted()).await.unwrap();
        assert!(result.is_none());
        assert_eq!(source.page_calls(), 0);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let source = MemorySource::new()
            .page(FIRST, None, &["bulbasaur"])
            .fail_once(FIRST);
        let err = load_next_page(&source, &Cursor::start(FIRST))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 503, .. }));
    }
}
