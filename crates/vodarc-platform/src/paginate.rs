//! Cursor-pagination accumulation.

use std::future::Future;

use crate::error::PlatformResult;

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in page order
    pub items: Vec<T>,
    /// Cursor for the next page; empty when exhausted
    pub cursor: String,
}

/// Repeatedly invoke a listing operation, feeding each returned cursor back
/// as the `after` parameter, and merge all pages in page order.
///
/// The first invocation receives an empty cursor. Iteration stops only when
/// a page returns an empty cursor; no page-count cap is imposed here, so a
/// platform that never returns an empty cursor iterates unbounded — that
/// contract belongs to the platform API, and capping it here would silently
/// truncate results.
pub async fn accumulate<T, F, Fut>(mut fetch: F) -> PlatformResult<Vec<T>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = PlatformResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor = String::new();

    loop {
        let page = fetch(cursor).await?;
        items.extend(page.items);
        if page.cursor.is_empty() {
            return Ok(items);
        }
        cursor = page.cursor;
    }
}
