use std::future::Future;

use crate::Pagination;

/// Drive a page-returning function until it yields an empty batch.
///
/// `fetch` is called with the current window, starting from `initial` (or
/// the default window). A non-empty batch advances the window by one page
/// (`page + 1`, `offset + page_size`) and the walk continues; an empty
/// batch ends it. Calls are strictly sequential: the next page is not
/// requested until the previous call has completed.
///
/// There is no iteration bound beyond the data source running dry; the
/// caller is responsible for supplying a function that terminates. Errors
/// from `fetch` propagate immediately and stop the walk.
pub async fn walk_pages<T, E, F, Fut>(
    mut fetch: F,
    initial: Option<Pagination>,
) -> Result<(), E>
where
    F: FnMut(Pagination) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let mut window = initial.unwrap_or_default();

    loop {
        let batch = fetch(window).await?;
        if batch.is_empty() {
            return Ok(());
        }

        window = Pagination {
            page: window.page.saturating_add(1),
            page_size: window.page_size,
            offset: window.offset.saturating_add(window.page_size),
        };
    }
}
