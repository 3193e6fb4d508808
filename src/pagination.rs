//! Lazy record streams over the two Incydr pagination styles.
//!
//! - **Page number** (cases, users, devices, watchlists, ...): request
//!   `first, first + 1, ...` and stop after a page holds fewer records than
//!   the page size. An exactly-full last page costs one extra empty request.
//! - **Page token** (file events): start from an empty token, then send back
//!   the server's `nextPgToken` until it is null/empty or a batch is empty.
//!
//! Both return a `Stream` of individual records. Nothing is requested until
//! the stream is polled, and dropping it stops paging. Calling the resource's
//! `iter_all` again restarts from the first page.

use futures::stream::{self, Stream, TryStreamExt};
use std::future::Future;

use crate::error::{IncydrError, Result};

/// Streams records from a page-number API.
///
/// `fetch(page)` returns the records of one page. Paging stops when a page
/// returns fewer than `page_size` records.
pub fn paginate_by_number<'a, T, F, Fut>(
    first_page: u32,
    page_size: usize,
    fetch: F,
) -> impl Stream<Item = Result<T>> + 'a
where
    T: 'a,
    F: FnMut(u32) -> Fut + 'a,
    Fut: Future<Output = Result<Vec<T>>> + 'a,
{
    let page_size = page_size.max(1);
    stream::try_unfold(
        (fetch, Some(first_page)),
        move |(mut fetch, next)| async move {
            let Some(page) = next else {
                return Ok::<_, IncydrError>(None);
            };
            let records = fetch(page).await?;
            tracing::trace!(page, count = records.len(), "fetched page");
            let next = if records.len() < page_size {
                None
            } else {
                Some(page + 1)
            };
            Ok(Some((records, (fetch, next))))
        },
    )
    .map_ok(|records| stream::iter(records.into_iter().map(Ok::<T, IncydrError>)))
    .try_flatten()
}

/// Streams records from a page-token API.
///
/// `fetch(token)` returns one batch and the server's next token. The first
/// call receives an empty token.
pub fn paginate_by_token<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = Result<T>> + 'a
where
    T: 'a,
    F: FnMut(String) -> Fut + 'a,
    Fut: Future<Output = Result<(Vec<T>, Option<String>)>> + 'a,
{
    stream::try_unfold(
        (fetch, Some(String::new())),
        |(mut fetch, next)| async move {
            let Some(token) = next else {
                return Ok::<_, IncydrError>(None);
            };
            let (records, next_token) = fetch(token).await?;
            tracing::trace!(count = records.len(), "fetched token page");
            let next = match next_token {
                Some(t) if !t.is_empty() && !records.is_empty() => Some(t),
                _ => None,
            };
            Ok(Some((records, (fetch, next))))
        },
    )
    .map_ok(|records| stream::iter(records.into_iter().map(Ok::<T, IncydrError>)))
    .try_flatten()
}

/// Drains a record stream into a `Vec`, stopping at the first error.
pub async fn collect_all<T>(records: impl Stream<Item = Result<T>>) -> Result<Vec<T>> {
    records.try_collect().await
}
