//! Incremental mapping over large collections.

/// Default number of items processed between yields.
pub const DEFAULT_CHUNK_SIZE: usize = 150;

/// Map `items` through `f` in slices of `chunk_size`, yielding to the runtime
/// between slices so no single poll runs longer than one slice's work.
///
/// Output order matches input order. An empty input resolves without
/// yielding. The first error from `f` fails the whole operation; callers
/// that need a result anyway fall back to a single synchronous pass.
pub async fn map_chunked<T, R, E, F>(items: &[T], mut f: F, chunk_size: usize) -> Result<Vec<R>, E>
where
    F: FnMut(&T) -> Result<R, E>,
{
    let chunk_size = chunk_size.max(1);
    let mut out = Vec::with_capacity(items.len());

    for (index, chunk) in items.chunks(chunk_size).enumerate() {
        if index > 0 {
            tokio::task::yield_now().await;
        }
        for item in chunk {
            out.push(f(item)?);
        }
    }

    Ok(out)
}
