use bytes::Bytes;
use futures::future;
use futures::stream::{BoxStream, Stream, StreamExt};

use crate::error::StreamError;

/// Raw generation output, forwarded chunk by chunk as it arrives.
///
/// Finite and not restartable. Ends after the first `Err` item. Dropping it
/// closes the underlying connection.
pub type GenerationStream = BoxStream<'static, Result<Bytes, StreamError>>;

/// Forward the body of a streaming response without interpreting it
pub fn forward_chunks(response: reqwest::Response) -> GenerationStream {
    let url = response.url().clone();
    let chunks = response.bytes_stream().map(move |item| {
        item.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Generation stream read failed");
            StreamError::Read(e)
        })
    });

    fuse_on_error(chunks).boxed()
}

/// Yield items up to and including the first error, then end
pub fn fuse_on_error<S, T, E>(stream: S) -> impl Stream<Item = Result<T, E>>
where
    S: Stream<Item = Result<T, E>>,
{
    stream.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        *failed = item.is_err();
        future::ready(Some(item))
    })
}
