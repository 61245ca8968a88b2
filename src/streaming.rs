//! Relaying a streamed inference response to a live connection.

use futures_util::StreamExt;
use std::time::Duration;

use crate::accumulator::ReplyAccumulator;
use crate::providers::ModelFamily;
use crate::push::ConnectionPusher;
use crate::{ChunkStream, Error, LiveConnection};

/// Consume `chunks` in arrival order, pushing each fragment to `connection`
/// before the next chunk is read. Returns the full reply.
///
/// Every chunk read is bounded by `read_timeout`. The first decode, extract
/// or push failure aborts the relay.
pub async fn relay_stream(
    family: ModelFamily,
    mut chunks: ChunkStream,
    pusher: &dyn ConnectionPusher,
    connection: &LiveConnection,
    read_timeout: Duration,
) -> Result<String, Error> {
    let mut accumulator = ReplyAccumulator::new(family);

    loop {
        let next = tokio::time::timeout(read_timeout, chunks.next())
            .await
            .map_err(|_| Error::streaming(format!("no chunk received within {read_timeout:?}")))?;
        let Some(chunk) = next else {
            break;
        };

        if let Some(fragment) = accumulator.process_chunk(&chunk?)? {
            tracing::debug!(
                connection_id = %connection.connection_id,
                fragment = %fragment,
                "chunk text sent to client"
            );
            pusher.post(connection, &fragment).await?;
        }
    }

    tracing::info!(
        fragments = accumulator.fragment_count(),
        "stream relayed"
    );
    Ok(accumulator.finalize())
}
