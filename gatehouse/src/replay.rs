//! Replay of stored cache entries through the connector-interceptor slot.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use gatehouse_core::{ApiRequest, Connector, ConnectorInterceptor, ProxyError, ProxyResponse};
use gatehouse_store::EntryStream;

/// Connector interceptor that short-circuits the upstream transport with a
/// cached entry.
///
/// Installed on the request context by the caching policy on a hit. The
/// produced connector opens no network connection: it emits the stored head
/// synchronously and pumps body chunks in arrival order until the entry
/// stream ends. The entry is single shot, so exactly one response is
/// produced; asking again is an error.
pub struct ReplayInterceptor {
    entry: Arc<Mutex<Option<EntryStream>>>,
}

impl ReplayInterceptor {
    /// Wraps the entry to replay.
    pub fn new(entry: EntryStream) -> Self {
        ReplayInterceptor {
            entry: Arc::new(Mutex::new(Some(entry))),
        }
    }
}

impl ConnectorInterceptor for ReplayInterceptor {
    fn connector(&self) -> Box<dyn Connector> {
        Box::new(ReplayConnector {
            entry: Arc::clone(&self.entry),
        })
    }
}

struct ReplayConnector {
    entry: Arc<Mutex<Option<EntryStream>>>,
}

#[async_trait]
impl Connector for ReplayConnector {
    async fn connect(&self, _request: ApiRequest) -> Result<ProxyResponse, ProxyError> {
        let entry = self
            .entry
            .lock()
            .map_err(|_| ProxyError::new("replay state poisoned"))?
            .take()
            .ok_or_else(|| ProxyError::new("cached entry already replayed"))?;
        let (head, body) = entry.into_parts();
        // Store-side read failures surface as upstream transport errors.
        let body = body.map(|chunk| chunk.map_err(ProxyError::new)).boxed();
        Ok(ProxyResponse::new(head, body))
    }
}
