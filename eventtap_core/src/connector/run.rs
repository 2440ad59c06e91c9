use crate::Result;
use crate::connector::models::{RunStatus, UpsertDirective};
use crate::o11y::logger::{RunLogger, TracingLogger};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use futures_util::stream::BoxStream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use uuid::Uuid;

/// Per-run context handed to `Connector::update`.
#[derive(Clone)]
pub struct RunContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    logger: Arc<dyn RunLogger>,
}

impl RunContext {
    pub fn new(logger: Arc<dyn RunLogger>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            logger,
        }
    }

    /// Context that logs through `tracing`.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingLogger::new()))
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn logger(&self) -> &Arc<dyn RunLogger> {
        &self.logger
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// The upsert stream returned by `Connector::update`, guarded by the run's error boundary.
///
/// The first `Err` from the inner stream is logged as a severe message, the run is
/// marked `Aborted`, and the stream ends. Items yielded before the fault stay delivered.
pub struct UpdateRun {
    inner: Option<BoxStream<'static, Result<UpsertDirective>>>,
    logger: Arc<dyn RunLogger>,
    status: RunStatus,
    emitted: u64,
}

impl UpdateRun {
    pub fn guarded(
        ctx: &RunContext,
        inner: impl Stream<Item = Result<UpsertDirective>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Some(Box::pin(inner)),
            logger: ctx.logger.clone(),
            status: RunStatus::Running,
            emitted: 0,
        }
    }

    /// A run with nothing to do; already `Completed`.
    pub fn empty(ctx: &RunContext) -> Self {
        Self {
            inner: None,
            logger: ctx.logger.clone(),
            status: RunStatus::Completed,
            emitted: 0,
        }
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Number of directives yielded so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl Stream for UpdateRun {
    type Item = UpsertDirective;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(directive))) => {
                this.emitted += 1;
                Poll::Ready(Some(directive))
            }
            Poll::Ready(Some(Err(e))) => {
                let reason = e.to_string();
                this.logger.severe(&format!("Error occurred: {reason}"));
                this.status = RunStatus::Aborted { reason };
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Ready(None) => {
                this.status = RunStatus::Completed;
                this.inner = None;
                Poll::Ready(None)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Some(_) => (0, None),
            None => (0, Some(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::o11y::logger::{LogLevel, MemoryLogger};
    use futures_util::StreamExt;
    use futures_util::stream;

    fn directive(id: &str) -> UpsertDirective {
        let mut fields = serde_json::Map::new();
        fields.insert("event_id".to_string(), serde_json::json!(id));
        UpsertDirective::new("github_events", fields)
    }

    #[tokio::test]
    async fn completes_when_inner_is_exhausted() {
        let logger = MemoryLogger::new();
        let ctx = RunContext::new(Arc::new(logger.clone()));
        let mut run = UpdateRun::guarded(
            &ctx,
            stream::iter(vec![Ok(directive("1")), Ok(directive("2"))]),
        );
        assert_eq!(run.status(), &RunStatus::Running);

        let mut ids = Vec::new();
        while let Some(d) = run.next().await {
            ids.push(d.field("event_id").cloned().unwrap());
        }
        assert_eq!(ids, vec![serde_json::json!("1"), serde_json::json!("2")]);
        assert_eq!(run.status(), &RunStatus::Completed);
        assert_eq!(run.emitted(), 2);
        assert!(logger.messages_at(LogLevel::Severe).is_empty());
    }

    #[tokio::test]
    async fn first_error_aborts_and_keeps_earlier_items() {
        let logger = MemoryLogger::new();
        let ctx = RunContext::new(Arc::new(logger.clone()));
        let mut run = UpdateRun::guarded(
            &ctx,
            stream::iter(vec![
                Ok(directive("1")),
                Err(Error::BackendMessage("boom".to_string())),
                Ok(directive("never")),
            ]),
        );

        let got: Vec<_> = (&mut run).collect().await;
        assert_eq!(got.len(), 1);
        assert!(matches!(run.status(), RunStatus::Aborted { reason } if reason.contains("boom")));

        let severe = logger.messages_at(LogLevel::Severe);
        assert_eq!(severe, vec!["Error occurred: backend error: boom".to_string()]);

        // Not restartable.
        assert!(run.next().await.is_none());
        assert_eq!(run.emitted(), 1);
    }

    #[tokio::test]
    async fn empty_run_is_already_completed() {
        let ctx = RunContext::new(Arc::new(MemoryLogger::new()));
        let mut run = UpdateRun::empty(&ctx);
        assert_eq!(run.status(), &RunStatus::Completed);
        assert!(run.next().await.is_none());
    }
}
