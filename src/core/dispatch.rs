//! Question dispatch
//!
//! Sends an accepted question to the answering service on a background task
//! and reports the outcome back to the event loop over a channel.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::answering::{AnswerError, Answerer};

/// Outcome of one dispatched question
#[derive(Debug)]
pub struct Settlement {
    pub question: String,
    pub outcome: Result<String, AnswerError>,
}

/// Holds the in-flight status of one question.
///
/// Exactly one settlement is sent per guard: the outcome passed to
/// [`InFlight::settle`], or [`AnswerError::Abandoned`] if the guard is dropped
/// first (task panicked or was aborted).
pub struct InFlight<T: From<Settlement>> {
    question: Option<String>,
    tx: UnboundedSender<T>,
}

impl<T: From<Settlement>> InFlight<T> {
    pub fn new(question: String, tx: UnboundedSender<T>) -> Self {
        Self {
            question: Some(question),
            tx,
        }
    }

    pub fn settle(mut self, outcome: Result<String, AnswerError>) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: Result<String, AnswerError>) {
        if let Some(question) = self.question.take() {
            if self.tx.send(Settlement { question, outcome }.into()).is_err() {
                tracing::debug!("Settlement dropped, event loop has shut down");
            }
        }
    }
}

impl<T: From<Settlement>> Drop for InFlight<T> {
    fn drop(&mut self) {
        if self.question.is_some() {
            tracing::warn!("Request ended without an outcome");
            self.send(Err(AnswerError::Abandoned));
        }
    }
}

/// Spawns answering calls and routes their settlements to `T`
pub struct Dispatcher<T> {
    answerer: Arc<dyn Answerer>,
    tx: UnboundedSender<T>,
}

impl<T> Dispatcher<T>
where
    T: From<Settlement> + Send + 'static,
{
    pub fn new(answerer: Arc<dyn Answerer>, tx: UnboundedSender<T>) -> Self {
        Self { answerer, tx }
    }

    /// Start answering `question`. Returns immediately; the settlement arrives
    /// on the channel later.
    pub fn dispatch(&self, question: String) -> JoinHandle<()> {
        let guard = InFlight::new(question.clone(), self.tx.clone());
        let answerer = Arc::clone(&self.answerer);

        tokio::spawn(async move {
            let outcome = answerer.answer(&question).await;
            guard.settle(outcome);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConversationSession, FALLBACK_MESSAGE};
    use crate::conversation::Sender;
    use async_trait::async_trait;
    use tokio::sync::{mpsc, Notify};
    use tokio_test::assert_pending;

    struct EchoAnswerer;

    #[async_trait]
    impl Answerer for EchoAnswerer {
        async fn answer(&self, question: &str) -> Result<String, AnswerError> {
            Ok(format!("Answer to: {}", question))
        }
    }

    struct FailingAnswerer;

    #[async_trait]
    impl Answerer for FailingAnswerer {
        async fn answer(&self, _question: &str) -> Result<String, AnswerError> {
            Err(AnswerError::Status {
                status: 500,
                detail: "Internal server error".into(),
            })
        }
    }

    struct GatedAnswerer {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl Answerer for GatedAnswerer {
        async fn answer(&self, _question: &str) -> Result<String, AnswerError> {
            self.gate.notified().await;
            Ok("finally".into())
        }
    }

    struct PanickingAnswerer;

    #[async_trait]
    impl Answerer for PanickingAnswerer {
        async fn answer(&self, _question: &str) -> Result<String, AnswerError> {
            panic!("answerer blew up");
        }
    }

    fn dispatcher(
        answerer: impl Answerer + 'static,
    ) -> (Dispatcher<Settlement>, mpsc::UnboundedReceiver<Settlement>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Dispatcher::new(Arc::new(answerer), tx), rx)
    }

    #[tokio::test]
    async fn test_dispatch_reports_answer() {
        let (dispatcher, mut rx) = dispatcher(EchoAnswerer);

        dispatcher.dispatch("What is this?".into()).await.unwrap();

        let settlement = rx.recv().await.unwrap();
        assert_eq!(settlement.question, "What is this?");
        assert_eq!(settlement.outcome.unwrap(), "Answer to: What is this?");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_reports_failure() {
        let (dispatcher, mut rx) = dispatcher(FailingAnswerer);

        dispatcher.dispatch("q".into()).await.unwrap();

        let settlement = rx.recv().await.unwrap();
        assert!(matches!(
            settlement.outcome,
            Err(AnswerError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_dispatch_does_not_block_caller() {
        let gate = Arc::new(Notify::new());
        let (dispatcher, mut rx) = dispatcher(GatedAnswerer { gate: gate.clone() });

        let handle = dispatcher.dispatch("slow".into());
        tokio::task::yield_now().await;

        {
            let mut recv = tokio_test::task::spawn(rx.recv());
            assert_pending!(recv.poll());
        }

        gate.notify_one();
        handle.await.unwrap();
        let settlement = rx.recv().await.unwrap();
        assert_eq!(settlement.outcome.unwrap(), "finally");
    }

    #[tokio::test]
    async fn test_panicking_answerer_still_settles() {
        let (dispatcher, mut rx) = dispatcher(PanickingAnswerer);

        let result = dispatcher.dispatch("boom".into()).await;
        assert!(result.unwrap_err().is_panic());

        let settlement = rx.recv().await.unwrap();
        assert_eq!(settlement.question, "boom");
        assert!(matches!(settlement.outcome, Err(AnswerError::Abandoned)));
    }

    #[tokio::test]
    async fn test_aborted_task_still_settles() {
        let gate = Arc::new(Notify::new());
        let (dispatcher, mut rx) = dispatcher(GatedAnswerer { gate });

        let handle = dispatcher.dispatch("never".into());
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        let settlement = rx.recv().await.unwrap();
        assert!(matches!(settlement.outcome, Err(AnswerError::Abandoned)));
    }

    #[test]
    fn test_guard_settles_once() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Settlement>();

        InFlight::new("q".into(), tx).settle(Ok("a".into()));

        assert_eq!(rx.try_recv().unwrap().outcome.unwrap(), "a");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let (dispatcher, mut rx) = dispatcher(FailingAnswerer);
        let mut session = ConversationSession::default();

        session.update_input("Why?");
        let question = session.submit().unwrap();
        dispatcher.dispatch(question);
        assert!(session.awaiting_response());

        session.settle(rx.recv().await.unwrap());

        let senders: Vec<Sender> = session.transcript().iter().map(|m| m.sender()).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Bot]);
        assert_eq!(session.transcript().last().unwrap().text(), FALLBACK_MESSAGE);
        assert!(!session.awaiting_response());
    }
}
