//! Conversation controller
//!
//! Owns the transcript and the input field. Each submission appends a user
//! entry and a pending placeholder, then runs its request on a spawned task.
//! The task reports back through a channel; the event loop hands the result
//! to [`Controller::complete`], which settles that submission's placeholder
//! and nothing else. Submissions are independent and may settle in any order.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::client::ChatBackend;
use crate::error::ChatError;
use crate::input::InputField;
use crate::transcript::{EntryId, Transcript};

/// Result of one outbound request, tagged with the placeholder it belongs to.
#[derive(Debug)]
pub struct Completion {
    pub entry: EntryId,
    pub outcome: Result<String, ChatError>,
}

pub type CompletionReceiver = mpsc::UnboundedReceiver<Completion>;

/// Terminal state of a submission.
///
/// A submission is awaiting a response from `submit` until its completion is
/// applied; only then is it dropped from the in-flight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Resolved,
    Failed,
}

pub struct Controller {
    transcript: Transcript,
    input: InputField,
    backend: Arc<dyn ChatBackend>,
    completions: mpsc::UnboundedSender<Completion>,
    // Pending entries of submissions still awaiting a response
    in_flight: HashSet<EntryId>,
}

impl Controller {
    pub fn new(backend: Arc<dyn ChatBackend>) -> (Self, CompletionReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            transcript: Transcript::new(),
            input: InputField::new(),
            backend,
            completions: tx,
            in_flight: HashSet::new(),
        };
        (controller, rx)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputField {
        &mut self.input
    }

    /// Number of submissions still waiting on the backend.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether the submission whose placeholder is `entry` is still waiting.
    pub fn is_awaiting(&self, entry: EntryId) -> bool {
        self.in_flight.contains(&entry)
    }

    /// Send whatever is in the input field.
    ///
    /// Whitespace-only input is ignored. Otherwise the trimmed text is
    /// appended as a user entry, the field is cleared, a pending entry is
    /// appended and the request is spawned. Returns the pending entry's id.
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self) -> Option<EntryId> {
        let message = self.input.text().trim().to_string();
        if message.is_empty() {
            return None;
        }

        self.transcript.push_user(message.clone());
        self.input.clear();
        let entry = self.transcript.push_pending();
        self.in_flight.insert(entry);

        debug!(?entry, chars = message.chars().count(), "submitting message");

        let request = self.backend.send(message);
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let outcome = request.await;
            // Receiver gone means the app is shutting down
            let _ = tx.send(Completion { entry, outcome });
        });

        Some(entry)
    }

    /// Apply a finished request to the transcript and return the terminal state.
    ///
    /// Settling is idempotent: a completion for a submission that is not
    /// awaiting a response leaves the transcript untouched and returns `None`.
    pub fn complete(&mut self, completion: Completion) -> Option<SubmissionState> {
        let Completion { entry, outcome } = completion;

        if !self.in_flight.remove(&entry) {
            warn!(?entry, "ignoring completion for settled submission");
            return None;
        }

        let (text, state) = match outcome {
            Ok(reply) => {
                info!(?entry, chars = reply.chars().count(), "reply received");
                (reply, SubmissionState::Resolved)
            }
            Err(err) => {
                error!(?entry, error = %err, "chat request failed");
                (err.diagnostic(), SubmissionState::Failed)
            }
        };

        if self.transcript.settle(entry, text).is_none() {
            warn!(?entry, "pending entry already removed");
        }
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::ChatRole;
    use futures_util::future::BoxFuture;
    use reqwest::StatusCode;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Reply = Result<String, ChatError>;

    /// Backend whose replies are released by the test, one per request.
    #[derive(Default)]
    struct ScriptedBackend {
        requests: Mutex<Vec<(String, oneshot::Sender<Reply>)>>,
    }

    impl ScriptedBackend {
        fn sent(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(m, _)| m.clone())
                .collect()
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        /// Answer the request carrying `message`.
        fn answer(&self, message: &str, reply: Reply) {
            let mut requests = self.requests.lock().unwrap();
            let idx = requests
                .iter()
                .position(|(m, _)| m == message)
                .expect("no such request");
            let (_, tx) = requests.remove(idx);
            tx.send(reply).unwrap();
        }
    }

    impl ChatBackend for ScriptedBackend {
        fn send(&self, message: String) -> BoxFuture<'static, Reply> {
            let (tx, rx) = oneshot::channel();
            self.requests.lock().unwrap().push((message, tx));
            Box::pin(async move {
                rx.await
                    .unwrap_or_else(|_| Err(ChatError::Transport("dropped".into())))
            })
        }
    }

    /// Backend that answers every message immediately.
    struct EchoBackend;

    impl ChatBackend for EchoBackend {
        fn send(&self, message: String) -> BoxFuture<'static, Reply> {
            Box::pin(async move { Ok(format!("echo: {}", message)) })
        }
    }

    fn scripted() -> (Arc<ScriptedBackend>, Controller, CompletionReceiver) {
        let backend = Arc::new(ScriptedBackend::default());
        let (controller, rx) = Controller::new(backend.clone());
        (backend, controller, rx)
    }

    fn type_and_submit(controller: &mut Controller, text: &str) -> Option<EntryId> {
        controller.input_mut().set_text(text);
        controller.submit()
    }

    async fn settle_next(
        controller: &mut Controller,
        rx: &mut CompletionReceiver,
    ) -> (EntryId, Option<SubmissionState>) {
        let completion = rx.recv().await.expect("completion channel closed");
        (completion.entry, controller.complete(completion))
    }

    #[tokio::test]
    async fn whitespace_input_is_ignored() {
        let (backend, mut controller, _rx) = scripted();
        for text in ["", "   ", "\t\n "] {
            assert!(type_and_submit(&mut controller, text).is_none());
        }
        tokio::task::yield_now().await;

        assert!(controller.transcript().is_empty());
        assert_eq!(backend.request_count(), 0);
        assert_eq!(controller.in_flight(), 0);
    }

    #[tokio::test]
    async fn submit_appends_user_and_pending_entries() {
        let (backend, mut controller, _rx) = scripted();
        let pending = type_and_submit(&mut controller, "  hello  ").unwrap();

        let entries = controller.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, ChatRole::User);
        assert_eq!(entries[0].text, "hello");
        assert!(!entries[0].pending);
        assert_eq!(entries[1].id, pending);
        assert_eq!(entries[1].role, ChatRole::Assistant);
        assert!(entries[1].pending);
        assert!(entries[1].text.is_empty());

        assert_eq!(controller.input().text(), "");
        assert!(controller.is_awaiting(pending));
        assert_eq!(backend.sent(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn success_replaces_pending_with_reply() {
        let backend = Arc::new(EchoBackend);
        let (mut controller, mut rx) = Controller::new(backend);
        let pending = type_and_submit(&mut controller, "Y").unwrap();

        let (entry, state) = settle_next(&mut controller, &mut rx).await;
        assert_eq!(entry, pending);
        assert_eq!(state, Some(SubmissionState::Resolved));
        assert!(!controller.is_awaiting(pending));

        let transcript = controller.transcript();
        assert_eq!(transcript.pending_count(), 0);
        assert_eq!(transcript.len(), 2);
        let last = transcript.last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.text, "echo: Y");
    }

    #[tokio::test]
    async fn backend_error_payload_is_shown() {
        let (backend, mut controller, mut rx) = scripted();
        type_and_submit(&mut controller, "Y").unwrap();
        backend.answer(
            "Y",
            Err(ChatError::Backend {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "rate limited".into(),
            }),
        );

        let (_, state) = settle_next(&mut controller, &mut rx).await;
        assert_eq!(state, Some(SubmissionState::Failed));
        let last = controller.transcript().last().unwrap();
        assert!(last.text.contains("rate limited"));
        assert_eq!(controller.transcript().pending_count(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_shown() {
        let (backend, mut controller, mut rx) = scripted();
        type_and_submit(&mut controller, "Y").unwrap();
        backend.answer("Y", Err(ChatError::Transport("connection refused".into())));

        let (_, state) = settle_next(&mut controller, &mut rx).await;
        assert_eq!(state, Some(SubmissionState::Failed));
        let last = controller.transcript().last().unwrap();
        assert!(last.text.contains("connection refused"));
        assert_eq!(controller.transcript().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_submissions_settle_independently() {
        let (backend, mut controller, mut rx) = scripted();
        let a = type_and_submit(&mut controller, "A").unwrap();
        let b = type_and_submit(&mut controller, "B").unwrap();
        assert_eq!(controller.in_flight(), 2);
        assert_eq!(controller.transcript().pending_count(), 2);

        // Second request settles first
        backend.answer("B", Err(ChatError::Status(StatusCode::BAD_GATEWAY)));
        let settled = settle_next(&mut controller, &mut rx).await;
        assert_eq!(settled, (b, Some(SubmissionState::Failed)));
        assert!(controller.is_awaiting(a));
        assert_eq!(controller.in_flight(), 1);
        assert!(controller.transcript().get(a).unwrap().pending);

        backend.answer("A", Ok("reply to A".into()));
        let settled = settle_next(&mut controller, &mut rx).await;
        assert_eq!(settled, (a, Some(SubmissionState::Resolved)));
        assert_eq!(controller.in_flight(), 0);

        let transcript = controller.transcript();
        assert_eq!(transcript.pending_count(), 0);
        let texts: Vec<&str> = transcript.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts.len(), 4);
        assert_eq!(texts[0], "A");
        assert_eq!(texts[1], "B");
        assert!(texts[2].contains("502 Bad Gateway"));
        assert_eq!(texts[3], "reply to A");
    }

    #[tokio::test]
    async fn duplicate_completion_is_ignored() {
        let backend = Arc::new(EchoBackend);
        let (mut controller, mut rx) = Controller::new(backend);
        let pending = type_and_submit(&mut controller, "once").unwrap();
        settle_next(&mut controller, &mut rx).await;

        let state = controller.complete(Completion {
            entry: pending,
            outcome: Ok("again".into()),
        });
        assert_eq!(state, None);
        assert_eq!(controller.in_flight(), 0);
        assert_eq!(controller.transcript().len(), 2);
        assert_eq!(controller.transcript().last().unwrap().text, "echo: once");
    }

    #[tokio::test]
    async fn completion_for_unknown_entry_is_ignored() {
        let (_backend, mut controller, _rx) = scripted();
        let (mut other, mut other_rx) = Controller::new(Arc::new(EchoBackend));
        type_and_submit(&mut other, "x").unwrap();
        let stray = other_rx.recv().await.unwrap();

        assert_eq!(controller.complete(stray), None);
        assert!(controller.transcript().is_empty());
    }
}
