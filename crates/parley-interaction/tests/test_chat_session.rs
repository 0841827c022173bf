use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parley_core::config::{AppConfig, Credentials};
use parley_core::conversation::TurnRole;
use parley_core::model::ModelSelector;
use parley_core::ParleyError;
use parley_infrastructure::ingest::{SelectedFile, pdf_fallback_text};
use parley_interaction::{
    ChatSession, ChatTransport, CompletionClient, EMPTY_REPLY_PLACEHOLDER, SubmitOutcome,
    TransportError, TransportRequest, TransportResponse,
};

/// Records every request and answers with a fixed response.
struct RecordingTransport {
    status: u16,
    body: String,
    requests: Mutex<Vec<TransportRequest>>,
}

impl RecordingTransport {
    fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

fn session_with(transport: Arc<RecordingTransport>, credentials: Credentials) -> ChatSession {
    let client = CompletionClient::new(transport, &AppConfig::default());
    ChatSession::new(ModelSelector::DeepSeekV3, credentials, client)
}

fn all_keys() -> Credentials {
    Credentials::new(Some("sk-v3".into()), Some("sk-r1".into()))
}

fn last_user_content(request: &TransportRequest) -> String {
    let messages = request.body["messages"].as_array().unwrap();
    let last = messages.last().unwrap();
    assert_eq!(last["role"], "user");
    last["content"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_new_session_starts_with_greeting() {
    let session = session_with(RecordingTransport::new(200, "{}"), all_keys());
    let transcript = session.transcript();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].role(), TurnRole::Assistant);
    assert_eq!(
        transcript[0].text(),
        "Hallo! Ich bin ein KI-Chatbot, der von DeepSeek V3 betrieben wird."
    );
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_hallo_gets_reply() {
    let transport = RecordingTransport::new(200, r#"{"choices":[{"message":{"content":"Hi!"}}]}"#);
    let mut session = session_with(transport.clone(), all_keys());

    let outcome = session.submit("Hallo").await;
    assert_eq!(outcome, SubmitOutcome::Replied { reply: "Hi!".into() });

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let messages = requests[0].body["messages"].as_array().unwrap();
    // system, greeting, user
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(last_user_content(&requests[0]), "Hallo");

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].role(), TurnRole::User);
    assert_eq!(transcript[1].text(), "Hallo");
    assert_eq!(transcript[2].role(), TurnRole::Assistant);
    assert_eq!(transcript[2].text(), "Hi!");
}

#[tokio::test]
async fn test_blank_submission_is_ignored() {
    let transport = RecordingTransport::new(200, "{}");
    let mut session = session_with(transport.clone(), all_keys());

    assert_eq!(session.submit("   ").await, SubmitOutcome::Ignored);
    assert_eq!(session.transcript().len(), 1);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_failing_pdf_still_reaches_network() {
    let transport = RecordingTransport::new(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#);
    let mut session = session_with(transport.clone(), all_keys());

    let notices = session
        .attach(vec![SelectedFile::from_bytes(
            "kaputt.pdf",
            Some("application/pdf".into()),
            b"definitely not a pdf".to_vec(),
        )])
        .await;
    assert!(notices.is_empty());
    assert_eq!(session.pending_attachments().len(), 1);

    let outcome = session.submit("").await;
    assert!(matches!(outcome, SubmitOutcome::Replied { .. }));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let content = last_user_content(&requests[0]);
    assert!(content.starts_with("[Anhang hinzugefügt]"));
    assert!(content.contains("--- Datei: kaputt.pdf ---"));
    assert!(content.contains(&pdf_fallback_text("kaputt.pdf")));

    assert_eq!(session.transcript()[1].text(), "[Anhang hinzugefügt]");
    assert!(session.pending_attachments().is_empty());
}

#[tokio::test]
async fn test_missing_credential_records_error_without_call() {
    let transport = RecordingTransport::new(200, "{}");
    let mut session = session_with(transport.clone(), Credentials::default());
    session
        .attach(vec![SelectedFile::from_bytes("a.txt", None, "alpha")])
        .await;

    let outcome = session.submit("Hallo").await;
    assert_eq!(
        outcome,
        SubmitOutcome::Failed {
            error: ParleyError::missing_credential("deepseek-v3")
        }
    );
    assert!(transport.requests().is_empty());

    let last = session.transcript().last().unwrap();
    assert_eq!(last.role(), TurnRole::Assistant);
    assert_eq!(last.text(), "Fehler: API key not found for deepseek-v3");
    assert!(session.pending_attachments().is_empty());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_server_error_becomes_assistant_turn() {
    let transport = RecordingTransport::new(500, "insufficient balance");
    let mut session = session_with(transport, all_keys());
    session
        .attach(vec![SelectedFile::from_bytes("pic.png", Some("image/png".into()), vec![1u8])])
        .await;

    let outcome = session.submit("Was ist das?").await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed { ref error } if error.status() == Some(500)
    ));

    let last = session.transcript().last().unwrap();
    assert_eq!(last.role(), TurnRole::Assistant);
    assert!(last.text().contains("500"));
    assert!(last.text().contains("insufficient balance"));
    assert!(session.pending_attachments().is_empty());
}

#[tokio::test]
async fn test_malformed_reply_uses_placeholder() {
    let transport = RecordingTransport::new(200, r#"{"choices":[]}"#);
    let mut session = session_with(transport, all_keys());

    let outcome = session.submit("Hallo").await;
    assert_eq!(
        outcome,
        SubmitOutcome::Replied {
            reply: EMPTY_REPLY_PLACEHOLDER.into()
        }
    );
    assert_eq!(session.transcript().last().unwrap().text(), EMPTY_REPLY_PLACEHOLDER);
}

#[tokio::test]
async fn test_attach_reports_unsupported_and_detach() {
    let mut session = session_with(RecordingTransport::new(200, "{}"), all_keys());

    let notices = session
        .attach(vec![
            SelectedFile::from_bytes("a.txt", None, "alpha"),
            SelectedFile::from_bytes("b.zip", Some("application/zip".into()), vec![0u8]),
        ])
        .await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].to_string(), "Nicht unterstützte Datei: b.zip");

    let id = session.pending_attachments()[0].id.clone();
    assert!(!session.remove_attachment("unknown"));
    assert!(session.remove_attachment(&id));
    assert!(session.pending_attachments().is_empty());
}

#[tokio::test]
async fn test_history_grows_across_submissions() {
    let transport = RecordingTransport::new(200, r#"{"choices":[{"message":{"content":"Antwort"}}]}"#);
    let mut session = session_with(transport.clone(), all_keys());

    session.submit("eins").await;
    session.submit("zwei").await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    let second = requests[1].body["messages"].as_array().unwrap();
    // system, greeting, eins, Antwort, zwei
    assert_eq!(second.len(), 5);
    assert_eq!(second[2]["content"], "eins");
    assert_eq!(second[3]["content"], "Antwort");
    assert_eq!(second[4]["content"], "zwei");
}

#[tokio::test]
async fn test_switch_model_starts_fresh_conversation() {
    let transport = RecordingTransport::new(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#);
    let mut session = session_with(transport.clone(), all_keys());
    session.submit("Hallo").await;
    session
        .attach(vec![SelectedFile::from_bytes("a.txt", None, "alpha")])
        .await;

    session.switch_model(ModelSelector::DeepSeekR1);
    assert_eq!(session.model(), ModelSelector::DeepSeekR1);
    assert_eq!(session.transcript().len(), 1);
    assert!(session.transcript()[0].text().contains("DeepSeek R1"));
    assert!(session.pending_attachments().is_empty());

    session.submit("Frage").await;
    let requests = transport.requests();
    assert_eq!(requests[1].body["model"], "deepseek/deepseek-r1");
    assert_eq!(requests[1].header("Authorization"), Some("Bearer sk-r1"));
}

/// Never answers the first request; answers later ones with "Hi!".
struct StallOnceTransport {
    stalled: AtomicBool,
}

#[async_trait]
impl ChatTransport for StallOnceTransport {
    async fn post(&self, _request: TransportRequest) -> Result<TransportResponse, TransportError> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(TransportResponse {
            status: 200,
            body: r#"{"choices":[{"message":{"content":"Hi!"}}]}"#.to_string(),
        })
    }
}

#[tokio::test]
async fn test_abandoned_submit_releases_session() {
    let transport = Arc::new(StallOnceTransport {
        stalled: AtomicBool::new(false),
    });
    let client = CompletionClient::new(transport, &AppConfig::default());
    let mut session = ChatSession::new(ModelSelector::DeepSeekV3, all_keys(), client);
    session
        .attach(vec![SelectedFile::from_bytes("a.txt", None, "alpha")])
        .await;

    let abandoned = tokio::time::timeout(Duration::from_millis(50), session.submit("Hallo")).await;
    assert!(abandoned.is_err());

    assert!(!session.is_busy());
    assert!(session.pending_attachments().is_empty());

    let outcome = session.submit("Noch einmal").await;
    assert_eq!(outcome, SubmitOutcome::Replied { reply: "Hi!".into() });
    assert_eq!(session.transcript().last().unwrap().text(), "Hi!");
}
