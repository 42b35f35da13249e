//! Completion session integration tests

use std::time::Duration;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use mavis::{CorrectorLocator, Engine, Event, MemoryAuditLog, SpeakOptions, TextBuffer, UserFile};

mod common;
use common::{
    StubBehavior, corrector_config, spawn_corrector, test_config, test_engine, write_phrases,
    write_soundbites,
};

const WAIT: Duration = Duration::from_secs(5);

/// Locator that only finds the service after a few lookups
struct SlowLocator {
    addr: String,
    misses: AtomicUsize,
}

impl CorrectorLocator for SlowLocator {
    fn resolved_addr(&self) -> Option<String> {
        let pending = self
            .misses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        pending.is_err().then(|| self.addr.clone())
    }

    fn forget(&self) {}
}

/// Move a path's modification time forward so caches see a change
fn bump_modified(path: &Path) {
    let later = SystemTime::now() + Duration::from_secs(10);
    std::fs::File::open(path)
        .unwrap()
        .set_modified(later)
        .unwrap();
}

#[tokio::test]
async fn test_corrector_reply_installed() {
    let dir = tempfile::tempdir().unwrap();
    let stub = spawn_corrector(StubBehavior::Reply(serde_json::json!({
        "return": ["I am here.", "I'm here."]
    })))
    .await;
    let mut t = test_engine(corrector_config(dir.path(), &stub.addr, Duration::from_secs(2)));

    let outcome = t
        .engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("i am heer")));
    assert!(outcome.view.awaiting_network);
    assert!(outcome.view.candidates.is_empty());

    let view = tokio::time::timeout(WAIT, t.engine.next_reply())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.candidates, vec!["I am here.", "I'm here."]);
    assert_eq!(view.selected(), Some("I am here."));
    assert!(!view.awaiting_network);

    let changed: Vec<&str> = view.highlights[0]
        .iter()
        .filter(|w| w.changed)
        .map(|w| w.text.as_str())
        .collect();
    assert_eq!(changed, vec!["here."]);
    assert_eq!(stub.received(), vec!["i am heer"]);

    let outcome = t.engine.handle(Event::Accept);
    let edit = outcome.edit.unwrap();
    assert_eq!(edit.text, "I am here.");
    assert_eq!(edit.selection, 10..10);
    assert!(!outcome.view.is_active);

    let entries = t.audit.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_completion(true));
}

#[tokio::test]
async fn test_timeout_falls_back_to_context() {
    let dir = tempfile::tempdir().unwrap();
    let stub = spawn_corrector(StubBehavior::EchoUpper(Duration::from_secs(3))).await;
    let mut t = test_engine(corrector_config(
        dir.path(),
        &stub.addr,
        Duration::from_millis(200),
    ));

    t.engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("see you soon")));
    let view = tokio::time::timeout(WAIT, t.engine.next_reply())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(view.candidates, vec!["see you soon"]);
    assert!(view.highlights[0].iter().all(|w| !w.changed));
    assert_eq!(t.locator.forget_count(), 1);

    // The configured address is resolved again for the next session
    let outcome = t
        .engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("see you later")));
    assert!(outcome.view.awaiting_network);
    tokio::time::timeout(WAIT, t.engine.next_reply())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stub.received().len(), 2);
}

#[tokio::test]
async fn test_malformed_reply_falls_back_and_retries() {
    let dir = tempfile::tempdir().unwrap();
    let stub = spawn_corrector(StubBehavior::Malformed).await;
    let mut t = test_engine(corrector_config(dir.path(), &stub.addr, Duration::from_secs(2)));

    t.engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("hello there")));
    let view = tokio::time::timeout(WAIT, t.engine.next_reply())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(view.candidates, vec!["hello there"]);
    assert_eq!(t.locator.forget_count(), 1);

    let outcome = t
        .engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("hello again")));
    assert!(outcome.view.awaiting_network);
    let view = tokio::time::timeout(WAIT, t.engine.next_reply())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.candidates, vec!["hello again"]);
    assert_eq!(stub.received(), vec!["hello there", "hello again"]);
    assert_eq!(t.locator.forget_count(), 2);
}

#[tokio::test]
async fn test_service_error_keeps_address() {
    let dir = tempfile::tempdir().unwrap();
    let stub = spawn_corrector(StubBehavior::Reply(serde_json::json!({ "error": "busy" }))).await;
    let mut t = test_engine(corrector_config(dir.path(), &stub.addr, Duration::from_secs(2)));

    t.engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("good morning")));
    let view = tokio::time::timeout(WAIT, t.engine.next_reply())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(view.candidates, vec!["good morning"]);
    assert_eq!(t.locator.forget_count(), 0);
    assert_eq!(t.locator.resolved_addr(), Some(stub.addr.clone()));
}

#[tokio::test]
async fn test_unreachable_corrector_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let mut t = test_engine(corrector_config(dir.path(), &addr, Duration::from_secs(1)));
    t.engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("thank you")));
    let view = tokio::time::timeout(WAIT, t.engine.next_reply())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(view.candidates, vec!["thank you"]);
    assert_eq!(t.locator.forget_count(), 1);
}

#[tokio::test]
async fn test_new_session_supersedes_request() {
    let dir = tempfile::tempdir().unwrap();
    let stub = spawn_corrector(StubBehavior::EchoUpper(Duration::from_millis(300))).await;
    let mut t = test_engine(corrector_config(dir.path(), &stub.addr, Duration::from_secs(2)));

    t.engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("first one")));
    t.engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("second one")));

    let view = tokio::time::timeout(WAIT, t.engine.next_reply())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.candidates, vec!["SECOND ONE"]);

    // Nothing from the first session shows up later
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(t.engine.poll_replies().is_none());
    assert_eq!(t.engine.view().candidates, vec!["SECOND ONE"]);
}

#[tokio::test]
async fn test_cancel_while_waiting_restores_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let stub = spawn_corrector(StubBehavior::EchoUpper(Duration::from_millis(200))).await;
    let mut t = test_engine(corrector_config(dir.path(), &stub.addr, Duration::from_secs(2)));

    let buffer = TextBuffer::new("see you later", 4..7);
    t.engine.handle(Event::Start(buffer.clone()));
    let outcome = t.engine.handle(Event::Cancel);
    assert_eq!(outcome.edit, Some(buffer));
    assert!(!outcome.view.is_active);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(t.engine.poll_replies().is_none());
    assert!(t.engine.view().candidates.is_empty());

    let entries = t.audit.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_completion(false));
}

#[tokio::test]
async fn test_next_reply_returns_when_nothing_pending() {
    let dir = tempfile::tempdir().unwrap();
    let stub = spawn_corrector(StubBehavior::EchoUpper(Duration::from_millis(100))).await;
    let mut t = test_engine(corrector_config(dir.path(), &stub.addr, Duration::from_secs(2)));

    // No session at all
    assert!(t.engine.next_reply().await.is_none());

    // Cancelled while waiting
    t.engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("hello")));
    t.engine.handle(Event::Cancel);
    let waited = tokio::time::timeout(WAIT, t.engine.next_reply()).await;
    assert_eq!(waited, Ok(None));

    // Reply already installed
    t.engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("hello")));
    let view = tokio::time::timeout(WAIT, t.engine.next_reply())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.candidates, vec!["HELLO"]);
    let waited = tokio::time::timeout(WAIT, t.engine.next_reply()).await;
    assert_eq!(waited, Ok(None));

    // Local refinement session never waits
    t.engine.handle(Event::Start(TextBuffer::with_caret_at_end("z")));
    let waited = tokio::time::timeout(WAIT, t.engine.next_reply()).await;
    assert_eq!(waited, Ok(None));
}

#[tokio::test]
async fn test_correct_waits_for_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let stub = spawn_corrector(StubBehavior::EchoUpper(Duration::ZERO)).await;
    let mut config = test_config(dir.path());
    config.corrector.enabled = true;

    let locator = Arc::new(SlowLocator {
        addr: stub.addr.clone(),
        misses: AtomicUsize::new(3),
    });
    let engine = Engine::with_parts(
        config,
        locator as Arc<dyn CorrectorLocator>,
        Arc::new(MemoryAuditLog::default()),
    )
    .unwrap();

    assert_eq!(engine.correct("i am heer").await, vec!["I AM HEER"]);
}

#[test]
fn test_soundbite_added_after_speech_reaches_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_phrases(&config, &["go home"]);
    let mut t = test_engine(config.clone());
    assert_eq!(t.engine.corpus().phrases(), &["go home"]);

    write_soundbites(&config, &["Go away.m4a"]);
    bump_modified(&config.locations().path(UserFile::Soundbites));
    assert_eq!(t.engine.soundbite_names(), vec!["Go away"]);

    let outcome = t
        .engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("go")));
    assert_eq!(outcome.view.candidates, vec!["Go away", "go home"]);
    t.engine.handle(Event::Cancel);

    write_soundbites(&config, &["Go on.wav"]);
    bump_modified(&config.locations().path(UserFile::Soundbites));
    t.engine.speak("go on", SpeakOptions::default());

    let outcome = t
        .engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("go")));
    assert_eq!(outcome.view.candidates, vec!["Go away", "Go on", "go home"]);
}

#[test]
fn test_local_completion_over_phrases_and_soundbites() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_phrases(&config, &["go home", "i want to go out", "home sweet home"]);
    write_soundbites(&config, &["Go away.m4a", "notes.txt"]);
    let mut t = test_engine(config);

    let outcome = t
        .engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("go")));
    assert_eq!(
        outcome.view.candidates,
        vec!["Go away", "go home", "i want to go out"]
    );

    t.engine.handle(Event::SelectNext);
    let outcome = t.engine.handle(Event::Accept);
    assert_eq!(outcome.edit.unwrap().text, "go home");
}

#[test]
fn test_selection_span_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_phrases(&config, &["hello there"]);
    let mut t = test_engine(config);

    t.engine
        .handle(Event::Start(TextBuffer::new("I said hel today", 7..10)));
    let edit = t.engine.handle(Event::Accept).edit.unwrap();
    assert_eq!(edit.text, "I said hello there today");
    assert_eq!(edit.selection, 18..18);
}

#[test]
fn test_refinement_narrows_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_phrases(&config, &["good morning", "good night", "hello"]);
    let mut t = test_engine(config);

    let outcome = t
        .engine
        .handle(Event::Start(TextBuffer::with_caret_at_end("z")));
    assert!(outcome.view.refining);
    assert_eq!(outcome.view.candidates.len(), 3);

    t.engine.handle(Event::Refine('G'));
    let view = t.engine.handle(Event::Refine('o')).view;
    assert_eq!(view.candidates, vec!["good morning", "good night"]);

    for c in "od n".chars() {
        t.engine.handle(Event::Refine(c));
    }
    assert_eq!(t.engine.view().candidates, vec!["good night"]);

    // A refinement matching nothing keeps the previous list
    let view = t.engine.handle(Event::Refine('q')).view;
    assert_eq!(view.candidates, vec!["good night"]);
    assert_eq!(view.selected(), Some("good night"));
}

#[test]
fn test_accept_without_candidates_equals_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = test_engine(test_config(dir.path()));
    let buffer = TextBuffer::new("qwerty uiop", 0..6);

    t.engine.handle(Event::Start(buffer.clone()));
    let accepted = t.engine.handle(Event::Accept);

    t.engine.handle(Event::Start(buffer.clone()));
    let cancelled = t.engine.handle(Event::Cancel);

    assert_eq!(accepted, cancelled);
    assert_eq!(accepted.edit, Some(buffer));
    assert_eq!(t.audit.entries()[0], t.audit.entries()[1]);
}

#[test]
fn test_phrase_file_change_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_phrases(&config, &["alpha"]);
    let mut t = test_engine(config.clone());
    assert_eq!(t.engine.corpus().phrases(), &["alpha"]);

    let path = config.locations().path(UserFile::Phrases);
    std::fs::write(&path, "alpha\nbeta\n").unwrap();
    bump_modified(&path);

    assert_eq!(t.engine.corpus().phrases(), &["alpha", "beta"]);

    std::fs::remove_file(&path).unwrap();
    assert!(t.engine.corpus().is_empty());
}
