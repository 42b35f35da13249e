//! The Mavis engine
//!
//! One `Engine` value owns everything the completion flow needs: the
//! cached phrase corpus and soundbite index, the pronunciation overrides,
//! the active session, the corrector client and its locator, the audit log
//! and the message history. Callers drive it with [`Event`]s and render the
//! returned [`SessionView`]s.
//!
//! Corrector requests run on a spawned task. Their replies come back over a
//! channel tagged with the session id and are only installed by the owner
//! through [`Engine::next_reply`] or [`Engine::poll_replies`], so session
//! state is never touched from another task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;

use crate::audit::{AuditEntry, AuditLog, AuditSink};
use crate::cache::ModTimeCache;
use crate::completion::{
    Acquisition, Candidate, CompletionSession, CorrectionClient, CorrectionReply,
    CorrectionRequest, CorrectorMode, Corpus, Event, Outcome, SessionState, SessionView,
    score_candidates,
};
use crate::config::Config;
use crate::discovery::{CorrectorLocator, MdnsBrowser, StaticLocator};
use crate::files::{self, FileLocations, UserFile};
use crate::history::{HistoryStore, Message};
use crate::soundbite::SoundbiteIndex;
use crate::speech::{self, Pronunciations, Utterance};
use crate::text::ends_sentence;
use crate::Result;

/// How long a one-off correction waits for discovery to find the service
pub const DISCOVERY_WAIT: Duration = Duration::from_secs(3);

/// Interval between address checks while waiting for discovery
const DISCOVERY_POLL: Duration = Duration::from_millis(100);

/// Circumstances of a speak request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeakOptions {
    /// Spoken because a sentence was completed, not on explicit request
    pub automatic: bool,
    /// A phone call is active; soundbites would not reach the other party
    pub in_call: bool,
}

/// Completion, correction and speech planning engine
pub struct Engine {
    config: Config,
    locations: FileLocations,
    phrases: ModTimeCache<Vec<String>>,
    soundbites: ModTimeCache<Arc<SoundbiteIndex>>,
    pronunciations: ModTimeCache<Pronunciations>,
    corpus: Arc<Corpus>,
    /// Phrase file and soundbite directory times the corpus was built from
    corpus_sources: Option<(Option<SystemTime>, Option<SystemTime>)>,
    session: CompletionSession,
    client: CorrectionClient,
    locator: Arc<dyn CorrectorLocator>,
    audit: Arc<dyn AuditSink>,
    history: HistoryStore,
    replies_tx: mpsc::UnboundedSender<CorrectionReply>,
    replies_rx: mpsc::UnboundedReceiver<CorrectionReply>,
}

impl Engine {
    /// Create an engine from configuration
    ///
    /// Uses the configured corrector address when set, otherwise mDNS
    /// discovery. The audit log lives in the data directory.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let locator: Arc<dyn CorrectorLocator> = match &config.corrector.address {
            Some(addr) => Arc::new(StaticLocator::new(Some(addr.clone()))),
            None if config.corrector.enabled => {
                match MdnsBrowser::new(&config.corrector.service_type) {
                    Ok(browser) => Arc::new(browser),
                    Err(e) => {
                        tracing::warn!(error = %e, "mDNS unavailable, corrector disabled");
                        Arc::new(StaticLocator::new(None))
                    }
                }
            }
            None => Arc::new(StaticLocator::new(None)),
        };

        let audit = Arc::new(AuditLog::new(
            config.locations().path(UserFile::Log),
            config.speech.log_chat_history,
        ));

        Self::with_parts(config, locator, audit)
    }

    /// Create an engine with explicit collaborators
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn with_parts(
        config: Config,
        locator: Arc<dyn CorrectorLocator>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        let locations = config.locations();
        let client = CorrectionClient::new(config.corrector.timeout)?;

        let history_path = locations.path(UserFile::History);
        let history = HistoryStore::load(&history_path).unwrap_or_else(|e| {
            tracing::warn!(path = %history_path.display(), error = %e, "failed to load history");
            HistoryStore::new(&history_path)
        });

        let (replies_tx, replies_rx) = mpsc::unbounded_channel();

        Ok(Self {
            phrases: ModTimeCache::new(locations.path(UserFile::Phrases)),
            soundbites: ModTimeCache::new(locations.path(UserFile::Soundbites)),
            pronunciations: ModTimeCache::new(locations.path(UserFile::Pronunciations)),
            corpus: Arc::new(Corpus::default()),
            corpus_sources: None,
            session: CompletionSession::new(),
            locations,
            config,
            client,
            locator,
            audit,
            history,
            replies_tx,
            replies_rx,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn locations(&self) -> &FileLocations {
        &self.locations
    }

    /// Apply a caller event to the session
    pub fn handle(&mut self, event: Event) -> Outcome {
        let edit = match event {
            Event::Start(buffer) => {
                self.refresh_corpus();
                let mode = self.corrector_mode();
                let corpus = Arc::clone(&self.corpus);
                if let Some(request) = self.session.start(&buffer, corpus.phrases(), &mode) {
                    self.dispatch(request);
                }
                None
            }
            Event::Accept => self.session.accept(self.audit.as_ref()),
            Event::Cancel => self.session.cancel(self.audit.as_ref()),
            Event::Refine(c) => {
                self.session.refine(c);
                None
            }
            Event::SelectNext => {
                self.session.select_next();
                None
            }
            Event::SelectPrevious => {
                self.session.select_previous();
                None
            }
        };

        Outcome {
            view: self.session.view(),
            edit,
        }
    }

    /// Current session snapshot
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    /// Wait for the next corrector reply that belongs to the active session
    ///
    /// Stale replies are dropped while waiting. Returns the updated view,
    /// or `None` at once when the session is not waiting on the corrector.
    pub async fn next_reply(&mut self) -> Option<SessionView> {
        while self.session.state() == SessionState::Active(Acquisition::AwaitingNetwork) {
            let reply = self.replies_rx.recv().await?;
            if self.session.install_reply(reply) {
                return Some(self.session.view());
            }
        }
        None
    }

    /// Install any replies that already arrived, without waiting
    ///
    /// Returns the updated view if a reply was installed.
    pub fn poll_replies(&mut self) -> Option<SessionView> {
        let mut installed = false;
        while let Ok(reply) = self.replies_rx.try_recv() {
            installed |= self.session.install_reply(reply);
        }
        installed.then(|| self.session.view())
    }

    /// How the corrector can be used right now
    #[must_use]
    pub fn corrector_mode(&self) -> CorrectorMode {
        if !self.config.corrector.enabled {
            return CorrectorMode::Disabled;
        }
        self.locator
            .resolved_addr()
            .map_or(CorrectorMode::Unresolved, CorrectorMode::Available)
    }

    /// Rank the corpus against `query` without opening a session
    pub fn complete(&mut self, query: &str) -> Vec<Candidate> {
        self.refresh_corpus();
        score_candidates(self.corpus.phrases(), query)
    }

    /// One corrector round trip for `text`, outside any session
    ///
    /// An unresolved service gets up to [`DISCOVERY_WAIT`] to be found.
    /// Falls back to `[text]` when the corrector is disabled, not found or
    /// fails.
    pub async fn correct(&self, text: &str) -> Vec<String> {
        let addr = match self.corrector_mode() {
            CorrectorMode::Available(addr) => Some(addr),
            CorrectorMode::Unresolved => self.await_corrector(DISCOVERY_WAIT).await,
            CorrectorMode::Disabled => None,
        };

        match addr {
            Some(addr) => {
                self.client
                    .fetch_candidates(&addr, text, self.locator.as_ref())
                    .await
            }
            None => vec![text.to_string()],
        }
    }

    /// Poll the locator until it resolves an address or `window` passes
    async fn await_corrector(&self, window: Duration) -> Option<String> {
        let poll = async {
            loop {
                if let Some(addr) = self.locator.resolved_addr() {
                    return addr;
                }
                tokio::time::sleep(DISCOVERY_POLL).await;
            }
        };

        match tokio::time::timeout(window, poll).await {
            Ok(addr) => Some(addr),
            Err(_) => {
                tracing::warn!(?window, "corrector not discovered");
                None
            }
        }
    }

    /// Decide how to voice `text` and record it
    ///
    /// Blank text yields `None`. Spoken text is written to the audit log;
    /// text spoken on explicit request is also added to the history.
    pub fn speak(&mut self, text: &str, options: SpeakOptions) -> Option<Utterance> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        self.refresh_soundbites();
        self.pronunciations
            .refresh(|p| Ok(Pronunciations::parse(&files::read_lines(p)?)));

        let allow_bites = self.config.speech.enable_soundbites && !options.in_call;
        let index = Arc::clone(self.soundbites.value());
        let utterance = speech::plan(
            trimmed,
            allow_bites.then_some(index.as_ref()),
            self.pronunciations.value(),
        );

        self.audit
            .record(AuditEntry::spoken(trimmed, options.automatic));

        if !options.automatic {
            self.history.record(trimmed);
            if let Err(e) = self.history.save() {
                tracing::warn!(error = %e, "failed to save history");
            }
        }

        tracing::info!(?utterance, automatic = options.automatic, "speaking");
        Some(utterance)
    }

    /// Whether `text` ends a sentence and may be spoken automatically
    #[must_use]
    pub fn ready_to_speak(text: &str) -> bool {
        ends_sentence(text)
    }

    /// Soundbite clip for `text`, if any
    pub fn soundbite_for(&mut self, text: &str) -> Option<PathBuf> {
        self.refresh_soundbites();
        self.soundbites.value().lookup(text).map(Path::to_path_buf)
    }

    /// Soundbite names, sorted
    pub fn soundbite_names(&mut self) -> Vec<String> {
        self.refresh_soundbites();
        self.soundbites.value().names().to_vec()
    }

    /// Current corpus, refreshed if its sources changed
    pub fn corpus(&mut self) -> Arc<Corpus> {
        self.refresh_corpus();
        Arc::clone(&self.corpus)
    }

    /// Recently spoken messages, oldest first
    #[must_use]
    pub fn history(&self) -> &[Message] {
        self.history.messages()
    }

    /// Import a user-supplied file into place
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnrecognizedFile`] for unknown file names
    pub fn import(&self, source: &Path) -> Result<UserFile> {
        self.locations.import(source)
    }

    /// Rebuild the corpus if the phrase file or soundbite directory changed
    ///
    /// Compares against the source times the current corpus was built from,
    /// so a soundbite reload done for speech still reaches the corpus.
    fn refresh_corpus(&mut self) {
        self.phrases.refresh(files::read_lines);
        self.refresh_soundbites();

        let sources = (self.phrases.last_seen(), self.soundbites.last_seen());
        if self.corpus_sources != Some(sources) {
            self.corpus_sources = Some(sources);
            let corpus = Corpus::build(self.phrases.value(), self.soundbites.value().names());
            tracing::debug!(phrases = corpus.len(), "corpus rebuilt");
            self.corpus = Arc::new(corpus);
        }
    }

    fn refresh_soundbites(&mut self) {
        self.soundbites.refresh(|dir| {
            let listing = files::list_dir(dir)?;
            Ok(Arc::new(SoundbiteIndex::rebuild(dir, &listing)))
        });
    }

    /// Run a corrector request on a background task
    fn dispatch(&mut self, request: CorrectionRequest) {
        let CorrectionRequest {
            session_id,
            addr,
            context,
        } = request;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime, offering original text");
            self.session.install_reply(CorrectionReply {
                session_id,
                candidates: vec![context],
            });
            return;
        };

        let client = self.client.clone();
        let locator = Arc::clone(&self.locator);
        let tx = self.replies_tx.clone();

        let handle = runtime.spawn(async move {
            let candidates = client
                .fetch_candidates(&addr, &context, locator.as_ref())
                .await;
            if tx
                .send(CorrectionReply {
                    session_id,
                    candidates,
                })
                .is_err()
            {
                tracing::trace!(session_id, "engine dropped before corrector reply");
            }
        });

        self.session.attach_request(session_id, handle.abort_handle());
    }
}
