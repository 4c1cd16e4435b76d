//! In-memory port implementations shared by use case tests.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use crate::ports::paper_store::{PaperStorePort, StoreError};
use crate::ports::scholar::{PaperHit, ScholarError, ScholarSearchPort};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use xpcs_domain::{ChunkingConfig, Document, DownloadRecord, KnowledgeIndex, Model, SourceKind};

/// Scripted replies shared by every session the gateway hands out.
#[derive(Clone, Default)]
pub struct Script {
    replies: Arc<Mutex<VecDeque<Result<String, GatewayError>>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub system_prompts: Arc<Mutex<Vec<String>>>,
}

impl Script {
    pub fn new(replies: Vec<Result<String, GatewayError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Default::default()
        }
    }

    pub fn ok(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

pub struct MockSession {
    model: Model,
    script: Script,
}

#[async_trait]
impl LlmSession for MockSession {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        self.script.prompts.lock().unwrap().push(content.to_string());
        self.script
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::RequestFailed("No more responses".to_string())))
    }
}

pub struct MockGateway {
    pub script: Script,
    pub sessions_created: Mutex<usize>,
}

impl MockGateway {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            sessions_created: Mutex::new(0),
        }
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
        *self.sessions_created.lock().unwrap() += 1;
        Ok(Box::new(MockSession {
            model: model.clone(),
            script: self.script.clone(),
        }))
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        self.script
            .system_prompts
            .lock()
            .unwrap()
            .push(system_prompt.to_string());
        self.create_session(model).await
    }

    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        Ok(vec![])
    }
}

/// Gateway without any provider, as when no API key is configured.
pub struct NoProviderGateway;

#[async_trait]
impl LlmGateway for NoProviderGateway {
    async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
        Err(GatewayError::ModelNotAvailable(model.to_string()))
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        _system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        self.create_session(model).await
    }

    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        Ok(vec![])
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    pub events: Mutex<Vec<ConversationEvent>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.event_type).collect()
    }
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn paper_hit(title: &str, pdf_url: Option<&str>) -> PaperHit {
    PaperHit {
        title: title.to_string(),
        year: None,
        authors: vec![],
        pdf_url: pdf_url.map(str::to_string),
        landing_url: Some(format!("https://papers.test/{}", title.len())),
    }
}

/// Scholar backend keyed by exact query text.
#[derive(Default)]
pub struct MockScholar {
    pub results: HashMap<String, Result<Vec<PaperHit>, ScholarError>>,
    /// One-shot responses served before falling back to `results`.
    pub queued: Mutex<HashMap<String, VecDeque<Result<Vec<PaperHit>, ScholarError>>>>,
    pub downloads: HashMap<String, Result<Vec<u8>, ScholarError>>,
    pub searches: Mutex<Vec<String>>,
    pub fetched: Mutex<Vec<String>>,
}

impl MockScholar {
    pub fn with_hit(self, query: &str, pdf_url: Option<&str>) -> Self {
        self.with_hits(query, vec![paper_hit(query, pdf_url)])
    }

    pub fn with_hits(mut self, query: &str, hits: Vec<PaperHit>) -> Self {
        self.results.insert(query.to_string(), Ok(hits));
        self
    }

    pub fn with_search_error(mut self, query: &str, error: ScholarError) -> Self {
        self.results.insert(query.to_string(), Err(error));
        self
    }

    /// Serve `responses` in order for `query`, then fall back to `results`.
    pub fn with_search_sequence(
        self,
        query: &str,
        responses: Vec<Result<Vec<PaperHit>, ScholarError>>,
    ) -> Self {
        self.queued
            .lock()
            .unwrap()
            .insert(query.to_string(), responses.into());
        self
    }

    pub fn with_download(mut self, url: &str, bytes: Result<Vec<u8>, ScholarError>) -> Self {
        self.downloads.insert(url.to_string(), bytes);
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScholarSearchPort for MockScholar {
    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<PaperHit>, ScholarError> {
        self.searches.lock().unwrap().push(query.to_string());
        if let Some(next) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(query)
            .and_then(VecDeque::pop_front)
        {
            return next;
        }
        self.results.get(query).cloned().unwrap_or(Ok(vec![]))
    }

    async fn download_pdf(&self, url: &str) -> Result<Vec<u8>, ScholarError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.downloads
            .get(url)
            .cloned()
            .unwrap_or(Err(ScholarError::Http {
                status: 404,
                message: "not found".into(),
            }))
    }

    fn manual_search_url(&self, query: &str) -> String {
        format!("https://search.test/?q={}", query.replace(' ', "+"))
    }
}

/// Paper store that keeps everything in memory.
pub struct MemoryStore {
    dir: PathBuf,
    reject_pdfs: bool,
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub logs: Mutex<Vec<(String, Vec<DownloadRecord>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            dir: PathBuf::from("mem"),
            reject_pdfs: false,
            files: Mutex::new(HashMap::new()),
            logs: Mutex::new(Vec::new()),
        }
    }

    /// A store whose disk refuses PDFs but still takes notes and logs.
    pub fn rejecting_pdfs() -> Self {
        Self {
            reject_pdfs: true,
            ..Self::new()
        }
    }

    fn put(&self, filename: &str, bytes: &[u8]) -> PathBuf {
        self.files.lock().unwrap().insert(filename.to_string(), bytes.to_vec());
        self.dir.join(filename)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

impl PaperStorePort for MemoryStore {
    fn save_pdf(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        if self.reject_pdfs {
            return Err(StoreError::Io {
                path: self.dir.join(filename),
                source: std::io::Error::other("disk full"),
            });
        }
        Ok(self.put(filename, bytes))
    }

    fn save_manual_note(&self, filename: &str, text: &str) -> Result<PathBuf, StoreError> {
        Ok(self.put(filename, text.as_bytes()))
    }

    fn save_log(&self, filename: &str, records: &[DownloadRecord]) -> Result<PathBuf, StoreError> {
        self.logs
            .lock()
            .unwrap()
            .push((filename.to_string(), records.to_vec()));
        Ok(self.dir.join(filename))
    }

    fn output_dir(&self) -> &Path {
        &self.dir
    }
}

pub fn sample_index() -> KnowledgeIndex {
    KnowledgeIndex::build(
        vec![
            Document::new(
                "ruta2012",
                "Atomic-scale relaxation dynamics and aging in a metallic glass",
                SourceKind::Citation,
                "Metallic glasses show compressed exponential relaxation and aging below Tg.\n\n\
                 WAXS-XPCS near the first diffraction peak probes atomic-scale dynamics.",
            ),
            Document::new(
                "handbook",
                "8-ID-I data handbook",
                SourceKind::Handbook,
                "Colloid diffusion in glycerol is a standard SAXS-XPCS calibration measurement.",
            ),
        ],
        &ChunkingConfig::default(),
    )
}
