//! Mock collaborators and fixtures for jobhound tests.
//!
//! Every pipeline collaborator has a scripted stand-in here so tests run
//! with zero network access: a queue-driven completion client, a canned
//! search provider, a canned page fetcher, and an ATS factory serving
//! fixture job records.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use jobhound_llm::{ChatMessage, Completion, CompletionClient, LlmError, TokenUsage};
use jobhound_protocol::{AtsType, Company};
use jobhound_tools::{
    AtsClient, AtsClientFactory, AtsError, PageFetcher, ScrapeError, SearchProvider, SearchResult,
};

pub mod fixtures;

// ============================================================================
// Completion client
// ============================================================================

enum MockReply {
    Content(Value),
    Error(String),
}

/// Queue-driven completion client. Replies are consumed in call order; the
/// full message history of every call is recorded for assertions.
pub struct MockCompletion {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
    usage: TokenUsage,
    delay: Option<Duration>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            usage: TokenUsage {
                input_tokens: 1000,
                output_tokens: 200,
            },
            delay: None,
        }
    }

    /// Fixed usage reported for every call.
    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = TokenUsage {
            input_tokens,
            output_tokens,
        };
        self
    }

    /// Sleep before answering; for timeout tests with paused clocks.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn enqueue(&self, content: Value) {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Content(content));
    }

    pub fn enqueue_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Error(message.into()));
    }

    /// Message histories of all calls made so far.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Concatenated text of one recorded call, for content assertions.
    pub fn call_text(&self, index: usize) -> String {
        self.calls.lock().unwrap()[index]
            .iter()
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        _schema: &Value,
    ) -> Result<Completion, LlmError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(messages.to_vec());

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Content(content)) => Ok(Completion {
                content,
                usage: self.usage,
                model: model.to_string(),
            }),
            Some(MockReply::Error(message)) => Err(LlmError::MalformedOutput {
                attempts: 3,
                message,
            }),
            None => Err(LlmError::EmptyResponse),
        }
    }
}

// ============================================================================
// Search provider
// ============================================================================

/// Canned career-page search: maps company names to a single result URL.
/// Queries that mention no known company return nothing.
pub struct MockSearch {
    pages: Mutex<HashMap<String, String>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, company: &str, url: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(company.to_string(), url.to_string());
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str, _max_results: usize) -> anyhow::Result<Vec<SearchResult>> {
        let pages = self.pages.lock().unwrap();
        let results = pages
            .iter()
            .filter(|(company, _)| query.contains(company.as_str()))
            .map(|(company, url)| SearchResult {
                title: format!("{company} careers"),
                url: url.clone(),
                content: String::new(),
            })
            .collect();
        Ok(results)
    }
}

// ============================================================================
// Page fetcher
// ============================================================================

/// Canned page fetcher: maps URLs to bodies; unknown URLs 404.
pub struct MockFetcher {
    pages: Mutex<HashMap<String, String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, url: &str, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

// ============================================================================
// ATS factory
// ============================================================================

/// ATS factory serving fixture job records keyed by company name.
pub struct MockAtsFactory {
    jobs_by_company: Mutex<HashMap<String, Vec<Value>>>,
    failing_companies: Mutex<HashSet<String>>,
}

impl MockAtsFactory {
    pub fn new() -> Self {
        Self {
            jobs_by_company: Mutex::new(HashMap::new()),
            failing_companies: Mutex::new(HashSet::new()),
        }
    }

    pub fn insert(&self, company: &str, jobs: Vec<Value>) {
        self.jobs_by_company
            .lock()
            .unwrap()
            .insert(company.to_string(), jobs);
    }

    /// Every fetch for this company fails with a 500.
    pub fn fail_for(&self, company: &str) {
        self.failing_companies
            .lock()
            .unwrap()
            .insert(company.to_string());
    }
}

impl Default for MockAtsFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AtsClientFactory for MockAtsFactory {
    fn client_for(&self, ats_type: AtsType) -> Option<Box<dyn AtsClient>> {
        Some(Box::new(MockAtsClient {
            ats_type,
            jobs_by_company: self.jobs_by_company.lock().unwrap().clone(),
            failing_companies: self.failing_companies.lock().unwrap().clone(),
        }))
    }
}

struct MockAtsClient {
    ats_type: AtsType,
    jobs_by_company: HashMap<String, Vec<Value>>,
    failing_companies: HashSet<String>,
}

#[async_trait]
impl AtsClient for MockAtsClient {
    fn ats_type(&self) -> AtsType {
        self.ats_type
    }

    fn detect(&self, _career_url: &str) -> bool {
        true
    }

    async fn fetch_jobs(&self, company: &Company) -> Result<Vec<Value>, AtsError> {
        if self.failing_companies.contains(&company.name) {
            return Err(AtsError::Status {
                ats: self.ats_type,
                status: 500,
                url: company.career_page.url.clone(),
            });
        }
        Ok(self
            .jobs_by_company
            .get(&company.name)
            .cloned()
            .unwrap_or_default())
    }
}

/// Convenience: a Greenhouse-shaped fixture job record.
pub fn greenhouse_job(title: &str, content: &str, absolute_url: &str) -> Value {
    json!({
        "title": title,
        "content": content,
        "absolute_url": absolute_url,
        "location": {"name": "Remote"},
        "updated_at": "2025-01-15T00:00:00Z"
    })
}
