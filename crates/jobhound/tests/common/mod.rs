//! Shared harness for pipeline integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use jobhound::pipeline::{Pipeline, Toolbox};
use jobhound::trace::NoopSpans;
use jobhound::stages::{LogNotifier, PlainTextExtractor};
use jobhound_protocol::{RunConfig, Settings};
use jobhound_test_utils::{MockAtsFactory, MockCompletion, MockFetcher, MockSearch};

const RESUME_TEXT: &str = "Jane Doe\njane@example.com\n5 years of Python and ML experience.";

/// Test environment: temp dirs, mock collaborators, settings.
pub struct TestEnv {
    /// Temp directory (cleaned up on drop)
    _temp: TempDir,
    pub settings: Settings,
    pub resume_path: PathBuf,
    pub llm: Arc<MockCompletion>,
    pub search: Arc<MockSearch>,
    pub fetcher: Arc<MockFetcher>,
    pub ats: Arc<MockAtsFactory>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_llm(MockCompletion::new())
    }

    pub fn with_llm(llm: MockCompletion) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let resume_path = temp.path().join("resume.txt");
        std::fs::write(&resume_path, RESUME_TEXT).expect("Failed to write resume");

        let settings = Settings {
            checkpoint_enabled: false,
            checkpoint_dir: temp.path().join("checkpoints"),
            output_dir: temp.path().join("output"),
            ..Settings::default()
        };

        Self {
            _temp: temp,
            settings,
            resume_path,
            llm: Arc::new(llm),
            search: Arc::new(MockSearch::new()),
            fetcher: Arc::new(MockFetcher::new()),
            ats: Arc::new(MockAtsFactory::new()),
        }
    }

    pub fn toolbox(&self) -> Toolbox {
        Toolbox {
            llm: self.llm.clone(),
            search: self.search.clone(),
            ats_factory: self.ats.clone(),
            fetcher: self.fetcher.clone(),
            resume_extractor: Arc::new(PlainTextExtractor),
            notifier: Arc::new(LogNotifier),
            spans: Arc::new(NoopSpans::new()),
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.settings.clone(), self.toolbox())
    }

    /// Dry-run config so the notify stage never attempts delivery.
    pub fn config(&self, run_id: &str) -> RunConfig {
        let mut config = RunConfig::new(&self.resume_path, "remote ML engineer roles")
            .with_run_id(run_id);
        config.dry_run = true;
        config
    }
}
