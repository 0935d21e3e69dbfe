//! Checkpoint save/resume behavior across pipeline restarts.

mod common;

use std::sync::Arc;

use common::TestEnv;
use jobhound_protocol::{AgentFailure, RunStatus};
use jobhound_test_utils::{fixtures, greenhouse_job, MockCompletion};

#[tokio::test]
async fn resume_skips_completed_setup_stages() {
    let mut env = TestEnv::new();
    env.settings.checkpoint_enabled = true;

    // First run: setup succeeds, then discovery dies (no career pages).
    env.llm.enqueue(fixtures::profile_reply());
    env.llm.enqueue(fixtures::prefs_reply());
    env.llm.enqueue(fixtures::candidates_reply(&["GhostCo"]));

    let first = env.pipeline().run(env.config("run_e")).await.unwrap();
    assert_eq!(first.status, RunStatus::Failed);
    assert_eq!(env.llm.call_count(), 3);

    // Both setup checkpoints exist.
    let checkpoint = jobhound::checkpoint::load_latest_checkpoint(
        "run_e",
        &env.settings.checkpoint_dir,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(checkpoint.completed_step, "parse_prefs");
    let saved = jobhound::PipelineState::from_checkpoint(checkpoint).unwrap();
    assert_eq!(saved.profile.as_ref().unwrap().name, "Jane Doe");
    assert_eq!(saved.preferences.as_ref().unwrap().currency, "USD");

    // Second run under the same run id with a fresh reply queue: the parse
    // stages are skipped, so the first call is candidate generation.
    env.llm = Arc::new(MockCompletion::new());
    env.llm.enqueue(fixtures::candidates_reply(&["Acme"]));
    env.llm.enqueue(fixtures::batch_score_reply(&[(0, 85)]));
    env.search.insert("Acme", "https://boards.greenhouse.io/acme");
    env.ats.insert(
        "Acme",
        vec![greenhouse_job(
            "ML Engineer",
            "Build models",
            "https://boards.greenhouse.io/acme/1",
        )],
    );

    let second = env.pipeline().run(env.config("run_e")).await.unwrap();
    assert_eq!(second.status, RunStatus::Success);
    assert_eq!(env.llm.call_count(), 2);
    assert!(env.llm.call_text(0).contains("<candidate_profile>"));
    // The restored profile fed the prompt, not a re-parse.
    assert!(env.llm.call_text(0).contains("Jane Doe"));
}

#[tokio::test]
async fn corrupt_checkpoint_aborts_the_run() {
    let mut env = TestEnv::new();
    env.settings.checkpoint_enabled = true;
    tokio::fs::create_dir_all(&env.settings.checkpoint_dir)
        .await
        .unwrap();
    tokio::fs::write(
        env.settings.checkpoint_dir.join("run_x--parse_resume.json"),
        b"{definitely not json",
    )
    .await
    .unwrap();

    let err = env.pipeline().run(env.config("run_x")).await.unwrap_err();
    assert!(matches!(err, AgentFailure::Checkpoint(_)));
}

#[tokio::test]
async fn checkpoints_disabled_means_no_files() {
    let env = TestEnv::new();
    env.llm.enqueue(fixtures::profile_reply());
    env.llm.enqueue(fixtures::prefs_reply());
    env.llm.enqueue(fixtures::candidates_reply(&["GhostCo"]));

    let result = env.pipeline().run(env.config("run_nocp")).await.unwrap();
    assert_eq!(result.status, RunStatus::Failed);
    assert!(!env.settings.checkpoint_dir.exists());
}
