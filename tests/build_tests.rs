mod common;

use common::{MemorySettingsStore, ScriptedCompiler, StaticHostProbe};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use takt::core::models::{BuildOutcome, CliOptions, CompileStats};
use takt::core::services::{classify_compile, BuildRunner};
use takt::infrastructure::DefaultConfigFactory;
use takt::utils::{EngineError, TaktError};

fn runner(compiler: Arc<ScriptedCompiler>) -> BuildRunner {
    BuildRunner::new(
        Arc::new(MemorySettingsStore::new()),
        Arc::new(StaticHostProbe),
        Arc::new(DefaultConfigFactory::new()),
        compiler,
    )
}

#[tokio::test]
async fn two_errors_surface_only_the_first() {
    let stats = CompileStats {
        errors: vec![
            "Cannot resolve './missing'".to_string(),
            "Unexpected token in src/app.js".to_string(),
        ],
        warnings: Vec::new(),
    };
    let compiler = Arc::new(ScriptedCompiler::ok(stats));

    let err = runner(compiler)
        .run(Path::new("/project/app"), &CliOptions::default())
        .await
        .unwrap_err();

    match err {
        TaktError::BuildFailed(message) => assert_eq!(message, "Cannot resolve './missing'"),
        other => panic!("expected BuildFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn clean_compile_reports_success() {
    let compiler = Arc::new(ScriptedCompiler::clean());

    let outcome = runner(compiler.clone())
        .run(Path::new("/project/app"), &CliOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, BuildOutcome::Success);
    assert_eq!(*compiler.calls.lock(), 1);
}

#[tokio::test]
async fn bare_engine_errors_propagate_unchanged() {
    let compiler = Arc::new(ScriptedCompiler::err(EngineError::new("")));

    let err = runner(compiler)
        .run(Path::new("/project/app"), &CliOptions::default())
        .await
        .unwrap_err();

    match err {
        TaktError::Engine(engine) => assert!(engine.message.is_empty()),
        other => panic!("expected Engine, got {:?}", other),
    }
}

#[tokio::test]
async fn engine_errors_with_messages_become_build_failures() {
    let compiler = Arc::new(ScriptedCompiler::err(EngineError::new(
        "bundler crashed before emitting",
    )));

    let err = runner(compiler)
        .run(Path::new("/project/app"), &CliOptions::default())
        .await
        .unwrap_err();

    match err {
        TaktError::BuildFailed(message) => {
            assert_eq!(message, "bundler crashed before emitting")
        }
        other => panic!("expected BuildFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn invalid_options_fail_before_the_compile_runs() {
    let compiler = Arc::new(ScriptedCompiler::clean());
    let options = CliOptions {
        polyfill: Some(json!("on")),
        ..Default::default()
    };

    let err = runner(compiler.clone())
        .run(Path::new("/project/app"), &options)
        .await
        .unwrap_err();

    match err {
        TaktError::InvalidOption { name } => assert_eq!(name, "polyfill"),
        other => panic!("expected InvalidOption, got {:?}", other),
    }
    assert_eq!(*compiler.calls.lock(), 0);
}

// CI escalation is exercised through the pure classifier so the tests stay
// independent of the ambient CI variable.

#[test]
fn warnings_pass_when_not_escalated() {
    let stats = CompileStats {
        errors: Vec::new(),
        warnings: vec!["asset size limit exceeded".to_string()],
    };

    let outcome = classify_compile(Ok(stats), false).unwrap();
    assert_eq!(
        outcome,
        BuildOutcome::Warnings(vec!["asset size limit exceeded".to_string()])
    );
}

#[test]
fn warnings_fail_when_escalated() {
    let stats = CompileStats {
        errors: Vec::new(),
        warnings: vec!["w1".to_string(), "w2".to_string()],
    };

    match classify_compile(Ok(stats), true).unwrap_err() {
        TaktError::BuildFailed(message) => assert_eq!(message, "w1\nw2"),
        other => panic!("expected BuildFailed, got {:?}", other),
    }
}
