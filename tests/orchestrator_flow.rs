//! End-to-end invoke pipeline behavior.

use ai_relay::{Error, InvokeOptions, OrchestratorBuilder, Params, RetryPolicy};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn generate_params(prompt: &str) -> Params {
    let mut params = Params::new();
    params.insert("prompt".into(), json!(prompt));
    params
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(3)
        .with_initial_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_millis(10))
        .no_jitter()
}

#[tokio::test]
async fn second_identical_invoke_is_served_from_cache() {
    let orchestrator = OrchestratorBuilder::new().build().unwrap();
    orchestrator
        .vault()
        .set_credential("acme", "sk-test-credential-1234")
        .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();
    let task = move |_credential: String| {
        let calls = calls_in.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<Value, Error>(json!({"text": "generated"}))
        }
    };

    let options = InvokeOptions::new("acme")
        .with_model("gpt-4o-mini")
        .with_ttl(Duration::from_secs(5));
    let params = generate_params("Draft an intro");

    let first: Value = orchestrator
        .invoke("generate", &params, &task, &options)
        .await
        .unwrap();
    let second: Value = orchestrator
        .invoke("generate", &params, &task, &options)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);

    let records = orchestrator.meter().recent(2);
    assert_eq!(records.len(), 2);
    assert!(!records[0].cache_hit);
    assert!(records[1].cache_hit);
    assert_eq!(records[1].estimated_cost_usd, 0.0);

    let stats = orchestrator.cache().stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn equivalent_param_orderings_share_one_remote_call() {
    let orchestrator = OrchestratorBuilder::new().build().unwrap();
    orchestrator
        .vault()
        .set_credential("acme", "sk-test-credential-1234")
        .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();
    let task = move |_credential: String| {
        let calls = calls_in.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<Value, Error>(json!({"text": "same"}))
        }
    };

    let options = InvokeOptions::new("acme");

    let mut a = Params::new();
    a.insert("prompt".into(), json!("  Summarize THIS  "));
    a.insert("temperature".into(), json!(0.2));
    let mut b = Params::new();
    b.insert("temperature".into(), json!(0.2));
    b.insert("prompt".into(), json!("summarize this"));

    let _: Value = orchestrator.invoke("generate", &a, &task, &options).await.unwrap();
    let _: Value = orchestrator.invoke("generate", &b, &task, &options).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_credential_fails_fast_without_running_the_task() {
    // make sure the generic fallback cannot satisfy resolution
    std::env::remove_var("API_KEY");

    let orchestrator = OrchestratorBuilder::new().build().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();
    let task = move |_credential: String| {
        let calls = calls_in.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<Value, Error>(json!({}))
        }
    };

    let result: Result<Value, _> = orchestrator
        .invoke(
            "generate",
            &generate_params("x"),
            &task,
            &InvokeOptions::new("unconfigured-provider"),
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    match result {
        Err(Error::Configuration { message, hint }) => {
            assert!(message.contains("unconfigured-provider"));
            assert!(hint.is_some());
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[tokio::test]
async fn client_errors_are_not_retried_or_cached() {
    let orchestrator = OrchestratorBuilder::new().build().unwrap();
    orchestrator
        .vault()
        .set_credential("acme", "sk-test-credential-1234")
        .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();
    let task = move |_credential: String| {
        let calls = calls_in.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<Value, Error>(Error::Remote {
                status: 400,
                message: "malformed prompt".into(),
                retry_after_ms: None,
            })
        }
    };

    let options = InvokeOptions::new("acme").with_retry_policy(fast_policy());
    let result: Result<Value, _> = orchestrator
        .invoke("generate", &generate_params("x"), &task, &options)
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(Error::Remote { status: 400, .. })));
    // failure was not cached: nothing to hit
    assert_eq!(orchestrator.cache().stats().await.size, 0);
}

#[tokio::test]
async fn rate_limit_exhaustion_surfaces_after_max_attempts() {
    let orchestrator = OrchestratorBuilder::new().build().unwrap();
    orchestrator
        .vault()
        .set_credential("acme", "sk-test-credential-1234")
        .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();
    let task = move |_credential: String| {
        let calls = calls_in.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<Value, Error>(Error::Remote {
                status: 429,
                message: "slow down".into(),
                retry_after_ms: None,
            })
        }
    };

    let options = InvokeOptions::new("acme").with_retry_policy(fast_policy());
    let result: Result<Value, _> = orchestrator
        .invoke("generate", &generate_params("x"), &task, &options)
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match result {
        Err(Error::RateLimited { message, .. }) => assert!(message.contains("retries exhausted")),
        other => panic!("expected rate-limit exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn error_messages_are_scrubbed_of_the_credential() {
    let orchestrator = OrchestratorBuilder::new().build().unwrap();
    orchestrator
        .vault()
        .set_credential("acme", "sk-leaky-credential-9876")
        .unwrap();

    let task = move |credential: String| async move {
        Err::<Value, Error>(Error::Remote {
            status: 401,
            message: format!("invalid api key: {credential}"),
            retry_after_ms: None,
        })
    };

    let result: Result<Value, _> = orchestrator
        .invoke(
            "generate",
            &generate_params("x"),
            &task,
            &InvokeOptions::new("acme"),
        )
        .await;

    let text = result.unwrap_err().to_string();
    assert!(!text.contains("sk-leaky-credential-9876"));
    assert!(text.contains("sk-l...9876"));
}

#[tokio::test]
async fn uncacheable_invokes_always_run_the_task() {
    let orchestrator = OrchestratorBuilder::new().build().unwrap();
    orchestrator
        .vault()
        .set_credential("acme", "sk-test-credential-1234")
        .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();
    let task = move |_credential: String| {
        let calls = calls_in.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<Value, Error>(json!({"text": "fresh"}))
        }
    };

    let options = InvokeOptions::new("acme").uncacheable();
    let params = generate_params("always fresh");
    let _: Value = orchestrator.invoke("generate", &params, &task, &options).await.unwrap();
    let _: Value = orchestrator.invoke("generate", &params, &task, &options).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(orchestrator.cache().stats().await.size, 0);
}

#[tokio::test]
async fn caller_timeout_is_retried_then_surfaced() {
    let orchestrator = OrchestratorBuilder::new().build().unwrap();
    orchestrator
        .vault()
        .set_credential("acme", "sk-test-credential-1234")
        .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();
    let task = move |_credential: String| {
        let calls = calls_in.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<Value, Error>(json!({}))
        }
    };

    let options = InvokeOptions::new("acme")
        .with_retry_policy(fast_policy().with_max_attempts(2))
        .with_timeout(Duration::from_millis(20));
    let result: Result<Value, _> = orchestrator
        .invoke("generate", &generate_params("slow"), &task, &options)
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(matches!(result, Err(Error::Timeout { .. })));
}
