//! End-to-end tests over the public task API.
//!
//! These compose constructors, combinators, the bulk executors, the bounded pool
//! and the retry drivers the way a caller would, including retry settings read
//! from a TOML config file.

use std::convert::Infallible;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lazytask_config::TaskConfig;
use lazytask_core::{BackoffOptions, FixedJitter, Task, UsageError};
use tokio::time::{Instant, sleep};

/// A task that sleeps for `ms` before settling with `outcome`.
fn after(ms: u64, outcome: Result<u32, String>) -> Task<u32, String> {
    Task::from_future(move || {
        let outcome = outcome.clone();
        async move {
            sleep(Duration::from_millis(ms)).await;
            outcome
        }
    })
}

#[tokio::test(start_paused = true)]
async fn composed_pipeline_recovers_and_records_effects() {
    let audit = Arc::new(Mutex::new(Vec::new()));
    let on_ok = Arc::clone(&audit);
    let on_err = Arc::clone(&audit);

    let task = after(20, Err("cold cache".to_string()))
        .tap_err(move |error| on_err.lock().unwrap().push(format!("miss: {error}")))
        .or_else(|_| after(10, Ok(7)))
        .map(|n| n * 6)
        .tap(move |n| on_ok.lock().unwrap().push(format!("hit: {n}")));

    assert_eq!(task.run().await, Ok(42));
    assert_eq!(
        *audit.lock().unwrap(),
        vec!["miss: cold cache".to_string(), "hit: 42".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn awaiting_a_task_supports_question_mark() {
    async fn total() -> Result<u32, String> {
        let a = after(5, Ok(2)).await?;
        let b = after(5, Ok(3)).await?;
        let c = after(5, Err("third failed".to_string())).await?;
        Ok(a + b + c)
    }
    assert_eq!(total().await, Err("third failed".to_string()));
}

#[tokio::test(start_paused = true)]
async fn every_fork_reruns_the_whole_chain() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let task = Task::<u32, String>::new(move |resolver| {
        counter.fetch_add(1, Ordering::SeqCst);
        resolver.ok(1);
    })
    .and(after(5, Ok(2)))
    .invert()
    .invert();

    assert_eq!(task.run().await, Ok(2));
    assert_eq!(task.run().await, Ok(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn bulk_and_pooled_executors_agree() {
    let tasks: Vec<_> = (0..12_u32)
        .map(|i| after(u64::from(12 - i) * 3, Ok(i)))
        .collect();

    let unbounded = Task::all(tasks.clone()).run().await;
    let bounded = Task::all_concurrent(3, tasks.clone()).unwrap().run().await;
    assert_eq!(unbounded, Ok((0..12).collect::<Vec<_>>()));
    assert_eq!(bounded, unbounded);

    let (oks, errs) = Task::collect_concurrent(3, tasks).unwrap().run().await.unwrap();
    assert_eq!(oks.len(), 12);
    assert!(errs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn pooled_collect_reports_failures_as_data() {
    let tasks = vec![
        after(10, Ok(1)),
        after(5, Err("two".to_string())),
        after(1, Ok(3)),
    ];
    let outcome: Result<(Vec<u32>, Vec<String>), Infallible> =
        Task::collect_concurrent(1, tasks).unwrap().run().await;
    assert_eq!(outcome, Ok((vec![1, 3], vec!["two".to_string()])));
}

#[test]
fn usage_errors_surface_before_anything_runs() {
    let never = Task::<u32, String>::new(|_| panic!("must not run"));
    assert_eq!(
        Task::all_concurrent(0, vec![never.clone()]).unwrap_err(),
        UsageError::InvalidConcurrency { value: 0 }
    );
    assert_eq!(
        Task::retry(0, never).unwrap_err(),
        UsageError::InvalidTryLimit { value: 0 }
    );
    assert!(BackoffOptions::from_millis(0, 10, 100).is_err());
}

#[tokio::test(start_paused = true)]
async fn retry_wraps_a_flaky_chain() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let flaky = Task::<usize, String>::new(move |resolver| {
        let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if call < 3 {
            resolver.err(format!("attempt {call}"));
        } else {
            resolver.ok(call);
        }
    })
    .and_then(|call| Task::from_future(move || async move { Ok(call * 10) }));

    let outcome = Task::retry(5, flaky).unwrap().run().await;
    assert_eq!(outcome, Ok(30));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn backoff_uses_settings_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[retry]\ntry_limit = 3\nbackoff_step_ms = 40\nbackoff_cap_ms = 60"
    )
    .unwrap();
    let config = TaskConfig::load(file.path()).unwrap();
    let options = config.retry.backoff_options().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let always_fails = Task::<(), usize>::new(move |resolver| {
        resolver.err(counter.fetch_add(1, Ordering::SeqCst) + 1);
    });

    let start = Instant::now();
    let task = Task::retry_with_backoff_jitter(options, Arc::new(FixedJitter(1.0)), always_fails);
    let outcome = task.run().await;
    let elapsed = start.elapsed();

    assert_eq!(outcome, Err(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Full jitter: 40ms, then min(60, 80) = 60ms.
    assert!(elapsed >= Duration::from_millis(100), "elapsed {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(110), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn pool_concurrency_from_config_bounds_in_flight_work() {
    let config = TaskConfig::from_toml_str("[pool]\nconcurrency = 2\n").unwrap();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..6_u32)
        .map(|i| {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            let done = Arc::clone(&running);
            Task::<u32, String>::from_future(move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                async move {
                    sleep(Duration::from_millis(10)).await;
                    Ok(i)
                }
            })
            .finally(move || {
                done.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();

    let start = Instant::now();
    let values = Task::all_concurrent(config.pool.concurrency().unwrap().get(), tasks)
        .unwrap()
        .run()
        .await;
    assert_eq!(values, Ok((0..6).collect::<Vec<_>>()));
    assert_eq!(peak.load(Ordering::SeqCst), 2);
    assert!(start.elapsed() >= Duration::from_millis(30));
}
