use recon_probe::core::{
    ClassifierRule, OutcomeKind, ProbeCapability, RawResult, ResponseEnvelope, Target,
    TransportFailure, Verdict,
};
use recon_probe::{run_probes, Outcome, ProbeEngine, ProbeError, Result, SchedulerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Answers according to the discriminator prefix:
/// `hit*` positive, `miss*` negative, `slow*` never answers in time,
/// `err*` returns an error, `panic*` panics, `nx*` fails to resolve.
struct ScriptedCapability {
    calls: AtomicUsize,
}

impl ScriptedCapability {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ProbeCapability for ScriptedCapability {
    async fn execute(&self, _target: &Target, discriminator: &str) -> Result<RawResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        // later calls in a wave settle first
        tokio::time::sleep(Duration::from_millis(50 - (call % 5) as u64 * 10)).await;

        if discriminator.starts_with("slow") {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if discriminator.starts_with("err") {
            return Err(ProbeError::InvalidTarget {
                input: discriminator.to_string(),
            });
        }
        if discriminator.starts_with("panic") {
            panic!("capability blew up on {}", discriminator);
        }
        if discriminator.starts_with("nx") {
            return Ok(RawResult::Failure(TransportFailure::Unresolvable));
        }
        if discriminator.starts_with("limited") {
            return Ok(RawResult::Response(ResponseEnvelope::new(
                200,
                "Too many requests, slow down",
            )));
        }

        let body = if discriminator.starts_with("hit") {
            format!("found {}", discriminator)
        } else {
            String::new()
        };
        Ok(RawResult::Response(ResponseEnvelope::new(200, body)))
    }
}

struct BodyMarkerRule;

impl ClassifierRule for BodyMarkerRule {
    fn name(&self) -> &str {
        "body-marker"
    }

    fn is_rate_limited(&self, response: &ResponseEnvelope) -> bool {
        response.status_code == 429 || response.body.contains("Too many requests")
    }

    fn judge(&self, response: &ResponseEnvelope) -> Verdict {
        if response.body.is_empty() {
            Verdict::Negative
        } else {
            Verdict::Positive(response.body.clone())
        }
    }
}

fn config(wave_size: usize, probe_timeout_ms: u64) -> SchedulerConfig {
    SchedulerConfig {
        wave_size,
        probe_timeout_ms,
        inter_wave_delay_ms: 10,
    }
}

fn discriminators(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_every_spec_lands_in_exactly_one_bucket_in_input_order() {
    let items: Vec<String> = (0..23)
        .map(|i| match i % 3 {
            0 => format!("hit-{}", i),
            1 => format!("miss-{}", i),
            _ => format!("nx-{}", i),
        })
        .collect();

    let report = run_probes(
        "https://example.com/index.html",
        &items,
        ScriptedCapability::new(),
        &BodyMarkerRule,
        config(5, 1_000),
    )
    .await
    .unwrap();

    assert_eq!(report.target.as_str(), "example.com");
    assert_eq!(report.total_issued, 23);
    assert_eq!(report.waves, 5);
    assert_eq!(
        report.positives.len() + report.negatives.len() + report.errors.len(),
        23
    );
    assert_eq!(report.positives.len(), 8);
    assert_eq!(report.negatives.len(), 8);
    assert_eq!(report.errors.len(), 7);

    for bucket in [&report.positives, &report.negatives, &report.errors] {
        let indexes: Vec<usize> = bucket.iter().map(|r| r.index).collect();
        let mut sorted = indexes.clone();
        sorted.sort_unstable();
        assert_eq!(indexes, sorted);
    }

    let ordered: Vec<&str> = report
        .ordered_results()
        .iter()
        .map(|r| r.spec.discriminator.as_str())
        .collect();
    assert_eq!(ordered, items.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_hung_probe_becomes_timed_out_without_blocking_the_wave() {
    let items = discriminators(&["hit-a", "slow-b", "miss-c"]);

    let report = run_probes(
        "example.com",
        &items,
        ScriptedCapability::new(),
        &BodyMarkerRule,
        config(5, 1_000),
    )
    .await
    .unwrap();

    assert_eq!(report.positives.len(), 1);
    assert_eq!(report.negatives.len(), 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].spec.discriminator, "slow-b");
    assert_eq!(report.errors[0].outcome, Outcome::TimedOut);
}

#[tokio::test]
async fn test_failing_and_panicking_probes_do_not_abort_the_batch() {
    let items = discriminators(&["hit-1", "err-2", "panic-3", "hit-4", "miss-5", "hit-6"]);

    let report = run_probes(
        "example.com",
        &items,
        ScriptedCapability::new(),
        &BodyMarkerRule,
        config(3, 5_000),
    )
    .await
    .unwrap();

    assert_eq!(report.total_issued, 6);
    assert_eq!(report.positives.len(), 3);
    assert_eq!(report.negatives.len(), 1);

    let error_kinds: Vec<(usize, OutcomeKind)> = report
        .errors
        .iter()
        .map(|r| (r.index, r.outcome.kind()))
        .collect();
    assert_eq!(
        error_kinds,
        vec![
            (1, OutcomeKind::TransportError),
            (2, OutcomeKind::TransportError)
        ]
    );
}

#[tokio::test]
async fn test_dns_style_scenario_splits_answer_empty_and_unresolvable() {
    struct Resolver;

    #[async_trait::async_trait]
    impl ProbeCapability for Resolver {
        async fn execute(&self, _target: &Target, discriminator: &str) -> Result<RawResult> {
            Ok(match discriminator {
                "A" => RawResult::Response(ResponseEnvelope::new(200, "93.184.216.34")),
                "MX" => RawResult::Response(ResponseEnvelope::new(200, "")),
                _ => RawResult::Failure(TransportFailure::Unresolvable),
            })
        }
    }

    let report = ProbeEngine::new(&SchedulerConfig::default())
        .run(
            "example.com",
            &discriminators(&["A", "MX", "BOGUS"]),
            Arc::new(Resolver),
            &BodyMarkerRule,
        )
        .await
        .unwrap();

    let names = |results: &Vec<recon_probe::ProbeResult>| -> Vec<String> {
        results.iter().map(|r| r.spec.discriminator.clone()).collect()
    };
    assert_eq!(names(&report.positives), vec!["A"]);
    assert_eq!(names(&report.negatives), vec!["MX"]);
    assert_eq!(names(&report.errors), vec!["BOGUS"]);
    assert_eq!(report.errors[0].outcome.kind(), OutcomeKind::TransportError);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_marker_wins_over_a_200_status() {
    let report = run_probes(
        "example.com",
        &discriminators(&["limited/admin"]),
        ScriptedCapability::new(),
        &BodyMarkerRule,
        config(5, 1_000),
    )
    .await
    .unwrap();

    assert!(report.negatives.is_empty());
    assert!(report.positives.is_empty());
    assert_eq!(report.errors[0].outcome, Outcome::RateLimited);
    assert_eq!(report.summary().rate_limited, 1);
}

#[tokio::test]
async fn test_empty_discriminator_list_yields_empty_report() {
    let report = run_probes(
        "example.com",
        &[],
        ScriptedCapability::new(),
        &BodyMarkerRule,
        SchedulerConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.total_issued, 0);
    assert_eq!(report.waves, 0);
    assert!(report.ordered_results().is_empty());
}

#[tokio::test]
async fn test_blank_target_is_rejected_before_any_probe() {
    let capability = ScriptedCapability::new();
    let result = run_probes(
        "  https://  ",
        &discriminators(&["hit"]),
        capability.clone(),
        &BodyMarkerRule,
        SchedulerConfig::default(),
    )
    .await;

    assert!(matches!(result, Err(ProbeError::InvalidTarget { .. })));
    assert_eq!(capability.calls.load(Ordering::SeqCst), 0);
}
