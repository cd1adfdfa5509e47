use parley_core::{CircuitBreakerConfig, RetryConfig};
use std::time::Duration;

#[test]
fn test_defaults_match_documented_values() {
    let retry = RetryConfig::default();
    assert_eq!(retry.max_retries, 3);
    assert_eq!(retry.base_delay_ms, 1000);
    assert_eq!(retry.max_delay_ms, 30_000);
    assert_eq!(retry.exponential_base, 2.0);
    assert!(retry.jitter);
    assert_eq!(retry.total_attempts(), 4);

    let breaker = CircuitBreakerConfig::default();
    assert_eq!(breaker.failure_threshold, 5);
    assert_eq!(breaker.reset_timeout(), Duration::from_secs(60));
    assert_eq!(breaker.monitoring_period(), Duration::from_secs(300));
    assert_eq!(breaker.half_open_max_probes, 1);
}

#[test]
fn test_nominal_delays_grow_exponentially() {
    let retry = RetryConfig::default();
    let delays: Vec<_> = (0..retry.max_retries)
        .map(|attempt| retry.nominal_delay(attempt))
        .collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(4000),
        ]
    );
}

#[test]
fn test_nominal_delay_is_capped() {
    let retry = RetryConfig::default().with_max_delay_ms(5000);
    assert_eq!(retry.nominal_delay(2), Duration::from_millis(4000));
    assert_eq!(retry.nominal_delay(3), Duration::from_millis(5000));
    assert_eq!(retry.nominal_delay(u32::MAX), Duration::from_millis(5000));
}

#[test]
fn test_custom_base_is_honored() {
    let retry = RetryConfig::default()
        .with_base_delay_ms(100)
        .with_exponential_base(3.0);
    assert_eq!(retry.nominal_delay(0), Duration::from_millis(100));
    assert_eq!(retry.nominal_delay(1), Duration::from_millis(300));
    assert_eq!(retry.nominal_delay(2), Duration::from_millis(900));
}

#[test]
fn test_no_retry_makes_one_attempt() {
    assert_eq!(RetryConfig::no_retry().total_attempts(), 1);
}

#[test]
fn test_validate_rejects_bad_schedules() {
    assert!(RetryConfig::default().validate().is_ok());
    assert!(
        RetryConfig::default()
            .with_exponential_base(0.5)
            .validate()
            .is_err()
    );
    assert!(
        RetryConfig::default()
            .with_exponential_base(f64::NAN)
            .validate()
            .is_err()
    );
    assert!(
        RetryConfig::default()
            .with_base_delay_ms(60_000)
            .validate()
            .is_err()
    );
    assert!(
        CircuitBreakerConfig::default()
            .with_failure_threshold(0)
            .validate()
            .is_err()
    );
}

#[test]
fn test_partial_config_deserializes_with_defaults() {
    let retry: RetryConfig = serde_json::from_str(r#"{ "max_retries": 1, "jitter": false }"#)
        .expect("valid retry config");
    assert_eq!(retry.max_retries, 1);
    assert!(!retry.jitter);
    assert_eq!(retry.base_delay_ms, 1000);
}
