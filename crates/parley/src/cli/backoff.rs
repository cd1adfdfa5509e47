//! Backoff schedule preview.

use super::resolve_config;
use parley::ParleyResult;
use std::path::Path;

/// Print the delay preceding each retry under the configured policy.
pub fn show_backoff(path: Option<&Path>) -> ParleyResult<()> {
    let retry = resolve_config(path)?.retry;

    println!(
        "{} attempts, base {}ms, factor {}, cap {}ms, jitter {}",
        retry.total_attempts(),
        retry.base_delay_ms,
        retry.exponential_base,
        retry.max_delay_ms,
        if retry.jitter { "±25%" } else { "off" }
    );
    println!("{:-<40}", "");
    for attempt in 0..retry.max_retries {
        let delay = retry.nominal_delay(attempt);
        println!("retry {:>2}  after {:>8}ms", attempt + 1, delay.as_millis());
    }
    Ok(())
}
