//! Status polling with bounded retries

use embedded_hal::delay::DelayNs;

use crate::config::PollPolicy;
use crate::Error;

/// Call `ready` until it returns `true`, sleeping between attempts.
///
/// Returns the number of status reads performed. The first read happens
/// immediately; the delay only separates consecutive reads.
pub(crate) fn poll_until<D, E, F>(
    delay: &mut D,
    policy: PollPolicy,
    mut ready: F,
) -> Result<u32, Error<E>>
where
    D: DelayNs,
    F: FnMut() -> Result<bool, Error<E>>,
{
    let mut polls: u32 = 0;
    loop {
        polls = polls.saturating_add(1);
        if ready()? {
            return Ok(polls);
        }
        if policy.max_polls.is_some_and(|max| polls >= max) {
            tracing::warn!(
                polls,
                interval_ms = policy.interval_ms,
                "status poll timed out"
            );
            return Err(Error::Timeout { polls });
        }
        delay.delay_ms(policy.interval_ms);
    }
}

#[cfg(all(test, feature = "std"))]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::mock::MockDelay;

    #[test]
    fn ready_on_first_read_does_not_sleep() {
        let mut delay = MockDelay::new();
        let polls =
            poll_until::<_, (), _>(&mut delay, PollPolicy::new(10, 3), || Ok(true)).unwrap();
        assert_eq!(polls, 1);
        assert_eq!(delay.total_ms(), 0);
    }

    #[test]
    fn sleeps_between_busy_reads() {
        let mut delay = MockDelay::new();
        let mut busy = 3;
        let polls = poll_until::<_, (), _>(&mut delay, PollPolicy::new(10, 10), || {
            busy -= 1;
            Ok(busy < 0)
        })
        .unwrap();
        assert_eq!(polls, 4);
        assert_eq!(delay.calls(), 3);
        assert_eq!(delay.total_ms(), 30);
    }

    #[test]
    fn gives_up_after_budget() {
        let mut delay = MockDelay::new();
        let err = poll_until::<_, (), _>(&mut delay, PollPolicy::new(100, 4), || Ok(false))
            .unwrap_err();
        assert_eq!(err, Error::Timeout { polls: 4 });
        assert_eq!(delay.total_ms(), 300);
    }

    #[test]
    fn unbounded_policy_keeps_polling() {
        let mut delay = MockDelay::new();
        let mut remaining = 1_000;
        let polls = poll_until::<_, (), _>(&mut delay, PollPolicy::unbounded(1), || {
            remaining -= 1;
            Ok(remaining == 0)
        })
        .unwrap();
        assert_eq!(polls, 1_000);
    }

    #[test]
    fn status_read_errors_propagate() {
        let mut delay = MockDelay::new();
        let err = poll_until::<_, &str, _>(&mut delay, PollPolicy::new(1, 5), || {
            Err(Error::Master("link lost"))
        })
        .unwrap_err();
        assert_eq!(err, Error::Master("link lost"));
        assert_eq!(delay.calls(), 0);
    }
}
