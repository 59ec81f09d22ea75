use crate::domain::{HourlyBucket, MessageEvent};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, Time};

pub const HOURLY_SLOT_COUNT: usize = 24;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Per-session totals folded from one transcript scan.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionTotals {
    pub message_count: usize,
    pub total_cost: f64,
    pub today_cost: f64,
}

/// Fold message events in line order. Every event counts toward the message
/// total; costs accumulate into the lifetime total, and into the today
/// total when the timestamp is strictly past the boundary.
pub fn fold_message_events(
    events: impl IntoIterator<Item = MessageEvent>,
    today_start_ms: i64,
) -> SessionTotals {
    let mut totals = SessionTotals::default();
    for event in events {
        totals.message_count += 1;
        totals.total_cost += event.cost;
        if event.timestamp_ms > today_start_ms {
            totals.today_cost += event.cost;
        }
    }
    totals
}

pub fn unix_ms(timestamp: OffsetDateTime) -> i64 {
    (timestamp.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Midnight of the reference instant in its own offset, as epoch ms. The
/// boundary is process-local when the caller captured a local "now".
pub fn start_of_day_ms(now: OffsetDateTime) -> i64 {
    unix_ms(now.replace_time(Time::MIDNIGHT))
}

const HOUR_LABEL: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");

/// The trailing 24-hour histogram: 24 contiguous 1-hour slots anchored to
/// the captured "now", slot `i` covering `(cutoff + i*1h, cutoff +
/// (i+1)*1h]` with `cutoff = now - 24h`. Bucket index is floor division
/// clamped to the last slot, so a timestamp exactly at `now` is included;
/// one exactly at the cutoff is not.
pub struct HourlyActivity {
    cutoff_ms: i64,
    now_ms: i64,
    buckets: Vec<HourlyBucket>,
}

impl HourlyActivity {
    pub fn new(now: OffsetDateTime) -> Self {
        let now_ms = unix_ms(now);
        let buckets = (0..HOURLY_SLOT_COUNT)
            .map(|slot| {
                let edge = now - Duration::hours((HOURLY_SLOT_COUNT - 1 - slot) as i64);
                HourlyBucket {
                    hour: edge.format(HOUR_LABEL).unwrap_or_default(),
                    messages: 0,
                    cost: 0.0,
                }
            })
            .collect();
        Self {
            cutoff_ms: now_ms - HOURLY_SLOT_COUNT as i64 * HOUR_MS,
            now_ms,
            buckets,
        }
    }

    pub fn record(&mut self, event: &MessageEvent) {
        if event.timestamp_ms <= self.cutoff_ms || event.timestamp_ms > self.now_ms {
            return;
        }
        let slot = (((event.timestamp_ms - self.cutoff_ms) / HOUR_MS) as usize)
            .min(HOURLY_SLOT_COUNT - 1);
        self.buckets[slot].messages += 1;
        self.buckets[slot].cost += event.cost;
    }

    pub fn into_buckets(self) -> Vec<HourlyBucket> {
        self.buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn fold_counts_every_event_and_sums_costs() {
        let boundary = 1_000;
        let events = vec![
            MessageEvent {
                timestamp_ms: 500,
                cost: 0.25,
            },
            MessageEvent {
                timestamp_ms: 1_500,
                cost: 0.5,
            },
            MessageEvent {
                timestamp_ms: 2_000,
                cost: 0.0,
            },
        ];
        let totals = fold_message_events(events, boundary);
        assert_eq!(totals.message_count, 3);
        assert_eq!(totals.total_cost, 0.75);
        assert_eq!(totals.today_cost, 0.5);
    }

    #[test]
    fn fold_today_boundary_is_strict() {
        let boundary = 1_000;
        let events = vec![MessageEvent {
            timestamp_ms: 1_000,
            cost: 0.5,
        }];
        let totals = fold_message_events(events, boundary);
        assert_eq!(totals.today_cost, 0.0);
        assert_eq!(totals.total_cost, 0.5);
    }

    #[test]
    fn fold_of_nothing_is_zero() {
        let totals = fold_message_events(Vec::new(), 0);
        assert_eq!(totals, SessionTotals::default());
    }

    #[test]
    fn start_of_day_uses_the_reference_offset() {
        let now = datetime!(2026-03-15 12:34:56 UTC);
        assert_eq!(start_of_day_ms(now), unix_ms(datetime!(2026-03-15 00:00 UTC)));

        let shifted = datetime!(2026-03-15 01:00 +5);
        assert_eq!(
            start_of_day_ms(shifted),
            unix_ms(datetime!(2026-03-15 00:00 +5))
        );
    }

    #[test]
    fn buckets_carry_upper_edge_labels() {
        let now = datetime!(2026-03-15 12:34 UTC);
        let buckets = HourlyActivity::new(now).into_buckets();
        assert_eq!(buckets.len(), HOURLY_SLOT_COUNT);
        assert_eq!(buckets[0].hour, "13:34");
        assert_eq!(buckets[23].hour, "12:34");
    }

    #[test]
    fn records_respect_window_edges() {
        let now = datetime!(2026-03-15 12:00 UTC);
        let now_ms = unix_ms(now);
        let mut activity = HourlyActivity::new(now);

        // Exactly at the lower bound: excluded.
        activity.record(&MessageEvent {
            timestamp_ms: now_ms - 24 * HOUR_MS,
            cost: 1.0,
        });
        // Outside the window entirely.
        activity.record(&MessageEvent {
            timestamp_ms: now_ms - 25 * HOUR_MS,
            cost: 1.0,
        });
        activity.record(&MessageEvent {
            timestamp_ms: now_ms + 1,
            cost: 1.0,
        });
        // Exactly at "now": lands in the last slot.
        activity.record(&MessageEvent {
            timestamp_ms: now_ms,
            cost: 0.5,
        });
        // One hour back: also the last slot's interval.
        activity.record(&MessageEvent {
            timestamp_ms: now_ms - HOUR_MS + 1,
            cost: 0.25,
        });
        // Just inside the window: first slot.
        activity.record(&MessageEvent {
            timestamp_ms: now_ms - 24 * HOUR_MS + 1,
            cost: 0.125,
        });

        let buckets = activity.into_buckets();
        assert_eq!(buckets[23].messages, 2);
        assert_eq!(buckets[23].cost, 0.75);
        assert_eq!(buckets[0].messages, 1);
        assert_eq!(buckets[0].cost, 0.125);

        let total: usize = buckets.iter().map(|bucket| bucket.messages).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn zero_timestamps_never_bucket() {
        let now = datetime!(2026-03-15 12:00 UTC);
        let mut activity = HourlyActivity::new(now);
        activity.record(&MessageEvent {
            timestamp_ms: 0,
            cost: 1.0,
        });
        let total: usize = activity
            .into_buckets()
            .iter()
            .map(|bucket| bucket.messages)
            .sum();
        assert_eq!(total, 0);
    }
}
