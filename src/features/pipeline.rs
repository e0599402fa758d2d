//! Feature extraction: raw session snapshot → fixed 21-field vector.

use super::behavioral::{intervals, mean, round_to, std_dev, variance};
use super::FeatureVector;
use crate::collectors::RawSession;
use crate::config::FeaturesConfig;

const MS_PER_MINUTE: f64 = 60_000.0;
/// Stand-in duration when the session has no measurable length yet
const MIN_SESSION_MINUTES: f64 = 1.0 / 60.0;

pub struct FeatureExtractor {
    config: FeaturesConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    /// Deterministic in (`session`, `user_id`, `now`). Never fails; absent
    /// data yields the documented defaults.
    pub fn extract(&self, session: &RawSession, user_id: &str, now: i64) -> FeatureVector {
        let duration_ms = now.saturating_sub(session.started_at).max(0) as f64;
        let session_minutes = if duration_ms > 0.0 {
            duration_ms / MS_PER_MINUTE
        } else {
            MIN_SESSION_MINUTES
        };

        let avg_typing_speed = session.printable_count as f64 / session_minutes / 60.0;

        let holds: Vec<f64> = session.key_events.iter().map(|k| k.hold_time_ms).collect();

        let mut by_press: Vec<_> = session.key_events.iter().collect();
        by_press.sort_by_key(|k| k.down_at);
        let flights: Vec<f64> = by_press
            .windows(2)
            .map(|w| w[1].down_at.saturating_sub(w[0].up_at) as f64)
            .collect();

        let clicks = intervals(&session.click_timestamps);

        FeatureVector {
            user_id: user_id.to_string(),
            session_duration: duration_ms.round(),
            avg_typing_speed: round_to(avg_typing_speed, 3),
            typing_variance: round_to(variance(&flights), 4),
            mouse_move_count: session.pointer_move_count,
            click_interval_avg: round_to(mean(&clicks), 2),
            mouse_path_length: round_to(session.path_length_px, 2),
            backspace_count: session.backspace_count,
            focus_changes: session.focus_change_count,
            idle_time_ratio: round_to(self.idle_ratio(session, now, duration_ms, session_minutes), 4),
            key_hold_time_mean: round_to(mean(&holds), 3),
            key_flight_time_variance: round_to(variance(&holds), 4),
            correction_delay_mean: round_to(mean(&session.correction_intervals_ms), 2),
            paste_usage_count: session.paste_count,
            mouse_acceleration_mean: round_to(mean(&session.acceleration_samples), 4),
            mouse_direction_changes: session.direction_change_count,
            click_randomness_score: round_to(click_randomness(session), 4),
            requests_per_minute: round_to(self.requests_within(session, now, self.config.request_window_ms) as f64, 2),
            session_request_count: session.request_count,
            burst_score: round_to(self.burst_score(session, now), 4),
            honeypot_triggered: u8::from(session.honeypot_triggered),
        }
    }

    fn idle_ratio(&self, session: &RawSession, now: i64, duration_ms: f64, session_minutes: f64) -> f64 {
        let mut idle = session.idle_accumulated_ms as f64;
        let since_active = now.saturating_sub(session.last_active_at);
        if since_active > self.config.active_idle_threshold_ms {
            idle += since_active as f64;
        }
        let denom = if duration_ms > 0.0 {
            duration_ms
        } else {
            session_minutes * MS_PER_MINUTE
        };
        (idle / denom).clamp(0.0, 0.99)
    }

    fn requests_within(&self, session: &RawSession, now: i64, window_ms: i64) -> usize {
        session
            .request_timestamps
            .iter()
            .filter(|&&t| now.saturating_sub(t) < window_ms)
            .count()
    }

    /// Short-window request rate over long-window rate, capped at 1.
    fn burst_score(&self, session: &RawSession, now: i64) -> f64 {
        let long = self.requests_within(session, now, self.config.request_window_ms);
        if long == 0 {
            return self.config.burst_fallback;
        }
        let short = self.requests_within(session, now, self.config.burst_window_ms);
        let short_rate = short as f64 / (self.config.burst_window_ms as f64 / 1000.0);
        let long_rate = long as f64 / (self.config.request_window_ms as f64 / 1000.0);
        (short_rate / long_rate).min(1.0)
    }
}

/// Spread of click positions relative to the viewport, in [0, 1].
fn click_randomness(session: &RawSession) -> f64 {
    let vp = session.viewport;
    if vp.is_empty() {
        return 0.0;
    }
    let xs: Vec<f64> = session.click_positions.iter().map(|p| p.x / vp.width).collect();
    let ys: Vec<f64> = session.click_positions.iter().map(|p| p.y / vp.height).collect();
    ((std_dev(&xs) + std_dev(&ys)) / 2.0 * 2.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{InteractionEvent, Viewport};

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(FeaturesConfig::default())
    }

    fn feed(s: &mut RawSession, events: &[InteractionEvent]) {
        for e in events {
            s.apply(e, 5.0);
        }
    }

    #[test]
    fn empty_session_has_defined_values() {
        let s = RawSession::new(1_000, Viewport::new(1000.0, 800.0));
        let fv = extractor().extract(&s, "anonymous", 1_000);
        assert_eq!(fv.session_duration, 0.0);
        assert_eq!(fv.avg_typing_speed, 0.0);
        assert_eq!(fv.mouse_acceleration_mean, 0.0);
        assert_eq!(fv.click_randomness_score, 0.0);
        assert_eq!(fv.idle_time_ratio, 0.0);
        assert_eq!(fv.burst_score, 0.1);
        assert_eq!(fv.session_request_count, 1);
        assert_eq!(fv.honeypot_triggered, 0);
    }

    #[test]
    fn idle_ratio_is_clamped() {
        let mut s = RawSession::new(0, Viewport::new(1000.0, 800.0));
        s.idle_accumulated_ms = 50_000;
        let fv = extractor().extract(&s, "u", 10_000);
        assert_eq!(fv.idle_time_ratio, 0.99);
    }

    #[test]
    fn stale_activity_counts_as_idle() {
        let mut s = RawSession::new(0, Viewport::new(1000.0, 800.0));
        feed(&mut s, &[InteractionEvent::Paste { at: 6_000 }]);
        // 4s since last activity on a 10s session
        let fv = extractor().extract(&s, "u", 10_000);
        assert_eq!(fv.idle_time_ratio, 0.4);
        // under the threshold nothing is added
        let fv = extractor().extract(&s, "u", 8_000);
        assert_eq!(fv.idle_time_ratio, 0.0);
    }

    #[test]
    fn typing_statistics() {
        let mut s = RawSession::new(0, Viewport::new(1000.0, 800.0));
        feed(
            &mut s,
            &[
                InteractionEvent::KeyDown { key: "h".into(), at: 0 },
                InteractionEvent::KeyUp { key: "h".into(), at: 100 },
                InteractionEvent::KeyDown { key: "i".into(), at: 150 },
                InteractionEvent::KeyUp { key: "i".into(), at: 350 },
                InteractionEvent::KeyDown { key: "!".into(), at: 450 },
                InteractionEvent::KeyUp { key: "!".into(), at: 550 },
            ],
        );
        let fv = extractor().extract(&s, "u", 60_000);
        // 3 chars in one minute
        assert_eq!(fv.avg_typing_speed, 0.05);
        // holds 100, 200, 100
        assert_eq!(fv.key_hold_time_mean, 133.333);
        assert_eq!(fv.key_flight_time_variance, 2222.2222);
        // flights 50, 100
        assert_eq!(fv.typing_variance, 625.0);
    }

    #[test]
    fn click_features() {
        let mut s = RawSession::new(0, Viewport::new(1000.0, 1000.0));
        feed(
            &mut s,
            &[
                InteractionEvent::Click { x: Some(0.0), y: Some(0.0), at: 1_000 },
                InteractionEvent::Click { x: Some(200.0), y: Some(200.0), at: 1_400 },
            ],
        );
        let fv = extractor().extract(&s, "u", 2_000);
        assert_eq!(fv.click_interval_avg, 400.0);
        // std of {0, 0.2} = 0.1 on both axes
        assert_eq!(fv.click_randomness_score, 0.2);
        assert_eq!(fv.session_request_count, 3);
    }

    #[test]
    fn request_windows_and_burst() {
        let mut s = RawSession::new(0, Viewport::new(1000.0, 800.0));
        for t in [10_000, 50_000, 95_000, 98_000] {
            s.track_request(t);
        }
        let fv = extractor().extract(&s, "u", 100_000);
        // 50_000, 95_000, 98_000 in the minute, two of them in the last 10s
        assert_eq!(fv.requests_per_minute, 3.0);
        assert_eq!(fv.burst_score, 1.0);
        assert_eq!(fv.session_request_count, 5);

        let fv = extractor().extract(&s, "u", 115_000);
        // 95_000 and 98_000 remain in the minute, nothing in the last 10s
        assert_eq!(fv.requests_per_minute, 2.0);
        assert_eq!(fv.burst_score, 0.0);

        let fv = extractor().extract(&s, "u", 170_000);
        assert_eq!(fv.requests_per_minute, 0.0);
        assert_eq!(fv.burst_score, 0.1);
    }

    #[test]
    fn burst_below_one_for_earlier_traffic() {
        let mut s = RawSession::new(0, Viewport::new(1000.0, 800.0));
        for t in (20..30).map(|i| i * 1_000) {
            s.track_request(t);
        }
        s.track_request(65_000);
        // 11 in the minute, 1 in the last 10s: (1/10) / (11/60)
        let fv = extractor().extract(&s, "u", 70_000);
        assert_eq!(fv.requests_per_minute, 11.0);
        assert_eq!(fv.burst_score, 0.5455);
    }

    #[test]
    fn extraction_is_deterministic() {
        let mut s = RawSession::new(0, Viewport::new(1000.0, 800.0));
        feed(
            &mut s,
            &[
                InteractionEvent::PointerMove { x: Some(0.0), y: Some(0.0), at: 10 },
                InteractionEvent::PointerMove { x: Some(30.0), y: Some(5.0), at: 30 },
                InteractionEvent::PointerMove { x: Some(31.0), y: Some(50.0), at: 55 },
                InteractionEvent::KeyDown { key: "a".into(), at: 60 },
                InteractionEvent::KeyUp { key: "a".into(), at: 140 },
            ],
        );
        let e = extractor();
        assert_eq!(e.extract(&s, "u", 5_000), e.extract(&s, "u", 5_000));
    }

    #[test]
    fn extreme_timestamps_stay_finite() {
        let mut s = RawSession::new(i64::MIN, Viewport::new(1000.0, 800.0));
        feed(
            &mut s,
            &[
                InteractionEvent::KeyDown { key: "Backspace".into(), at: i64::MIN },
                InteractionEvent::KeyDown { key: "a".into(), at: i64::MIN },
                InteractionEvent::KeyUp { key: "a".into(), at: i64::MAX },
                InteractionEvent::KeyDown { key: "b".into(), at: i64::MAX },
                InteractionEvent::KeyUp { key: "b".into(), at: i64::MIN },
                InteractionEvent::PointerMove { x: Some(0.0), y: Some(0.0), at: i64::MAX },
                InteractionEvent::PointerMove { x: Some(50.0), y: Some(0.0), at: i64::MIN },
                InteractionEvent::PointerMove { x: Some(50.0), y: Some(50.0), at: i64::MAX },
                InteractionEvent::Click { x: Some(1.0), y: Some(1.0), at: i64::MAX },
                InteractionEvent::Click { x: Some(2.0), y: Some(2.0), at: i64::MIN },
                InteractionEvent::Visibility { hidden: true, at: i64::MIN },
                InteractionEvent::Visibility { hidden: false, at: i64::MAX },
                InteractionEvent::Visibility { hidden: true, at: i64::MIN },
                InteractionEvent::Visibility { hidden: false, at: i64::MAX },
            ],
        );
        s.track_request(i64::MIN);
        s.track_request(i64::MAX);
        assert_eq!(s.idle_accumulated_ms, i64::MAX);
        assert_eq!(s.key_events[0].hold_time_ms, i64::MAX as f64);
        assert_eq!(s.key_events[1].hold_time_ms, 0.0);

        for now in [i64::MIN, 0, i64::MAX] {
            let fv = extractor().extract(&s, "u", now);
            let v = serde_json::to_value(&fv).unwrap();
            for (name, value) in v.as_object().unwrap() {
                assert!(!value.is_null(), "{name} is null at {now}");
                if let Some(x) = value.as_f64() {
                    assert!(x.is_finite(), "{name} not finite at {now}");
                }
            }
            assert!((0.0..=0.99).contains(&fv.idle_time_ratio));
            assert!((0.0..=1.0).contains(&fv.burst_score));
        }
    }
}
