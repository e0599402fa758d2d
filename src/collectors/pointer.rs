//! Pointer dynamics: path length, octant direction changes, acceleration, clicks.

use super::{ClickPosition, PointerSample, RawSession};
use serde::{Deserialize, Serialize};

/// Compass octant of a movement vector in screen coordinates (y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Octant {
    E,
    SE,
    S,
    SW,
    W,
    NW,
    N,
    NE,
}

impl Octant {
    /// Each octant spans 45 degrees centered on its direction.
    pub fn from_vector(dx: f64, dy: f64) -> Self {
        let angle = dy.atan2(dx).to_degrees();
        match angle {
            a if (-22.5..22.5).contains(&a) => Octant::E,
            a if (22.5..67.5).contains(&a) => Octant::SE,
            a if (67.5..112.5).contains(&a) => Octant::S,
            a if (112.5..157.5).contains(&a) => Octant::SW,
            a if a >= 157.5 || a < -157.5 => Octant::W,
            a if (-157.5..-112.5).contains(&a) => Octant::NW,
            a if (-112.5..-67.5).contains(&a) => Octant::N,
            _ => Octant::NE,
        }
    }
}

impl RawSession {
    pub(crate) fn on_pointer_move(&mut self, x: f64, y: f64, at: i64, noise_floor_px: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.touch(at);
        self.pointer_move_count += 1;

        if let Some(prev) = self.pointer_samples.last().copied() {
            let dx = x - prev.x;
            let dy = y - prev.y;
            let dist = dx.hypot(dy);
            let dt = at.saturating_sub(prev.t).max(1) as f64;

            self.path_length_px += dist;

            if dist > noise_floor_px {
                let dir = Octant::from_vector(dx, dy);
                if matches!(self.last_direction, Some(last) if last != dir) {
                    self.direction_change_count += 1;
                }
                self.last_direction = Some(dir);
            }

            let speed = dist / dt;
            if let Some(prev_speed) = self.last_speed {
                self.acceleration_samples.push((speed - prev_speed).abs());
            }
            self.last_speed = Some(speed);
        }

        self.pointer_samples.push(PointerSample { x, y, t: at });
    }

    pub(crate) fn on_click(&mut self, x: f64, y: f64, at: i64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.touch(at);
        self.click_timestamps.push(at);
        self.click_positions.push(ClickPosition { x, y });
        self.request_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::Octant;
    use crate::collectors::{RawSession, Viewport};

    fn session() -> RawSession {
        RawSession::new(0, Viewport::new(1000.0, 800.0))
    }

    #[test]
    fn octants_follow_screen_axes() {
        assert_eq!(Octant::from_vector(10.0, 0.0), Octant::E);
        assert_eq!(Octant::from_vector(10.0, 10.0), Octant::SE);
        assert_eq!(Octant::from_vector(0.0, 10.0), Octant::S);
        assert_eq!(Octant::from_vector(-10.0, 10.0), Octant::SW);
        assert_eq!(Octant::from_vector(-10.0, 0.0), Octant::W);
        assert_eq!(Octant::from_vector(-10.0, -10.0), Octant::NW);
        assert_eq!(Octant::from_vector(0.0, -10.0), Octant::N);
        assert_eq!(Octant::from_vector(10.0, -10.0), Octant::NE);
        assert_eq!(Octant::from_vector(-10.0, -0.5), Octant::W);
    }

    #[test]
    fn direction_change_ignores_jitter() {
        let mut s = session();
        s.on_pointer_move(0.0, 0.0, 0, 5.0);
        s.on_pointer_move(20.0, 0.0, 10, 5.0); // E
        s.on_pointer_move(22.0, 3.0, 20, 5.0); // jitter, below floor
        s.on_pointer_move(22.0, 30.0, 30, 5.0); // S
        s.on_pointer_move(22.0, 60.0, 40, 5.0); // S again
        assert_eq!(s.direction_change_count, 1);
        assert_eq!(s.pointer_move_count, 5);
    }

    #[test]
    fn acceleration_needs_three_samples() {
        let mut s = session();
        s.on_pointer_move(0.0, 0.0, 0, 5.0);
        s.on_pointer_move(10.0, 0.0, 10, 5.0); // speed 1.0
        assert!(s.acceleration_samples.is_empty());
        s.on_pointer_move(40.0, 0.0, 20, 5.0); // speed 3.0
        assert_eq!(s.acceleration_samples, vec![2.0]);
        assert_eq!(s.path_length_px, 40.0);
    }

    #[test]
    fn zero_elapsed_time_is_clamped() {
        let mut s = session();
        s.on_pointer_move(0.0, 0.0, 5, 5.0);
        s.on_pointer_move(3.0, 4.0, 5, 5.0);
        assert_eq!(s.last_speed, Some(5.0));
    }

    #[test]
    fn clicks_count_as_requests() {
        let mut s = session();
        s.on_click(10.0, 20.0, 100);
        s.on_click(f64::NAN, 20.0, 120);
        assert_eq!(s.click_timestamps, vec![100]);
        assert_eq!(s.request_count, 2);
    }
}
