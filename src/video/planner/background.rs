use rand::Rng;
use serde::Serialize;

use super::frame::FrameAdaptation;
use crate::video::errors::PlanError;

/// Everything needed to turn raw footage into the background track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundSourcePlan {
    pub frame: FrameAdaptation,
    /// Playback speed; below 1.0 slows the footage down.
    pub speed_factor: f64,
    /// Times the slowed footage is played back to back (1 = no looping).
    pub loop_count: u32,
    /// Offset into the slowed (and looped) footage where the used window starts.
    pub subclip_start: f64,
    pub subclip_duration: f64,
    pub source_duration: f64,
    pub slowed_duration: f64,
}

impl BackgroundSourcePlan {
    /// Length of the slowed footage after looping, before trimming.
    pub fn looped_duration(&self) -> f64 {
        self.slowed_duration * self.loop_count as f64
    }
}

/// Stretch footage by `speed_factor`, then either pick a random window of `required`
/// seconds inside it or loop it until it covers `required` and trim.
///
/// Footage shorter than `min_duration` (one output frame) is rejected.
pub fn plan_background<R: Rng>(
    frame: FrameAdaptation,
    source_duration: f64,
    required: f64,
    speed_factor: f64,
    min_duration: f64,
    rng: &mut R,
) -> Result<BackgroundSourcePlan, PlanError> {
    if !source_duration.is_finite() || source_duration < min_duration.max(f64::MIN_POSITIVE) {
        return Err(PlanError::EmptyBackground(source_duration));
    }

    let slowed_duration = source_duration / speed_factor;

    let (loop_count, subclip_start) = if slowed_duration >= required {
        let slack = slowed_duration - required;
        let offset = if slack > 0.0 {
            rng.gen_range(0.0..=slack)
        } else {
            0.0
        };
        (1, offset)
    } else {
        ((required / slowed_duration).floor() as u32 + 1, 0.0)
    };

    Ok(BackgroundSourcePlan {
        frame,
        speed_factor,
        loop_count,
        subclip_start,
        subclip_duration: required,
        source_duration,
        slowed_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::planner::frame::{AspectRatio, TargetFrame, adapt_frame};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const FRAME: f64 = 1.0 / 30.0;

    fn square() -> FrameAdaptation {
        let frame = TargetFrame::new(1080, 1080);
        adapt_frame(frame, frame, AspectRatio::Square).unwrap()
    }

    #[test]
    fn short_footage_loops_then_trims_to_required() {
        let mut rng = StdRng::seed_from_u64(1);
        // 3s slowed by 0.7 -> ~4.286s, need 14s -> 3 full copies + 1
        let plan = plan_background(square(), 3.0, 14.0, 0.7, FRAME, &mut rng).unwrap();

        assert_eq!(plan.loop_count, 4);
        assert_eq!(plan.subclip_start, 0.0);
        assert_eq!(plan.subclip_duration, 14.0);
        assert!(plan.looped_duration() > 14.0);
    }

    #[test]
    fn long_footage_uses_random_window_inside_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let plan = plan_background(square(), 60.0, 14.0, 0.7, FRAME, &mut rng).unwrap();
            assert_eq!(plan.loop_count, 1);
            assert!(plan.subclip_start >= 0.0);
            assert!(plan.subclip_start + plan.subclip_duration <= plan.slowed_duration + 1e-9);
        }
    }

    #[test]
    fn seeded_offsets_are_reproducible() {
        let plan_with_seed = |seed| {
            plan_background(square(), 60.0, 14.0, 0.7, FRAME, &mut StdRng::seed_from_u64(seed)).unwrap()
        };
        let first = plan_with_seed(5);
        let second = plan_with_seed(5);
        assert_eq!(first.subclip_start, second.subclip_start);
    }

    #[test]
    fn exact_fit_needs_no_offset() {
        let mut rng = StdRng::seed_from_u64(3);
        let plan = plan_background(square(), 3.5, 7.0, 0.5, FRAME, &mut rng).unwrap();
        assert_eq!(plan.loop_count, 1);
        assert_eq!(plan.subclip_start, 0.0);
    }

    #[test]
    fn zero_length_footage_is_a_precondition_failure() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            plan_background(square(), 0.0, 10.0, 0.7, FRAME, &mut rng),
            Err(PlanError::EmptyBackground(0.0))
        );
    }

    #[test]
    fn footage_shorter_than_a_frame_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            plan_background(square(), 1e-9, 10.0, 0.7, FRAME, &mut rng),
            Err(PlanError::EmptyBackground(1e-9))
        );

        let plan = plan_background(square(), FRAME, 10.0, 0.7, FRAME, &mut rng).unwrap();
        assert!(plan.looped_duration() >= 10.0);
    }
}
