//! Adaptive frame pacing on top of `VK_GOOGLE_display_timing`.
//!
//! The controller picks a target inter-present duration (IPD) that is a
//! whole multiple of the display refresh cycle. Feedback from past
//! presentations moves the multiplier: any new late present slows the
//! cadence down, while two seconds of presents that could have gone out
//! earlier speed it back up.

use ash::vk;

const MILLISECOND_NS: u64 = 1_000_000;
const SECOND_NS: u64 = 1_000_000_000;

/// A present counts as "could have been earlier" only with at least this
/// much slack on both sides.
pub const EARLY_SLACK_NS: u64 = 2 * MILLISECOND_NS;

/// How long presents must keep arriving early before the cadence speeds up.
pub const EARLY_WINDOW_NS: u64 = 2 * SECOND_NS;

/// Classification of a single past presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentClass {
    /// Could have been displayed at least [`EARLY_SLACK_NS`] sooner.
    Early,
    /// Displayed more than one refresh cycle after the desired time.
    Late,
    /// Neither early nor late.
    OnTime,
}

/// Classify one past presentation against the refresh cycle.
#[must_use]
pub const fn classify(timing: &vk::PastPresentationTimingGOOGLE, refresh_ns: u64) -> PresentClass {
    let earliest_gap = timing
        .actual_present_time
        .saturating_sub(timing.earliest_present_time);
    if earliest_gap >= EARLY_SLACK_NS && timing.present_margin >= EARLY_SLACK_NS {
        PresentClass::Early
    } else if timing.actual_present_time > timing.desired_present_time.saturating_add(refresh_ns) {
        PresentClass::Late
    } else {
        PresentClass::OnTime
    }
}

/// Net effect of one feedback pass on the cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingChange {
    Unchanged,
    /// Multiplier decremented.
    Faster,
    /// Multiplier incremented.
    Slower,
}

/// Present-timing feedback controller for one swapchain instance.
///
/// A fresh controller must be created for every new swapchain: the first
/// feedback entry it sees resynchronizes it to hardware timestamps.
#[derive(Debug, Clone)]
pub struct PresentTimingController {
    refresh_duration: u64,
    multiplier: u64,
    target_ipd: u64,
    prev_desired_present_time: u64,
    next_present_id: u32,
    last_early_id: u32,
    last_late_id: u32,
    synced: bool,
}

impl PresentTimingController {
    /// Start pacing at one present per refresh cycle.
    #[must_use]
    pub fn new(refresh_duration: u64) -> Self {
        let refresh_duration = refresh_duration.max(1);
        Self {
            refresh_duration,
            multiplier: 1,
            target_ipd: refresh_duration,
            prev_desired_present_time: 0,
            next_present_id: 1,
            last_early_id: 0,
            last_late_id: 0,
            synced: false,
        }
    }

    /// Measured refresh cycle in nanoseconds.
    #[must_use]
    pub const fn refresh_duration(&self) -> u64 {
        self.refresh_duration
    }

    /// Current refresh-cycle multiplier (at least 1).
    #[must_use]
    pub const fn multiplier(&self) -> u64 {
        self.multiplier
    }

    /// Target inter-present duration, always `refresh_duration * multiplier`.
    #[must_use]
    pub const fn target_ipd(&self) -> u64 {
        self.target_ipd
    }

    /// Id the next call to [`Self::next_present_time`] will hand out.
    #[must_use]
    pub const fn next_present_id(&self) -> u32 {
        self.next_present_id
    }

    /// Whether desired times are anchored to real hardware timestamps yet.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.synced
    }

    /// Consume a batch of past presentation timings.
    ///
    /// Early and late observations cancel each other inside a batch, and an
    /// on-time present cancels both and clears the late marker, so only what
    /// follows the last on-time present counts. A batch moves the multiplier
    /// by at most one step.
    pub fn process(&mut self, past: &[vk::PastPresentationTimingGOOGLE]) -> PacingChange {
        let Some(last) = past.last() else {
            return PacingChange::Unchanged;
        };

        let mut early = false;
        let mut late = false;
        let mut calibrate_next = false;

        for timing in past {
            if !self.synced {
                // Every prediction made so far is based on a guessed start
                // time. Anchor to the hardware clock and ignore this batch.
                self.last_late_id = self.next_present_id.wrapping_sub(1);
                self.last_early_id = 0;
                self.synced = true;
                calibrate_next = true;
                break;
            }

            match classify(timing, self.refresh_duration) {
                PresentClass::Early => {
                    if self.last_early_id == 0 {
                        let window_ids = EARLY_WINDOW_NS / self.target_ipd;
                        self.last_early_id = timing
                            .present_id
                            .saturating_add(u32::try_from(window_ids).unwrap_or(u32::MAX));
                    } else if timing.present_id >= self.last_early_id {
                        early = true;
                        late = false;
                        self.last_early_id = 0;
                    }
                    self.last_late_id = 0;
                }
                PresentClass::Late => {
                    if timing.present_id > self.last_late_id {
                        late = true;
                        early = false;
                        self.last_late_id = self.next_present_id.wrapping_sub(1);
                    }
                    self.last_early_id = 0;
                }
                PresentClass::OnTime => {
                    early = false;
                    late = false;
                    self.last_early_id = 0;
                    self.last_late_id = 0;
                    calibrate_next = true;
                }
            }
        }

        let change = if early && self.multiplier > 1 {
            self.multiplier -= 1;
            PacingChange::Faster
        } else if late {
            self.multiplier += 1;
            PacingChange::Slower
        } else {
            PacingChange::Unchanged
        };
        if change != PacingChange::Unchanged {
            self.target_ipd = self.refresh_duration * self.multiplier;
            tracing::debug!(
                multiplier = self.multiplier,
                target_ipd = self.target_ipd,
                "Present pacing changed: {change:?}"
            );
        }

        if calibrate_next {
            let ahead = u64::from(self.next_present_id.saturating_sub(last.present_id));
            self.prev_desired_present_time = last.actual_present_time + ahead * self.target_ipd;
        }

        change
    }

    /// Produce the timing request for the next present.
    ///
    /// `now_ns` is the presentation engine's clock, when the platform can
    /// read it. Without it, and before any feedback arrives, the desired time
    /// is left at zero ("as soon as possible").
    pub fn next_present_time(&mut self, now_ns: Option<u64>) -> vk::PresentTimeGOOGLE {
        let desired = if self.prev_desired_present_time == 0 {
            now_ns.map_or(0, |now| now + self.target_ipd / 2)
        } else {
            self.prev_desired_present_time + self.target_ipd
        };
        self.prev_desired_present_time = desired;

        let present_id = self.next_present_id;
        self.next_present_id = self.next_present_id.wrapping_add(1);

        vk::PresentTimeGOOGLE {
            present_id,
            desired_present_time: desired,
        }
    }
}
