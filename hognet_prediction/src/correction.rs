//! Smooth a reconciliation over a few ticks instead of snapping the rendered body to the
//! corrected state.
//!
//! The simulation always holds the corrected value. Only the rendered state is offset: at the
//! start of the correction the render matches the old prediction, and the offset decays to zero
//! by `end_tick`.
use bevy_math::{Quat, Vec3};
use hognet_core::prelude::{BodyState, Tick};

pub fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualCorrection {
    /// Old predicted position minus corrected position
    position_offset: Vec3,
    /// Rotation taking the corrected orientation to the old predicted one
    rotation_offset: Quat,
    start_tick: Tick,
    end_tick: Tick,
}

impl VisualCorrection {
    pub fn new(original: &BodyState, corrected: &BodyState, start_tick: Tick, ticks: u32) -> Self {
        Self {
            position_offset: original.position - corrected.position,
            rotation_offset: (original.orientation * corrected.orientation.inverse()).normalize(),
            start_tick,
            end_tick: start_tick + ticks.max(1),
        }
    }

    pub fn start_tick(&self) -> Tick {
        self.start_tick
    }

    pub fn end_tick(&self) -> Tick {
        self.end_tick
    }

    pub fn is_finished(&self, current_tick: Tick) -> bool {
        current_tick >= self.end_tick
    }

    /// Rendered state at `current_tick`, or `None` once the correction is over
    pub fn visual(&self, current_tick: Tick, corrected: &BodyState) -> Option<BodyState> {
        if self.is_finished(current_tick) {
            return None;
        }
        let elapsed = (current_tick - self.start_tick).max(0) as f32;
        let total = (self.end_tick - self.start_tick) as f32;
        let t = ease_out_quad((elapsed / total).clamp(0.0, 1.0));
        Some(BodyState {
            position: corrected.position + self.position_offset * (1.0 - t),
            orientation: self.rotation_offset.slerp(Quat::IDENTITY, t) * corrected.orientation,
            ..*corrected
        })
    }
}
