use crate::correction::VisualCorrection;
use crate::predictor::LocalPredictor;
use core::time::Duration;
use hognet_core::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Positional error (m) above which the local state is corrected
    pub position_threshold: f32,
    /// Angular error (degrees) above which the local state is corrected
    pub rotation_threshold: f32,
    /// Number of ticks over which a correction is visually smoothed. 0 snaps immediately
    pub correction_ticks: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            position_threshold: 0.5,
            rotation_threshold: 10.0,
            correction_ticks: 0,
        }
    }
}

/// Error between a predicted and an authoritative state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divergence {
    pub position: f32,
    pub rotation_degrees: f32,
}

impl Divergence {
    pub fn between(predicted: &BodyState, authoritative: &BodyState) -> Self {
        Self {
            position: predicted.position_error(authoritative),
            rotation_degrees: predicted.rotation_error_degrees(authoritative),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// The snapshot carries no new acknowledgement
    Ignored,
    /// The prediction was close enough, nothing changed
    WithinThreshold(Divergence),
    /// The local state was reset to the snapshot and the unacknowledged inputs replayed.
    ///
    /// `divergence` is `None` when no prediction was recorded for the acknowledged tick.
    Corrected {
        divergence: Option<Divergence>,
        replayed: usize,
        visual: Option<VisualCorrection>,
    },
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    config: ReconcileConfig,
    tick_duration: Duration,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig, tick_duration: Duration) -> Self {
        Self {
            config,
            tick_duration,
        }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    fn exceeds(&self, divergence: &Divergence) -> bool {
        divergence.position > self.config.position_threshold
            || divergence.rotation_degrees > self.config.rotation_threshold
    }

    /// Compare an authoritative snapshot against the prediction made for the acknowledged tick.
    ///
    /// `ack` is the last input tick the authority applied. `forced` skips the threshold check,
    /// which is used for post-collision snapshots.
    pub fn reconcile<S: Simulation>(
        &self,
        predictor: &mut LocalPredictor,
        sim: &mut S,
        snapshot: &StateSnapshot,
        ack: Option<Tick>,
        forced: bool,
    ) -> ReconcileOutcome {
        let entity = predictor.entity;
        let divergence = match ack {
            Some(ack) => {
                let stale = predictor
                    .acknowledged
                    .is_some_and(|last| ack < last || (ack == last && !forced));
                if stale {
                    trace!(?entity, ?ack, "ignoring snapshot without a new acknowledgement");
                    return ReconcileOutcome::Ignored;
                }
                predictor.acknowledge(ack);
                predictor
                    .history
                    .get(ack)
                    .map(|predicted| Divergence::between(predicted, &snapshot.body))
            }
            // the authority has not applied any of our inputs yet
            None if forced => None,
            None => return ReconcileOutcome::Ignored,
        };

        match divergence {
            Some(divergence) if !forced && !self.exceeds(&divergence) => {
                trace!(?entity, ?ack, ?divergence, "prediction within threshold");
                return ReconcileOutcome::WithinThreshold(divergence);
            }
            _ => {}
        }

        debug!(
            ?entity,
            ?ack,
            ?divergence,
            forced,
            "Divergence exceeded, correcting to the authoritative state"
        );
        let before = sim.read_state(entity);
        let current_tick = predictor.history.most_recent().map(|(tick, _)| *tick);
        sim.write_state(entity, &snapshot.body);
        if let Some(ack) = ack {
            predictor.history.add(ack, snapshot.body);
        }
        let replayed = predictor.replay(sim, self.tick_duration);

        let visual = match (before, sim.read_state(entity), current_tick) {
            (Some(before), Some(after), Some(tick)) if self.config.correction_ticks > 0 => Some(
                VisualCorrection::new(&before, &after, tick, self.config.correction_ticks),
            ),
            _ => None,
        };
        ReconcileOutcome::Corrected {
            divergence,
            replayed,
            visual,
        }
    }
}
