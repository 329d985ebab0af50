use core::time::Duration;
use hognet_core::prelude::*;
use hognet_inputs::prelude::{Evictions, InputConfig, InputHistoryBuffer};
use tracing::{trace, warn};

/// Result of predicting one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// The sample that was applied locally and must be sent to the authority
    pub sample: InputSample,
    /// Inputs evicted before the authority acknowledged them
    pub unacknowledged_evictions: Evictions,
}

/// Build the sample sent for `tick` from raw controls: clamped, then quantized at input precision
pub fn input_sample(
    quantizer: &Quantizer,
    entity: EntityId,
    tick: Tick,
    controls: VehicleControls,
) -> InputSample {
    let controls = controls.clamped();
    InputSample::new(
        entity,
        tick,
        VehicleControls {
            throttle: quantizer.input(controls.throttle),
            brake: quantizer.input(controls.brake),
            steer: quantizer.input(controls.steer),
            jump: controls.jump,
        },
    )
}

/// Owner-side state of one controlled entity.
///
/// Holds the inputs the authority has not acknowledged yet and the state predicted at every tick
/// since the last acknowledgement.
#[derive(Debug, Clone)]
pub struct LocalPredictor {
    pub(crate) entity: EntityId,
    quantizer: Quantizer,
    pub(crate) inputs: InputHistoryBuffer,
    pub(crate) history: HistoryBuffer<BodyState>,
    pub(crate) acknowledged: Option<Tick>,
}

impl LocalPredictor {
    pub fn new(entity: EntityId, config: &InputConfig, quantizer: Quantizer) -> Self {
        Self {
            entity,
            quantizer,
            inputs: InputHistoryBuffer::new(config.capacity),
            history: HistoryBuffer::with_max_len(config.capacity + 1),
            acknowledged: None,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn inputs(&self) -> &InputHistoryBuffer {
        &self.inputs
    }

    pub fn history(&self) -> &HistoryBuffer<BodyState> {
        &self.history
    }

    /// Last input tick the authority reported as applied
    pub fn acknowledged(&self) -> Option<Tick> {
        self.acknowledged
    }

    /// Build the input sample for `tick` from the current controls, apply it to the local
    /// simulation and keep it for replay.
    ///
    /// The controls are quantized at input precision so the applied and transmitted samples are
    /// identical.
    pub fn predict<S: Simulation>(
        &mut self,
        sim: &mut S,
        tick: Tick,
        controls: VehicleControls,
    ) -> Prediction {
        let sample = input_sample(&self.quantizer, self.entity, tick, controls);
        sim.apply_input(self.entity, &sample);
        let mut unacknowledged_evictions = self.inputs.put(tick, sample);
        let acknowledged = self.acknowledged;
        unacknowledged_evictions.retain(|eviction| acknowledged.is_none_or(|ack| eviction.tick > ack));
        for eviction in &unacknowledged_evictions {
            warn!(
                entity = ?self.entity,
                tick = ?eviction.tick,
                "Evicted an input the authority has not acknowledged yet"
            );
        }
        trace!(entity = ?self.entity, ?tick, ?sample, "predicted input");
        Prediction {
            sample,
            unacknowledged_evictions,
        }
    }

    /// Remember the state reached at the end of `tick`
    pub fn record_state<S: Simulation>(&mut self, tick: Tick, sim: &S) {
        if let Some(state) = sim.read_state(self.entity) {
            self.history.add(tick, state);
        }
    }

    /// The authority applied every input up to `ack`: drop them, and the predicted states before
    /// `ack`. Returns the number of inputs removed
    pub fn acknowledge(&mut self, ack: Tick) -> usize {
        if self.acknowledged.is_some_and(|last| ack < last) {
            return 0;
        }
        self.acknowledged = Some(ack);
        self.history.clear_before(ack);
        self.inputs.prune_before(ack.next())
    }

    /// Re-run every buffered input in ascending tick order, one physics step each, re-recording
    /// the predicted states. Returns the number of replayed inputs
    pub(crate) fn replay<S: Simulation>(&mut self, sim: &mut S, dt: Duration) -> usize {
        let mut replayed = 0;
        for (tick, sample) in self.inputs.iter() {
            sim.apply_input(self.entity, sample);
            sim.step_body(self.entity, dt);
            if let Some(state) = sim.read_state(self.entity) {
                self.history.add(tick, state);
            }
            replayed += 1;
        }
        replayed
    }

    /// Start over from `snapshot`, discarding every buffered input and prediction
    pub fn reset<S: Simulation>(&mut self, sim: &mut S, snapshot: &StateSnapshot) {
        self.inputs.clear();
        self.history.clear();
        sim.write_state(self.entity, &snapshot.body);
    }
}
