//! # Hognet Prediction
//!
//! The controlling participant applies its own input immediately ([`LocalPredictor`]) and later
//! checks the authority's verdict ([`Reconciler`]). When the two disagree by more than a
//! threshold, the local body is reset to the authoritative state and every input the authority
//! has not yet acknowledged is replayed on top of it.

extern crate alloc;

pub mod correction;
pub mod predictor;
pub mod reconciler;

pub mod prelude {
    pub use crate::correction::VisualCorrection;
    pub use crate::predictor::{LocalPredictor, Prediction, input_sample};
    pub use crate::reconciler::{Divergence, ReconcileConfig, ReconcileOutcome, Reconciler};
}
