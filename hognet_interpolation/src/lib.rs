//! # Hognet Interpolation
//!
//! Observers neither control nor simulate an entity: they render it by blending between the two
//! most recently received snapshots. The blend never extrapolates past the latest target, so a
//! lost snapshot widens one window instead of sending the body in the wrong direction.

pub mod interpolator;

pub mod prelude {
    pub use crate::interpolator::{
        InterpolatedState, InterpolationConfig, RemoteInterpolator, RestartPolicy,
    };
}
