//! Linear solver for simultaneous tool/flange (`X`) and robot/world (`Y`)
//! calibration.
//!
//! Each measurement `(M_i, N_i)` satisfies `M_i X = Y N_i`. Rewriting it as
//! `M_i X N_i^-1 = Y` gives 12 equations that are linear in the 24 entries of
//! the upper 3x4 blocks of `X` and `Y` (the QR24 formulation of Ernst et al.,
//! "Non-orthogonal tool/flange and robot/world calibration"). Stacking all
//! measurements yields an overdetermined system solved with Householder QR;
//! the rotation columns of the decoded transforms are finally rescaled to unit
//! length.
//!
//! Pipeline: [`build_row`] → [`assemble`] → [`LeastSquaresBackend::solve`] →
//! [`decode`] → [`normalize_rotation_columns`], wrapped by [`calibrate`].

mod equations;
mod error;
mod lstsq;
mod normalize;
mod reconstruct;
mod robot_world;
mod system;

pub use equations::*;
pub use error::*;
pub use lstsq::*;
pub use normalize::*;
pub use reconstruct::*;
pub use robot_world::*;
pub use system::*;
