//! Geometry utilities: pixel rectangles, region mapping, planar pose solving.

pub mod pnp;
pub mod rect;

pub use pnp::{PlanarSquareSolver, PoseSolver, SolveError, SquarePose, yaw_from_rotation};
pub use rect::{Aabb, PixelRect, refinement_region};
