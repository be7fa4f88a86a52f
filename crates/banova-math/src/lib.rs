//! banova math utilities.

pub mod math;

pub use math::describe::*;
pub use math::normal::*;
pub use math::stable::*;
pub use math::student_t::*;
pub use math::uniform::*;
