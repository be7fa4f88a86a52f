//! Core math modules.

pub mod describe;
pub mod normal;
pub mod stable;
pub mod student_t;
pub mod uniform;
