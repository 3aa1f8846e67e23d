//! Stock traversal strategies.

mod random;
mod row_major;

pub use random::Random;
pub use row_major::RowMajor;
