//! Time bases and the index arithmetic that makes columns from different
//! sampling rates comparable within one table.
pub mod frame;
pub mod index;

pub use frame::{convert_index, convert_interval, TimeFrame, TimeFrameError};
pub use index::{TimeFrameIndex, TimeFrameInterval};
