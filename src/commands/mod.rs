//! Command implementations for the covstat CLI.

pub mod resample;
pub mod stat;
pub mod view;

pub use resample::ResampleCommand;
pub use stat::{StatCommand, Statistic};
pub use view::ViewCommand;
