pub mod accumulator;
pub mod driver;
pub mod output;
pub mod parser;
pub mod stats;

pub use accumulator::Accumulator;
pub use parser::{Observation, ParseError};
pub use stats::StateStats;
