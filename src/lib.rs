pub mod error;
pub mod graph;
pub mod merge;
pub mod parser;
pub mod paths;
pub mod pipeline;
pub mod select;
pub mod sequence;
pub mod stats;
pub mod writer;

pub use error::{MergeError, MergeResult};
pub use pipeline::{run, FinalOutput, MergeConfig};
