pub mod dataset;
pub mod error;
pub mod query;
pub mod source;
pub mod stats;

pub use dataset::Dataset;
pub use error::DatasetError;
pub use query::*;
pub use source::DatasetSource;
pub use stats::*;
