pub mod dataset;
pub mod loaders;
pub mod record;
pub mod segment;

pub use dataset::Dataset;
pub use loaders::{load_dataset, save_dataset};
pub use record::{numeric_suffix, Record, RecordSchema};
pub use segment::{Segment, Sequence};
