/// Dataset ingestion and preprocessing
///
/// Raw tables are stripped of identifier columns, reconciled with the
/// nine-attribute workload schema, and scored row by row.

pub mod labeled;
pub mod preprocessor;
pub mod source;
pub mod table;

pub use labeled::{LabeledDataset, LabeledRecord, SchemaResolution};
pub use preprocessor::Preprocessor;
pub use source::{load_csv, write_labeled_csv};
pub use table::RawTable;
