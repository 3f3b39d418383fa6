//! Data module - CSV loading, cleaning and aggregation

mod aggregator;
mod loader;
mod processor;
mod schema;
mod table;

pub use aggregator::{
    Aggregator, CountRow, GroupCounts, GroupKeys, KeyValue, SectorCounts, YearCount,
};
pub use loader::CaseLoader;
pub use processor::DataProcessor;
pub use schema::{Field, LabourSector, SENTINEL, SENTINEL_TEXT, UNKNOWN_GENDER};
pub use table::CaseTable;
