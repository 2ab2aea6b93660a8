pub mod aggregation;
pub mod error;
pub mod models;
pub mod segmentation;
pub mod table_store;

pub use aggregation::{regional_snapshot, yearly_summary};
pub use error::{MarketError, Result};
pub use models::{
    CompetitorPosition, CompetitorRecord, CustomerRecord, ForecastPoint, MarketRecord,
    RegionalShareRow, SegmentCount, YearlySummaryRow,
};
pub use segmentation::{competitor_positions, customer_type_distribution, size_category_distribution};
pub use table_store::{Dataset, StoreConfig, Table, TableRow, TableStore};
