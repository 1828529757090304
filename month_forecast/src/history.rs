//! Sources of historical monthly quantities

use crate::data::{MonthlyQuantity, Series};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Provider of per-item monthly history
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Raw monthly records for an item, in any order
    async fn monthly_quantities(&self, item_id: u64) -> Result<Vec<MonthlyQuantity>>;
}

/// Fetch an item's history and normalize it into a sorted monthly series
pub async fn load_history<S: HistorySource + ?Sized>(source: &S, item_id: u64) -> Result<Series> {
    let records = source.monthly_quantities(item_id).await?;
    Series::from_monthly_quantities(&records)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    item_id: u64,
    date: String,
    quantity: u64,
}

/// History held in memory, loaded from CSV with an `item_id,date,quantity` header
#[derive(Debug, Clone, Default)]
pub struct CsvHistorySource {
    by_item: HashMap<u64, Vec<MonthlyQuantity>>,
}

impl CsvHistorySource {
    /// Load every row of a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load every row from any reader
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut by_item: HashMap<u64, Vec<MonthlyQuantity>> = HashMap::new();
        for row in csv_reader.deserialize::<CsvRow>() {
            let row = row?;
            by_item.entry(row.item_id).or_default().push(MonthlyQuantity {
                date: row.date,
                quantity: row.quantity,
            });
        }

        Ok(Self { by_item })
    }

    /// Number of distinct items
    pub fn item_count(&self) -> usize {
        self.by_item.len()
    }
}

#[async_trait]
impl HistorySource for CsvHistorySource {
    async fn monthly_quantities(&self, item_id: u64) -> Result<Vec<MonthlyQuantity>> {
        Ok(self.by_item.get(&item_id).cloned().unwrap_or_default())
    }
}
