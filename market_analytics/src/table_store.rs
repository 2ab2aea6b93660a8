use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MarketError, Result};
use crate::models::{CompetitorRecord, CustomerRecord, ForecastPoint, MarketRecord};

/// A row type with a fixed, ordered column schema.
///
/// `COLUMNS` must list the serialized field names in declaration order; it is
/// written as the header row and checked against the header on read.
pub trait TableRow: Serialize + DeserializeOwned {
    const COLUMNS: &'static [&'static str];

    /// Rejects values that deserialized but are not usable numbers.
    fn validate(&self, _record: u64) -> Result<()> {
        Ok(())
    }
}

/// Ordered sequence of homogeneous rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R> Table<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> FromIterator<R> for Table<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, R> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Logical datasets kept under the raw data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Market,
    Competitor,
    Customer,
    Forecast,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::Market,
        Dataset::Competitor,
        Dataset::Customer,
        Dataset::Forecast,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Market => "market",
            Dataset::Competitor => "competitor",
            Dataset::Customer => "customer",
            Dataset::Forecast => "forecast",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::Market => "brazil_hydro_data.csv",
            Dataset::Competitor => "competitor_data.csv",
            Dataset::Customer => "customer_data.csv",
            Dataset::Forecast => "market_forecast.csv",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| MarketError::UnknownDataset(s.to_string()))
    }
}

/// Storage location for raw inputs, processed tables and charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.data_dir.join("charts")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("data")
    }
}

/// Loads datasets from `raw/` and persists derived tables to `processed/`.
pub struct TableStore {
    config: StoreConfig,
}

impl TableStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load a raw dataset, decoding each row as `R`.
    pub fn load<R: TableRow>(&self, dataset: Dataset) -> Result<Table<R>> {
        let path = self.config.raw_dir().join(dataset.file_name());
        let table = read_table::<R>(&path)?;
        info!(
            "Loaded {} data: {} records, {} columns",
            dataset,
            table.len(),
            R::COLUMNS.len()
        );
        Ok(table)
    }

    pub fn load_market(&self) -> Result<Table<MarketRecord>> {
        self.load(Dataset::Market)
    }

    pub fn load_competitors(&self) -> Result<Table<CompetitorRecord>> {
        self.load(Dataset::Competitor)
    }

    pub fn load_customers(&self) -> Result<Table<CustomerRecord>> {
        self.load(Dataset::Customer)
    }

    pub fn load_forecast(&self) -> Result<Table<ForecastPoint>> {
        self.load(Dataset::Forecast)
    }

    /// Write `table` under `processed/`, returning the file path.
    pub fn save<R: TableRow>(&self, table: &Table<R>, name: &str) -> Result<PathBuf> {
        let path = self.processed_path(name);
        write_table(table, &path)?;
        info!("Saved processed data: {}", path.display());
        Ok(path)
    }

    /// Read back a table written by [`TableStore::save`].
    pub fn load_processed<R: TableRow>(&self, name: &str) -> Result<Table<R>> {
        read_table(&self.processed_path(name))
    }

    fn processed_path(&self, name: &str) -> PathBuf {
        let mut path = self.config.processed_dir().join(name);
        if path.extension().is_none() {
            path.set_extension("csv");
        }
        path
    }
}

pub fn read_table<R: TableRow>(path: &Path) -> Result<Table<R>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(MarketError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(MarketError::Malformed(e.into())),
    };
    let table = read_rows(file)?;
    debug!("Read {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Decode delimited text with a header row. Columns are matched by name, so
/// order is free and unknown columns are ignored.
pub fn read_rows<R: TableRow, Rd: Read>(reader: Rd) -> Result<Table<R>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::Headers).from_reader(reader);
    let headers = rdr.headers()?.clone();

    if let Some(column) = R::COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        return Err(MarketError::MissingValue {
            column: column.to_string(),
            record: 0,
        });
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize::<R>().enumerate() {
        let record = idx as u64 + 1;
        let row = result.map_err(|e| classify_read_error(e, &headers, record))?;
        row.validate(record)?;
        rows.push(row);
    }

    Ok(Table::new(rows))
}

pub fn write_table<R: TableRow>(table: &Table<R>, path: &Path) -> Result<()> {
    let write_error = |source: csv::Error| MarketError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_error(e.into()))?;
    }
    let file = File::create(path).map_err(|e| write_error(e.into()))?;
    write_rows(table, io::BufWriter::new(file)).map_err(write_error)
}

/// Encode a table as delimited text. The header is always written so an
/// empty table reads back as an empty table. Missing values become empty
/// fields.
pub fn write_rows<R: TableRow, W: Write>(table: &Table<R>, writer: W) -> csv::Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(R::COLUMNS)?;
    for row in table {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn classify_read_error(err: csv::Error, headers: &StringRecord, record: u64) -> MarketError {
    let column = match err.kind() {
        csv::ErrorKind::Deserialize { err: de, .. } => de
            .field()
            .and_then(|idx| headers.get(idx as usize))
            .map(str::to_string),
        // Short row: the first absent field is the one reported.
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } if len < expected_len => headers.get(*len as usize).map(str::to_string),
        _ => None,
    };

    match column {
        Some(column) => MarketError::MissingValue { column, record },
        None => MarketError::Malformed(err),
    }
}
