//! Review dataset loading.

use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::{PipelineError, Result};

/// Columns that have to be present in the header. Others are ignored.
pub const REQUIRED_COLUMNS: [&str; 5] = ["description", "points", "price", "variety", "title"];

/// One dataset row. `id` is the row index.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: usize,
    pub description: Option<String>,
    pub points: Option<f64>,
    pub price: Option<f64>,
    pub variety: Option<String>,
    pub title: Option<String>,
}

impl Review {
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

struct ColumnIndex {
    description: usize,
    points: usize,
    price: usize,
    variety: usize,
    title: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
        };
        let [description, points, price, variety, title] = REQUIRED_COLUMNS;
        Ok(Self {
            description: find(description)?,
            points: find(points)?,
            price: find(price)?,
            variety: find(variety)?,
            title: find(title)?,
        })
    }
}

fn text(record: &csv::StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Empty or unparsable cells are absent values.
fn number(record: &csv::StringRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Read reviews from any CSV source with a header row.
pub fn read_reviews<R: Read>(source: R) -> Result<Vec<Review>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut reviews = Vec::new();
    for (id, record) in reader.records().enumerate() {
        let record = record?;
        reviews.push(Review {
            id,
            description: text(&record, columns.description),
            points: number(&record, columns.points),
            price: number(&record, columns.price),
            variety: text(&record, columns.variety),
            title: text(&record, columns.title),
        });
    }
    Ok(reviews)
}

/// Load the dataset file.
pub fn load_reviews(path: &Path) -> Result<Vec<Review>> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let reviews = read_reviews(std::io::BufReader::new(file))?;
    if reviews.is_empty() {
        return Err(PipelineError::EmptyInput(format!("{} has no rows", path.display())));
    }
    let described = reviews.iter().filter(|r| r.description.is_some()).count();
    info!(
        path = %path.display(),
        rows = reviews.len(),
        described,
        "dataset loaded"
    );
    Ok(reviews)
}
