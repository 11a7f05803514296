//! Machine-readable and visual outputs of an analysis.

pub mod svg;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::ReportConfig;
use crate::dataset::Review;
use crate::error::{PipelineError, Result};
use crate::pipeline::Analysis;

use self::svg::{Coloring, ScatterPlot};

#[derive(Debug, Serialize)]
struct PointRow<'a> {
    id: usize,
    title: Option<&'a str>,
    variety: Option<&'a str>,
    points: Option<f64>,
    price: Option<f64>,
    x: f64,
    y: f64,
    cluster: usize,
}

/// One line per analyzed review: metadata, 2D coordinate and cluster label.
pub fn write_points_csv(path: &Path, reviews: &[Review], analysis: &Analysis) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (row, &doc) in analysis.documents.iter().enumerate() {
        let review = &reviews[doc];
        writer.serialize(PointRow {
            id: review.id,
            title: review.title.as_deref(),
            variety: review.variety.as_deref(),
            points: review.points,
            price: review.price,
            x: analysis.projection[(row, 0)],
            y: analysis.projection[(row, 1)],
            cluster: analysis.labels[row],
        })?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

/// File-name safe form of a token
fn slug(token: &str) -> String {
    token
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Write `points.csv` and every scatter plot into `out_dir`.
/// Returns the written paths.
pub fn write_report(
    out_dir: &Path,
    reviews: &[Review],
    analysis: &Analysis,
    config: &ReportConfig,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir).map_err(|e| PipelineError::io(out_dir, e))?;
    let mut written = Vec::new();

    let csv_path = out_dir.join("points.csv");
    write_points_csv(&csv_path, reviews, analysis)?;
    written.push(csv_path);

    let docs: Vec<&Review> = analysis.documents.iter().map(|&d| &reviews[d]).collect();
    let plot = ScatterPlot::new(&analysis.projection);

    let mut plots: Vec<(String, String, Coloring)> = vec![
        (
            "cluster.svg".into(),
            "cluster".into(),
            Coloring::categorical(analysis.labels.iter().map(|l| Some(l.to_string())), usize::MAX),
        ),
        (
            "points.svg".into(),
            "points".into(),
            Coloring::continuous(docs.iter().map(|r| r.points)),
        ),
        (
            "price.svg".into(),
            "price (log)".into(),
            Coloring::continuous(docs.iter().map(|r| r.price.filter(|p| *p > 0.0).map(f64::ln))),
        ),
        (
            "variety.svg".into(),
            "variety".into(),
            Coloring::categorical(docs.iter().map(|r| r.variety.clone()), config.top_varieties),
        ),
    ];
    for token in &config.highlight_tokens {
        let token = token.to_lowercase();
        let presence = analysis
            .documents
            .iter()
            .map(|&d| analysis.corpus.contains(&token, d));
        plots.push((
            format!("token-{}.svg", slug(&token)),
            format!("contains \"{token}\""),
            Coloring::presence(presence),
        ));
    }

    for (name, title, coloring) in plots {
        let path = out_dir.join(name);
        std::fs::write(&path, plot.render(&title, &coloring))
            .map_err(|e| PipelineError::io(&path, e))?;
        written.push(path);
    }

    info!(dir = %out_dir.display(), files = written.len(), "report written");
    Ok(written)
}
