//! Minimal SVG scatter plots.

use std::collections::HashMap;
use std::fmt::Write;

use nalgebra::DMatrix;

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 700.0;
const MARGIN: f64 = 40.0;
const LEGEND_WIDTH: f64 = 180.0;
const RADIUS: f64 = 2.0;
const MISSING: &str = "#d0d0d0";
const OTHER: &str = "other";

const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// viridis stops, low to high
const GRADIENT: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// How each point is colored.
#[derive(Debug, Clone, PartialEq)]
pub enum Coloring {
    /// numeric value mapped onto a gradient, `None` drawn grey
    Continuous { values: Vec<Option<f64>>, min: f64, max: f64 },
    /// index into `names`, `None` drawn grey
    Categorical { classes: Vec<Option<usize>>, names: Vec<String> },
    /// highlighted when true
    Presence(Vec<bool>),
}

impl Coloring {
    pub fn continuous<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let values: Vec<Option<f64>> = values.into_iter().map(|v| v.filter(|x| x.is_finite())).collect();
        let (min, max) = values
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Self::Continuous { values, min, max }
    }

    /// The `top` most frequent labels get their own class, the rest share "other".
    pub fn categorical<I>(labels: I, top: usize) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let labels: Vec<Option<String>> = labels.into_iter().collect();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in labels.iter().flatten() {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        let mut names: Vec<String> = ranked.iter().take(top).map(|(n, _)| n.to_string()).collect();
        let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
        let other = names.len();
        let mut used_other = false;
        let classes = labels
            .iter()
            .map(|label| {
                label.as_deref().map(|l| {
                    index.get(l).copied().unwrap_or_else(|| {
                        used_other = true;
                        other
                    })
                })
            })
            .collect();
        if used_other {
            names.push(OTHER.to_string());
        }
        Self::Categorical { classes, names }
    }

    pub fn presence<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        Self::Presence(flags.into_iter().collect())
    }

    fn len(&self) -> usize {
        match self {
            Self::Continuous { values, .. } => values.len(),
            Self::Categorical { classes, .. } => classes.len(),
            Self::Presence(flags) => flags.len(),
        }
    }

    fn color(&self, i: usize) -> String {
        match self {
            Self::Continuous { values, min, max } => match values[i] {
                Some(v) => {
                    let t = if max > min { (v - min) / (max - min) } else { 0.5 };
                    gradient(t)
                }
                None => MISSING.to_string(),
            },
            Self::Categorical { classes, .. } => match classes[i] {
                Some(c) => PALETTE[c % PALETTE.len()].to_string(),
                None => MISSING.to_string(),
            },
            Self::Presence(flags) => {
                if flags[i] {
                    PALETTE[3].to_string()
                } else {
                    MISSING.to_string()
                }
            }
        }
    }

    /// Highlighted and non-missing points are drawn last.
    fn draw_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        match self {
            Self::Presence(flags) => order.sort_by_key(|&i| flags[i]),
            Self::Continuous { values, .. } => order.sort_by_key(|&i| values[i].is_some()),
            Self::Categorical { classes, .. } => order.sort_by_key(|&i| classes[i].is_some()),
        }
        order
    }

    fn legend(&self) -> Vec<(String, String)> {
        match self {
            Self::Continuous { min, max, .. } if min <= max => vec![
                (gradient(0.0), format!("{min:.1}")),
                (gradient(0.5), format!("{:.1}", (min + max) / 2.0)),
                (gradient(1.0), format!("{max:.1}")),
            ],
            Self::Continuous { .. } => Vec::new(),
            Self::Categorical { names, .. } => names
                .iter()
                .enumerate()
                .take(24)
                .map(|(i, n)| (PALETTE[i % PALETTE.len()].to_string(), n.clone()))
                .collect(),
            Self::Presence(_) => vec![
                (PALETTE[3].to_string(), "present".into()),
                (MISSING.to_string(), "absent".into()),
            ],
        }
    }
}

fn gradient(t: f64) -> String {
    let t = t.clamp(0.0, 1.0) * (GRADIENT.len() - 1) as f64;
    let lo = (t.floor() as usize).min(GRADIENT.len() - 2);
    let f = t - lo as f64;
    let (a, b) = (GRADIENT[lo], GRADIENT[lo + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Fixed set of 2D points rendered with different colorings.
#[derive(Debug, Clone)]
pub struct ScatterPlot {
    points: Vec<(f64, f64)>,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl ScatterPlot {
    /// # Arguments
    /// * `projection` - rows x 2
    pub fn new(projection: &DMatrix<f64>) -> Self {
        let points: Vec<(f64, f64)> = (0..projection.nrows())
            .map(|i| (projection[(i, 0)], projection[(i, 1)]))
            .collect();
        let range = |it: &mut dyn Iterator<Item = f64>| {
            let (lo, hi) = it.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
            if lo < hi {
                (lo, hi)
            } else if lo.is_finite() {
                (lo - 1.0, lo + 1.0)
            } else {
                (0.0, 1.0)
            }
        };
        let x_range = range(&mut points.iter().map(|p| p.0));
        let y_range = range(&mut points.iter().map(|p| p.1));
        Self {
            points,
            x_range,
            y_range,
        }
    }

    fn to_screen(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let plot_w = WIDTH - LEGEND_WIDTH - 2.0 * MARGIN;
        let plot_h = HEIGHT - 2.0 * MARGIN;
        let sx = MARGIN + (x - self.x_range.0) / (self.x_range.1 - self.x_range.0) * plot_w;
        // svg y grows downwards
        let sy = HEIGHT - MARGIN - (y - self.y_range.0) / (self.y_range.1 - self.y_range.0) * plot_h;
        (sx, sy)
    }

    pub fn render(&self, title: &str, coloring: &Coloring) -> String {
        let mut svg = String::new();
        // writing into a String cannot fail
        let _ = writeln!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" font-family=\"sans-serif\">"
        );
        let _ = writeln!(svg, "  <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>");
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"24\" text-anchor=\"middle\" font-size=\"16\">{}</text>",
            (WIDTH - LEGEND_WIDTH) / 2.0,
            escape(title)
        );

        let _ = writeln!(svg, "  <g stroke=\"none\">");
        for i in coloring.draw_order() {
            let Some(&point) = self.points.get(i) else {
                continue;
            };
            let (sx, sy) = self.to_screen(point);
            let _ = writeln!(
                svg,
                "    <circle cx=\"{sx:.2}\" cy=\"{sy:.2}\" r=\"{RADIUS}\" fill=\"{}\" fill-opacity=\"0.7\"/>",
                coloring.color(i)
            );
        }
        let _ = writeln!(svg, "  </g>");

        let lx = WIDTH - LEGEND_WIDTH + 10.0;
        for (row, (color, label)) in coloring.legend().into_iter().enumerate() {
            let ly = MARGIN + row as f64 * 20.0;
            let _ = writeln!(
                svg,
                "  <rect x=\"{lx}\" y=\"{ly}\" width=\"12\" height=\"12\" fill=\"{color}\"/>"
            );
            let _ = writeln!(
                svg,
                "  <text x=\"{}\" y=\"{}\" font-size=\"12\">{}</text>",
                lx + 18.0,
                ly + 11.0,
                escape(&label)
            );
        }
        svg.push_str("</svg>\n");
        svg
    }
}
