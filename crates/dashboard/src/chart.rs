// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Chart data for the visualization front end
//!
//! Everything here works on an already-fetched batch. Drawing happens
//! elsewhere.

use crate::Result;
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::collections::BTreeMap;

pub const DEFAULT_BINS: usize = 20;
pub const MIN_BINS: usize = 5;
pub const MAX_BINS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Histogram,
    Pie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        Self::Bar,
        Self::Line,
        Self::Scatter,
        Self::Histogram,
        Self::Pie,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Bar => "Bar Chart",
            Self::Line => "Line Chart",
            Self::Scatter => "Scatter Plot",
            Self::Histogram => "Histogram",
            Self::Pie => "Pie Chart",
        }
    }
}

/// What to plot. Metric-like fields name numeric columns; category, group
/// and color fields name categorical ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartRequest {
    Bar { category: String, metric: String },
    Line { metric: String, group: Option<String> },
    Scatter { x: String, y: String, color: Option<String> },
    Histogram { column: String, bins: Option<usize> },
    Pie { category: String, value: String },
}

impl ChartRequest {
    pub fn kind(&self) -> ChartKind {
        match self {
            Self::Bar { .. } => ChartKind::Bar,
            Self::Line { .. } => ChartKind::Line,
            Self::Scatter { .. } => ChartKind::Scatter,
            Self::Histogram { .. } => ChartKind::Histogram,
            Self::Pie { .. } => ChartKind::Pie,
        }
    }
}

/// Numeric and categorical columns of a table, by declared type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartColumns {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// Top rows by metric, highest first.
    Bar { title: String, bars: Vec<Point> },
    /// Row order trend, or mean of the metric per group.
    Line { title: String, points: Vec<Point> },
    Scatter { title: String, points: Vec<ScatterPoint> },
    Histogram { title: String, bins: Vec<Bin> },
    /// Sum of the value per category.
    Pie { title: String, slices: Vec<Point> },
}

impl ChartData {
    pub fn title(&self) -> &str {
        match self {
            Self::Bar { title, .. }
            | Self::Line { title, .. }
            | Self::Scatter { title, .. }
            | Self::Histogram { title, .. }
            | Self::Pie { title, .. } => title,
        }
    }
}

/// Values of a numeric column as f64; nulls and failed casts are `None`.
pub(crate) fn numbers(batch: &RecordBatch, column: usize) -> Result<Vec<Option<f64>>> {
    let array = cast(batch.column(column), &DataType::Float64)?;
    let values = array.as_primitive::<Float64Type>();
    Ok((0..values.len())
        .map(|i| values.is_valid(i).then(|| values.value(i)))
        .collect())
}

/// Values of any column rendered as text; nulls are `None`.
pub(crate) fn labels(batch: &RecordBatch, column: usize) -> Result<Vec<Option<String>>> {
    let array = batch.column(column);
    let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
    Ok((0..array.len())
        .map(|i| array.is_valid(i).then(|| formatter.value(i).to_string()))
        .collect())
}

/// Category/metric pairs in row order.
pub fn bars(category: &[Option<String>], metric: &[Option<f64>]) -> Vec<Point> {
    category
        .iter()
        .zip(metric)
        .filter_map(|(c, m)| Some(Point {
            label: c.clone()?,
            value: (*m)?,
        }))
        .collect()
}

/// Metric in row order, labelled by row number.
pub fn trend(metric: &[Option<f64>]) -> Vec<Point> {
    metric
        .iter()
        .enumerate()
        .filter_map(|(i, m)| Some(Point {
            label: i.to_string(),
            value: (*m)?,
        }))
        .collect()
}

/// Mean metric per group, groups sorted. Null groups are dropped, and
/// groups without any metric value are omitted.
pub fn mean_by_group(group: &[Option<String>], metric: &[Option<f64>]) -> Vec<Point> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (g, m) in group.iter().zip(metric) {
        let Some(g) = g.as_deref() else { continue };
        let entry = sums.entry(g).or_insert((0.0, 0));
        if let Some(m) = m {
            entry.0 += m;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .filter(|(_, (_, n))| *n > 0)
        .map(|(g, (sum, n))| Point {
            label: g.to_string(),
            value: sum / n as f64,
        })
        .collect()
}

/// Sum per category, categories sorted. Missing values add nothing.
pub fn sum_by_category(category: &[Option<String>], value: &[Option<f64>]) -> Vec<Point> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for (c, v) in category.iter().zip(value) {
        let Some(c) = c.as_deref() else { continue };
        *sums.entry(c).or_insert(0.0) += v.unwrap_or(0.0);
    }
    sums.into_iter()
        .map(|(c, sum)| Point {
            label: c.to_string(),
            value: sum,
        })
        .collect()
}

pub fn scatter(x: &[Option<f64>], y: &[Option<f64>], color: Option<&[Option<String>]>) -> Vec<ScatterPoint> {
    (0..x.len().min(y.len()))
        .filter_map(|i| {
            Some(ScatterPoint {
                x: x[i]?,
                y: y[i]?,
                group: color.and_then(|c| c.get(i).cloned().flatten()),
            })
        })
        .collect()
}

/// Clamp a requested bin count into the supported range.
pub fn bin_count(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_BINS).clamp(MIN_BINS, MAX_BINS)
}

/// Equal-width bins over the finite values. The last bin is closed.
pub fn histogram(values: &[Option<f64>], bins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    let (Some(min), Some(max)) = (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    let bins = bins.max(1);
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in &finite {
        let index = if width > 0.0 {
            (((v - min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[index] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_bin_count_is_clamped() {
        assert_eq!(bin_count(None), 20);
        assert_eq!(bin_count(Some(2)), 5);
        assert_eq!(bin_count(Some(500)), 100);
        assert_eq!(bin_count(Some(42)), 42);
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values: Vec<Option<f64>> = vec![Some(0.0), Some(1.0), Some(2.5), None, Some(10.0), Some(f64::NAN)];
        let bins = histogram(&values, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[4].count, 1);
        assert_eq!(bins[4].upper, 10.0);
    }

    #[test]
    fn test_histogram_single_value() {
        let bins = histogram(&[Some(3.0), Some(3.0)], 5);
        assert_eq!(bins[0].count, 2);
        assert!(histogram(&[None], 5).is_empty());
    }

    #[test]
    fn test_grouping() {
        let groups = vec![s("b"), s("a"), s("b"), None, s("c")];
        let metric = vec![Some(1.0), Some(4.0), Some(3.0), Some(100.0), None];

        let means = mean_by_group(&groups, &metric);
        assert_eq!(
            means,
            vec![
                Point { label: "a".into(), value: 4.0 },
                Point { label: "b".into(), value: 2.0 },
            ]
        );

        let sums = sum_by_category(&groups, &metric);
        assert_eq!(sums.len(), 3);
        assert_eq!(sums[2], Point { label: "c".into(), value: 0.0 });
    }

    #[test]
    fn test_scatter_skips_incomplete_pairs() {
        let points = scatter(&[Some(1.0), None, Some(3.0)], &[Some(2.0), Some(5.0), Some(4.0)], None);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].x, 3.0);
        assert_eq!(points[1].group, None);
    }
}
