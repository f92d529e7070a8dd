//! transforms.rs
//!
//! Post-build table transforms. A transform reads a finished table and
//! produces a new, derived table; the source table is never touched.
use serde_json::{Map, Value};
use thiserror::Error;

use crate::computers::ColumnValues;
use crate::table::{BuiltColumn, BuiltTable, TableError};

pub const PCA: &str = "PCA";

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-22;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("No numeric columns selected for PCA")]
    NoColumns,
    #[error("PCA needs at least 2 complete rows, found {0}")]
    TooFewRows(usize),
    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PcaConfig {
    pub center: bool,
    pub standardize: bool,
    /// Columns to use. Empty means every numeric scalar column.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Number of components to keep. `None` keeps all of them.
    pub n_components: Option<usize>,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self { center: true, standardize: false, include: Vec::new(), exclude: Vec::new(), n_components: None }
    }
}

impl PcaConfig {
    /// Reads `center`, `standardize`, `include`, `exclude` and `n_components`.
    /// Missing or mistyped entries keep their defaults.
    pub fn from_parameters(params: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        let names = |key: &str| -> Vec<String> {
            params
                .get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default()
        };
        Self {
            center: params.get("center").and_then(Value::as_bool).unwrap_or(defaults.center),
            standardize: params.get("standardize").and_then(Value::as_bool).unwrap_or(defaults.standardize),
            include: names("include"),
            exclude: names("exclude"),
            n_components: params.get("n_components").and_then(Value::as_u64).map(|n| n as usize),
        }
    }

    fn selects(&self, column: &str) -> bool {
        (self.include.is_empty() || self.include.iter().any(|c| c == column)) && !self.exclude.iter().any(|c| c == column)
    }
}

/// Principal component scores of the numeric scalar columns of `table`.
///
/// Rows holding a non-finite value in any selected column are dropped. The
/// output keeps the surviving rows in order, with one `PC<n>` double column per
/// component, strongest first.
pub fn pca(table: &BuiltTable, config: &PcaConfig) -> Result<BuiltTable, TransformError> {
    // 1. Column selection
    let columns: Vec<Vec<f64>> = table
        .columns()
        .iter()
        .filter(|c| config.selects(&c.name))
        .filter_map(|c| c.values.as_f64())
        .collect();
    if columns.is_empty() {
        return Err(TransformError::NoColumns);
    }

    // 2. Complete rows
    let kept: Vec<usize> = (0..table.row_count()).filter(|&r| columns.iter().all(|c| c[r].is_finite())).collect();
    if kept.len() < 2 {
        return Err(TransformError::TooFewRows(kept.len()));
    }
    let n = kept.len();
    let p = columns.len();

    // 3. Centering and scaling
    let mut data: Vec<Vec<f64>> = kept.iter().map(|&r| columns.iter().map(|c| c[r]).collect()).collect();
    for j in 0..p {
        let mean = data.iter().map(|row| row[j]).sum::<f64>() / n as f64;
        let std = (data.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt();
        for row in data.iter_mut() {
            if config.center || config.standardize {
                row[j] -= mean;
            }
            if config.standardize && std > 0.0 {
                row[j] /= std;
            }
        }
    }

    // 4. Covariance and its eigenvectors
    let mut covariance = vec![vec![0.0; p]; p];
    for a in 0..p {
        for b in a..p {
            let sum: f64 = data.iter().map(|row| row[a] * row[b]).sum::<f64>() / (n - 1) as f64;
            covariance[a][b] = sum;
            covariance[b][a] = sum;
        }
    }
    let (eigenvalues, eigenvectors) = jacobi_eigen(covariance);
    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

    // 5. Scores
    let k = config.n_components.unwrap_or(p).clamp(1, p);
    let pcs = order[..k]
        .iter()
        .enumerate()
        .map(|(pos, &component)| {
            let mut axis: Vec<f64> = eigenvectors.iter().map(|row| row[component]).collect();
            orient(&mut axis);
            let scores = data.iter().map(|row| row.iter().zip(&axis).map(|(x, w)| x * w).sum()).collect();
            BuiltColumn {
                name: format!("PC{}", pos + 1),
                values: ColumnValues::Double(scores),
                entity_ids: None,
                source: PCA.to_string(),
            }
        })
        .collect();

    Ok(BuiltTable::new(table.rows().select(&kept), table.time_frame().clone(), pcs)?)
}

/// Flips `axis` so its largest-magnitude component is positive.
fn orient(axis: &mut [f64]) {
    let dominant = axis.iter().copied().fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if dominant < 0.0 {
        axis.iter_mut().for_each(|x| *x = -*x);
    }
}

/// Cyclic Jacobi rotations on a symmetric matrix. Returns the eigenvalues and
/// a matrix whose columns are the matching unit eigenvectors.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n).map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect()).collect();

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off_diagonal: f64 = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off_diagonal < JACOBI_TOLERANCE {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q] == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                for k in 0..n {
                    let (kp, kq) = (a[k][p], a[k][q]);
                    a[k][p] = c * kp - s * kq;
                    a[k][q] = s * kp + c * kq;
                }
                for k in 0..n {
                    let (pk, qk) = (a[p][k], a[q][k]);
                    a[p][k] = c * pk - s * qk;
                    a[q][k] = s * pk + c * qk;
                }
                for row in v.iter_mut() {
                    let (kp, kq) = (row[p], row[q]);
                    row[p] = c * kp - s * kq;
                    row[q] = s * kp + c * kq;
                }
            }
        }
    }
    ((0..n).map(|i| a[i][i]).collect(), v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanRows;
    use crate::time::{TimeFrame, TimeFrameIndex};
    use serde_json::json;
    use std::sync::Arc;

    fn column(name: &str, values: ColumnValues) -> BuiltColumn {
        BuiltColumn { name: name.into(), values, entity_ids: None, source: "s".into() }
    }

    /// y = 2x, plus a NaN row and a non-numeric column.
    fn table() -> BuiltTable {
        let frame = Arc::new(TimeFrame::from_range(0, 5, 1).unwrap());
        let rows = PlanRows::Indices((0..5).map(TimeFrameIndex).collect());
        BuiltTable::new(
            rows,
            frame,
            vec![
                column("x", ColumnValues::Double(vec![1.0, 2.0, f64::NAN, 3.0, 4.0])),
                column("y", ColumnValues::Int(vec![2, 4, 0, 6, 8])),
                column("flag", ColumnValues::Bool(vec![true; 5])),
            ],
        )
        .unwrap()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{} != {}", a, e);
        }
    }

    #[test]
    fn test_pca_on_collinear_columns() {
        let result = pca(&table(), &PcaConfig::default()).unwrap();
        assert_eq!(result.column_names(), vec!["PC1", "PC2"]);
        assert_eq!(result.row_count(), 4);
        assert_eq!(result.rows(), &PlanRows::Indices(vec![TimeFrameIndex(0), TimeFrameIndex(1), TimeFrameIndex(3), TimeFrameIndex(4)]));

        let root5 = 5.0_f64.sqrt();
        let pc1 = result.values::<f64>("PC1").unwrap();
        assert_close(pc1, &[-1.5 * root5, -0.5 * root5, 0.5 * root5, 1.5 * root5]);
        assert_close(result.values::<f64>("PC2").unwrap(), &[0.0; 4]);
    }

    #[test]
    fn test_exclude_and_component_count() {
        let config = PcaConfig::from_parameters(json!({ "exclude": ["y"], "n_components": 3 }).as_object().unwrap());
        let result = pca(&table(), &config).unwrap();
        assert_eq!(result.column_names(), vec!["PC1"]);
        assert_close(result.values::<f64>("PC1").unwrap(), &[-1.5, -0.5, 0.5, 1.5]);
    }

    #[test]
    fn test_standardize_scales_to_unit_variance() {
        let config = PcaConfig { standardize: true, include: vec!["x".into()], ..Default::default() };
        let result = pca(&table(), &config).unwrap();
        let pc1 = result.values::<f64>("PC1").unwrap();
        let variance = pc1.iter().map(|v| v * v).sum::<f64>() / 3.0;
        assert!((variance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pca_errors() {
        let config = PcaConfig { include: vec!["flag".into()], ..Default::default() };
        assert_eq!(pca(&table(), &config).unwrap_err(), TransformError::NoColumns);

        let frame = Arc::new(TimeFrame::from_range(0, 2, 1).unwrap());
        let rows = PlanRows::Indices(vec![TimeFrameIndex(0), TimeFrameIndex(1)]);
        let sparse = BuiltTable::new(rows, frame, vec![column("x", ColumnValues::Double(vec![1.0, f64::NAN]))]).unwrap();
        assert_eq!(pca(&sparse, &PcaConfig::default()).unwrap_err(), TransformError::TooFewRows(1));
    }

    #[test]
    fn test_jacobi_recovers_diagonal_spectrum() {
        let (values, vectors) = jacobi_eigen(vec![vec![2.0, 1.0], vec![1.0, 2.0]]);
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        assert_close(&sorted, &[1.0, 3.0]);
        let top = if values[0] > values[1] { 0 } else { 1 };
        let mut axis = vec![vectors[0][top], vectors[1][top]];
        orient(&mut axis);
        let h = 0.5_f64.sqrt();
        assert_close(&axis, &[h, h]);
    }
}
