//! builder.rs
//!
//! Turns a row selector plus a set of computers into a `BuiltTable`.
//!
//! The build runs in three steps: names are checked, the row plan is
//! negotiated once for the whole table, then every column is computed against
//! that shared plan. Columns never read each other, so step three runs in
//! parallel.
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::TableError;
use crate::computers::{
    ColumnComputer, ColumnElement, ColumnValues, EntityIds, ErasedColumn, ErasedComputer, MultiColumnComputer, MultiComputer,
    SingleComputer,
};
use crate::error::ComputeError;
use crate::plan::{negotiate_plan, ExecutionPlan, PlanRows, RowExpansion, RowSelector, RowSelectorKind};
use crate::sources::EntityId;
use crate::time::TimeFrame;

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltColumn {
    pub name: String,
    pub values: ColumnValues,
    pub entity_ids: Option<Vec<EntityIds>>,
    /// Source the column was computed from.
    pub source: String,
}

impl BuiltColumn {
    fn from_erased(name: String, source: &str, column: ErasedColumn) -> Self {
        Self { name, values: column.values, entity_ids: column.entity_ids, source: source.to_string() }
    }
}

/// An ordered set of named, typed, equal-length columns.
#[derive(Debug, Clone)]
pub struct BuiltTable {
    rows: PlanRows,
    time_frame: Arc<TimeFrame>,
    columns: Vec<BuiltColumn>,
    by_name: HashMap<String, usize>,
}

impl BuiltTable {
    pub fn new(rows: PlanRows, time_frame: Arc<TimeFrame>, columns: Vec<BuiltColumn>) -> Result<Self, TableError> {
        let mut by_name = HashMap::with_capacity(columns.len());
        for (pos, column) in columns.iter().enumerate() {
            if column.values.len() != rows.len() {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected: rows.len(),
                    actual: column.values.len(),
                });
            }
            if by_name.insert(column.name.clone(), pos).is_some() {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { rows, time_frame, columns, by_name })
    }

    pub fn row_count(&self) -> usize { self.rows.len() }
    pub fn column_count(&self) -> usize { self.columns.len() }
    pub fn rows(&self) -> &PlanRows { &self.rows }
    pub fn time_frame(&self) -> &Arc<TimeFrame> { &self.time_frame }
    pub fn columns(&self) -> &[BuiltColumn] { &self.columns }
    pub fn has_column(&self, name: &str) -> bool { self.by_name.contains_key(name) }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&BuiltColumn, TableError> {
        self.by_name
            .get(name)
            .map(|&pos| &self.columns[pos])
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Typed view of one column.
    pub fn values<T: ColumnElement>(&self, name: &str) -> Result<&[T], TableError> {
        let column = self.column(name)?;
        T::unwrap_values(&column.values).ok_or_else(|| TableError::TypeMismatch {
            column: name.to_string(),
            expected: T::OUTPUT_TYPE,
            actual: column.values.output_type(),
        })
    }

    /// Every entity contributing to `row`, across all columns, sorted and unique.
    pub fn row_entity_ids(&self, row: usize) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .columns
            .iter()
            .filter_map(|c| c.entity_ids.as_ref()?.get(row))
            .flat_map(|ids| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// A table with only the rows at `positions`, in that order. Out-of-range
    /// positions are skipped.
    pub fn select_rows(&self, positions: &[usize]) -> BuiltTable {
        let positions: Vec<usize> = positions.iter().copied().filter(|&p| p < self.row_count()).collect();
        let positions = positions.as_slice();
        let columns = self
            .columns
            .iter()
            .map(|c| BuiltColumn {
                name: c.name.clone(),
                values: c.values.select(positions),
                entity_ids: c.entity_ids.as_ref().map(|ids| positions.iter().map(|&p| ids[p].clone()).collect()),
                source: c.source.clone(),
            })
            .collect();
        Self { rows: self.rows.select(positions), time_frame: self.time_frame.clone(), columns, by_name: self.by_name.clone() }
    }
}

fn compute_error(column: &str) -> impl FnOnce(ComputeError) -> TableError + '_ {
    move |source| TableError::Compute { column: column.to_string(), source }
}

#[derive(Debug)]
enum PendingColumn {
    Single { name: String, computer: SingleComputer },
    Multi { name: String, computer: MultiComputer },
}

impl PendingColumn {
    fn output_names(&self) -> Vec<String> {
        match self {
            PendingColumn::Single { name, .. } => vec![name.clone()],
            PendingColumn::Multi { name, computer } => {
                computer.output_suffixes().iter().map(|s| format!("{}.{}", name, s)).collect()
            }
        }
    }

    fn entity_counts(&self, plan: &ExecutionPlan) -> Option<Vec<usize>> {
        match self {
            PendingColumn::Single { .. } => None,
            PendingColumn::Multi { computer, .. } => computer.entity_counts(plan),
        }
    }

    fn compute(&self, plan: &ExecutionPlan) -> Result<Vec<BuiltColumn>, TableError> {
        match self {
            PendingColumn::Single { name, computer } => {
                let column = computer.compute(plan).map_err(compute_error(name))?;
                Ok(vec![BuiltColumn::from_erased(name.clone(), computer.source_dependency(), column)])
            }
            PendingColumn::Multi { name, computer } => {
                let columns = computer.compute_batch(plan).map_err(compute_error(name))?;
                let names = self.output_names();
                if columns.len() != names.len() {
                    return Err(TableError::LengthMismatch { column: name.clone(), expected: names.len(), actual: columns.len() });
                }
                Ok(names
                    .into_iter()
                    .zip(columns)
                    .map(|(n, c)| BuiltColumn::from_erased(n, computer.source_dependency(), c))
                    .collect())
            }
        }
    }
}

#[derive(Debug)]
pub struct TableBuilder {
    selector: RowSelector,
    columns: Vec<PendingColumn>,
}

impl TableBuilder {
    pub fn new(selector: RowSelector) -> Self {
        Self { selector, columns: Vec::new() }
    }

    pub fn add_column<T: ColumnElement>(&mut self, name: impl Into<String>, computer: Box<dyn ColumnComputer<T>>) -> &mut Self {
        self.columns.push(PendingColumn::Single { name: name.into(), computer: T::wrap_single(computer) });
        self
    }

    /// Adds every output of a multi-output computer as `<name>.<suffix>`.
    pub fn add_multi_column<T: ColumnElement>(&mut self, name: impl Into<String>, computer: Box<dyn MultiColumnComputer<T>>) -> &mut Self {
        self.columns.push(PendingColumn::Multi { name: name.into(), computer: T::wrap_multi(computer) });
        self
    }

    pub fn add_erased(&mut self, name: impl Into<String>, computer: ErasedComputer) -> &mut Self {
        let name = name.into();
        self.columns.push(match computer {
            ErasedComputer::Single(computer) => PendingColumn::Single { name, computer },
            ErasedComputer::Multi(computer) => PendingColumn::Multi { name, computer },
        });
        self
    }

    /// Number of output columns the build will produce.
    pub fn output_column_count(&self) -> usize {
        self.columns.iter().map(|c| c.output_names().len()).sum()
    }

    pub fn build(self) -> Result<BuiltTable, TableError> {
        // 1. Names
        if self.columns.is_empty() {
            return Err(TableError::NoColumns);
        }
        let mut seen = HashSet::new();
        for name in self.columns.iter().flat_map(PendingColumn::output_names) {
            if !seen.insert(name.clone()) {
                return Err(TableError::DuplicateColumn(name));
            }
        }

        // 2. Row-plan negotiation, once for the whole table
        let base = self.selector.to_plan();
        let expansion = if self.selector.kind() == RowSelectorKind::Timestamp {
            let counts: Vec<Option<Vec<usize>>> = self.columns.iter().map(|c| c.entity_counts(&base)).collect();
            let keep_empty = counts.iter().any(Option::is_none);
            counts.into_iter().flatten().next().map(|counts| RowExpansion { counts, keep_empty })
        } else {
            None
        };
        let plan = negotiate_plan(base, expansion);

        // 3. Columns
        let computed = self
            .columns
            .par_iter()
            .map(|c| c.compute(&plan))
            .collect::<Result<Vec<Vec<BuiltColumn>>, TableError>>()?;

        BuiltTable::new(plan.rows().clone(), plan.time_frame().clone(), computed.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computers::OutputType;
    use crate::computers::interval_property::{IntervalProperty, IntervalPropertyComputer};
    use crate::computers::line_sampling::LineSamplingComputer;
    use crate::computers::timestamp_value::TimestampValueComputer;
    use crate::plan::RowId;
    use crate::sources::{AnalogSeries, IntervalSeries, LineSeries, Point};
    use crate::time::{TimeFrameIndex, TimeFrameInterval};

    fn frame() -> Arc<TimeFrame> { Arc::new(TimeFrame::from_range(0, 3, 1).unwrap()) }

    /// 0 lines at t=0, 1 at t=1, 2 at t=2.
    fn lines(frame: Arc<TimeFrame>) -> Arc<LineSeries> {
        let mut lines = LineSeries::new("whiskers", frame);
        lines.add_line(TimeFrameIndex(1), vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        lines.add_line(TimeFrameIndex(2), vec![Point::new(0.0, 0.0), Point::new(0.0, 4.0)]);
        lines.add_line(TimeFrameIndex(2), vec![Point::new(1.0, 1.0), Point::new(3.0, 1.0)]);
        Arc::new(lines)
    }

    fn timestamps(frame: Arc<TimeFrame>) -> RowSelector {
        RowSelector::Timestamp { timestamps: vec![TimeFrameIndex(0), TimeFrameIndex(1), TimeFrameIndex(2)], time_frame: frame }
    }

    #[test]
    fn test_expansion_drops_empty_timestamps() {
        let f = frame();
        let mut builder = TableBuilder::new(timestamps(f.clone()));
        builder.add_multi_column::<f64>("Line", Box::new(LineSamplingComputer::new(lines(f), "whiskers", 2)));
        assert_eq!(builder.output_column_count(), 6);
        let table = builder.build().unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.rows(),
            &PlanRows::Entities(vec![
                RowId { time_index: TimeFrameIndex(1), entity: Some(0) },
                RowId { time_index: TimeFrameIndex(2), entity: Some(0) },
                RowId { time_index: TimeFrameIndex(2), entity: Some(1) },
            ])
        );
        assert_eq!(table.values::<f64>("Line.x@0.500").unwrap(), &[5.0, 0.0, 2.0]);
        assert_eq!(table.values::<f64>("Line.y@0.500").unwrap(), &[0.0, 2.0, 1.0]);
    }

    #[test]
    fn test_expansion_with_non_expanding_sibling_keeps_every_timestamp() {
        let f = frame();
        let analog = Arc::new(AnalogSeries::dense("lfp", f.clone(), vec![100.0, 200.0, 300.0]));
        let mut builder = TableBuilder::new(timestamps(f.clone()));
        builder
            .add_multi_column::<f64>("Line", Box::new(LineSamplingComputer::new(lines(f), "whiskers", 2)))
            .add_column::<f64>("Value", Box::new(TimestampValueComputer::new(analog, "lfp")));
        let table = builder.build().unwrap();

        // t=0 survives as one zero-filled row; t=2 still expands into two rows.
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.values::<f64>("Line.x@1.000").unwrap(), &[0.0, 10.0, 0.0, 3.0]);
        assert_eq!(table.values::<f64>("Value").unwrap(), &[100.0, 200.0, 300.0, 300.0]);
        assert!(table.row_entity_ids(0).is_empty());
        assert_eq!(table.row_entity_ids(3), vec![EntityId(2)]);
    }

    #[test]
    fn test_interval_table_and_typed_access() {
        let f = Arc::new(TimeFrame::from_range(0, 200, 1).unwrap());
        let source = Arc::new(IntervalSeries::new("behavior", f.clone(), vec![]));
        let selector = RowSelector::Interval {
            intervals: vec![TimeFrameInterval::new(10, 15).unwrap(), TimeFrameInterval::new(70, 120).unwrap()],
            time_frame: f,
        };
        let mut builder = TableBuilder::new(selector);
        builder
            .add_column::<f64>("Duration", Box::new(IntervalPropertyComputer::<f64>::new(source.clone(), IntervalProperty::Duration, "behavior")))
            .add_column::<i64>("Start", Box::new(IntervalPropertyComputer::<i64>::new(source, IntervalProperty::Start, "behavior")));
        let table = builder.build().unwrap();

        assert_eq!(table.column_names(), vec!["Duration", "Start"]);
        assert_eq!(table.values::<f64>("Duration").unwrap(), &[5.0, 50.0]);
        assert_eq!(table.values::<i64>("Start").unwrap(), &[10, 70]);
        assert_eq!(table.column("Start").unwrap().source, "behavior");
        assert_eq!(
            table.values::<f32>("Duration").unwrap_err(),
            TableError::TypeMismatch { column: "Duration".into(), expected: OutputType::Float, actual: OutputType::Double }
        );
        assert_eq!(table.values::<f64>("Missing").unwrap_err(), TableError::UnknownColumn("Missing".into()));

        let subset = table.select_rows(&[1]);
        assert_eq!(subset.values::<f64>("Duration").unwrap(), &[50.0]);
        let subset = table.select_rows(&[5, 0, 2]);
        assert_eq!(subset.row_count(), 1);
        assert_eq!(subset.values::<i64>("Start").unwrap(), &[10]);
    }

    #[test]
    fn test_build_errors() {
        let f = frame();
        assert_eq!(TableBuilder::new(timestamps(f.clone())).build().unwrap_err(), TableError::NoColumns);

        let analog = Arc::new(AnalogSeries::dense("lfp", f.clone(), vec![0.0; 3]));
        let mut builder = TableBuilder::new(timestamps(f.clone()));
        builder
            .add_column::<f64>("Value", Box::new(TimestampValueComputer::new(analog.clone(), "lfp")))
            .add_column::<f64>("Value", Box::new(TimestampValueComputer::new(analog.clone(), "lfp")));
        assert_eq!(builder.build().unwrap_err(), TableError::DuplicateColumn("Value".into()));

        // Interval computer over timestamp rows fails with the column named.
        let source = Arc::new(IntervalSeries::new("trials", f.clone(), vec![]));
        let mut builder = TableBuilder::new(timestamps(f));
        builder.add_column::<f64>("Duration", Box::new(IntervalPropertyComputer::<f64>::new(source, IntervalProperty::Duration, "trials")));
        assert!(matches!(builder.build(), Err(TableError::Compute { column, .. }) if column == "Duration"));
    }
}
