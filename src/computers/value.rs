//! value.rs
//!
//! The closed set of column value types, and the type-erased wrappers the
//! registry hands out. Everything that has to match over the set is generated
//! by `column_types!` so the variants cannot drift apart.
use serde::Serialize;
use std::fmt;

use super::{ColumnComputer, ComputedColumn, EntityIds, MultiColumnComputer};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::time::TimeFrameIndex;

/// Scalar type of a vector output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementType {
    Float,
    Double,
    Int,
    TimeFrameIndex,
}

/// A column value that can travel through the erased wrappers.
pub trait ColumnElement: Clone + Default + PartialEq + Send + Sync + fmt::Debug + 'static {
    const OUTPUT_TYPE: OutputType;

    fn wrap_values(values: Vec<Self>) -> ColumnValues;
    fn unwrap_values(values: &ColumnValues) -> Option<&[Self]>;
    fn wrap_single(computer: Box<dyn ColumnComputer<Self>>) -> SingleComputer;
    fn unwrap_single(computer: SingleComputer) -> Option<Box<dyn ColumnComputer<Self>>>;
    fn wrap_multi(computer: Box<dyn MultiColumnComputer<Self>>) -> MultiComputer;
    fn unwrap_multi(computer: MultiComputer) -> Option<Box<dyn MultiColumnComputer<Self>>>;
}

/// Column values after erasure, together with their provenance channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ErasedColumn {
    pub values: ColumnValues,
    pub entity_ids: Option<Vec<EntityIds>>,
}

impl<T: ColumnElement> From<ComputedColumn<T>> for ErasedColumn {
    fn from(c: ComputedColumn<T>) -> Self {
        Self { values: T::wrap_values(c.values), entity_ids: c.entity_ids }
    }
}

macro_rules! column_types {
    ($( $variant:ident($ty:ty) => $name:literal, $elem:expr; )*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum OutputType { $( $variant, )* }

        impl OutputType {
            pub const ALL: &'static [OutputType] = &[$( OutputType::$variant, )*];

            pub fn name(&self) -> &'static str {
                match self { $( OutputType::$variant => $name, )* }
            }

            pub fn element_type(&self) -> Option<ElementType> {
                match self { $( OutputType::$variant => $elem, )* }
            }
        }

        #[derive(Debug, Clone, PartialEq)]
        pub enum ColumnValues { $( $variant(Vec<$ty>), )* }

        impl ColumnValues {
            pub fn len(&self) -> usize {
                match self { $( ColumnValues::$variant(v) => v.len(), )* }
            }

            pub fn output_type(&self) -> OutputType {
                match self { $( ColumnValues::$variant(_) => OutputType::$variant, )* }
            }

            /// Keeps the values at `rows`, in that order.
            pub fn select(&self, rows: &[usize]) -> ColumnValues {
                match self { $( ColumnValues::$variant(v) => ColumnValues::$variant(rows.iter().map(|&r| v[r].clone()).collect()), )* }
            }
        }

        #[derive(Debug)]
        pub enum SingleComputer { $( $variant(Box<dyn ColumnComputer<$ty>>), )* }

        impl SingleComputer {
            pub fn output_type(&self) -> OutputType {
                match self { $( SingleComputer::$variant(_) => OutputType::$variant, )* }
            }
            pub fn compute(&self, plan: &ExecutionPlan) -> Result<ErasedColumn, ComputeError> {
                match self { $( SingleComputer::$variant(c) => c.compute(plan).map(ErasedColumn::from), )* }
            }
            pub fn required_row_kind(&self) -> RowSelectorKind {
                match self { $( SingleComputer::$variant(c) => c.required_row_kind(), )* }
            }
            pub fn source_dependency(&self) -> &str {
                match self { $( SingleComputer::$variant(c) => c.source_dependency(), )* }
            }
        }

        #[derive(Debug)]
        pub enum MultiComputer { $( $variant(Box<dyn MultiColumnComputer<$ty>>), )* }

        impl MultiComputer {
            pub fn output_type(&self) -> OutputType {
                match self { $( MultiComputer::$variant(_) => OutputType::$variant, )* }
            }
            pub fn output_suffixes(&self) -> Vec<String> {
                match self { $( MultiComputer::$variant(c) => c.output_suffixes(), )* }
            }
            pub fn compute_batch(&self, plan: &ExecutionPlan) -> Result<Vec<ErasedColumn>, ComputeError> {
                match self {
                    $( MultiComputer::$variant(c) => Ok(c.compute_batch(plan)?.into_iter().map(ErasedColumn::from).collect()), )*
                }
            }
            pub fn entity_counts(&self, plan: &ExecutionPlan) -> Option<Vec<usize>> {
                match self { $( MultiComputer::$variant(c) => c.entity_counts(plan), )* }
            }
            pub fn required_row_kind(&self) -> RowSelectorKind {
                match self { $( MultiComputer::$variant(c) => c.required_row_kind(), )* }
            }
            pub fn source_dependency(&self) -> &str {
                match self { $( MultiComputer::$variant(c) => c.source_dependency(), )* }
            }
        }

        $(
            impl ColumnElement for $ty {
                const OUTPUT_TYPE: OutputType = OutputType::$variant;

                fn wrap_values(values: Vec<Self>) -> ColumnValues { ColumnValues::$variant(values) }
                fn unwrap_values(values: &ColumnValues) -> Option<&[Self]> {
                    if let ColumnValues::$variant(v) = values { Some(v) } else { None }
                }
                fn wrap_single(computer: Box<dyn ColumnComputer<Self>>) -> SingleComputer {
                    SingleComputer::$variant(computer)
                }
                fn unwrap_single(computer: SingleComputer) -> Option<Box<dyn ColumnComputer<Self>>> {
                    if let SingleComputer::$variant(c) = computer { Some(c) } else { None }
                }
                fn wrap_multi(computer: Box<dyn MultiColumnComputer<Self>>) -> MultiComputer {
                    MultiComputer::$variant(computer)
                }
                fn unwrap_multi(computer: MultiComputer) -> Option<Box<dyn MultiColumnComputer<Self>>> {
                    if let MultiComputer::$variant(c) = computer { Some(c) } else { None }
                }
            }
        )*
    };
}

column_types! {
    Bool(bool) => "bool", None;
    Int(i32) => "int", None;
    Int64(i64) => "int64", None;
    Float(f32) => "float", None;
    Double(f64) => "double", None;
    FloatVec(Vec<f32>) => "vector<float>", Some(ElementType::Float);
    DoubleVec(Vec<f64>) => "vector<double>", Some(ElementType::Double);
    IntVec(Vec<i32>) => "vector<int>", Some(ElementType::Int);
    IndexVec(Vec<TimeFrameIndex>) => "vector<TimeFrameIndex>", Some(ElementType::TimeFrameIndex);
}

impl OutputType {
    pub fn is_vector(&self) -> bool { self.element_type().is_some() }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl ColumnValues {
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Numeric scalar columns widened to `f64`. `None` for booleans and vectors.
    pub fn as_f64(&self) -> Option<Vec<f64>> {
        match self {
            ColumnValues::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            ColumnValues::Int64(v) => Some(v.iter().map(|&x| x as f64).collect()),
            ColumnValues::Float(v) => Some(v.iter().map(|&x| x as f64).collect()),
            ColumnValues::Double(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// A constructed computer with its output type erased.
#[derive(Debug)]
pub enum ErasedComputer {
    Single(SingleComputer),
    Multi(MultiComputer),
}

impl ErasedComputer {
    pub fn single<T: ColumnElement>(computer: impl ColumnComputer<T> + 'static) -> Self {
        ErasedComputer::Single(T::wrap_single(Box::new(computer)))
    }

    pub fn multi<T: ColumnElement>(computer: impl MultiColumnComputer<T> + 'static) -> Self {
        ErasedComputer::Multi(T::wrap_multi(Box::new(computer)))
    }

    pub fn output_type(&self) -> OutputType {
        match self {
            ErasedComputer::Single(c) => c.output_type(),
            ErasedComputer::Multi(c) => c.output_type(),
        }
    }

    pub fn is_multi_output(&self) -> bool { matches!(self, ErasedComputer::Multi(_)) }

    pub fn required_row_kind(&self) -> RowSelectorKind {
        match self {
            ErasedComputer::Single(c) => c.required_row_kind(),
            ErasedComputer::Multi(c) => c.required_row_kind(),
        }
    }

    pub fn source_dependency(&self) -> &str {
        match self {
            ErasedComputer::Single(c) => c.source_dependency(),
            ErasedComputer::Multi(c) => c.source_dependency(),
        }
    }

    /// Recovers the statically typed single-output computer, or `None` if
    /// `T` is not its output type.
    pub fn into_single<T: ColumnElement>(self) -> Option<Box<dyn ColumnComputer<T>>> {
        match self {
            ErasedComputer::Single(c) => T::unwrap_single(c),
            ErasedComputer::Multi(_) => None,
        }
    }

    pub fn into_multi<T: ColumnElement>(self) -> Option<Box<dyn MultiColumnComputer<T>>> {
        match self {
            ErasedComputer::Multi(c) => T::unwrap_multi(c),
            ErasedComputer::Single(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_type_names_and_elements() {
        assert_eq!(OutputType::Double.name(), "double");
        assert!(!OutputType::Int64.is_vector());
        assert_eq!(OutputType::IndexVec.element_type(), Some(ElementType::TimeFrameIndex));
        assert_eq!(OutputType::ALL.len(), 9);
    }

    #[test]
    fn test_values_wrap_and_unwrap_only_for_their_type() {
        let values = f64::wrap_values(vec![1.0, 2.0]);
        assert_eq!(values.output_type(), OutputType::Double);
        assert_eq!(f64::unwrap_values(&values), Some(&[1.0, 2.0][..]));
        assert_eq!(f32::unwrap_values(&values), None);
        assert_eq!(values.select(&[1]), ColumnValues::Double(vec![2.0]));
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(ColumnValues::Int(vec![1, -2]).as_f64(), Some(vec![1.0, -2.0]));
        assert_eq!(ColumnValues::Bool(vec![true]).as_f64(), None);
    }
}
