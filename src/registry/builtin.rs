//! builtin.rs
//!
//! The built-in computer and adapter catalog.
use std::sync::Arc;

use super::{
    AdapterFactory, AdapterInfo, ComputerFactory, ComputerInfo, ComputerRegistry, ParameterDescriptor, Params, SuffixFactory,
    SOURCE_NAME_PARAM,
};
use crate::computers::analog_offsets::{offset_suffixes, parse_offsets, AnalogTimestampOffsetsComputer};
use crate::computers::analog_slice::AnalogSliceGathererComputer;
use crate::computers::event_in_interval::{EventInIntervalComputer, EventOperation};
use crate::computers::interval_overlap::{IntervalOverlapComputer, OverlapOperation};
use crate::computers::interval_property::{IntervalProperty, IntervalPropertyComputer};
use crate::computers::interval_reduction::{IntervalReductionComputer, ReductionType};
use crate::computers::line_sampling::{line_suffixes, LineSamplingComputer, DEFAULT_SEGMENTS, MAX_SEGMENTS};
use crate::computers::timestamp_in_interval::TimestampInIntervalComputer;
use crate::computers::timestamp_value::TimestampValueComputer;
use crate::computers::{ErasedComputer, OutputType};
use crate::error::ConfigError;
use crate::plan::RowSelectorKind;
use crate::sources::{
    AnalogSource, DataSource, DataSourceVariant, EventSource, IntervalSource, LineSource, Point, RawData, RawDataType,
    SourceKind,
};
use crate::time::TimeFrameIndex;

/// Builds the registry holding every built-in computer and adapter.
pub fn build_registry() -> ComputerRegistry {
    let mut registry = ComputerRegistry::empty();
    register_interval_computers(&mut registry);
    register_event_computers(&mut registry);
    register_point_computers(&mut registry);
    register_adapters(&mut registry);
    log::debug!(
        "Computer registry built with {} computers and {} adapters",
        registry.computer_names().len(),
        registry.adapter_names().len()
    );
    registry
}

// --- Factory helpers ---

fn factory<F>(f: F) -> ComputerFactory
where
    F: Fn(&DataSourceVariant, &Params) -> Result<ErasedComputer, ConfigError> + Send + Sync + 'static,
{
    Box::new(f)
}

fn suffixes<F>(f: F) -> SuffixFactory
where
    F: Fn(&Params) -> Vec<String> + Send + Sync + 'static,
{
    Box::new(f)
}

fn adapter<F>(f: F) -> AdapterFactory
where
    F: Fn(&RawData, &str, &Params) -> Result<DataSourceVariant, ConfigError> + Send + Sync + 'static,
{
    Box::new(f)
}

fn source_name(params: &Params, source: &DataSourceVariant) -> String {
    params.get(SOURCE_NAME_PARAM).cloned().unwrap_or_else(|| source.name().to_string())
}

fn kind_mismatch(computer: &str, expected: SourceKind, source: &DataSourceVariant) -> ConfigError {
    ConfigError::SourceKindMismatch { computer: computer.to_string(), expected, actual: source.kind() }
}

fn analog(computer: &str, source: &DataSourceVariant) -> Result<Arc<dyn AnalogSource>, ConfigError> {
    source.as_analog().cloned().ok_or_else(|| kind_mismatch(computer, SourceKind::Analog, source))
}

fn events(computer: &str, source: &DataSourceVariant) -> Result<Arc<dyn EventSource>, ConfigError> {
    source.as_event().cloned().ok_or_else(|| kind_mismatch(computer, SourceKind::Event, source))
}

fn intervals(computer: &str, source: &DataSourceVariant) -> Result<Arc<dyn IntervalSource>, ConfigError> {
    source.as_interval().cloned().ok_or_else(|| kind_mismatch(computer, SourceKind::Interval, source))
}

fn lines(computer: &str, source: &DataSourceVariant) -> Result<Arc<dyn LineSource>, ConfigError> {
    source.as_line().cloned().ok_or_else(|| kind_mismatch(computer, SourceKind::Line, source))
}

fn segments_param(params: &Params) -> usize {
    params
        .get("segments")
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_SEGMENTS)
        .clamp(1, MAX_SEGMENTS)
}

fn gather_operation(params: &Params) -> EventOperation {
    match params.get("mode").map(String::as_str) {
        Some("centered") => EventOperation::GatherCentered,
        _ => EventOperation::Gather,
    }
}

// --- Interval rows ---

fn register_interval_computers(registry: &mut ComputerRegistry) {
    // 1. Analog reductions
    let reductions = [
        ("Interval Mean", "Mean of the analog samples in each interval", ReductionType::Mean),
        ("Interval Max", "Maximum of the analog samples in each interval", ReductionType::Max),
        ("Interval Min", "Minimum of the analog samples in each interval", ReductionType::Min),
        ("Interval Standard Deviation", "Population standard deviation of the analog samples in each interval", ReductionType::StdDev),
        ("Interval Sum", "Sum of the analog samples in each interval", ReductionType::Sum),
        ("Interval Count", "Number of analog samples in each interval", ReductionType::Count),
    ];
    for (name, description, reduction) in reductions {
        let info = ComputerInfo::new(name, description, OutputType::Double, RowSelectorKind::Interval, SourceKind::Analog);
        registry.register_computer(
            info,
            factory(move |source, params| {
                let computer = IntervalReductionComputer::new(analog(name, source)?, reduction, source_name(params, source));
                Ok(ErasedComputer::single(computer))
            }),
        );
    }

    // 2. Properties of the row intervals
    let properties = [
        ("Interval Start", "Start of each interval", IntervalProperty::Start),
        ("Interval End", "End of each interval", IntervalProperty::End),
        ("Interval Duration", "Duration (end - start) of each interval", IntervalProperty::Duration),
    ];
    for (name, description, property) in properties {
        let info = ComputerInfo::new(name, description, OutputType::Double, RowSelectorKind::Interval, SourceKind::Interval);
        registry.register_computer(
            info,
            factory(move |source, params| {
                let computer = IntervalPropertyComputer::<f64>::new(intervals(name, source)?, property, source_name(params, source));
                Ok(ErasedComputer::single(computer))
            }),
        );
    }
    registry.register_computer(
        ComputerInfo::new(
            "Interval Duration Int",
            "Duration (end - start) of each interval as an integer",
            OutputType::Int64,
            RowSelectorKind::Interval,
            SourceKind::Interval,
        ),
        factory(|source, params| {
            let source_name = source_name(params, source);
            let computer =
                IntervalPropertyComputer::<i64>::new(intervals("Interval Duration Int", source)?, IntervalProperty::Duration, source_name);
            Ok(ErasedComputer::single(computer))
        }),
    );

    // 3. Overlap with a second interval series
    let overlaps = [
        ("Interval Overlap Assign ID", "Position of the last column interval containing each row interval, or -1", OverlapOperation::AssignId),
        ("Interval Overlap Count", "Number of column intervals overlapping each row interval", OverlapOperation::CountOverlaps),
        ("Interval Overlap Assign Start", "Start of the containing column interval, or -1", OverlapOperation::AssignStart),
        ("Interval Overlap Assign End", "End of the containing column interval, or -1", OverlapOperation::AssignEnd),
    ];
    for (name, description, operation) in overlaps {
        let info = ComputerInfo::new(name, description, OutputType::Int64, RowSelectorKind::Interval, SourceKind::Interval);
        registry.register_computer(
            info,
            factory(move |source, params| {
                let computer = IntervalOverlapComputer::new(intervals(name, source)?, operation, source_name(params, source));
                Ok(ErasedComputer::single(computer))
            }),
        );
    }

    // 4. Raw analog slices
    registry.register_computer(
        ComputerInfo::new(
            "Analog Slice Gatherer",
            "Analog samples inside each interval",
            OutputType::DoubleVec,
            RowSelectorKind::Interval,
            SourceKind::Analog,
        ),
        factory(|source, params| {
            let computer = AnalogSliceGathererComputer::<Vec<f64>>::new(analog("Analog Slice Gatherer", source)?, source_name(params, source));
            Ok(ErasedComputer::single(computer))
        }),
    );
    registry.register_computer(
        ComputerInfo::new(
            "Analog Slice Gatherer Float",
            "Analog samples inside each interval, as single precision",
            OutputType::FloatVec,
            RowSelectorKind::Interval,
            SourceKind::Analog,
        ),
        factory(|source, params| {
            let computer =
                AnalogSliceGathererComputer::<Vec<f32>>::new(analog("Analog Slice Gatherer Float", source)?, source_name(params, source));
            Ok(ErasedComputer::single(computer))
        }),
    );
}

fn register_event_computers(registry: &mut ComputerRegistry) {
    registry.register_computer(
        ComputerInfo::new("Event Presence", "Whether any event falls in each interval", OutputType::Bool, RowSelectorKind::Interval, SourceKind::Event),
        factory(|source, params| {
            let computer = EventInIntervalComputer::<bool>::new(events("Event Presence", source)?, EventOperation::Presence, source_name(params, source))?;
            Ok(ErasedComputer::single(computer))
        }),
    );
    registry.register_computer(
        ComputerInfo::new("Event Count", "Number of events in each interval", OutputType::Int, RowSelectorKind::Interval, SourceKind::Event),
        factory(|source, params| {
            let computer = EventInIntervalComputer::<i32>::new(events("Event Count", source)?, EventOperation::Count, source_name(params, source))?;
            Ok(ErasedComputer::single(computer))
        }),
    );

    let mode = || {
        ParameterDescriptor::enumeration(
            "mode",
            "absolute: event positions; centered: positions relative to the interval midpoint",
            &["absolute", "centered"],
            "absolute",
        )
    };
    registry.register_computer(
        ComputerInfo::new("Event Gather", "Event positions inside each interval", OutputType::FloatVec, RowSelectorKind::Interval, SourceKind::Event)
            .with_parameter(mode()),
        factory(|source, params| {
            let computer =
                EventInIntervalComputer::<Vec<f32>>::new(events("Event Gather", source)?, gather_operation(params), source_name(params, source))?;
            Ok(ErasedComputer::single(computer))
        }),
    );
    registry.register_computer(
        ComputerInfo::new(
            "Event Gather Indices",
            "Event indices inside each interval",
            OutputType::IndexVec,
            RowSelectorKind::Interval,
            SourceKind::Event,
        )
        .with_parameter(mode()),
        factory(|source, params| {
            let computer = EventInIntervalComputer::<Vec<TimeFrameIndex>>::new(
                events("Event Gather Indices", source)?,
                gather_operation(params),
                source_name(params, source),
            )?;
            Ok(ErasedComputer::single(computer))
        }),
    );
}

// --- Point rows ---

fn register_point_computers(registry: &mut ComputerRegistry) {
    registry.register_computer(
        ComputerInfo::new("Timestamp Value", "Analog value at each timestamp", OutputType::Double, RowSelectorKind::Timestamp, SourceKind::Analog),
        factory(|source, params| {
            let computer = TimestampValueComputer::new(analog("Timestamp Value", source)?, source_name(params, source));
            Ok(ErasedComputer::single(computer))
        }),
    );
    registry.register_computer(
        ComputerInfo::new("Index Value", "Analog value at each index", OutputType::Double, RowSelectorKind::Index, SourceKind::Analog),
        factory(|source, params| {
            let computer = TimestampValueComputer::for_indices(analog("Index Value", source)?, source_name(params, source));
            Ok(ErasedComputer::single(computer))
        }),
    );
    registry.register_computer(
        ComputerInfo::new(
            "Timestamp In Interval",
            "Whether each timestamp lies inside any interval",
            OutputType::Bool,
            RowSelectorKind::Timestamp,
            SourceKind::Interval,
        ),
        factory(|source, params| {
            let computer = TimestampInIntervalComputer::new(intervals("Timestamp In Interval", source)?, source_name(params, source));
            Ok(ErasedComputer::single(computer))
        }),
    );

    registry.register_multi_computer(
        ComputerInfo::new(
            "Analog Timestamp Offsets",
            "Analog values at integer sample offsets from each timestamp",
            OutputType::Double,
            RowSelectorKind::Timestamp,
            SourceKind::Analog,
        )
        .with_parameter(ParameterDescriptor::text("offsets", "Comma separated integer offsets, e.g. -2,-1,0,1", "0")),
        suffixes(|params| offset_suffixes(&parse_offsets(params.get("offsets").map(String::as_str)))),
        factory(|source, params| {
            let offsets = parse_offsets(params.get("offsets").map(String::as_str));
            let computer = AnalogTimestampOffsetsComputer::new(analog("Analog Timestamp Offsets", source)?, source_name(params, source), offsets);
            Ok(ErasedComputer::multi(computer))
        }),
    );

    registry.register_multi_computer(
        ComputerInfo::new(
            "Line Sample XY",
            "x/y at equally spaced positions along each line, one row per line",
            OutputType::Double,
            RowSelectorKind::Timestamp,
            SourceKind::Line,
        )
        .with_parameter(ParameterDescriptor::integer(
            "segments",
            "Number of equal segments to divide each line into (segments + 1 samples)",
            DEFAULT_SEGMENTS as i64,
            1,
            MAX_SEGMENTS as i64,
        )),
        suffixes(|params| line_suffixes(segments_param(params))),
        factory(|source, params| {
            let computer = LineSamplingComputer::new(lines("Line Sample XY", source)?, source_name(params, source), segments_param(params));
            Ok(ErasedComputer::multi(computer))
        }),
    );
}

// --- Adapters ---

fn register_adapters(registry: &mut ComputerRegistry) {
    let components: [(&str, &str, fn(&Point) -> f32, &str); 2] = [
        ("Point X Component", "X coordinate of point data as an analog source", |p| p.x, "_X"),
        ("Point Y Component", "Y coordinate of point data as an analog source", |p| p.y, "_Y"),
    ];
    for (name, description, pick, suffix) in components {
        registry.register_adapter(
            AdapterInfo {
                name: name.to_string(),
                description: description.to_string(),
                input_type: RawDataType::Points,
                output_kind: SourceKind::Analog,
                parameters: Vec::new(),
            },
            adapter(move |raw, source_name, _params| match raw {
                RawData::Points(points) => {
                    let series = points.component(format!("{}{}", source_name, suffix), pick);
                    Ok(DataSourceVariant::Analog(Arc::new(series)))
                }
                other => Err(ConfigError::AdapterInputMismatch {
                    adapter: name.to_string(),
                    expected: RawDataType::Points,
                    actual: other.data_type(),
                }),
            }),
        );
    }

    registry.register_adapter(
        AdapterInfo {
            name: "Line Data".to_string(),
            description: "Line collection as a line source".to_string(),
            input_type: RawDataType::Lines,
            output_kind: SourceKind::Line,
            parameters: Vec::new(),
        },
        adapter(|raw, source_name, _params| match raw {
            RawData::Lines(series) if series.name() == source_name => Ok(DataSourceVariant::Line(series.clone())),
            RawData::Lines(series) => Ok(DataSourceVariant::Line(Arc::new(series.with_name(source_name)))),
            other => Err(ConfigError::AdapterInputMismatch {
                adapter: "Line Data".to_string(),
                expected: RawDataType::Lines,
                actual: other.data_type(),
            }),
        }),
    );
}
