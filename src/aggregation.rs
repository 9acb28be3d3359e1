/// Aggregation
///
/// Sum, min, max, mean and median per aggregable column. Column types are
/// re-derived from the raw list with the same inference and override rules the
/// schema uses. Text columns aggregate the character count of their values;
/// boolean columns aggregate true as 1 and only get a sum.
///
/// Aggregates are a full recompute on list replacement. In-place row mutation
/// does not trigger a recompute until `rebuild()` is called.

use crate::config::TableOptions;
use crate::inference::{property_types_for_row, PropertyType, TypeRules};
use crate::rows::{DerivedView, SharedRows};
use crate::schema::{infer_columns_from_all, SchemaSampling};
use crate::value::{PropertyValue, RowItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which summary the footer currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    #[default]
    Sum,
    Min,
    Max,
    Mean,
    Median,
}

impl AggregationType {
    pub const ALL: [AggregationType; 5] = [
        AggregationType::Sum,
        AggregationType::Min,
        AggregationType::Max,
        AggregationType::Mean,
        AggregationType::Median,
    ];

    /// sum → min → max → mean → median → sum
    pub fn next(self) -> AggregationType {
        match self {
            AggregationType::Sum => AggregationType::Min,
            AggregationType::Min => AggregationType::Max,
            AggregationType::Max => AggregationType::Mean,
            AggregationType::Mean => AggregationType::Median,
            AggregationType::Median => AggregationType::Sum,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
            AggregationType::Mean => "mean",
            AggregationType::Median => "median",
        }
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The five summary maps, property name → value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregateSet {
    pub sum: BTreeMap<String, f64>,
    pub min: BTreeMap<String, f64>,
    pub max: BTreeMap<String, f64>,
    pub mean: BTreeMap<String, f64>,
    pub median: BTreeMap<String, f64>,
}

impl AggregateSet {
    pub fn values(&self, aggregation_type: AggregationType) -> &BTreeMap<String, f64> {
        match aggregation_type {
            AggregationType::Sum => &self.sum,
            AggregationType::Min => &self.min,
            AggregationType::Max => &self.max,
            AggregationType::Mean => &self.mean,
            AggregationType::Median => &self.median,
        }
    }

    pub fn get(&self, aggregation_type: AggregationType, property_name: &str) -> Option<f64> {
        self.values(aggregation_type).get(property_name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.sum.is_empty()
            && self.min.is_empty()
            && self.max.is_empty()
            && self.mean.is_empty()
            && self.median.is_empty()
    }
}

/// Numeric projection of one value for a column of `property_type`.
/// Values of a kind the column does not aggregate yield `None`.
fn project(value: &PropertyValue, property_type: PropertyType) -> Option<f64> {
    match (property_type, value) {
        (PropertyType::Text, PropertyValue::Text(s)) => Some(s.chars().count() as f64),
        (PropertyType::Boolean, PropertyValue::Boolean(b)) => Some(if *b { 1.0 } else { 0.0 }),
        (
            PropertyType::Integer | PropertyType::DecimalNumber | PropertyType::PositiveInteger,
            PropertyValue::Number(n),
        ) => Some(*n),
        _ => None,
    }
}

/// Round the exact binary value of `x` to one decimal. Exact ties
/// (quarters with an odd numerator) round away from zero.
fn round_to_one_decimal(x: f64) -> f64 {
    let quarters = x * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return (x * 10.0).round() / 10.0;
    }
    format!("{:.1}", x).parse().unwrap_or(x)
}

/// Median of an ascending-sorted, non-empty slice.
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Aggregate `rows` over the given column types.
pub fn compute_aggregates_for(rows: &[RowItem], types: &[(String, PropertyType)]) -> AggregateSet {
    let mut set = AggregateSet::default();
    if rows.is_empty() {
        return set;
    }

    for (property_name, property_type) in types {
        if !property_type.is_aggregable() {
            continue;
        }

        let mut values: Vec<f64> = rows
            .iter()
            .filter_map(|row| project(row.get(property_name), *property_type))
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));

        let sum: f64 = values.iter().sum();
        set.sum.insert(property_name.clone(), sum);

        let count = values.len();
        if *property_type == PropertyType::Boolean || count == 0 {
            continue;
        }

        set.min.insert(property_name.clone(), values[0]);
        set.max.insert(property_name.clone(), values[count - 1]);
        set.mean
            .insert(property_name.clone(), round_to_one_decimal(sum / count as f64));
        set.median
            .insert(property_name.clone(), median_of_sorted(&values));

        log::trace!(
            "Aggregated '{}' ({}) over {} values: sum={}",
            property_name,
            property_type,
            count,
            sum
        );
    }

    set
}

/// Aggregate `rows`, typing the columns from the first record.
///
/// # Examples
///
/// ```
/// use tabulardata::{compute_aggregates, AggregationType, RowItem, TypeRules};
///
/// let rows: Vec<RowItem> = [5, 1, 6, 2, 4, 3]
///     .into_iter()
///     .map(|n| RowItem::new().with("n", n))
///     .collect();
///
/// let set = compute_aggregates(&rows, &TypeRules::default());
/// assert_eq!(set.get(AggregationType::Sum, "n"), Some(21.0));
/// assert_eq!(set.get(AggregationType::Median, "n"), Some(3.5));
/// ```
pub fn compute_aggregates(rows: &[RowItem], rules: &TypeRules) -> AggregateSet {
    match rows.first() {
        Some(sample) => compute_aggregates_for(rows, &property_types_for_row(sample, rules)),
        None => AggregateSet::default(),
    }
}

/// The aggregation component.
#[derive(Debug)]
pub struct Aggregation {
    rows: SharedRows,
    rules: TypeRules,
    sampling: SchemaSampling,
    aggregates: AggregateSet,
    current_aggregation_type: AggregationType,
    display_all_aggregations: bool,
    last_synced_generation: u64,
}

impl Aggregation {
    pub fn new(rows: SharedRows, options: &TableOptions) -> Self {
        let generation = rows.borrow().generation();
        let mut aggregation = Aggregation {
            rows,
            rules: options.type_rules(),
            sampling: options.schema_sampling,
            aggregates: AggregateSet::default(),
            current_aggregation_type: AggregationType::Sum,
            display_all_aggregations: false,
            last_synced_generation: generation,
        };
        aggregation.calculate_aggregation_values();
        aggregation
    }

    fn calculate_aggregation_values(&mut self) {
        let list = self.rows.borrow();

        self.aggregates = match self.sampling {
            SchemaSampling::FirstRow => compute_aggregates(list.rows(), &self.rules),
            SchemaSampling::AllRows => {
                let types: Vec<(String, PropertyType)> =
                    infer_columns_from_all(list.rows(), &self.rules, &[])
                        .into_iter()
                        .map(|c| (c.property_name, c.property_type))
                        .collect();
                compute_aggregates_for(list.rows(), &types)
            }
        };

        log::debug!(
            "Aggregated {} items: {} columns summed, {} with statistics",
            list.len(),
            self.aggregates.sum.len(),
            self.aggregates.mean.len()
        );

        self.last_synced_generation = list.generation();
    }

    pub fn aggregates(&self) -> &AggregateSet {
        &self.aggregates
    }

    pub fn current_aggregation_type(&self) -> AggregationType {
        self.current_aggregation_type
    }

    pub fn set_aggregation_type(&mut self, aggregation_type: AggregationType) {
        self.current_aggregation_type = aggregation_type;
    }

    /// Advance the selector and return the new type.
    pub fn rotate_aggregation_type(&mut self) -> AggregationType {
        let next = self.current_aggregation_type.next();
        log::info!(
            "Aggregation type: {} => {}",
            self.current_aggregation_type,
            next
        );
        self.current_aggregation_type = next;
        next
    }

    /// Values for the currently selected aggregation type.
    pub fn current_values(&self) -> &BTreeMap<String, f64> {
        self.aggregates.values(self.current_aggregation_type)
    }

    pub fn display_all_aggregations(&self) -> bool {
        self.display_all_aggregations
    }

    pub fn set_display_all_aggregations(&mut self, display_all: bool) {
        self.display_all_aggregations = display_all;
    }

    pub fn toggle_display_all_aggregations(&mut self) -> bool {
        self.display_all_aggregations = !self.display_all_aggregations;
        self.display_all_aggregations
    }

    /// Replace the shared list, recompute and reset the selector.
    pub fn replace(&mut self, rows: Vec<RowItem>) {
        self.rows.borrow_mut().replace(rows);
        self.rebuild();
    }
}

impl DerivedView for Aggregation {
    fn sync(&mut self) -> bool {
        let generation = self.rows.borrow().generation();
        if generation == self.last_synced_generation {
            return false;
        }
        self.rebuild();
        true
    }

    fn last_synced_generation(&self) -> u64 {
        self.last_synced_generation
    }

    fn rebuild(&mut self) {
        self.current_aggregation_type = AggregationType::Sum;
        self.calculate_aggregation_values();
    }
}
