/// Column Schema
///
/// Derives the ordered column descriptor set from the shared row list. By
/// default only the first record is sampled, so properties that appear only in
/// later records produce no column. `SchemaSampling::AllRows` widens the sample
/// to the union of every record's properties.
///
/// The schema is rebuilt when the list is replaced. Measured widths and sticky
/// offsets are written back by the column layout and survive in-place row
/// mutation, but not replacement.

use crate::config::TableOptions;
use crate::error::TableError;
use crate::inference::{prettify_property_name, PropertyType, TypeRules};
use crate::rows::{DerivedView, SharedRows};
use crate::value::{PropertyValue, RowItem, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Edge a sticky column is pinned to while scrolling horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickyEdge {
    Left,
}

/// Which records are sampled to build the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaSampling {
    /// Only the first record decides the columns
    #[default]
    FirstRow,
    /// Union of all records, in first-seen order
    AllRows,
}

impl FromStr for SchemaSampling {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "firstrow" | "first" => Ok(SchemaSampling::FirstRow),
            "allrows" | "all" => Ok(SchemaSampling::AllRows),
            _ => Err(TableError::InvalidOption(format!(
                "unknown schema sampling '{}'. Valid options: firstRow, allRows",
                s
            ))),
        }
    }
}

/// Derived per-column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfiguration {
    pub property_name: String,
    pub property_type: PropertyType,
    /// Runtime kind of the sampled value
    #[serde(rename = "typeof")]
    pub value_kind: ValueKind,
    pub label: String,
    pub index_order: usize,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width_in_pixels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sticky: Option<StickyEdge>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sticky_offset_in_pixels: Option<u32>,
}

impl ColumnConfiguration {
    pub fn new(
        property_name: &str,
        value: &PropertyValue,
        index_order: usize,
        rules: &TypeRules,
    ) -> Self {
        ColumnConfiguration {
            property_name: property_name.to_string(),
            property_type: rules.resolve(property_name, value),
            value_kind: value.kind(),
            label: prettify_property_name(property_name),
            index_order,
            enabled: true,
            width_in_pixels: None,
            sticky: None,
            sticky_offset_in_pixels: None,
        }
    }

    pub fn is_sticky_left(&self) -> bool {
        self.sticky == Some(StickyEdge::Left)
    }
}

fn mark_sticky(columns: &mut [ColumnConfiguration], sticky_columns: &[String]) {
    for column in columns.iter_mut() {
        if sticky_columns.iter().any(|s| *s == column.property_name) {
            column.sticky = Some(StickyEdge::Left);
        }
    }
}

/// One configuration per property of `sample`, in the sample's key order.
pub fn infer_columns(
    sample: &RowItem,
    rules: &TypeRules,
    sticky_columns: &[String],
) -> Vec<ColumnConfiguration> {
    let mut columns: Vec<ColumnConfiguration> = sample
        .iter()
        .enumerate()
        .map(|(i, (name, value))| ColumnConfiguration::new(name, value, i, rules))
        .collect();
    mark_sticky(&mut columns, sticky_columns);
    columns
}

/// Union of every record's properties in first-seen order. Each column is typed
/// from the first record that carries a present value for it.
pub fn infer_columns_from_all(
    rows: &[RowItem],
    rules: &TypeRules,
    sticky_columns: &[String],
) -> Vec<ColumnConfiguration> {
    let mut names: Vec<&str> = Vec::new();
    for row in rows {
        for name in row.property_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let absent = PropertyValue::Absent;
    let mut columns: Vec<ColumnConfiguration> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let value = rows
                .iter()
                .map(|row| row.get(name))
                .find(|v| !v.is_absent())
                .unwrap_or(&absent);
            ColumnConfiguration::new(name, value, i, rules)
        })
        .collect();
    mark_sticky(&mut columns, sticky_columns);
    columns
}

/// The column schema component.
#[derive(Debug)]
pub struct ColumnSchema {
    rows: SharedRows,
    rules: TypeRules,
    sampling: SchemaSampling,
    sticky_columns: Vec<String>,
    configurations: Vec<ColumnConfiguration>,
    last_synced_generation: u64,
}

impl ColumnSchema {
    pub fn new(rows: SharedRows, options: &TableOptions) -> Self {
        let generation = rows.borrow().generation();
        let mut schema = ColumnSchema {
            rows,
            rules: options.type_rules(),
            sampling: options.schema_sampling,
            sticky_columns: options.sticky_columns.clone(),
            configurations: Vec::new(),
            last_synced_generation: generation,
        };
        schema.rebuild_configurations();
        schema
    }

    fn rebuild_configurations(&mut self) {
        let list = self.rows.borrow();

        self.configurations = match self.sampling {
            SchemaSampling::FirstRow => match list.first() {
                Some(sample) => infer_columns(sample, &self.rules, &self.sticky_columns),
                None => Vec::new(),
            },
            SchemaSampling::AllRows => {
                infer_columns_from_all(list.rows(), &self.rules, &self.sticky_columns)
            }
        };

        log::debug!(
            "Deciding column configurations from {} items ({:?}): {} columns",
            list.len(),
            self.sampling,
            self.configurations.len()
        );
        for column in &self.configurations {
            log::trace!(
                "  {} '{}': {} ({:?})",
                column.index_order,
                column.property_name,
                column.property_type,
                column.value_kind
            );
        }

        self.last_synced_generation = list.generation();
    }

    /// Configurations in column order.
    pub fn configurations(&self) -> &[ColumnConfiguration] {
        &self.configurations
    }

    /// Keyed view of the configurations.
    pub fn configuration_map(&self) -> BTreeMap<String, ColumnConfiguration> {
        self.configurations
            .iter()
            .map(|c| (c.property_name.clone(), c.clone()))
            .collect()
    }

    pub fn get(&self, property_name: &str) -> Option<&ColumnConfiguration> {
        self.configurations
            .iter()
            .find(|c| c.property_name == property_name)
    }

    pub fn property_type(&self, property_name: &str) -> Option<PropertyType> {
        self.get(property_name).map(|c| c.property_type)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.configurations.iter().map(|c| c.property_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Columns pinned to the left edge, in column order.
    pub fn sticky_left_columns(&self) -> impl Iterator<Item = &ColumnConfiguration> {
        self.configurations.iter().filter(|c| c.is_sticky_left())
    }

    pub fn enabled_configurations(&self) -> impl Iterator<Item = &ColumnConfiguration> {
        self.configurations.iter().filter(|c| c.enabled)
    }

    /// Returns false if there is no such column.
    pub fn set_enabled(&mut self, property_name: &str, enabled: bool) -> bool {
        match self
            .configurations
            .iter_mut()
            .find(|c| c.property_name == property_name)
        {
            Some(column) => {
                column.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Pin or unpin a column. Returns false if there is no such column.
    pub fn set_sticky(&mut self, property_name: &str, sticky: bool) -> bool {
        match self
            .configurations
            .iter_mut()
            .find(|c| c.property_name == property_name)
        {
            Some(column) => {
                column.sticky = sticky.then_some(StickyEdge::Left);
                if !sticky {
                    column.sticky_offset_in_pixels = None;
                }
                true
            }
            None => false,
        }
    }

    /// Write measured widths and sticky offsets into the configurations.
    /// Columns missing from `widths` keep no width.
    pub fn apply_widths(&mut self, widths: &BTreeMap<String, u32>, offsets: &BTreeMap<String, u32>) {
        for column in self.configurations.iter_mut() {
            column.width_in_pixels = widths.get(&column.property_name).copied();
            column.sticky_offset_in_pixels = if column.is_sticky_left() {
                offsets.get(&column.property_name).copied()
            } else {
                None
            };
        }
    }

    pub fn clear_widths(&mut self) {
        for column in self.configurations.iter_mut() {
            column.width_in_pixels = None;
            column.sticky_offset_in_pixels = None;
        }
    }

    pub fn rules(&self) -> &TypeRules {
        &self.rules
    }

    pub fn sampling(&self) -> SchemaSampling {
        self.sampling
    }

    /// Replace the shared list and rebuild.
    pub fn replace(&mut self, rows: Vec<RowItem>) {
        self.rows.borrow_mut().replace(rows);
        self.rebuild();
    }
}

impl DerivedView for ColumnSchema {
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
        self.rebuild_configurations();
    }
}
