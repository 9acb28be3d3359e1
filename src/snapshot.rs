/// Serializable table state for a rendering layer.
///
/// A `TableSnapshot` carries everything needed to draw one frame: the column
/// descriptors, the current page as typed cells, the pager counts, the sort
/// state and the footer aggregates. `TableAction` is the inbound direction:
/// user interactions expressed as data.

use crate::aggregation::{AggregateSet, AggregationType};
use crate::inference::PropertyType;
use crate::pagination::Paginator;
use crate::rows::{DerivedView, RowView};
use crate::schema::ColumnConfiguration;
use crate::value::{PropertyValue, RowItem};
use crate::view::SortState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed value for one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub property_name: String,
    pub property_type: PropertyType,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSnapshot {
    /// 1-based position in the whole sorted list
    pub row_number: usize,
    pub row_number_label: String,
    pub cells: Vec<CellData>,
}

impl RowSnapshot {
    /// Cells for the enabled columns, in column order.
    pub fn new(
        row_number: usize,
        row_number_label: String,
        row: &RowItem,
        columns: &[ColumnConfiguration],
    ) -> Self {
        let cells = columns
            .iter()
            .filter(|c| c.enabled)
            .map(|c| CellData {
                property_name: c.property_name.clone(),
                property_type: c.property_type,
                value: row.get(&c.property_name).clone(),
            })
            .collect();
        RowSnapshot {
            row_number,
            row_number_label,
            cells,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub current_page: usize,
    pub rows_per_page: usize,
    pub total_number_of_items: usize,
    pub total_number_of_pages: usize,
    pub first_item_on_page: usize,
    pub last_item_on_page: usize,
}

impl PageSnapshot {
    pub fn from_paginator<V: RowView + DerivedView>(paginator: &Paginator<V>) -> Self {
        PageSnapshot {
            current_page: paginator.current_page(),
            rows_per_page: paginator.rows_per_page(),
            total_number_of_items: paginator.total_number_of_items(),
            total_number_of_pages: paginator.total_number_of_pages(),
            first_item_on_page: paginator.first_item_on_page(),
            last_item_on_page: paginator.last_item_on_page(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub columns: Vec<ColumnConfiguration>,
    pub rows: Vec<RowSnapshot>,
    pub page: PageSnapshot,
    pub sort: SortState,
    pub aggregation_type: AggregationType,
    pub display_all_aggregations: bool,
    pub aggregates: AggregateSet,
    pub is_calculating: bool,
    pub row_number_style: String,
    pub column_styles: BTreeMap<String, String>,
}

impl TableSnapshot {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A user interaction on the table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TableAction {
    #[serde(rename_all = "camelCase")]
    SortOn { property_name: String },

    GotoFirstPage,
    GotoPreviousPage,
    GotoNextPage,
    GotoLastPage,

    #[serde(rename_all = "camelCase")]
    SetCurrentPage { page: usize },

    #[serde(rename_all = "camelCase")]
    SetRowsPerPage { rows_per_page: usize },

    RotateAggregationType,
    ToggleDisplayAllAggregations,

    #[serde(rename_all = "camelCase")]
    SetColumnEnabled { property_name: String, enabled: bool },
}

impl TableAction {
    /// Parse one action or a JSON array of actions.
    pub fn parse_many(json: &str) -> crate::error::Result<Vec<TableAction>> {
        if json.trim_start().starts_with('[') {
            Ok(serde_json::from_str(json)?)
        } else {
            Ok(vec![serde_json::from_str(json)?])
        }
    }
}
