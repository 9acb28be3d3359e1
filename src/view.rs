/// Sorted view over the shared row list.
///
/// The view keeps an index from view positions to list positions and never
/// reorders the list itself. Each `sort_on()` stably re-sorts the current
/// order, so rows that tie on the new key keep the order left by the previous
/// sort.

use crate::rows::{DerivedView, RowView, SharedRows};
use crate::value::{PropertyValue, RowItem};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> SortOrder {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Active sort property and direction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub property_name: Option<String>,
    pub order: SortOrder,
}

impl fmt::Display for SortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" {}",
            self.property_name.as_deref().unwrap_or(""),
            self.order.as_str().to_uppercase()
        )
    }
}

/// Rank used to order values of different kinds
fn kind_rank(value: &PropertyValue) -> u8 {
    match value {
        PropertyValue::Boolean(_) => 0,
        PropertyValue::Number(_) => 1,
        PropertyValue::Text(_) => 2,
        PropertyValue::Absent => 3,
    }
}

/// Compare two cell values for sorting.
///
/// Absent values rank after every present value before the direction is
/// applied, so they land last when ascending and first when descending.
///
/// ```
/// use std::cmp::Ordering;
/// use tabulardata::{compare_values, PropertyValue, SortOrder};
///
/// let a = PropertyValue::from(1);
/// let b = PropertyValue::from(2);
/// assert_eq!(compare_values(&a, &b, SortOrder::Ascending), Ordering::Less);
/// assert_eq!(compare_values(&a, &b, SortOrder::Descending), Ordering::Greater);
/// assert_eq!(compare_values(&PropertyValue::Absent, &a, SortOrder::Ascending), Ordering::Greater);
/// ```
pub fn compare_values(a: &PropertyValue, b: &PropertyValue, order: SortOrder) -> Ordering {
    let base = match (a, b) {
        (PropertyValue::Absent, PropertyValue::Absent) => Ordering::Equal,
        (_, PropertyValue::Absent) => Ordering::Less,
        (PropertyValue::Absent, _) => Ordering::Greater,
        (PropertyValue::Number(x), PropertyValue::Number(y)) => x.total_cmp(y),
        (PropertyValue::Text(x), PropertyValue::Text(y)) => x.cmp(y),
        (PropertyValue::Boolean(x), PropertyValue::Boolean(y)) => x.cmp(y),
        (x, y) => kind_rank(x).cmp(&kind_rank(y)),
    };

    match order {
        SortOrder::Ascending => base,
        SortOrder::Descending => base.reverse(),
    }
}

/// A SortedView presents rows from the shared list in sorted order.
///
/// # Features
///
/// - Single-property sort, direction toggled by selecting the same property again
/// - Stable: ties keep the order of the previous pass
/// - Absent values last when ascending, first when descending
/// - Resets to the unsorted list when the list is replaced
///
/// # Examples
///
/// ```
/// use tabulardata::{RowItem, RowList, RowView, SortOrder, SortedView};
///
/// let rows = RowList::shared(vec![
///     RowItem::new().with("planet", "Venus"),
///     RowItem::new().with("planet", "Earth"),
///     RowItem::new().with("planet", "Mars"),
/// ]);
///
/// let mut sorted = SortedView::new(rows);
/// sorted.sort_on("planet");
/// assert_eq!(sorted.get_row(0).unwrap().get("planet").as_text(), Some("Earth"));
///
/// sorted.sort_on("planet");
/// assert_eq!(sorted.sort_state().order, SortOrder::Descending);
/// assert_eq!(sorted.get_row(0).unwrap().get("planet").as_text(), Some("Venus"));
/// ```
#[derive(Debug)]
pub struct SortedView {
    parent: SharedRows,
    state: SortState,
    /// sorted_index[view_pos] = list position
    sorted_index: Vec<usize>,
    revision: u64,
    last_synced_generation: u64,
}

impl SortedView {
    pub fn new(parent: SharedRows) -> Self {
        let generation = parent.borrow().generation();
        let mut view = SortedView {
            parent,
            state: SortState::default(),
            sorted_index: Vec::new(),
            revision: 0,
            last_synced_generation: generation,
        };
        view.rebuild_index();
        view
    }

    /// Unsorted identity order over the current list
    fn rebuild_index(&mut self) {
        let list = self.parent.borrow();
        self.sorted_index = (0..list.len()).collect();
        self.state = SortState::default();
        self.last_synced_generation = list.generation();
        self.revision += 1;

        log::debug!("Sorted view reset: {} items", list.len());
    }

    /// Select the sort property: the same property toggles the direction,
    /// a new one sorts ascending.
    pub fn sort_on(&mut self, property_name: &str) -> &SortState {
        self.sync();

        let previous = self.state.clone();
        if self.state.property_name.as_deref() == Some(property_name) {
            self.state.order = self.state.order.toggled();
        } else {
            self.state.property_name = Some(property_name.to_string());
            self.state.order = SortOrder::Ascending;
        }

        log::info!("Sorting: {} => {}", previous, self.state);

        let order = self.state.order;
        let list = self.parent.borrow();
        let rows = list.rows();
        self.sorted_index
            .sort_by(|&a, &b| compare_values(rows[a].get(property_name), rows[b].get(property_name), order));
        drop(list);

        self.revision += 1;
        &self.state
    }

    pub fn sort_state(&self) -> &SortState {
        &self.state
    }

    pub fn currently_sorted_on_property_name(&self) -> Option<&str> {
        self.state.property_name.as_deref()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.state.order
    }

    /// The rows in view order.
    pub fn sorted_list(&self) -> Vec<RowItem> {
        let list = self.parent.borrow();
        self.sorted_index
            .iter()
            .filter_map(|&i| list.get(i).cloned())
            .collect()
    }

    /// Rows for a range of view positions, clipped to the view.
    pub fn rows_in_range(&self, start: usize, end: usize) -> Vec<RowItem> {
        let end = end.min(self.sorted_index.len());
        if start >= end {
            return Vec::new();
        }
        let list = self.parent.borrow();
        self.sorted_index[start..end]
            .iter()
            .filter_map(|&i| list.get(i).cloned())
            .collect()
    }

    /// A single value at a view position.
    pub fn get_value(&self, row: usize, property_name: &str) -> Option<PropertyValue> {
        let parent_index = *self.sorted_index.get(row)?;
        self.parent
            .borrow()
            .get(parent_index)
            .map(|r| r.get(property_name).clone())
    }

    /// Returns the list position for a given view position
    pub fn get_parent_index(&self, view_index: usize) -> Option<usize> {
        self.sorted_index.get(view_index).copied()
    }

    pub fn sorted_index(&self) -> &[usize] {
        &self.sorted_index
    }

    /// Replace the shared list. Sort state resets and the view shows the
    /// new list unmodified.
    pub fn replace(&mut self, rows: Vec<RowItem>) {
        self.parent.borrow_mut().replace(rows);
        self.rebuild();
    }
}

impl RowView for SortedView {
    fn len(&self) -> usize {
        self.sorted_index.len()
    }

    fn get_row(&self, index: usize) -> Option<RowItem> {
        let parent_index = *self.sorted_index.get(index)?;
        self.parent.borrow().get(parent_index).cloned()
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

impl DerivedView for SortedView {
    fn sync(&mut self) -> bool {
        let generation = self.parent.borrow().generation();
        if generation == self.last_synced_generation {
            return false;
        }
        log::info!(
            "Sorted view received updated list: {} => {} items",
            self.sorted_index.len(),
            self.parent.borrow().len()
        );
        self.rebuild();
        true
    }

    fn last_synced_generation(&self) -> u64 {
        self.last_synced_generation
    }

    fn rebuild(&mut self) {
        self.rebuild_index();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::RowList;

    fn planets() -> Vec<RowItem> {
        vec![
            RowItem::new().with("planet", "Venus").with("size", 6052),
            RowItem::new().with("planet", "Earth").with("size", 6371),
            RowItem::new().with("planet", "Mars").with("size", 3389),
        ]
    }

    fn column(view: &SortedView, name: &str) -> Vec<String> {
        view.sorted_list()
            .iter()
            .map(|row| row.get(name).to_string())
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let view = SortedView::new(RowList::shared(planets()));

        assert_eq!(view.sort_state(), &SortState::default());
        assert_eq!(view.currently_sorted_on_property_name(), None);
        assert_eq!(view.sort_order(), SortOrder::Ascending);
        assert_eq!(column(&view, "planet"), vec!["Venus", "Earth", "Mars"]);
    }

    #[test]
    fn test_sort_on_text_toggles_direction() {
        let mut view = SortedView::new(RowList::shared(planets()));

        view.sort_on("planet");
        assert_eq!(column(&view, "planet"), vec!["Earth", "Mars", "Venus"]);

        view.sort_on("planet");
        assert_eq!(view.sort_order(), SortOrder::Descending);
        assert_eq!(column(&view, "planet"), vec!["Venus", "Mars", "Earth"]);

        view.sort_on("planet");
        assert_eq!(view.sort_order(), SortOrder::Ascending);
        assert_eq!(column(&view, "planet"), vec!["Earth", "Mars", "Venus"]);
    }

    #[test]
    fn test_sort_on_new_property_starts_ascending() {
        let mut view = SortedView::new(RowList::shared(planets()));

        view.sort_on("planet");
        view.sort_on("planet");
        view.sort_on("size");

        assert_eq!(view.currently_sorted_on_property_name(), Some("size"));
        assert_eq!(view.sort_order(), SortOrder::Ascending);
        assert_eq!(column(&view, "size"), vec!["3389", "6052", "6371"]);
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let rows = vec![
            RowItem::new().with("n", 10),
            RowItem::new().with("n", 9),
            RowItem::new().with("n", 100),
            RowItem::new().with("n", -1.5),
        ];
        let mut view = SortedView::new(RowList::shared(rows));
        view.sort_on("n");

        assert_eq!(column(&view, "n"), vec!["-1.5", "9", "10", "100"]);
    }

    #[test]
    fn test_sort_is_stable_across_passes() {
        let rows = vec![
            RowItem::new().with("id", 1).with("group", "b"),
            RowItem::new().with("id", 2).with("group", "a"),
            RowItem::new().with("id", 3).with("group", "b"),
            RowItem::new().with("id", 4).with("group", "a"),
        ];
        let mut view = SortedView::new(RowList::shared(rows));

        view.sort_on("group");
        assert_eq!(column(&view, "id"), vec!["2", "4", "1", "3"]);

        // Descending keeps the previous relative order among ties
        view.sort_on("group");
        assert_eq!(column(&view, "id"), vec!["1", "3", "2", "4"]);

        view.sort_on("group");
        assert_eq!(column(&view, "id"), vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn test_sort_twice_reverses_distinct_keys() {
        let rows: Vec<RowItem> = [4, 2, 9, 7, 1]
            .into_iter()
            .map(|n| RowItem::new().with("n", n))
            .collect();
        let mut view = SortedView::new(RowList::shared(rows));

        view.sort_on("n");
        let ascending = column(&view, "n");
        view.sort_on("n");
        let mut descending = column(&view, "n");
        descending.reverse();

        assert_eq!(ascending, descending);
    }

    #[test]
    fn test_absent_values_placement() {
        let rows = vec![
            RowItem::new().with("name", "b"),
            RowItem::new().with("name", PropertyValue::Absent),
            RowItem::new().with("name", "a"),
            RowItem::new(),
        ];
        let mut view = SortedView::new(RowList::shared(rows));

        view.sort_on("name");
        assert_eq!(column(&view, "name"), vec!["a", "b", "", ""]);
        assert_eq!(view.get_parent_index(2), Some(1));
        assert_eq!(view.get_parent_index(3), Some(3));

        view.sort_on("name");
        assert_eq!(column(&view, "name"), vec!["", "", "b", "a"]);
    }

    #[test]
    fn test_mixed_kinds_have_total_order() {
        let rows = vec![
            RowItem::new().with("v", "text"),
            RowItem::new().with("v", 3),
            RowItem::new().with("v", true),
            RowItem::new().with("v", PropertyValue::Absent),
            RowItem::new().with("v", 1),
        ];
        let mut view = SortedView::new(RowList::shared(rows));
        view.sort_on("v");

        assert_eq!(column(&view, "v"), vec!["true", "1", "3", "text", ""]);
    }

    #[test]
    fn test_compare_values() {
        let asc = SortOrder::Ascending;
        let desc = SortOrder::Descending;
        let absent = PropertyValue::Absent;

        assert_eq!(compare_values(&"a".into(), &"b".into(), asc), Ordering::Less);
        assert_eq!(compare_values(&"B".into(), &"a".into(), asc), Ordering::Less);
        assert_eq!(compare_values(&false.into(), &true.into(), asc), Ordering::Less);
        assert_eq!(compare_values(&2.into(), &2.into(), asc), Ordering::Equal);
        assert_eq!(compare_values(&absent, &absent, asc), Ordering::Equal);
        assert_eq!(compare_values(&1.into(), &absent, asc), Ordering::Less);
        assert_eq!(compare_values(&1.into(), &absent, desc), Ordering::Greater);
    }

    #[test]
    fn test_replace_resets_sort_state() {
        let rows = RowList::shared(planets());
        let mut view = SortedView::new(rows.clone());
        view.sort_on("planet");
        view.sort_on("planet");

        view.replace(vec![
            RowItem::new().with("planet", "Neptune"),
            RowItem::new().with("planet", "Jupiter"),
        ]);

        assert_eq!(view.sort_state(), &SortState::default());
        assert_eq!(column(&view, "planet"), vec!["Neptune", "Jupiter"]);
    }

    #[test]
    fn test_sync_detects_external_replace() {
        let rows = RowList::shared(planets());
        let mut view = SortedView::new(rows.clone());
        view.sort_on("size");
        let revision = view.revision();

        rows.borrow_mut().update_row(0, |row| row.insert("size", 1)).unwrap();
        assert!(!view.sync());
        assert_eq!(view.currently_sorted_on_property_name(), Some("size"));

        rows.borrow_mut().replace(vec![RowItem::new().with("planet", "Pluto")]);
        assert!(view.sync());
        assert!(view.revision() > revision);
        assert_eq!(view.len(), 1);
        assert_eq!(view.currently_sorted_on_property_name(), None);
    }

    #[test]
    fn test_rows_in_range_and_get_value() {
        let mut view = SortedView::new(RowList::shared(planets()));
        view.sort_on("planet");

        let slice = view.rows_in_range(1, 10);
        assert_eq!(slice.len(), 2);
        assert_eq!(slice[0].get("planet").as_text(), Some("Mars"));
        assert!(view.rows_in_range(5, 8).is_empty());

        assert_eq!(view.get_value(0, "size"), Some(PropertyValue::from(6371)));
        assert_eq!(view.get_value(7, "size"), None);
    }

    #[test]
    fn test_sort_state_display() {
        let mut view = SortedView::new(RowList::shared(planets()));
        assert_eq!(view.sort_state().to_string(), "\"\" ASCENDING");
        view.sort_on("planet");
        view.sort_on("planet");
        assert_eq!(view.sort_state().to_string(), "\"planet\" DESCENDING");
    }
}
