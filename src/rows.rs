/// TabularData Row List
///
/// The single shared input every component derives from. A `RowList` owns the
/// records and a generation counter; the generation moves only when the whole
/// list is replaced. Derived views remember the generation they were built
/// from and rebuild (resetting their control state) when it moves.
///
/// # Change detection
///
/// - `replace()` swaps the list: a new generation, every view recomputes.
/// - `update_row()` mutates a record in place: same generation, views keep
///   their state and simply read the new values.

use crate::error::{Result, TableError};
use crate::value::RowItem;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared, single-writer handle to the list.
pub type SharedRows = Rc<RefCell<RowList>>;

/// Read access shared by the raw list and the views layered on top of it.
pub trait RowView {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row at a view position, cloned out of the underlying list.
    fn get_row(&self, index: usize) -> Option<RowItem>;

    /// Moves whenever the order or content identity seen through this view changes.
    fn revision(&self) -> u64;
}

/// A structure derived from the shared list.
pub trait DerivedView {
    /// Recompute if the list was replaced since the last sync.
    /// Returns true if anything was recomputed.
    fn sync(&mut self) -> bool;

    /// Generation of the list this view was last built from
    fn last_synced_generation(&self) -> u64;

    /// Unconditional recompute from the current list
    fn rebuild(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct RowList {
    rows: Vec<RowItem>,
    generation: u64,
}

impl RowList {
    pub fn new(rows: Vec<RowItem>) -> Self {
        RowList { rows, generation: 0 }
    }

    /// Wrap a list into the shared handle the components consume.
    pub fn shared(rows: Vec<RowItem>) -> SharedRows {
        Rc::new(RefCell::new(RowList::new(rows)))
    }

    /// Parse a JSON array of objects. Key order inside each object is kept.
    pub fn from_json(json: &str) -> Result<RowList> {
        // Parsed straight from text: going through serde_json::Value would sort the keys
        if !json.trim_start().starts_with('[') {
            return Err(TableError::InvalidJson(
                "expected an array of objects".to_string(),
            ));
        }
        let rows: Vec<RowItem> = serde_json::from_str(json)?;
        Ok(RowList::new(rows))
    }

    pub fn rows(&self) -> &[RowItem] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RowItem> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RowItem> {
        self.rows.get(index)
    }

    /// First record, the sample for schema inference.
    pub fn first(&self) -> Option<&RowItem> {
        self.rows.first()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the whole list. Every derived view will recompute on its next sync.
    pub fn replace(&mut self, rows: Vec<RowItem>) {
        log::debug!(
            "Row list replaced: {} => {} items (generation {})",
            self.rows.len(),
            rows.len(),
            self.generation + 1
        );
        self.rows = rows;
        self.generation += 1;
    }

    /// Mutate one record in place without signalling a replacement.
    pub fn update_row<F>(&mut self, index: usize, f: F) -> Result<()>
    where
        F: FnOnce(&mut RowItem),
    {
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(TableError::RowOutOfRange { index, len })?;
        f(row);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RowItem> {
        self.rows.iter()
    }
}

impl RowView for RowList {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn get_row(&self, index: usize) -> Option<RowItem> {
        self.rows.get(index).cloned()
    }

    fn revision(&self) -> u64 {
        self.generation
    }
}

impl DerivedView for RowList {
    fn sync(&mut self) -> bool {
        false
    }

    fn last_synced_generation(&self) -> u64 {
        self.generation
    }

    fn rebuild(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_bumps_generation() {
        let mut list = RowList::new(vec![RowItem::new().with("n", 1)]);
        assert_eq!(list.generation(), 0);

        list.replace(vec![RowItem::new().with("n", 2), RowItem::new().with("n", 3)]);
        assert_eq!(list.generation(), 1);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_update_row_keeps_generation() {
        let mut list = RowList::new(vec![RowItem::new().with("n", 1)]);
        list.update_row(0, |row| row.insert("n", 99)).unwrap();

        assert_eq!(list.generation(), 0);
        assert_eq!(list.get(0).unwrap().get("n").as_number(), Some(99.0));
        assert!(matches!(
            list.update_row(5, |_| {}),
            Err(TableError::RowOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_from_json() {
        let list = RowList::from_json(r#"[{"age": 42}, {"age": 19, "name": "Bob"}]"#).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.first().unwrap().get("age").as_number(), Some(42.0));
        assert_eq!(list.get(1).unwrap().get("name").as_text(), Some("Bob"));
    }

    #[test]
    fn test_into_rows_keeps_order() {
        let rows = RowList::from_json(r#"[{"id": 1}, {"id": 2}]"#).unwrap().into_rows();
        let ids: Vec<_> = rows.iter().map(|row| row.get("id").as_number()).collect();
        assert_eq!(ids, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(matches!(
            RowList::from_json(r#"{"age": 42}"#),
            Err(TableError::InvalidJson(_))
        ));
        assert!(matches!(RowList::from_json("[1, 2]"), Err(TableError::Json(_))));
        assert!(matches!(RowList::from_json("not json"), Err(TableError::InvalidJson(_))));
        assert!(matches!(RowList::from_json("[{\"a\": 1"), Err(TableError::Json(_))));
    }

    #[test]
    fn test_empty_array() {
        let list = RowList::from_json("[]").unwrap();
        assert!(list.is_empty());
        assert!(list.first().is_none());
    }
}
