/// TabularData Facade
///
/// Wires the five components around one shared row list: the column schema
/// and the aggregates are derived from the raw list, the sorted view orders
/// it, the paginator slices the sorted view and the column layout measures
/// the rendered result.
///
/// # Examples
///
/// ```
/// use tabulardata::{RowItem, TableOptions, TabularData};
///
/// let rows = (1..=21)
///     .map(|i| RowItem::new().with("id", i).with("name", format!("User {}", i)))
///     .collect();
///
/// let mut table = TabularData::new(rows, TableOptions::default()).unwrap();
/// assert_eq!(table.paginator().total_number_of_pages(), 3);
///
/// table.sort_on("id");
/// table.sort_on("id");
/// let page = table.paginated_list();
/// assert_eq!(page[0].get("id").as_number(), Some(21.0));
/// ```

use crate::aggregation::Aggregation;
use crate::config::TableOptions;
use crate::error::Result;
use crate::layout::ColumnLayout;
use crate::pagination::Paginator;
use crate::rows::{DerivedView, RowList, RowView, SharedRows};
use crate::schema::ColumnSchema;
use crate::snapshot::{PageSnapshot, RowSnapshot, TableAction, TableSnapshot};
use crate::util::{number_of_digits, pad_start};
use crate::value::RowItem;
use crate::view::{SortState, SortedView};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

pub struct TabularData {
    rows: SharedRows,
    options: TableOptions,
    schema: Rc<RefCell<ColumnSchema>>,
    aggregation: Aggregation,
    sorted: Rc<RefCell<SortedView>>,
    paginator: Paginator<SortedView>,
    layout: ColumnLayout,
}

impl TabularData {
    pub fn new(rows: Vec<RowItem>, options: TableOptions) -> Result<Self> {
        options.validate()?;
        log::info!("Init tabular data for {} items", rows.len());

        let rows = RowList::shared(rows);
        let schema = Rc::new(RefCell::new(ColumnSchema::new(rows.clone(), &options)));
        let aggregation = Aggregation::new(rows.clone(), &options);
        let sorted = Rc::new(RefCell::new(SortedView::new(rows.clone())));
        let paginator = Paginator::with_rows_per_page(sorted.clone(), options.rows_per_page)?;
        let layout = ColumnLayout::new(rows.clone(), schema.clone());

        Ok(TabularData {
            rows,
            options,
            schema,
            aggregation,
            sorted,
            paginator,
            layout,
        })
    }

    /// Build from a JSON array of objects.
    pub fn from_json(json: &str, options: TableOptions) -> Result<Self> {
        TabularData::new(RowList::from_json(json)?.into_rows(), options)
    }

    /// Bring every component up to date with the shared list, in wiring order.
    /// Returns true if anything was recomputed.
    pub fn sync(&mut self) -> bool {
        let mut changed = self.schema.borrow_mut().sync();
        changed |= self.aggregation.sync();
        changed |= self.paginator.sync();
        changed |= self.layout.sync();
        changed
    }

    /// Replace the whole list. Sort state, page and aggregation selector reset.
    pub fn replace(&mut self, rows: Vec<RowItem>) {
        self.rows.borrow_mut().replace(rows);
        self.sync();
    }

    /// Mutate one record in place. Derived state is not recomputed.
    pub fn update_row<F>(&mut self, index: usize, f: F) -> Result<()>
    where
        F: FnOnce(&mut RowItem),
    {
        self.rows.borrow_mut().update_row(index, f)
    }

    pub fn rows(&self) -> &SharedRows {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn schema(&self) -> Ref<'_, ColumnSchema> {
        self.schema.borrow()
    }

    pub fn schema_mut(&self) -> RefMut<'_, ColumnSchema> {
        self.schema.borrow_mut()
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn aggregation_mut(&mut self) -> &mut Aggregation {
        &mut self.aggregation
    }

    pub fn sorted_view(&self) -> Ref<'_, SortedView> {
        self.sorted.borrow()
    }

    pub fn paginator(&self) -> &Paginator<SortedView> {
        &self.paginator
    }

    pub fn paginator_mut(&mut self) -> &mut Paginator<SortedView> {
        &mut self.paginator
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut ColumnLayout {
        &mut self.layout
    }

    /// Sort on `property_name` and go back to the first page.
    pub fn sort_on(&mut self, property_name: &str) -> SortState {
        self.sync();
        let state = self.sorted.borrow_mut().sort_on(property_name).clone();
        self.paginator.sync();
        state
    }

    pub fn sort_state(&self) -> SortState {
        self.sorted.borrow().sort_state().clone()
    }

    pub fn goto_first_page(&mut self) {
        self.paginator.goto_first_page();
    }

    pub fn goto_previous_page(&mut self) {
        self.paginator.goto_previous_page();
    }

    pub fn goto_next_page(&mut self) {
        self.paginator.goto_next_page();
    }

    pub fn goto_last_page(&mut self) {
        self.paginator.goto_last_page();
    }

    pub fn set_rows_per_page(&mut self, rows_per_page: usize) -> Result<()> {
        self.paginator.set_rows_per_page(rows_per_page)
    }

    pub fn set_current_page(&mut self, page: usize) -> Result<()> {
        self.paginator.set_current_page(page)
    }

    pub fn paginated_list(&self) -> Vec<RowItem> {
        self.paginator.paginated_list()
    }

    /// Rows the surface should draw right now, with their 1-based numbers
    /// and gutter labels: every row while widths are being measured, the
    /// current page otherwise.
    pub fn rows_to_render(&self) -> Vec<(usize, String, RowItem)> {
        if self.layout.renders_all_rows() {
            let sorted = self.sorted.borrow();
            let width = number_of_digits(sorted.len() as i64);
            sorted
                .sorted_list()
                .into_iter()
                .enumerate()
                .map(|(i, row)| (i + 1, pad_start(i as i64 + 1, width), row))
                .collect()
        } else {
            let first = self.paginator.first_item_on_page();
            self.paginator
                .paginated_list()
                .into_iter()
                .enumerate()
                .map(|(i, row)| (first + i, self.paginator.row_number_label(i), row))
                .collect()
        }
    }

    /// Apply one user interaction.
    pub fn apply(&mut self, action: &TableAction) -> Result<()> {
        match action {
            TableAction::SortOn { property_name } => {
                self.sort_on(property_name);
            }
            TableAction::GotoFirstPage => self.goto_first_page(),
            TableAction::GotoPreviousPage => self.goto_previous_page(),
            TableAction::GotoNextPage => self.goto_next_page(),
            TableAction::GotoLastPage => self.goto_last_page(),
            TableAction::SetCurrentPage { page } => self.set_current_page(*page)?,
            TableAction::SetRowsPerPage { rows_per_page } => self.set_rows_per_page(*rows_per_page)?,
            TableAction::RotateAggregationType => {
                self.aggregation.rotate_aggregation_type();
            }
            TableAction::ToggleDisplayAllAggregations => {
                self.aggregation.toggle_display_all_aggregations();
            }
            TableAction::SetColumnEnabled {
                property_name,
                enabled,
            } => {
                self.schema.borrow_mut().set_enabled(property_name, *enabled);
            }
        }
        Ok(())
    }

    /// Everything needed to draw the current frame.
    pub fn snapshot(&mut self) -> TableSnapshot {
        self.sync();

        let schema = self.schema.borrow();
        let rows = self
            .rows_to_render()
            .into_iter()
            .map(|(number, label, row)| RowSnapshot::new(number, label, &row, schema.configurations()))
            .collect();

        TableSnapshot {
            columns: schema.configurations().to_vec(),
            rows,
            page: PageSnapshot::from_paginator(&self.paginator),
            sort: self.sort_state(),
            aggregation_type: self.aggregation.current_aggregation_type(),
            display_all_aggregations: self.aggregation.display_all_aggregations(),
            aggregates: self.aggregation.aggregates().clone(),
            is_calculating: self.layout.is_calculating(),
            row_number_style: self.layout.row_number_style(),
            column_styles: self.layout.column_styles(),
        }
    }
}
