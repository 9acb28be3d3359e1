/// Pagination
///
/// Slices a parent view (normally the sorted view) into fixed-size pages. The
/// slice is read on demand from the parent, so the paginator only stores its
/// own control state: rows per page and the current page.
///
/// The current page resets to 1 whenever the parent's revision moves (list
/// replaced or re-sorted) and whenever rows per page changes. Navigation is
/// clamped to `1..=max(1, total_number_of_pages)`.

use crate::error::{Result, TableError};
use crate::rows::{DerivedView, RowView};
use crate::util::{number_of_digits, pad_start};
use crate::value::RowItem;
use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

#[derive(Debug)]
pub struct Paginator<V: RowView + DerivedView> {
    parent: Rc<RefCell<V>>,
    rows_per_page: usize,
    current_page: usize,
    last_parent_revision: u64,
}

impl<V: RowView + DerivedView> Paginator<V> {
    pub fn new(parent: Rc<RefCell<V>>) -> Self {
        let revision = parent.borrow().revision();
        let paginator = Paginator {
            parent,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            current_page: 1,
            last_parent_revision: revision,
        };
        paginator.log_state();
        paginator
    }

    pub fn with_rows_per_page(parent: Rc<RefCell<V>>, rows_per_page: usize) -> Result<Self> {
        let mut paginator = Paginator::new(parent);
        paginator.set_rows_per_page(rows_per_page)?;
        Ok(paginator)
    }

    fn log_state(&self) {
        log::debug!(
            "Pagination: {} items, {} rows per page, {} pages",
            self.total_number_of_items(),
            self.rows_per_page,
            self.total_number_of_pages()
        );
    }

    /// Sync the parent, then reset to page 1 if its order or content moved.
    /// Returns true if the page was reset.
    pub fn sync(&mut self) -> bool {
        self.parent.borrow_mut().sync();
        let revision = self.parent.borrow().revision();
        if revision == self.last_parent_revision {
            return false;
        }

        log::info!(
            "Pagination received updated list: {} items, page {} => 1",
            self.total_number_of_items(),
            self.current_page
        );
        self.last_parent_revision = revision;
        self.current_page = 1;
        self.log_state();
        true
    }

    pub fn parent(&self) -> &Rc<RefCell<V>> {
        &self.parent
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Change the page size. Any change resets to page 1.
    pub fn set_rows_per_page(&mut self, rows_per_page: usize) -> Result<()> {
        if rows_per_page == 0 {
            return Err(TableError::InvalidRowsPerPage(rows_per_page));
        }
        if rows_per_page != self.rows_per_page {
            log::info!(
                "Rows per page modified: {} => {}",
                self.rows_per_page,
                rows_per_page
            );
            self.rows_per_page = rows_per_page;
            self.current_page = 1;
            self.log_state();
        }
        Ok(())
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Jump to a 1-based page.
    pub fn set_current_page(&mut self, page: usize) -> Result<()> {
        let last = self.last_valid_page();
        if page < 1 || page > last {
            return Err(TableError::PageOutOfRange {
                page,
                total_pages: self.total_number_of_pages(),
            });
        }
        self.current_page = page;
        Ok(())
    }

    pub fn total_number_of_items(&self) -> usize {
        self.parent.borrow().len()
    }

    pub fn total_number_of_pages(&self) -> usize {
        self.total_number_of_items().div_ceil(self.rows_per_page)
    }

    fn last_valid_page(&self) -> usize {
        self.total_number_of_pages().max(1)
    }

    /// 1-based number of the first item on the current page.
    pub fn first_item_on_page(&self) -> usize {
        self.items_before_page().saturating_add(1)
    }

    fn items_before_page(&self) -> usize {
        (self.current_page - 1).saturating_mul(self.rows_per_page)
    }

    /// 1-based number of the last item on the current page; 0 for an empty list.
    pub fn last_item_on_page(&self) -> usize {
        self.items_before_page()
            .saturating_add(self.rows_per_page)
            .min(self.total_number_of_items())
    }

    /// Parent view positions covered by the current page.
    pub fn page_range(&self) -> Range<usize> {
        let total = self.total_number_of_items();
        let start = self.items_before_page().min(total);
        let end = start.saturating_add(self.rows_per_page).min(total);
        start..end
    }

    /// Rows on the current page.
    pub fn paginated_list(&self) -> Vec<RowItem> {
        let parent = self.parent.borrow();
        self.page_range()
            .filter_map(|i| parent.get_row(i))
            .collect()
    }

    /// Gutter label for the row at `position` on the current page: the
    /// absolute item number, right-aligned to the width of the total.
    pub fn row_number_label(&self, position: usize) -> String {
        let number = self.first_item_on_page() + position;
        let width = number_of_digits(self.total_number_of_items() as i64);
        pad_start(number as i64, width)
    }

    fn goto(&mut self, action: &str, page: usize) {
        let page = page.clamp(1, self.last_valid_page());
        log::info!("Goto {} page: {} => {}", action, self.current_page, page);
        self.current_page = page;
    }

    pub fn goto_first_page(&mut self) {
        self.goto("first", 1);
    }

    pub fn goto_previous_page(&mut self) {
        self.goto("previous", self.current_page.saturating_sub(1));
    }

    pub fn goto_next_page(&mut self) {
        self.goto("next", self.current_page + 1);
    }

    pub fn goto_last_page(&mut self) {
        self.goto("last", self.total_number_of_pages());
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page == 1
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page >= self.last_valid_page()
    }
}
