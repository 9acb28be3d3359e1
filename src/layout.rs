/// Column Layout
///
/// Fits column widths to rendered content with a two-phase handshake against
/// the rendering surface:
///
/// 1. `request_calculation()` enters `Measuring`. The surface renders the
///    whole unpaginated list so every cell takes part in natural-width layout.
/// 2. After one rendered frame, `complete_measurement()` reads each column's
///    width through its `MeasurementHandle`, rounds up to whole pixels,
///    publishes style strings and writes widths and sticky offsets into the
///    schema. The phase moves to `Displaying`.
/// 3. The surface resumes paginated rendering and `finish_display()` returns
///    to `Idle`.
///
/// Only one request is in flight. A new request, or a list replacement,
/// invalidates the ticket of the previous one; completing with a stale ticket
/// is a no-op.

use crate::rows::{DerivedView, SharedRows};
use crate::schema::ColumnSchema;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Reads the rendered content width of one element.
pub trait MeasurementHandle {
    /// Width in pixels, `None` when the element is not rendered.
    fn rendered_width(&self) -> Option<f64>;
}

/// Shared width slot a rendering surface writes into.
#[derive(Debug, Clone, Default)]
pub struct MeasurementCell {
    width: Rc<Cell<Option<f64>>>,
}

impl MeasurementCell {
    pub fn new() -> Self {
        MeasurementCell::default()
    }

    pub fn set(&self, width: f64) {
        self.width.set(Some(width));
    }

    pub fn clear(&self) {
        self.width.set(None);
    }

    pub fn get(&self) -> Option<f64> {
        self.width.get()
    }
}

impl MeasurementHandle for MeasurementCell {
    fn rendered_width(&self) -> Option<f64> {
        self.width.get()
    }
}

impl<F: Fn() -> Option<f64>> MeasurementHandle for F {
    fn rendered_width(&self) -> Option<f64> {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPhase {
    Idle,
    /// Surface must render every row
    Measuring,
    /// Widths are published, surface goes back to paginated rendering
    Displaying,
}

/// Identifies one measurement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementTicket {
    generation: u64,
}

impl MeasurementTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The rendering collaborator driven by `ColumnLayout::calculate_and_display`.
#[allow(async_fn_in_trait)]
pub trait RenderSurface {
    /// Render the full unpaginated list.
    fn render_all_rows(&mut self);

    /// Resolve once the surface has completed one layout pass.
    async fn next_frame(&mut self);

    /// Go back to rendering the current page only.
    fn resume_paginated(&mut self);
}

/// `min-width`/`width`/`max-width` pinned to `width`, plus a left offset
/// for sticky columns. Unmeasured or zero widths give an empty style.
pub fn create_style_for_column(width_in_pixels: Option<u32>, sticky_offset_in_pixels: Option<u32>) -> String {
    match width_in_pixels {
        Some(w) if w > 0 => {
            let mut style = format!("min-width: {w}px; width: {w}px; max-width: {w}px;");
            if let Some(offset) = sticky_offset_in_pixels {
                style.push_str(&format!(" left: {offset}px;"));
            }
            style
        }
        _ => String::new(),
    }
}

fn to_pixels(width: f64) -> u32 {
    width.max(0.0).ceil() as u32
}

pub struct ColumnLayout {
    rows: SharedRows,
    schema: Rc<RefCell<ColumnSchema>>,
    row_number_handle: Option<Box<dyn MeasurementHandle>>,
    column_handles: Vec<(String, Box<dyn MeasurementHandle>)>,
    phase: LayoutPhase,
    ticket_generation: u64,
    has_measured: bool,
    row_number_width_in_pixels: Option<u32>,
    calculated_column_widths_in_pixels: BTreeMap<String, u32>,
    sticky_offsets_in_pixels: BTreeMap<String, u32>,
    last_synced_generation: u64,
}

impl fmt::Debug for ColumnLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnLayout")
            .field("phase", &self.phase)
            .field("ticket_generation", &self.ticket_generation)
            .field("column_handles", &self.column_handles.len())
            .field("row_number_width_in_pixels", &self.row_number_width_in_pixels)
            .field("calculated_column_widths_in_pixels", &self.calculated_column_widths_in_pixels)
            .finish_non_exhaustive()
    }
}

impl ColumnLayout {
    pub fn new(rows: SharedRows, schema: Rc<RefCell<ColumnSchema>>) -> Self {
        let generation = rows.borrow().generation();
        log::debug!(
            "Column layout initialized for {} items",
            rows.borrow().len()
        );
        ColumnLayout {
            rows,
            schema,
            row_number_handle: None,
            column_handles: Vec::new(),
            phase: LayoutPhase::Idle,
            ticket_generation: 0,
            has_measured: false,
            row_number_width_in_pixels: None,
            calculated_column_widths_in_pixels: BTreeMap::new(),
            sticky_offsets_in_pixels: BTreeMap::new(),
            last_synced_generation: generation,
        }
    }

    pub fn set_row_number_handle(&mut self, handle: impl MeasurementHandle + 'static) {
        self.row_number_handle = Some(Box::new(handle));
    }

    /// Attach the handle for the header cell of `property_name`.
    /// Registering the same name again replaces the earlier handle.
    pub fn register_column_handle(
        &mut self,
        property_name: impl Into<String>,
        handle: impl MeasurementHandle + 'static,
    ) {
        let property_name = property_name.into();
        self.column_handles.retain(|(name, _)| *name != property_name);
        self.column_handles.push((property_name, Box::new(handle)));
    }

    pub fn clear_column_handles(&mut self) {
        self.column_handles.clear();
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    /// True until the first measurement is displayed, and during every
    /// recalculation.
    pub fn is_calculating(&self) -> bool {
        !self.has_measured || self.phase != LayoutPhase::Idle
    }

    /// Whether the surface must currently render the unpaginated list.
    pub fn renders_all_rows(&self) -> bool {
        self.phase == LayoutPhase::Measuring
    }

    /// Start a measurement. Any ticket handed out earlier becomes stale.
    pub fn request_calculation(&mut self) -> MeasurementTicket {
        self.sync();

        if self.phase != LayoutPhase::Idle {
            log::debug!(
                "Superseding measurement {} in phase {:?}",
                self.ticket_generation,
                self.phase
            );
        }
        self.ticket_generation += 1;
        self.phase = LayoutPhase::Measuring;

        log::info!(
            "Calculating column widths for {} columns (measurement {})",
            self.column_handles.len(),
            self.ticket_generation
        );
        MeasurementTicket {
            generation: self.ticket_generation,
        }
    }

    fn is_current(&self, ticket: MeasurementTicket, phase: LayoutPhase) -> bool {
        ticket.generation == self.ticket_generation && self.phase == phase
    }

    /// Read all handles and publish widths. Returns false for a stale ticket.
    pub fn complete_measurement(&mut self, ticket: MeasurementTicket) -> bool {
        self.sync();
        if !self.is_current(ticket, LayoutPhase::Measuring) {
            log::warn!(
                "Ignoring stale measurement {} (current {}, {:?})",
                ticket.generation,
                self.ticket_generation,
                self.phase
            );
            return false;
        }

        if let Some(handle) = &self.row_number_handle {
            if let Some(width) = handle.rendered_width() {
                self.row_number_width_in_pixels = Some(to_pixels(width));
            }
        }

        let mut widths = BTreeMap::new();
        for (property_name, handle) in &self.column_handles {
            if let Some(width) = handle.rendered_width() {
                let pixels = to_pixels(width);
                log::trace!("  '{}': {} => {}px", property_name, width, pixels);
                widths.insert(property_name.clone(), pixels);
            }
        }

        let mut schema = self.schema.borrow_mut();
        schema.sync();

        let mut offsets = BTreeMap::new();
        let mut offset = self.row_number_width_in_pixels.unwrap_or(0);
        for column in schema.sticky_left_columns() {
            offsets.insert(column.property_name.clone(), offset);
            offset += widths.get(&column.property_name).copied().unwrap_or(0);
        }

        schema.apply_widths(&widths, &offsets);
        drop(schema);

        log::debug!(
            "Measured {} columns, row number column {:?}px",
            widths.len(),
            self.row_number_width_in_pixels
        );

        self.calculated_column_widths_in_pixels = widths;
        self.sticky_offsets_in_pixels = offsets;
        self.has_measured = true;
        self.phase = LayoutPhase::Displaying;
        true
    }

    /// The surface is back on the paginated list. Returns false for a stale ticket.
    pub fn finish_display(&mut self, ticket: MeasurementTicket) -> bool {
        if !self.is_current(ticket, LayoutPhase::Displaying) {
            log::warn!(
                "Ignoring display of stale measurement {} (current {}, {:?})",
                ticket.generation,
                self.ticket_generation,
                self.phase
            );
            return false;
        }
        self.phase = LayoutPhase::Idle;
        true
    }

    /// Run the whole handshake against `surface`. Returns false if the
    /// measurement was superseded while waiting for the frame.
    ///
    /// The layout stays mutably borrowed across the await, so the only way
    /// to supersede it from here is replacing the shared list. Use
    /// `request_calculation`/`complete_measurement` directly when a new
    /// request has to overtake one that is still waiting.
    pub async fn calculate_and_display<S: RenderSurface>(&mut self, surface: &mut S) -> bool {
        let ticket = self.request_calculation();
        surface.render_all_rows();

        surface.next_frame().await;

        if !self.complete_measurement(ticket) {
            return false;
        }
        surface.resume_paginated();
        self.finish_display(ticket)
    }

    pub fn calculated_column_widths_in_pixels(&self) -> &BTreeMap<String, u32> {
        &self.calculated_column_widths_in_pixels
    }

    pub fn row_number_width_in_pixels(&self) -> Option<u32> {
        self.row_number_width_in_pixels
    }

    pub fn sticky_offset_in_pixels(&self, property_name: &str) -> Option<u32> {
        self.sticky_offsets_in_pixels.get(property_name).copied()
    }

    pub fn row_number_style(&self) -> String {
        create_style_for_column(self.row_number_width_in_pixels, None)
    }

    pub fn column_style(&self, property_name: &str) -> String {
        create_style_for_column(
            self.calculated_column_widths_in_pixels.get(property_name).copied(),
            self.sticky_offset_in_pixels(property_name),
        )
    }

    /// Style per measured column.
    pub fn column_styles(&self) -> BTreeMap<String, String> {
        self.calculated_column_widths_in_pixels
            .keys()
            .map(|name| (name.clone(), self.column_style(name)))
            .collect()
    }

    fn clear_measurements(&mut self) {
        self.row_number_width_in_pixels = None;
        self.calculated_column_widths_in_pixels.clear();
        self.sticky_offsets_in_pixels.clear();
        self.has_measured = false;
    }
}

impl DerivedView for ColumnLayout {
    /// A replaced list drops measured widths and invalidates any in-flight ticket.
    fn sync(&mut self) -> bool {
        let generation = self.rows.borrow().generation();
        if generation == self.last_synced_generation {
            return false;
        }
        log::debug!("Column layout received updated list: widths cleared");
        self.rebuild();
        true
    }

    fn last_synced_generation(&self) -> u64 {
        self.last_synced_generation
    }

    fn rebuild(&mut self) {
        self.clear_measurements();
        if self.phase != LayoutPhase::Idle {
            self.ticket_generation += 1;
            self.phase = LayoutPhase::Idle;
        }
        self.last_synced_generation = self.rows.borrow().generation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableOptions;
    use crate::rows::RowList;
    use crate::value::RowItem;

    fn setup(sticky: &[&str]) -> (SharedRows, Rc<RefCell<ColumnSchema>>, ColumnLayout) {
        let rows = RowList::shared(vec![
            RowItem::new().with("id", 1).with("name", "Ada").with("age", 36),
            RowItem::new().with("id", 2).with("name", "Grace").with("age", 45),
        ]);
        let options = TableOptions {
            sticky_columns: sticky.iter().map(|s| s.to_string()).collect(),
            ..TableOptions::default()
        };
        let schema = Rc::new(RefCell::new(ColumnSchema::new(rows.clone(), &options)));
        let layout = ColumnLayout::new(rows.clone(), schema.clone());
        (rows, schema, layout)
    }

    struct FakeSurface {
        gutter: MeasurementCell,
        cells: Vec<(MeasurementCell, f64)>,
        rendered_all: bool,
        frames: usize,
    }

    impl RenderSurface for FakeSurface {
        fn render_all_rows(&mut self) {
            self.rendered_all = true;
        }

        async fn next_frame(&mut self) {
            tokio::task::yield_now().await;
            self.frames += 1;
            self.gutter.set(23.2);
            for (cell, width) in &self.cells {
                cell.set(*width);
            }
        }

        fn resume_paginated(&mut self) {
            self.rendered_all = false;
        }
    }

    #[test]
    fn test_create_style_for_column() {
        assert_eq!(
            create_style_for_column(Some(42), None),
            "min-width: 42px; width: 42px; max-width: 42px;"
        );
        assert_eq!(
            create_style_for_column(Some(42), Some(24)),
            "min-width: 42px; width: 42px; max-width: 42px; left: 24px;"
        );
        assert_eq!(create_style_for_column(None, Some(3)), "");
        assert_eq!(create_style_for_column(Some(0), None), "");
    }

    #[test]
    fn test_initially_calculating() {
        let (_, _, layout) = setup(&[]);
        assert!(layout.is_calculating());
        assert_eq!(layout.phase(), LayoutPhase::Idle);
        assert!(!layout.renders_all_rows());
        assert_eq!(layout.row_number_style(), "");
    }

    #[test]
    fn test_handshake_phases() {
        let (_, schema, mut layout) = setup(&[]);
        let gutter = MeasurementCell::new();
        let id = MeasurementCell::new();
        let name = MeasurementCell::new();
        layout.set_row_number_handle(gutter.clone());
        layout.register_column_handle("id", id.clone());
        layout.register_column_handle("name", name.clone());

        let ticket = layout.request_calculation();
        assert_eq!(layout.phase(), LayoutPhase::Measuring);
        assert!(layout.renders_all_rows());
        assert!(layout.is_calculating());

        gutter.set(19.5);
        id.set(30.0);
        name.set(88.01);
        assert!(layout.complete_measurement(ticket));
        assert_eq!(layout.phase(), LayoutPhase::Displaying);
        assert!(layout.is_calculating());

        assert_eq!(layout.row_number_width_in_pixels(), Some(20));
        assert_eq!(layout.calculated_column_widths_in_pixels().get("id"), Some(&30));
        assert_eq!(layout.calculated_column_widths_in_pixels().get("name"), Some(&89));
        assert_eq!(layout.column_style("age"), "");
        assert_eq!(schema.borrow().get("name").unwrap().width_in_pixels, Some(89));

        assert!(layout.finish_display(ticket));
        assert_eq!(layout.phase(), LayoutPhase::Idle);
        assert!(!layout.is_calculating());
        assert!(!layout.finish_display(ticket));
    }

    #[test]
    fn test_new_request_supersedes_in_flight() {
        let (_, _, mut layout) = setup(&[]);
        let id = MeasurementCell::new();
        layout.register_column_handle("id", id.clone());
        id.set(10.0);

        let first = layout.request_calculation();
        let second = layout.request_calculation();
        assert_ne!(first, second);

        assert!(!layout.complete_measurement(first));
        assert_eq!(layout.phase(), LayoutPhase::Measuring);
        assert!(layout.complete_measurement(second));
        assert!(!layout.finish_display(first));
        assert!(layout.finish_display(second));
    }

    #[test]
    fn test_sticky_offsets() {
        let (_, schema, mut layout) = setup(&["id", "name"]);
        let gutter = MeasurementCell::new();
        layout.set_row_number_handle(gutter.clone());
        for (column, width) in [("id", 30.0), ("name", 80.0), ("age", 40.0)] {
            let cell = MeasurementCell::new();
            cell.set(width);
            layout.register_column_handle(column, cell);
        }
        gutter.set(24.0);

        let ticket = layout.request_calculation();
        assert!(layout.complete_measurement(ticket));

        assert_eq!(layout.sticky_offset_in_pixels("id"), Some(24));
        assert_eq!(layout.sticky_offset_in_pixels("name"), Some(54));
        assert_eq!(layout.sticky_offset_in_pixels("age"), None);
        assert_eq!(
            layout.column_style("name"),
            "min-width: 80px; width: 80px; max-width: 80px; left: 54px;"
        );
        assert_eq!(
            layout.column_style("age"),
            "min-width: 40px; width: 40px; max-width: 40px;"
        );
        assert_eq!(schema.borrow().get("name").unwrap().sticky_offset_in_pixels, Some(54));
        assert_eq!(layout.column_styles().len(), 3);
    }

    #[test]
    fn test_closure_handles_and_unrendered_columns() {
        let (_, _, mut layout) = setup(&[]);
        layout.register_column_handle("id", || Some(12.3));
        layout.register_column_handle("name", || None);

        let ticket = layout.request_calculation();
        assert!(layout.complete_measurement(ticket));
        assert_eq!(layout.calculated_column_widths_in_pixels().len(), 1);
        assert_eq!(layout.column_style("id"), "min-width: 13px; width: 13px; max-width: 13px;");
        assert_eq!(layout.row_number_width_in_pixels(), None);
    }

    #[test]
    fn test_replace_clears_widths_and_invalidates_ticket() {
        let (rows, _, mut layout) = setup(&[]);
        layout.register_column_handle("id", || Some(10.0));

        let ticket = layout.request_calculation();
        assert!(layout.complete_measurement(ticket));
        assert!(layout.finish_display(ticket));
        assert!(!layout.is_calculating());

        let ticket = layout.request_calculation();
        rows.borrow_mut().replace(vec![RowItem::new().with("id", 3)]);
        assert!(!layout.complete_measurement(ticket));
        assert_eq!(layout.phase(), LayoutPhase::Idle);
        assert!(layout.calculated_column_widths_in_pixels().is_empty());
        assert!(layout.is_calculating());
    }

    #[test]
    fn test_clear_column_handles() {
        let (_, _, mut layout) = setup(&[]);
        layout.register_column_handle("id", || Some(10.0));
        layout.register_column_handle("id", || Some(20.0));
        layout.clear_column_handles();

        let ticket = layout.request_calculation();
        assert!(layout.complete_measurement(ticket));
        assert!(layout.calculated_column_widths_in_pixels().is_empty());
    }

    #[tokio::test]
    async fn test_calculate_and_display() {
        let (_, schema, mut layout) = setup(&["name"]);
        let gutter = MeasurementCell::new();
        let name = MeasurementCell::new();
        let age = MeasurementCell::new();
        layout.set_row_number_handle(gutter.clone());
        layout.register_column_handle("name", name.clone());
        layout.register_column_handle("age", age.clone());

        let mut surface = FakeSurface {
            gutter,
            cells: vec![(name, 64.4), (age, 31.0)],
            rendered_all: false,
            frames: 0,
        };

        assert!(layout.calculate_and_display(&mut surface).await);
        assert_eq!(surface.frames, 1);
        assert!(!surface.rendered_all);
        assert!(!layout.is_calculating());
        assert_eq!(layout.row_number_width_in_pixels(), Some(24));
        assert_eq!(
            layout.column_style("name"),
            "min-width: 65px; width: 65px; max-width: 65px; left: 24px;"
        );
        assert_eq!(schema.borrow().get("age").unwrap().width_in_pixels, Some(31));
    }

    struct ReplacingSurface {
        rows: SharedRows,
        resumed: bool,
    }

    impl RenderSurface for ReplacingSurface {
        fn render_all_rows(&mut self) {}

        async fn next_frame(&mut self) {
            tokio::task::yield_now().await;
            self.rows.borrow_mut().replace(vec![RowItem::new().with("id", 3)]);
        }

        fn resume_paginated(&mut self) {
            self.resumed = true;
        }
    }

    #[tokio::test]
    async fn test_replace_while_waiting_supersedes() {
        let (rows, _, mut layout) = setup(&[]);
        layout.register_column_handle("id", || Some(10.0));

        let mut surface = ReplacingSurface {
            rows,
            resumed: false,
        };

        assert!(!layout.calculate_and_display(&mut surface).await);
        assert!(!surface.resumed);
        assert_eq!(layout.phase(), LayoutPhase::Idle);
        assert!(layout.is_calculating());
        assert!(layout.calculated_column_widths_in_pixels().is_empty());
    }
}
