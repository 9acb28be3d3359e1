/// TabularData - Derived-State Engine for Interactive Tables
///
/// Turns a schema-less list of records into the synchronized state a table
/// needs: typed columns, a sorted order, a paginated slice, footer aggregates
/// and measured column widths. Every derived structure is a function of the
/// shared list and its own control state, and is recomputed when the list is
/// replaced.

pub mod error;
pub mod value;
pub mod rows;
pub mod inference;
pub mod schema;
pub mod aggregation;
pub mod view;
pub mod pagination;
pub mod layout;
pub mod config;
pub mod snapshot;
pub mod table;
pub mod util;

pub use error::{Result, TableError};
pub use value::{PropertyValue, RowItem, ValueKind};
pub use rows::{DerivedView, RowList, RowView, SharedRows};
pub use inference::{
    capitalize, classify, decapitalize, prettify_property_name, property_types_for_row,
    PropertyType, RuleMatcher, TypeRule, TypeRules,
};
pub use schema::{
    infer_columns, infer_columns_from_all, ColumnConfiguration, ColumnSchema, SchemaSampling,
    StickyEdge,
};
pub use aggregation::{compute_aggregates, compute_aggregates_for, AggregateSet, Aggregation, AggregationType};
pub use view::{compare_values, SortOrder, SortState, SortedView};
pub use pagination::{Paginator, DEFAULT_ROWS_PER_PAGE};
pub use layout::{
    create_style_for_column, ColumnLayout, LayoutPhase, MeasurementCell, MeasurementHandle,
    MeasurementTicket, RenderSurface,
};
pub use config::{TableOptions, TypeOverride};
pub use snapshot::{CellData, PageSnapshot, RowSnapshot, TableAction, TableSnapshot};
pub use table::TabularData;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const PEOPLE: &str = r#"[
        {"firstName": "Alice", "age": 34, "salary": 52000, "active": true, "countryCode": "SE", "dateOfBirth": "1990-05-23"},
        {"firstName": "Bob", "age": 27, "salary": 48000.5, "active": false, "countryCode": "DK", "dateOfBirth": "1997-01-02"},
        {"firstName": "Charlie", "age": 45, "salary": 61000, "active": true, "countryCode": "NO", "dateOfBirth": null},
        {"firstName": "Donna", "age": 27, "salary": 39000, "active": true, "countryCode": "FI", "dateOfBirth": "1997-11-30"}
    ]"#;

    #[test]
    fn test_complete_workflow() {
        let mut table = TabularData::from_json(
            PEOPLE,
            TableOptions {
                rows_per_page: 3,
                ..TableOptions::default()
            },
        )
        .unwrap();

        // Schema from the first record, overrides applied
        {
            let schema = table.schema();
            let labels: Vec<&str> = schema.configurations().iter().map(|c| c.label.as_str()).collect();
            assert_eq!(
                labels,
                vec!["First name", "Age", "Salary", "Active", "Country code", "Date of birth"]
            );
            assert_eq!(schema.property_type("salary"), Some(PropertyType::DecimalNumber));
            assert_eq!(schema.property_type("countryCode"), Some(PropertyType::CountryCode));
            assert_eq!(schema.property_type("dateOfBirth"), Some(PropertyType::LocalDate));
        }

        // Aggregates over the raw list
        let aggregates = table.aggregation().aggregates().clone();
        assert_eq!(aggregates.get(AggregationType::Sum, "age"), Some(133.0));
        assert_eq!(aggregates.get(AggregationType::Median, "age"), Some(30.5));
        assert_eq!(aggregates.get(AggregationType::Sum, "active"), Some(3.0));
        assert_eq!(aggregates.get(AggregationType::Max, "firstName"), Some(7.0));
        assert!(!aggregates.sum.contains_key("dateOfBirth"));

        // Sort by age: ties keep list order
        table.sort_on("age");
        let names: Vec<String> = table
            .paginated_list()
            .iter()
            .map(|r| r.get("firstName").to_string())
            .collect();
        assert_eq!(names, vec!["Bob", "Donna", "Alice"]);

        table.goto_next_page();
        let page = table.paginated_list();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].get("firstName").as_text(), Some("Charlie"));

        // Sorting on date puts the absent value last, then first when descending
        table.sort_on("dateOfBirth");
        assert_eq!(table.paginator().current_page(), 1);
        table.goto_last_page();
        assert_eq!(table.paginated_list()[0].get("firstName").as_text(), Some("Charlie"));
        table.sort_on("dateOfBirth");
        assert_eq!(table.paginated_list()[0].get("firstName").as_text(), Some("Charlie"));

        // Replacement resets everything
        table.replace(vec![RowItem::new().with("planet", "Mars")]);
        assert_eq!(table.sort_state(), SortState::default());
        assert_eq!(table.paginator().total_number_of_pages(), 1);
        assert_eq!(table.schema().len(), 1);
        assert_eq!(
            table.aggregation().aggregates().get(AggregationType::Sum, "planet"),
            Some(4.0)
        );
    }

    #[test]
    fn test_components_share_one_list() {
        let rows = RowList::shared(vec![
            RowItem::new().with("planet", "Venus"),
            RowItem::new().with("planet", "Earth"),
            RowItem::new().with("planet", "Mars"),
        ]);
        let options = TableOptions::default();

        let mut schema = ColumnSchema::new(rows.clone(), &options);
        let mut aggregation = Aggregation::new(rows.clone(), &options);
        let sorted = Rc::new(RefCell::new(SortedView::new(rows.clone())));
        let mut paginator = Paginator::new(sorted.clone());

        sorted.borrow_mut().sort_on("planet");
        assert!(paginator.sync());
        let page: Vec<String> = paginator
            .paginated_list()
            .iter()
            .map(|r| r.get("planet").to_string())
            .collect();
        assert_eq!(page, vec!["Earth", "Mars", "Venus"]);

        rows.borrow_mut().replace(vec![RowItem::new().with("n", 5), RowItem::new().with("n", 1)]);
        assert!(schema.sync());
        assert!(aggregation.sync());
        assert!(paginator.sync());

        assert_eq!(schema.property_type("n"), Some(PropertyType::Integer));
        assert_eq!(aggregation.aggregates().get(AggregationType::Sum, "n"), Some(6.0));
        assert_eq!(sorted.borrow().sort_state(), &SortState::default());
        assert_eq!(paginator.paginated_list()[0].get("n").as_number(), Some(5.0));
    }

    #[test]
    fn test_layout_measures_full_list_then_paginates() {
        let rows: Vec<RowItem> = (1..=25)
            .map(|i| RowItem::new().with("id", i).with("label", "x".repeat(i as usize)))
            .collect();
        let mut table = TabularData::new(
            rows,
            TableOptions {
                sticky_columns: vec!["id".to_string()],
                ..TableOptions::default()
            },
        )
        .unwrap();

        let gutter = MeasurementCell::new();
        let id = MeasurementCell::new();
        let label = MeasurementCell::new();
        table.layout_mut().set_row_number_handle(gutter.clone());
        table.layout_mut().register_column_handle("id", id.clone());
        table.layout_mut().register_column_handle("label", label.clone());

        let ticket = table.layout_mut().request_calculation();
        // The surface draws all rows, the widest label sets the column width
        let rendered = table.rows_to_render();
        assert_eq!(rendered.len(), 25);
        let widest = rendered
            .iter()
            .map(|(_, _, row)| row.get("label").to_string().len())
            .max()
            .unwrap();
        gutter.set(18.0);
        id.set(20.0);
        label.set(widest as f64 * 7.5);

        assert!(table.layout_mut().complete_measurement(ticket));
        assert!(table.layout_mut().finish_display(ticket));

        let snapshot = table.snapshot();
        assert!(!snapshot.is_calculating);
        assert_eq!(snapshot.rows.len(), 10);
        assert_eq!(snapshot.row_number_style, "min-width: 18px; width: 18px; max-width: 18px;");
        assert_eq!(
            snapshot.column_styles["id"],
            "min-width: 20px; width: 20px; max-width: 20px; left: 18px;"
        );
        assert_eq!(
            snapshot.column_styles["label"],
            "min-width: 188px; width: 188px; max-width: 188px;"
        );
        assert_eq!(snapshot.columns[1].width_in_pixels, Some(188));
    }
}
