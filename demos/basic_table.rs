/// Basic Table Example
///
/// This example demonstrates:
/// - Loading records from JSON
/// - The inferred column schema
/// - Reading the first page and the footer aggregates

use tabulardata::{AggregationType, TableOptions, TabularData};

const USERS: &str = r#"[
    {"firstName": "Alice", "lastName": "Andersson", "age": 30, "salary": 52000, "numberOfChildren": 2, "active": true, "countryCode": "SE", "registered": "2019-03-14"},
    {"firstName": "Bob", "lastName": "Berg", "age": 25, "salary": 48500.5, "numberOfChildren": 0, "active": false, "countryCode": "NO", "registered": "2021-07-01"},
    {"firstName": "Charlie", "lastName": "Christensen", "age": 35, "salary": 61000, "numberOfChildren": 1, "active": true, "countryCode": "DK", "registered": "2017-11-23"},
    {"firstName": "Diana", "lastName": "Dahl", "age": 28, "salary": null, "numberOfChildren": 3, "active": true, "countryCode": "FI", "registered": "2020-01-09"}
]"#;

fn main() {
    println!("=== TabularData Basic Table Example ===\n");

    // 1. Load the records
    println!("1. Loading records...");
    let table = TabularData::from_json(USERS, TableOptions::default()).unwrap();
    println!("   {} records loaded\n", table.len());

    // 2. Inspect the schema
    println!("2. Inferred columns:");
    for column in table.schema().configurations() {
        println!(
            "   {:>2}. {:<20} {:<16} ({:?})",
            column.index_order, column.label, column.property_type, column.value_kind
        );
    }
    println!();

    // 3. First page
    println!("3. First page:");
    let paginator = table.paginator();
    for (i, row) in paginator.paginated_list().iter().enumerate() {
        println!(
            "   {} {} {}, {}",
            paginator.row_number_label(i),
            row.get("firstName"),
            row.get("lastName"),
            row.get("age")
        );
    }
    println!(
        "   Items {}-{} of {}\n",
        paginator.first_item_on_page(),
        paginator.last_item_on_page(),
        paginator.total_number_of_items()
    );

    // 4. Aggregates
    println!("4. Aggregates:");
    let aggregates = table.aggregation().aggregates();
    for aggregation_type in AggregationType::ALL {
        println!("   {:<6} {:?}", aggregation_type, aggregates.values(aggregation_type));
    }

    println!("\n=== Example Complete ===");
}
