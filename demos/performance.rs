/// Performance Example
///
/// This example demonstrates:
/// - Building the derived state for a large list
/// - Cost of sorting, paging, aggregation and snapshots
/// - Cost of a full list replacement

use std::time::Instant;
use tabulardata::{RowItem, SchemaSampling, TableOptions, TabularData};

fn generate_rows(count: usize, seed: usize) -> Vec<RowItem> {
    (0..count)
        .map(|i| {
            let k = (i * 7919 + seed) % count.max(1);
            RowItem::new()
                .with("id", i as i64)
                .with("name", format!("Person {:06}", k))
                .with("age", (18 + k % 60) as i64)
                .with("salary", 25000.0 + (k % 1000) as f64 * 75.25)
                .with("active", k % 4 != 0)
        })
        .collect()
}

fn main() {
    println!("=== TabularData Performance Example ===\n");

    let n = 100_000;
    let rows = generate_rows(n, 0);

    let start = Instant::now();
    let mut table = TabularData::new(
        rows,
        TableOptions {
            rows_per_page: 50,
            schema_sampling: SchemaSampling::AllRows,
            ..TableOptions::default()
        },
    )
    .unwrap();
    println!("1. Build ({} rows, all-rows sampling): {:?}", n, start.elapsed());

    let start = Instant::now();
    table.sort_on("name");
    println!("2. Sort on name: {:?}", start.elapsed());

    let start = Instant::now();
    table.sort_on("age");
    println!("3. Sort on age (stable over name): {:?}", start.elapsed());

    let start = Instant::now();
    for _ in 0..100 {
        let _ = table.paginated_list();
        table.goto_next_page();
    }
    println!("4. Read 100 pages: {:?}", start.elapsed());

    let start = Instant::now();
    let snapshot = table.snapshot();
    println!(
        "5. Snapshot ({} rows on page {}): {:?}",
        snapshot.rows.len(),
        snapshot.page.current_page,
        start.elapsed()
    );

    let start = Instant::now();
    table.replace(generate_rows(n, 17));
    println!("6. Replace and recompute: {:?}", start.elapsed());

    println!(
        "\n   Mean salary: {:?}",
        table
            .aggregation()
            .aggregates()
            .get(tabulardata::AggregationType::Mean, "salary")
    );

    println!("\n=== Example Complete ===");
}
