/// Sorting and Paging Example
///
/// This example demonstrates:
/// - Toggling sort direction by sorting on the same property twice
/// - Stable multi-pass sorting
/// - Page navigation and the reset to page 1 after a sort
/// - Replacing the whole list

use tabulardata::{RowItem, TableOptions, TabularData};

fn print_page(table: &TabularData) {
    let paginator = table.paginator();
    println!(
        "   Page {}/{}",
        paginator.current_page(),
        paginator.total_number_of_pages()
    );
    for (i, row) in paginator.paginated_list().iter().enumerate() {
        println!(
            "   {} {:<8} {:>6}  {}",
            paginator.row_number_label(i),
            row.get("planet"),
            row.get("radius"),
            row.get("rings")
        );
    }
}

fn main() {
    println!("=== TabularData Sorting and Paging Example ===\n");

    let planets = [
        ("Mercury", 2440, false),
        ("Venus", 6052, false),
        ("Earth", 6371, false),
        ("Mars", 3390, false),
        ("Jupiter", 69911, true),
        ("Saturn", 58232, true),
        ("Uranus", 25362, true),
        ("Neptune", 24622, true),
    ];
    let rows: Vec<RowItem> = planets
        .iter()
        .map(|(planet, radius, rings)| {
            RowItem::new()
                .with("planet", *planet)
                .with("radius", *radius)
                .with("rings", *rings)
        })
        .collect();

    let options = TableOptions {
        rows_per_page: 3,
        ..TableOptions::default()
    };
    let mut table = TabularData::new(rows, options).unwrap();

    println!("1. Unsorted:");
    print_page(&table);

    println!("\n2. Sort on planet, then again to reverse:");
    table.sort_on("planet");
    print_page(&table);
    table.sort_on("planet");
    print_page(&table);

    println!("\n3. Sort on radius, then on rings (ties keep radius order):");
    table.sort_on("radius");
    table.sort_on("rings");
    print_page(&table);

    println!("\n4. Navigate:");
    table.goto_next_page();
    print_page(&table);
    table.goto_last_page();
    print_page(&table);
    table.goto_next_page();
    println!("   Next on the last page stays on page {}", table.paginator().current_page());

    println!("\n5. Replace the list:");
    table.replace(vec![
        RowItem::new().with("planet", "Pluto").with("radius", 1188),
        RowItem::new().with("planet", "Ceres").with("radius", 470),
    ]);
    println!("   Sort state after replace: {}", table.sort_state());
    print_page(&table);

    println!("\n=== Example Complete ===");
}
