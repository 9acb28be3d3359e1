/// Tabulate
///
/// Renders a JSON array of records as a paginated text table.
///
/// Usage: `tabulate [--json] [FILE]` (reads stdin without FILE)
///
/// Environment:
/// - `TABULATE_CONFIG`: path to a JSON options file
/// - `ROWS_PER_PAGE`, `SCHEMA_SAMPLING`: option overrides
/// - `SORT_ON`: comma-separated property names, sorted on in turn
/// - `PAGE`: 1-based page to show
/// - `TABULATE_ACTIONS`: JSON action or array of actions applied last

use std::error::Error;
use std::io::Read;
use tabulardata::{AggregationType, TableAction, TableOptions, TableSnapshot, TabularData};

fn read_input(path: Option<&str>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn load_options() -> Result<TableOptions, Box<dyn Error>> {
    let options = match std::env::var("TABULATE_CONFIG") {
        Ok(path) => {
            log::info!("Loading options from {}", path);
            TableOptions::from_json(&std::fs::read_to_string(path)?)?
        }
        Err(_) => TableOptions::default(),
    };
    Ok(options.with_env(|key| std::env::var(key).ok())?)
}

fn print_table(snapshot: &TableSnapshot) {
    println!("Columns:");
    for column in &snapshot.columns {
        println!(
            "  {:>2}  {:<24} {:<16} {}",
            column.index_order,
            column.property_name,
            column.property_type.as_str(),
            if column.enabled { "" } else { "(disabled)" }
        );
    }
    println!();

    let gutter = snapshot
        .rows
        .iter()
        .map(|r| r.row_number_label.len())
        .max()
        .unwrap_or(1);
    let columns: Vec<_> = snapshot.columns.iter().filter(|c| c.enabled).collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            snapshot
                .rows
                .iter()
                .map(|r| r.cells.get(i).map_or(0, |c| c.value.to_string().chars().count()))
                .chain(std::iter::once(column.label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c.label, w = *w))
        .collect();
    println!("{:>gutter$} | {}", "#", header.join(" | "), gutter = gutter);

    for row in &snapshot.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell.value.to_string(), w = *w))
            .collect();
        println!("{} | {}", row.row_number_label, cells.join(" | "));
    }

    let page = &snapshot.page;
    println!();
    println!(
        "Items {}-{} of {} (page {} of {})",
        page.first_item_on_page,
        page.last_item_on_page,
        page.total_number_of_items,
        page.current_page,
        page.total_number_of_pages
    );

    println!();
    let aggregation_types: Vec<_> = if snapshot.display_all_aggregations {
        AggregationType::ALL.to_vec()
    } else {
        vec![snapshot.aggregation_type]
    };
    for aggregation_type in aggregation_types {
        let values = snapshot.aggregates.values(aggregation_type);
        if values.is_empty() {
            continue;
        }
        let line: Vec<String> = values.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        println!("{:<6} {}", aggregation_type, line.join(", "));
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let as_json = args.iter().any(|a| a == "--json");
    let path = args.iter().find(|a| !a.starts_with("--")).map(String::as_str);

    let options = load_options()?;
    let input = read_input(path)?;
    let mut table = TabularData::from_json(&input, options)?;

    if let Ok(sort_on) = std::env::var("SORT_ON") {
        for property_name in sort_on.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            table.sort_on(property_name);
        }
    }

    if let Ok(page) = std::env::var("PAGE") {
        let page: usize = page.trim().parse()?;
        table.set_current_page(page)?;
    }

    if let Ok(actions) = std::env::var("TABULATE_ACTIONS") {
        for action in TableAction::parse_many(&actions)? {
            table.apply(&action)?;
        }
    }

    let snapshot = table.snapshot();
    if as_json {
        println!("{}", snapshot.to_json()?);
    } else {
        print_table(&snapshot);
    }

    Ok(())
}
