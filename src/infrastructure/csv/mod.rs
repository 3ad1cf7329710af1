// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV file parsing for spreadsheet imports

mod csv_parser;

pub use csv_parser::CsvParser;
