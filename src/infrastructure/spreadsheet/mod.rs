mod reader;
mod writer;

pub use reader::{SpreadsheetReader, SpreadsheetSource};
pub use writer::{write_workbook, SheetCell};
