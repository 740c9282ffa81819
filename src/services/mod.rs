pub mod spreadsheet;

pub use spreadsheet::{parse_workbook, SheetError, SheetTable};
