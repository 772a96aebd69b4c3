pub mod csv_parser;
pub mod csv_serializer;

pub use csv_parser::{parse_csv, parse_records, CsvError};
pub use csv_serializer::serialize_csv;
