use crate::model::issue::{Level, RawIssue};

/// Error type for CSV import
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CsvError {
    #[error("CSV is empty: expected a header row")]
    Empty,
    #[error("CSV is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
    #[error("line {line}: unknown level '{value}'")]
    InvalidLevel { line: usize, value: String },
}

pub const COL_ID: &str = "ID";
pub const COL_LEVEL: &str = "Level";
pub const COL_SUMMARY: &str = "Summary";
pub const COL_EPIC_NAME: &str = "Epic Name";
pub const COL_PARENT_ID: &str = "Parent ID";
pub const COL_BLOCKS: &str = "Blocks";

/// A CSV record and the 1-based line it starts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Split CSV text into records.
///
/// Handles quoted fields with `""` escapes and embedded commas or newlines,
/// CRLF line endings, and a leading UTF-8 BOM. Blank lines are skipped.
pub fn parse_records(text: &str) -> Result<Vec<Record>, CsvError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut fields), record_line);
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: record_line });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        push_record(&mut records, fields, record_line);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<Record>, fields: Vec<String>, line: usize) {
    let blank = fields.len() == 1 && fields[0].trim().is_empty();
    if !blank {
        records.push(Record { line, fields });
    }
}

/// Column positions resolved from the header row
#[derive(Debug)]
struct Columns {
    id: usize,
    level: usize,
    summary: usize,
    epic_name: Option<usize>,
    parent_id: Option<usize>,
    blocks: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, CsvError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &'static str| find(name).ok_or(CsvError::MissingColumn(name));
        Ok(Columns {
            id: require(COL_ID)?,
            level: require(COL_LEVEL)?,
            summary: require(COL_SUMMARY)?,
            epic_name: find(COL_EPIC_NAME),
            parent_id: find(COL_PARENT_ID),
            blocks: find(COL_BLOCKS),
        })
    }
}

/// Parse an issue CSV into raw rows.
///
/// Requires `ID`, `Level` and `Summary` columns; `Epic Name`, `Parent ID` and
/// `Blocks` are optional. Header names are matched case-insensitively and
/// extra columns are ignored. Rows are returned un-normalized.
pub fn parse_csv(text: &str) -> Result<Vec<RawIssue>, CsvError> {
    let mut records = parse_records(text)?.into_iter();
    let header = records.next().ok_or(CsvError::Empty)?;
    let cols = Columns::from_header(&header.fields)?;

    let mut rows = Vec::new();
    for record in records {
        let get = |idx: usize| record.fields.get(idx).cloned().unwrap_or_default();
        let opt = |idx: Option<usize>| idx.map(&get);

        let id = get(cols.id);
        let level_text = get(cols.level);
        let level = match level_text.parse::<Level>() {
            Ok(level) => level,
            // ID-less rows are dropped by normalize, so their level is irrelevant
            Err(_) if id.trim().is_empty() => continue,
            Err(_) => {
                return Err(CsvError::InvalidLevel {
                    line: record.line,
                    value: level_text.trim().to_string(),
                });
            }
        };

        rows.push(RawIssue {
            id,
            level,
            summary: get(cols.summary),
            epic_name: opt(cols.epic_name),
            parent_id: opt(cols.parent_id),
            blocks: opt(cols.blocks),
        });
    }

    tracing::debug!(rows = rows.len(), "parsed issue csv");
    Ok(rows)
}
