use crate::model::issue::Issue;
use crate::model::table::IssueTable;

use super::csv_parser::{COL_BLOCKS, COL_EPIC_NAME, COL_ID, COL_LEVEL, COL_PARENT_ID, COL_SUMMARY};

const HEADER: [&str; 6] = [
    COL_ID,
    COL_LEVEL,
    COL_SUMMARY,
    COL_EPIC_NAME,
    COL_PARENT_ID,
    COL_BLOCKS,
];

/// Serialize the table as CSV: a header row, then one line per issue in
/// table order. Blocks are `;`-joined. Lines end with `\n`.
pub fn serialize_csv(table: &IssueTable) -> String {
    let mut out = String::new();
    write_row(&mut out, HEADER.iter().copied());
    for issue in table {
        write_issue(&mut out, issue);
    }
    out
}

fn write_issue(out: &mut String, issue: &Issue) {
    let blocks = issue.blocks_joined();
    write_row(
        out,
        [
            issue.id.as_str(),
            issue.level.name(),
            issue.summary.as_str(),
            issue.epic_name.as_str(),
            issue.parent_id.as_str(),
            blocks.as_str(),
        ],
    );
}

fn write_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field));
    }
    out.push('\n');
}

/// Quote a field if it contains a delimiter, quote or line break.
pub fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}
