//! Row tokenizer and column mapping.

use record_store_client::{Record, RecordId};
use tracing::warn;

/// A decoded record together with the 1-based line its row started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub record: Record,
}

/// One tokenized row before column mapping.
#[derive(Debug, Default)]
struct RawRow {
    line: usize,
    fields: Vec<String>,
    malformed: bool,
}

impl RawRow {
    fn is_blank(&self) -> bool {
        self.fields.iter().all(|field| field.trim().is_empty())
    }
}

/// Column positions for id, name and email.
#[derive(Debug, Clone, Copy)]
struct Columns {
    id: Option<usize>,
    name: Option<usize>,
    email: Option<usize>,
}

impl Columns {
    const POSITIONAL: Columns = Columns {
        id: Some(0),
        name: Some(1),
        email: Some(2),
    };

    /// Read a header row; `None` when the row names none of the known columns.
    fn from_header(fields: &[String]) -> Option<Columns> {
        let position = |wanted: &str| {
            fields
                .iter()
                .position(|field| field.trim().eq_ignore_ascii_case(wanted))
        };
        let columns = Columns {
            id: position("id"),
            name: position("name"),
            email: position("email"),
        };
        if columns.id.is_none() && columns.name.is_none() && columns.email.is_none() {
            None
        } else {
            Some(columns)
        }
    }
}

pub(crate) fn parse(text: &str) -> Vec<CsvRow> {
    let mut columns = None;
    let mut rows = Vec::new();

    for raw in tokenize(text) {
        if raw.is_blank() {
            continue;
        }
        if raw.malformed {
            warn!(line = raw.line, "Skipping malformed CSV row");
            continue;
        }

        let columns = match columns {
            Some(columns) => columns,
            None => match Columns::from_header(&raw.fields) {
                Some(header) => {
                    columns = Some(header);
                    continue;
                }
                None => *columns.insert(Columns::POSITIONAL),
            },
        };

        match to_record(&raw, columns) {
            Some(record) => rows.push(CsvRow {
                line: raw.line,
                record,
            }),
            None => warn!(line = raw.line, "Skipping CSV row with invalid id"),
        }
    }

    rows
}

fn to_record(raw: &RawRow, columns: Columns) -> Option<Record> {
    let column = |index: Option<usize>| {
        index
            .and_then(|i| raw.fields.get(i))
            .cloned()
            .unwrap_or_default()
    };

    let id_text = column(columns.id);
    let id = match id_text.trim() {
        "" => 0,
        trimmed => trimmed.parse::<RecordId>().ok()?,
    };

    Some(Record {
        id,
        name: column(columns.name),
        email: column(columns.email),
    })
}

fn tokenize(text: &str) -> Vec<RawRow> {
    let mut rows = Vec::new();
    let mut chars = text.chars().peekable();

    let mut line = 1;
    let mut row = RawRow {
        line,
        ..Default::default()
    };
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            ',' => {
                row.fields.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                line += 1;
                row.fields.push(std::mem::take(&mut field));
                quoted = false;
                rows.push(std::mem::replace(
                    &mut row,
                    RawRow {
                        line,
                        ..Default::default()
                    },
                ));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        row.malformed = true;
    }
    if in_quotes || quoted || !field.is_empty() || !row.fields.is_empty() {
        row.fields.push(field);
        rows.push(row);
    }

    rows
}
