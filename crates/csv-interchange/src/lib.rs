//! CSV interchange for user records.
//!
//! The format is a header row `id,name,email` followed by one row per record.
//! Fields containing a comma, quote, carriage return or newline are quoted
//! with inner quotes doubled, so `decode(&encode(records)) == records` for any
//! record set.
//!
//! Decoding is lenient: blank rows and malformed rows (unterminated quote,
//! non-integer id) are skipped, missing columns default to `0` / `""`.

mod parse;

use record_store_client::Record;
use tracing::debug;

pub use parse::CsvRow;

/// Header written by [`encode`].
pub const HEADER: &str = "id,name,email";

/// Serialize records, one row per record, in the order given.
pub fn encode(records: &[Record]) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + records.len() * 32);
    out.push_str(HEADER);
    out.push('\n');

    for record in records {
        out.push_str(&record.id.to_string());
        out.push(',');
        push_field(&mut out, &record.name);
        out.push(',');
        push_field(&mut out, &record.email);
        out.push('\n');
    }

    out
}

/// Parse records out of CSV text, skipping blank and malformed rows.
pub fn decode(text: &str) -> Vec<Record> {
    decode_rows(text).into_iter().map(|row| row.record).collect()
}

/// Like [`decode`], keeping the line each record started on.
pub fn decode_rows(text: &str) -> Vec<CsvRow> {
    let rows = parse::parse(text);
    debug!(rows = rows.len(), "Decoded CSV");
    rows
}

fn push_field(out: &mut String, value: &str) {
    if needs_quoting(value) {
        out.push('"');
        for c in value.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(value);
    }
}

fn needs_quoting(value: &str) -> bool {
    value.contains([',', '"', '\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tricky_records() -> Vec<Record> {
        vec![
            Record::new(1, "Doe, Jane", "jane@x.com"),
            Record::new(2, r#"The "Boss""#, "boss@x.com"),
            Record::new(3, "Line\nBreak", "lb@x.com"),
            Record::new(4, "  padded  ", "pad@x.com"),
            Record::new(5, "\"", "q@x.com"),
            Record::new(6, "Crlf\r\nName", "weird,\"mail\"@x.com"),
        ]
    }

    #[test]
    fn encode_writes_header_and_rows() {
        let text = encode(&[Record::new(1, "Ann", "ann@x.com")]);
        assert_eq!(text, "id,name,email\n1,Ann,ann@x.com\n");
    }

    #[test]
    fn encode_quotes_special_characters() {
        let text = encode(&[Record::new(2, r#"Doe, "JD""#, "jd@x.com")]);
        assert_eq!(text, "id,name,email\n2,\"Doe, \"\"JD\"\"\",jd@x.com\n");
    }

    #[test]
    fn round_trip_preserves_special_characters() {
        let records = tricky_records();
        assert_eq!(decode(&encode(&records)), records);
    }

    /// Field values that sit on a quoting or line-break boundary.
    const AWKWARD_FIELDS: &[&str] = &[
        "",
        " ",
        "\"",
        "\"\"",
        ",",
        ",,",
        "  lead",
        "trail  ",
        "\r",
        "\n",
        "\r\n",
        "a\rb",
        "\n\n",
        "\"quoted\"",
        "x\"",
        "\"x",
        "id",
        "name,email",
        "Émile 😀",
        "tab\there",
    ];

    #[test]
    fn round_trip_table() {
        let cases: Vec<(&str, Vec<Record>)> = vec![
            ("single plain", vec![Record::new(1, "Ann", "ann@x.com")]),
            ("empty name and email", vec![Record::new(1, "", "")]),
            ("zero id", vec![Record::new(0, "Zero", "z@x.com")]),
            ("max id", vec![Record::new(u64::MAX, "Max", "m@x.com")]),
            ("only a quote", vec![Record::new(2, "\"", "\"")]),
            ("only a comma", vec![Record::new(3, ",", ",")]),
            ("only spaces", vec![Record::new(4, "   ", " ")]),
            ("cr only", vec![Record::new(5, "a\rb", "\r")]),
            ("header lookalike", vec![Record::new(6, "name", "email")]),
            (
                "blank-looking rows between real ones",
                vec![
                    Record::new(7, "", ""),
                    Record::new(8, "\n", "\r\n"),
                    Record::new(9, "  ", ""),
                ],
            ),
        ];

        for (label, records) in cases {
            assert_eq!(decode(&encode(&records)), records, "case: {label}");
        }
    }

    #[test]
    fn round_trip_every_pair_of_awkward_fields() {
        let records: Vec<Record> = AWKWARD_FIELDS
            .iter()
            .flat_map(|name| AWKWARD_FIELDS.iter().map(move |email| (*name, *email)))
            .enumerate()
            .map(|(i, (name, email))| Record::new(i as u64, name, email))
            .collect();

        assert_eq!(decode(&encode(&records)), records);
        for record in &records {
            let single = vec![record.clone()];
            assert_eq!(decode(&encode(&single)), single, "record {record:?}");
        }
    }

    #[test]
    fn round_trip_empty_set() {
        assert_eq!(decode(&encode(&[])), Vec::<Record>::new());
    }

    #[test]
    fn encode_is_order_preserving() {
        let records = vec![
            Record::new(9, "Zed", "z@x.com"),
            Record::new(1, "Ann", "a@x.com"),
        ];
        let ids: Vec<_> = decode(&encode(&records)).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![9, 1]);
    }
}
