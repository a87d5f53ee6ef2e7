// Saved-password records and their CSV import/export format - pure logic.

use serde::{Deserialize, Serialize};

pub const CSV_HEADER: &str = "URL,Username,Password";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PasswordEntry {
    pub id: i64,
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Inserts or updates by `(url, username)`. Returns true if a new entry was added.
///
/// `now_ms` seeds the id of a new entry; it is bumped past every existing id
/// so two saves within the same millisecond still get distinct ids.
pub fn upsert(
    entries: &mut Vec<PasswordEntry>,
    url: &str,
    username: &str,
    password: &str,
    now_ms: i64,
) -> bool {
    if let Some(existing) = entries
        .iter_mut()
        .find(|p| p.url == url && p.username == username)
    {
        existing.password = password.to_string();
        return false;
    }

    let max_id = entries.iter().map(|p| p.id).max().unwrap_or(i64::MIN);
    let id = if now_ms > max_id { now_ms } else { max_id + 1 };
    entries.push(PasswordEntry {
        id,
        url: url.to_string(),
        username: username.to_string(),
        password: password.to_string(),
    });
    true
}

/// A row accepted by the CSV reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub url: String,
    pub username: String,
    pub password: String,
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn export_csv(entries: &[PasswordEntry]) -> String {
    let mut out = String::from(CSV_HEADER);
    for entry in entries {
        out.push('\n');
        out.push_str(&quote(&entry.url));
        out.push(',');
        out.push_str(&quote(&entry.username));
        out.push(',');
        out.push_str(&quote(&entry.password));
    }
    out
}

/// Splits one CSV line into fields. Quoted fields may contain commas and
/// doubled quotes; unquoted fields are taken verbatim.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parses exported CSV text. The first line is always treated as the header.
/// Rows missing any of the three fields are skipped, never fatal.
pub fn parse_csv(text: &str) -> Vec<CsvRow> {
    let mut rows = Vec::new();
    for (line_no, line) in text.lines().enumerate().skip(1) {
        let fields = split_fields(line.trim_end_matches('\r'));
        let mut values = fields.iter().map(|f| f.trim());
        match (values.next(), values.next(), values.next()) {
            (Some(url), Some(username), Some(password))
                if !url.is_empty() && !username.is_empty() && !password.is_empty() =>
            {
                rows.push(CsvRow {
                    url: url.to_string(),
                    username: username.to_string(),
                    password: password.to_string(),
                });
            }
            _ => {
                if !line.trim().is_empty() {
                    log::debug!("[Passwords] Skipping incomplete CSV row {}", line_no + 1);
                }
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_overwrites_matching_key() {
        let mut entries = Vec::new();
        assert!(upsert(&mut entries, "https://a.com", "bob", "pw1", 100));
        assert!(!upsert(&mut entries, "https://a.com", "bob", "pw2", 200));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].password, "pw2");
        assert_eq!(entries[0].id, 100);
    }

    #[test]
    fn test_upsert_novel_pair_adds_exactly_one() {
        let mut entries = Vec::new();
        upsert(&mut entries, "https://a.com", "bob", "pw1", 100);
        assert!(upsert(&mut entries, "https://a.com", "alice", "pw1", 100));
        assert_eq!(entries.len(), 2);
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[test]
    fn test_parse_skips_rows_with_missing_fields() {
        let text = "URL,Username,Password\nhttps://a.com,bob,pw1\n,missing,pw2\nhttps://c.com,carol,pw3";
        let rows = parse_csv(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].url, "https://a.com");
        assert_eq!(rows[1].username, "carol");
    }

    #[test]
    fn test_parse_handles_short_rows_and_blank_lines() {
        let text = "URL,Username,Password\r\nhttps://a.com,bob\r\n\r\n https://b.com , eve , s3cret \r\n";
        let rows = parse_csv(text);
        assert_eq!(
            rows,
            vec![CsvRow {
                url: "https://b.com".into(),
                username: "eve".into(),
                password: "s3cret".into(),
            }]
        );
    }

    #[test]
    fn test_export_then_parse_keeps_awkward_fields() {
        let entries = vec![PasswordEntry {
            id: 1,
            url: "https://x.com/login?a=1,b=2".into(),
            username: "mallory".into(),
            password: "pa\"ss,word".into(),
        }];
        let csv = export_csv(&entries);
        assert!(csv.starts_with("URL,Username,Password\n\"https://x.com/login?a=1,b=2\""));

        let rows = parse_csv(&csv);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url, entries[0].url);
        assert_eq!(rows[0].password, entries[0].password);
    }

    #[test]
    fn test_export_empty_is_header_only() {
        assert_eq!(export_csv(&[]), CSV_HEADER);
    }
}
