use crate::base::neterror::{HttpError, Result};
use crate::http::headers::HeaderSet;
use crate::rows::{RowCursor, Value};

pub const HEADERS_EACH_COLUMNS: &[&str] = &["key", "value"];

/// One row per (key, value) pair of a header block, in the block's
/// natural order, optionally restricted to a single key.
///
/// The position is a pair of indices: the key, then the value within that
/// key.
#[derive(Debug)]
pub struct HeadersEachCursor {
    entries: Vec<(String, Vec<String>)>,
    key_index: usize,
    value_index: usize,
    started: bool,
    done: bool,
    rowid: i64,
}

impl HeadersEachCursor {
    pub fn new(headers: &HeaderSet, only_key: Option<&str>) -> Self {
        let entries = (0..headers.key_count())
            .filter_map(|i| headers.entry(i))
            .filter(|(key, _)| only_key.map_or(true, |only| key.eq_ignore_ascii_case(only)))
            .map(|(key, values)| (key.to_string(), values.to_vec()))
            .collect();
        Self {
            entries,
            key_index: 0,
            value_index: 0,
            started: false,
            done: false,
            rowid: -1,
        }
    }

    /// Parses `wire` tolerantly and enumerates it.
    pub fn parse(wire: &str, only_key: Option<&str>) -> Self {
        Self::new(&HeaderSet::parse(wire), only_key)
    }

    fn current(&self) -> Result<(&str, &str)> {
        if !self.started || self.done {
            return Err(HttpError::CursorNotPositioned);
        }
        self.entries
            .get(self.key_index)
            .and_then(|(k, vs)| vs.get(self.value_index).map(|v| (k.as_str(), v.as_str())))
            .ok_or(HttpError::CursorNotPositioned)
    }
}

impl RowCursor for HeadersEachCursor {
    fn columns(&self) -> &'static [&'static str] {
        HEADERS_EACH_COLUMNS
    }

    fn next(&mut self) -> bool {
        if self.done {
            return false;
        }
        if self.started {
            self.value_index += 1;
        } else {
            self.started = true;
        }
        while let Some((_, values)) = self.entries.get(self.key_index) {
            if self.value_index < values.len() {
                self.rowid += 1;
                return true;
            }
            self.key_index += 1;
            self.value_index = 0;
        }
        self.done = true;
        false
    }

    fn column(&mut self, index: usize) -> Result<Value> {
        let (key, value) = self.current()?;
        match index {
            0 => Ok(Value::from(key)),
            1 => Ok(Value::from(value)),
            _ => Err(HttpError::NoSuchColumn(index.to_string())),
        }
    }

    fn rowid(&self) -> Result<i64> {
        self.current().map(|_| self.rowid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(cursor: &mut HeadersEachCursor) -> Vec<(String, String)> {
        cursor
            .collect_rows()
            .unwrap()
            .into_iter()
            .map(|row| (row[0].to_string(), row[1].to_string()))
            .collect()
    }

    fn owned(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_enumerates_in_order() {
        let mut cursor = HeadersEachCursor::parse("A: 1\r\nA: 2\r\nB: 3\r\n\r\n", None);
        assert_eq!(pairs(&mut cursor), owned(&[("A", "1"), ("A", "2"), ("B", "3")]));
    }

    #[test]
    fn test_only_key() {
        let mut cursor = HeadersEachCursor::parse("A: 1\r\nB: 2\r\nA: 3\r\n", Some("a"));
        assert_eq!(pairs(&mut cursor), owned(&[("A", "1"), ("A", "3")]));

        let mut cursor = HeadersEachCursor::parse("A: 1\r\n", Some("Missing"));
        assert!(pairs(&mut cursor).is_empty());
    }

    #[test]
    fn test_empty_block() {
        let mut cursor = HeadersEachCursor::parse("", None);
        assert!(!cursor.next());
        assert!(!cursor.next());
    }

    #[test]
    fn test_column_before_next() {
        let mut cursor = HeadersEachCursor::parse("A: 1\r\n", None);
        assert_eq!(cursor.column(0), Err(HttpError::CursorNotPositioned));
        assert!(cursor.rowid().is_err());
    }

    #[test]
    fn test_rowids_count_up() {
        let mut cursor = HeadersEachCursor::parse("A: 1\r\nB: 2\r\nB: 3\r\n", None);
        let mut ids = Vec::new();
        while cursor.next() {
            ids.push(cursor.rowid().unwrap());
        }
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(cursor.column(0).is_err());
    }

    #[test]
    fn test_column_by_name() {
        let mut cursor = HeadersEachCursor::parse("X-Id: 9\r\n", None);
        assert!(cursor.next());
        assert_eq!(cursor.column_by_name("value").unwrap(), Value::from("9"));
        assert!(matches!(
            cursor.column_by_name("nope"),
            Err(HttpError::NoSuchColumn(_))
        ));
    }
}
