use crate::base::neterror::{HttpError, Result};
use crate::http::TransactionResult;
use crate::rows::{RowCursor, Value};

/// Columns of the transaction row.
pub const TRANSACTION_COLUMNS: &[&str] = &[
    "request_url",
    "request_method",
    "request_headers",
    "request_cookies",
    "request_body",
    "response_status",
    "response_status_code",
    "response_headers",
    "response_cookies",
    "response_body",
    "remote_address",
    "timings",
    "meta",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    OnRow,
    Done,
}

/// Exactly one row describing a transaction. Response columns are null
/// when the exchange failed; `meta` then carries the error.
#[derive(Debug)]
pub struct TransactionCursor {
    result: TransactionResult,
    position: Position,
}

impl TransactionCursor {
    pub fn new(result: TransactionResult) -> Self {
        Self {
            result,
            position: Position::BeforeFirst,
        }
    }

    pub fn result(&self) -> &TransactionResult {
        &self.result
    }
}

impl RowCursor for TransactionCursor {
    fn columns(&self) -> &'static [&'static str] {
        TRANSACTION_COLUMNS
    }

    fn next(&mut self) -> bool {
        self.position = match self.position {
            Position::BeforeFirst => Position::OnRow,
            Position::OnRow | Position::Done => Position::Done,
        };
        self.position == Position::OnRow
    }

    fn column(&mut self, index: usize) -> Result<Value> {
        if self.position != Position::OnRow {
            return Err(HttpError::CursorNotPositioned);
        }
        let r = &mut self.result;
        let value = match index {
            0 => Value::from(r.request_url()),
            1 => Value::from(r.request_method()),
            2 => Value::from(r.request_headers()),
            3 => Value::from(r.request_cookies()),
            4 => Value::from(r.request_body()),
            5 => Value::from(r.response_status()),
            6 => Value::from(r.response_status_code()),
            7 => Value::from(r.response_headers()),
            8 => Value::from(r.response_cookies()),
            9 => Value::from(r.response_body()?),
            10 => Value::from(r.remote_address()),
            11 => Value::from(r.timings_json()),
            12 => Value::from(r.meta()),
            _ => return Err(HttpError::NoSuchColumn(index.to_string())),
        };
        Ok(value)
    }

    fn rowid(&self) -> Result<i64> {
        match self.position {
            Position::OnRow => Ok(0),
            _ => Err(HttpError::CursorNotPositioned),
        }
    }
}
