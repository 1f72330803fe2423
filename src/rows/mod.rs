//! Row iteration.
//!
//! Row-producing operations hand the host a [`RowCursor`]: a pull-based,
//! non-restartable cursor owned by a single consumer. `next()` advances and
//! reports whether a row is available; `column()` reads a cell of the
//! current row.

pub mod headerseach;
pub mod transaction;
pub mod value;

pub use headerseach::HeadersEachCursor;
pub use transaction::TransactionCursor;
pub use value::Value;

use crate::base::neterror::{HttpError, Result};

pub trait RowCursor {
    /// Column names, in index order.
    fn columns(&self) -> &'static [&'static str];

    /// Moves to the next row. Returns `false` once the rows are exhausted;
    /// further calls keep returning `false`.
    fn next(&mut self) -> bool;

    /// Reads column `index` of the current row.
    fn column(&mut self, index: usize) -> Result<Value>;

    /// Identifier of the current row.
    fn rowid(&self) -> Result<i64>;

    /// Reads a column by name.
    fn column_by_name(&mut self, name: &str) -> Result<Value> {
        let index = self
            .columns()
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| HttpError::NoSuchColumn(name.to_string()))?;
        self.column(index)
    }

    /// Drains the cursor, reading every column of every row.
    fn collect_rows(&mut self) -> Result<Vec<Vec<Value>>> {
        let width = self.columns().len();
        let mut rows = Vec::new();
        while self.next() {
            let row = (0..width)
                .map(|i| self.column(i))
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }
        Ok(rows)
    }
}
