use std::path::Path;

use rusqlite::{Connection, OpenFlags, Row, params};

use crate::report::error::Result;
use crate::report::record::Record;
use crate::source::{DATE_FORMAT, DateRange, RecordSource};

const SELECT_NOTES: &str = "SELECT What_I_accomplished_at_work, One_thing_I_Learnt, \
     Plan_for_the_next_2_weeks, Support_at_school_or_shifu_or_at_work, Insight, Blog_Url \
     FROM Notes_notes WHERE DATE(Created_date) BETWEEN ?1 AND ?2";

/// Status records stored in the `Notes_notes` table of a SQLite database.
#[derive(Debug)]
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open an existing database read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wrap an already open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl RecordSource for SqliteSource {
    fn fetch(&self, range: &DateRange) -> Result<Vec<Record>> {
        let from = range.from().format(DATE_FORMAT).to_string();
        let to = range.to().format(DATE_FORMAT).to_string();

        let mut stmt = self.conn.prepare(SELECT_NOTES)?;
        let rows = stmt.query_map(params![from, to], read_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        log::debug!("fetched {} record(s) between {} and {}", records.len(), from, to);
        Ok(records)
    }
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        accomplishment: text_column(row, 0)?,
        learning: text_column(row, 1)?,
        plan: text_column(row, 2)?,
        support: text_column(row, 3)?,
        insight: text_column(row, 4)?,
        blog: text_column(row, 5)?,
    })
}

/// A text column, with `NULL` read as an empty string.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}
