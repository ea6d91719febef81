//! Column lookup and cell decoding for the CSV input tables
//!
//! Headers are resolved once per file. A required column that is absent fails the
//! whole load; individual empty cells decode to `None`.

use std::collections::HashMap;

use csv::StringRecord;

use crate::{PlayCallError, Result};

/// Cell values that mean "missing" in exported tables
const MISSING_MARKERS: [&str; 4] = ["", "NA", "NaN", "null"];

/// Header name -> position for one table
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    table: String,
    index: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn from_headers(table: &str, headers: &StringRecord) -> Self {
        let mut index = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            // First occurrence wins on duplicate headers
            index.entry(h.trim().to_string()).or_insert(i);
        }
        ColumnIndex {
            table: table.to_string(),
            index,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Position of a column the table cannot be used without
    pub fn require(&self, name: &str) -> Result<usize> {
        self.optional(name)
            .ok_or_else(|| PlayCallError::MissingColumn {
                table: self.table.clone(),
                column: name.to_string(),
            })
    }

    /// Position of the first present column among aliases
    pub fn require_any(&self, names: &[&str]) -> Result<usize> {
        names
            .iter()
            .find_map(|n| self.optional(n))
            .ok_or_else(|| PlayCallError::MissingColumn {
                table: self.table.clone(),
                column: names.join("|"),
            })
    }

    pub fn optional(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Check a full column list up front so the error names the first gap
    pub fn require_all(&self, names: &[&str]) -> Result<()> {
        for name in names {
            self.require(name)?;
        }
        Ok(())
    }
}

/// One decoded CSV line with typed accessors
pub struct Row<'a> {
    table: &'a str,
    line: usize,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    pub fn new(table: &'a str, line: usize, record: &'a StringRecord) -> Self {
        Row {
            table,
            line,
            record,
        }
    }

    fn parse_error(&self, message: String) -> PlayCallError {
        PlayCallError::Parse {
            table: self.table.to_string(),
            row: self.line,
            message,
        }
    }

    /// Raw text, `None` for missing markers or an absent column
    pub fn text(&self, idx: Option<usize>) -> Option<&'a str> {
        let value = self.record.get(idx?)?.trim();
        if MISSING_MARKERS.contains(&value) {
            None
        } else {
            Some(value)
        }
    }

    pub fn float(&self, idx: Option<usize>) -> Result<Option<f64>> {
        match self.text(idx) {
            None => Ok(None),
            Some(v) => v
                .parse::<f64>()
                .map(|x| if x.is_nan() { None } else { Some(x) })
                .map_err(|_| self.parse_error(format!("invalid number '{}'", v))),
        }
    }

    /// Integer cell; exports often write integers as `3.0`
    pub fn int<T: TryFrom<i64>>(&self, idx: Option<usize>) -> Result<Option<T>> {
        let Some(x) = self.float(idx)? else {
            return Ok(None);
        };
        if x.fract() != 0.0 {
            return Err(self.parse_error(format!("expected integer, got {}", x)));
        }
        T::try_from(x as i64)
            .map(Some)
            .map_err(|_| self.parse_error(format!("integer {} out of range", x)))
    }

    pub fn flag(&self, idx: Option<usize>) -> Result<Option<bool>> {
        match self.text(idx) {
            None => Ok(None),
            Some(v) => match v.to_lowercase().as_str() {
                "1" | "1.0" | "true" | "t" | "yes" => Ok(Some(true)),
                "0" | "0.0" | "false" | "f" | "no" => Ok(Some(false)),
                _ => Err(self.parse_error(format!("invalid flag '{}'", v))),
            },
        }
    }

    /// Counting stat where a blank cell means zero
    pub fn count(&self, idx: Option<usize>) -> Result<f64> {
        Ok(self.float(idx)?.unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    #[test]
    fn test_require_missing_column() {
        let index = ColumnIndex::from_headers("pbp", &headers(&["game_id", "play_id"]));
        assert_eq!(index.require("play_id").unwrap(), 1);

        match index.require("down") {
            Err(PlayCallError::MissingColumn { table, column }) => {
                assert_eq!(table, "pbp");
                assert_eq!(column, "down");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_require_any_alias() {
        let index = ColumnIndex::from_headers("participation", &headers(&["game_id", "play_id"]));
        assert_eq!(index.require_any(&["nflverse_game_id", "game_id"]).unwrap(), 0);
        assert!(index.require_any(&["recent_team", "team"]).is_err());
    }

    #[test]
    fn test_cell_decoding() {
        let record = StringRecord::from(vec!["3.0", "", "NA", "1", "abc", "2.5"]);
        let row = Row::new("pbp", 2, &record);

        assert_eq!(row.int::<u8>(Some(0)).unwrap(), Some(3));
        assert_eq!(row.int::<u8>(Some(1)).unwrap(), None);
        assert_eq!(row.float(Some(2)).unwrap(), None);
        assert_eq!(row.flag(Some(3)).unwrap(), Some(true));
        assert!(row.float(Some(4)).is_err());
        assert!(row.int::<u8>(Some(5)).is_err());
        assert_eq!(row.count(Some(1)).unwrap(), 0.0);
        assert_eq!(row.text(None), None);
    }

    #[test]
    fn test_int_out_of_range() {
        let record = StringRecord::from(vec!["-4"]);
        let row = Row::new("pbp", 2, &record);
        assert!(row.int::<u8>(Some(0)).is_err());
        assert_eq!(row.int::<i32>(Some(0)).unwrap(), Some(-4));
    }
}
