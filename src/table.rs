//! In-memory feature table
//!
//! Named columns over rows of typed cells, with CSV read/write. Output is
//! deterministic: column order is insertion order and floats use the shortest
//! round-trip representation.

use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::{PlayCallError, Result};

/// A single cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn flag(b: bool) -> Self {
        Value::Int(i64::from(b))
    }

    pub fn opt_flag(b: Option<bool>) -> Self {
        b.map_or(Value::Missing, Value::flag)
    }

    pub fn opt_int<T: Into<i64>>(v: Option<T>) -> Self {
        v.map_or(Value::Missing, |x| Value::Int(x.into()))
    }

    /// Non-finite values are stored as missing
    pub fn float(x: f64) -> Self {
        if x.is_finite() {
            Value::Float(x)
        } else {
            Value::Missing
        }
    }

    pub fn opt_float(v: Option<f64>) -> Self {
        v.map_or(Value::Missing, Value::float)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(x) if x.fract() == 0.0 => Some(*x as i64),
            _ => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            Value::Missing
        } else if let Ok(i) = cell.parse::<i64>() {
            Value::Int(i)
        } else if let Ok(x) = cell.parse::<f64>() {
            Value::float(x)
        } else {
            Value::Text(cell.to_string())
        }
    }
}

/// Rows of cells under named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>) -> Self {
        FeatureTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PlayCallError::Shape(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PlayCallError::MissingColumn {
                table: "features".to_string(),
                column: name.to_string(),
            })
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Cell at (row, column name)
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// New table with the given columns in the given order
    pub fn select(&self, names: &[String]) -> Result<FeatureTable> {
        let indices = names
            .iter()
            .map(|n| self.require_column(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureTable {
            columns: names.to_vec(),
            rows: self
                .rows
                .iter()
                .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// New table keeping rows for which `keep` returns true
    pub fn filter_rows<F>(&self, keep: F) -> FeatureTable
    where
        F: Fn(&[Value]) -> bool,
    {
        FeatureTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Replace missing cells with `value`, skipping the listed columns
    pub fn fill_missing(&mut self, value: &Value, except: &[&str]) {
        let skip: Vec<bool> = self
            .columns
            .iter()
            .map(|c| except.contains(&c.as_str()))
            .collect();
        for row in &mut self.rows {
            for (cell, &skip) in row.iter_mut().zip(&skip) {
                if !skip && cell.is_missing() {
                    *cell = value.clone();
                }
            }
        }
    }

    pub fn write_csv<W: Write>(&self, sink: W) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(sink);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(Value::render))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }

    pub fn read_csv<R: Read>(source: R) -> Result<FeatureTable> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut table = FeatureTable::new(columns);
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(Value::parse).collect())?;
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<FeatureTable> {
        if !path.exists() {
            return Err(PlayCallError::MissingTable(path.display().to_string()));
        }
        FeatureTable::read_csv(std::fs::File::open(path)?)
    }
}
