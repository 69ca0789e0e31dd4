use serde::Deserialize;
use serde_json::Value;

use crate::error::TableError;

/// Raw provider payload: parallel column names and positional rows.
#[derive(Debug, Clone, Deserialize)]
pub struct TabularResponse {
    pub fields: Vec<String>,
    pub items: Vec<Vec<Value>>,
}

/// Named-column view over a provider response.
///
/// Every extraction downstream of the provider client goes through
/// column-name lookup on this type; positional indices never leave this
/// module. A provider reordering columns between operations therefore
/// cannot silently misalign values.
#[derive(Debug, Clone, Default)]
pub struct Table {
    fields: Vec<String>,
    items: Vec<Vec<Value>>,
}

impl Table {
    /// Validate and wrap a raw payload. Rejects ragged rows and duplicate
    /// column names.
    pub fn from_response(response: TabularResponse) -> Result<Self, TableError> {
        for (left, name) in response.fields.iter().enumerate() {
            if response.fields[..left].iter().any(|other| other == name) {
                return Err(TableError::DuplicateColumn { name: name.clone() });
            }
        }

        for (row, values) in response.items.iter().enumerate() {
            if values.len() != response.fields.len() {
                return Err(TableError::RowWidthMismatch {
                    row,
                    expected: response.fields.len(),
                    actual: values.len(),
                });
            }
        }

        Ok(Self {
            fields: response.fields,
            items: response.items,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.items.len()).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.items.len()).map(move |index| Row { table: self, index })
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field == name)
    }
}

/// One positional row, read through named-column accessors.
///
/// An absent column, a null cell, or a cell that does not carry the
/// requested type all read as `None`. Missing data is a degradation, not
/// an error, at this layer.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    fn cell(&self, name: &str) -> Option<&'a Value> {
        let column = self.table.column_index(name)?;
        self.table.items[self.index].get(column)
    }

    /// Numeric cell. The provider emits numbers both as JSON numbers and
    /// as numeric strings, so both are accepted. NaN and infinities read
    /// as `None`.
    pub fn f64(&self, name: &str) -> Option<f64> {
        let value = match self.cell(name)? {
            Value::Number(number) => number.as_f64()?,
            Value::String(text) => text.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    /// String cell. Empty and whitespace-only strings read as `None`.
    pub fn str(&self, name: &str) -> Option<&'a str> {
        let text = self.cell(name)?.as_str()?.trim();
        (!text.is_empty()).then_some(text)
    }
}
