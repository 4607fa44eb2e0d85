use std::sync::Arc;

use quiver_error::{QuiverResult, quiver_bail};

use crate::{ArrayRef, SchemaRef};

/// A fixed number of rows of columnar data sharing one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    schema: SchemaRef,
    num_rows: usize,
    columns: Vec<ArrayRef>,
}

impl RecordBatch {
    /// Create a batch, validating that there is one column per field, that every column has
    /// `num_rows` values and that each column's type matches its field.
    pub fn try_new(schema: SchemaRef, num_rows: usize, columns: Vec<ArrayRef>) -> QuiverResult<Self> {
        if schema.len() != columns.len() {
            quiver_bail!(
                "schema has {} fields but {} columns were given",
                schema.len(),
                columns.len()
            )
        }
        for (field, column) in schema.fields().iter().zip(columns.iter()) {
            if column.len() != num_rows {
                quiver_bail!(
                    "column {} has {} rows, expected {}",
                    field.name(),
                    column.len(),
                    num_rows
                )
            }
            if column.dtype() != field.dtype() {
                quiver_bail!(
                    "column {} has type {}, expected {}",
                    field.name(),
                    column.dtype(),
                    field.dtype()
                )
            }
        }
        Ok(Self {
            schema,
            num_rows,
            columns,
        })
    }

    /// Create a batch from a schema and columns, taking the row count from the first column.
    pub fn try_from_columns(schema: impl Into<SchemaRef>, columns: Vec<ArrayRef>) -> QuiverResult<Self> {
        let num_rows = columns.first().map_or(0, |c| c.len());
        Self::try_new(schema.into(), num_rows, columns)
    }

    /// The batch's schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The number of rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// The number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// The columns in schema order.
    pub fn columns(&self) -> &[ArrayRef] {
        &self.columns
    }

    /// The column at `index`.
    pub fn column(&self, index: usize) -> Option<&ArrayRef> {
        self.columns.get(index)
    }

    /// A zero-copy window of `len` rows starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> QuiverResult<Self> {
        if offset.saturating_add(len) > self.num_rows {
            quiver_bail!(OutOfBounds: offset.saturating_add(len), 0, self.num_rows)
        }
        let columns = self
            .columns
            .iter()
            .map(|c| c.slice(offset, len).map(Arc::new))
            .collect::<QuiverResult<Vec<_>>>()?;
        Ok(Self {
            schema: self.schema.clone(),
            num_rows: len,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{ArrayData, DType, Field, PType, Schema};

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::nullable("a", DType::Primitive(PType::I32)),
            Field::nullable("b", DType::Utf8),
        ]))
    }

    #[test]
    fn conformance() {
        let a: ArrayRef = Arc::new(ArrayData::from_values([1i32, 2, 3]));
        let b: ArrayRef = Arc::new(ArrayData::from_utf8([Some("x"), None, Some("z")]));
        assert!(RecordBatch::try_new(schema(), 3, vec![a.clone(), b.clone()]).is_ok());
        assert!(RecordBatch::try_new(schema(), 2, vec![a.clone(), b.clone()]).is_err());
        assert!(RecordBatch::try_new(schema(), 3, vec![a.clone()]).is_err());
        assert!(RecordBatch::try_new(schema(), 3, vec![b, a]).is_err());
    }

    #[test]
    fn slice_rows() {
        let a: ArrayRef = Arc::new(ArrayData::from_values([1i32, 2, 3]));
        let b: ArrayRef = Arc::new(ArrayData::from_utf8([Some("x"), None, Some("z")]));
        let batch = RecordBatch::try_new(schema(), 3, vec![a, b]).unwrap();
        let sliced = batch.slice(1, 2).unwrap();
        assert_eq!(sliced.num_rows(), 2);
        assert_eq!(sliced.column(0).unwrap().value::<i32>(0), 2);
        assert_eq!(sliced.column(1).unwrap().str_value(1).unwrap(), "z");
        assert!(batch.slice(2, 2).is_err());
    }
}
