//! Logical schema types. Pure data; no Arrow dependency here.
//!
//! A `Schema` names the columns of a physical `RowBatch`. Logical tiles carry
//! their own positional schema (`tile::ColumnInfo`) and only borrow names from
//! here for planning and display.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
    /// Microseconds since the Unix epoch.
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Side-by-side schema for a join result: left fields, then right fields.
    ///
    /// A right field whose name already exists on the left gets a `_right`
    /// suffix so names stay unique.
    pub fn join(left: &Schema, right: &Schema) -> Schema {
        let mut fields = Vec::with_capacity(left.len() + right.len());
        fields.extend(left.fields.iter().cloned());
        for f in &right.fields {
            let mut f = f.clone();
            while fields.iter().any(|g: &Field| g.name == f.name) {
                f.name = format!("{}_right", f.name);
            }
            fields.push(f);
        }
        Schema { fields }
    }
}
