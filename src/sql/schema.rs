//! # Schema Catalog
//!
//! A case-insensitive catalog of tables and columns used by the validator
//! and the expression parser's type inference. Names are stored as given
//! for display; lookups fold to lower-case. Insertion order is preserved
//! so every walk over the catalog is deterministic.
//!
//! The catalog is populated up front and treated as immutable afterwards;
//! all query paths take `&self`.

use hashbrown::HashMap;

/// SQL data types known to the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    BigInt,
    Decimal,
    Float,
    Double,
    Varchar,
    Char,
    Text,
    Date,
    Time,
    Timestamp,
    Boolean,
    Blob,
    Clob,
}

impl DataType {
    /// Integer, BigInt, and Decimal: the types arithmetic operators and
    /// numeric functions accept.
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Integer | DataType::BigInt | DataType::Decimal)
    }

    /// Varchar, Char, and Text.
    pub fn is_textual(self) -> bool {
        matches!(self, DataType::Varchar | DataType::Char | DataType::Text)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, DataType::Date | DataType::Time | DataType::Timestamp)
    }
}

/// A table column: name, type, and constraint flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    data_type: DataType,
    nullable: bool,
    primary_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }
}

/// A table: a named, ordered collection of columns with a lower-cased
/// name index for case-insensitive lookup.
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_columns(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let mut table = Self::new(name);
        for column in columns {
            table.add_column(column);
        }
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds or replaces a column. Replacement keeps the original position.
    pub fn add_column(&mut self, column: Column) {
        let key = column.name.to_lowercase();
        match self.index.get(&key) {
            Some(&slot) => self.columns[slot] = column,
            None => {
                self.index.insert(key, self.columns.len());
                self.columns.push(column);
            }
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index
            .get(&name.to_lowercase())
            .map(|&slot| &self.columns[slot])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// The schema: tables in insertion order with case-insensitive lookup.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: Vec<Table>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a table. Replacement keeps the original position.
    pub fn add_table(&mut self, table: Table) {
        let key = table.name.to_lowercase();
        match self.index.get(&key) {
            Some(&slot) => self.tables[slot] = table,
            None => {
                self.index.insert(key, self.tables.len());
                self.tables.push(table);
            }
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.index
            .get(&name.to_lowercase())
            .map(|&slot| &self.tables[slot])
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Tables in insertion order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_schema() -> Schema {
        let mut schema = Schema::new();
        schema.add_table(Table::with_columns(
            "Users",
            vec![
                Column::new("id", DataType::Integer).primary_key(),
                Column::new("Name", DataType::Varchar),
                Column::new("age", DataType::Integer),
            ],
        ));
        schema
    }

    #[test]
    fn table_lookup_is_case_insensitive() {
        let schema = users_schema();
        assert!(schema.has_table("users"));
        assert!(schema.has_table("USERS"));
        assert!(schema.has_table("Users"));
        assert!(!schema.has_table("posts"));
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let schema = users_schema();
        let table = schema.table("USERS").unwrap();
        assert!(table.has_column("name"));
        assert!(table.has_column("NAME"));
        assert_eq!(table.column("name").unwrap().data_type(), DataType::Varchar);
    }

    #[test]
    fn names_preserve_case_for_display() {
        let schema = users_schema();
        let table = schema.table("users").unwrap();
        assert_eq!(table.name(), "Users");
        assert_eq!(table.column("NAME").unwrap().name(), "Name");
    }

    #[test]
    fn column_flags() {
        let schema = users_schema();
        let table = schema.table("users").unwrap();
        let id = table.column("id").unwrap();
        assert!(id.is_primary_key());
        assert!(!id.is_nullable());
        let name = table.column("name").unwrap();
        assert!(!name.is_primary_key());
        assert!(name.is_nullable());
    }

    #[test]
    fn insertion_order_preserved() {
        let schema = users_schema();
        let names: Vec<_> = schema.table("users").unwrap().columns().iter().map(Column::name).collect();
        assert_eq!(names, ["id", "Name", "age"]);
    }

    #[test]
    fn data_type_classes() {
        assert!(DataType::Integer.is_numeric());
        assert!(DataType::Decimal.is_numeric());
        assert!(!DataType::Varchar.is_numeric());
        assert!(DataType::Text.is_textual());
        assert!(!DataType::Date.is_textual());
        assert!(DataType::Timestamp.is_temporal());
    }
}
