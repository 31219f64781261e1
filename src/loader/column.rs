//! # Columns
//!
//! Named, typed descriptors used to annotate the structure of uploaded files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;
use uuid::Uuid;

use super::errors::{LoaderError, LoaderResult};
use super::names::validate_name;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
}

impl Default for ColumnType {
    fn default() -> Self {
        Self::Text
    }
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ColumnType::Text),
            "integer" => Ok(ColumnType::Integer),
            "float" => Ok(ColumnType::Float),
            "boolean" => Ok(ColumnType::Boolean),
            "date" => Ok(ColumnType::Date),
            "datetime" => Ok(ColumnType::DateTime),
            other => Err(format!("unknown column type: {}", other)),
        }
    }
}

/// A column descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub col_type: ColumnType,
    pub created_at: DateTime<Utc>,
}

impl Column {
    pub fn new(name: String, col_type: ColumnType) -> LoaderResult<Self> {
        validate_name(&name)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            col_type,
            created_at: Utc::now(),
        })
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Column registry keyed by name
#[derive(Debug, Default)]
pub struct ColumnRegistry {
    columns: RwLock<HashMap<String, Column>>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, name: String, col_type: ColumnType) -> LoaderResult<Column> {
        let column = Column::new(name, col_type)?;
        self.insert(column.clone())?;
        Ok(column)
    }

    pub fn insert(&self, column: Column) -> LoaderResult<()> {
        let mut columns = self.columns.write().map_err(|_| LoaderError::poisoned())?;

        if columns.contains_key(&column.name) {
            return Err(LoaderError::duplicate_column(column.name));
        }

        columns.insert(column.name.clone(), column);
        Ok(())
    }

    pub fn get(&self, name: &str) -> LoaderResult<Column> {
        let columns = self.columns.read().map_err(|_| LoaderError::poisoned())?;

        columns
            .get(name)
            .cloned()
            .ok_or_else(|| LoaderError::ColumnNotFound(name.to_string()))
    }

    pub fn delete(&self, name: &str) -> LoaderResult<Column> {
        let mut columns = self.columns.write().map_err(|_| LoaderError::poisoned())?;

        columns
            .remove(name)
            .ok_or_else(|| LoaderError::ColumnNotFound(name.to_string()))
    }

    /// All columns, ordered by name
    pub fn list(&self) -> LoaderResult<Vec<Column>> {
        let columns = self.columns.read().map_err(|_| LoaderError::poisoned())?;

        let mut columns: Vec<Column> = columns.values().cloned().collect();
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_column_display_is_name() {
        let column = Column::new("price".to_string(), ColumnType::Float).unwrap();
        assert_eq!(column.to_string(), "price");
    }

    #[test]
    fn test_column_type_parsing() {
        assert_eq!("text".parse::<ColumnType>().unwrap(), ColumnType::Text);
        assert_eq!("DateTime".parse::<ColumnType>().unwrap(), ColumnType::DateTime);
        assert!("blob".parse::<ColumnType>().is_err());
        assert_eq!(ColumnType::default(), ColumnType::Text);
    }

    #[test]
    fn test_column_type_serializes_lowercase() {
        let json = serde_json::to_string(&ColumnType::Integer).unwrap();
        assert_eq!(json, "\"integer\"");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = ColumnRegistry::new();
        registry.create("id".to_string(), ColumnType::Integer).unwrap();

        let result = registry.create("id".to_string(), ColumnType::Text);
        assert!(matches!(
            result,
            Err(LoaderError::UniquenessViolation { entity: "Column", .. })
        ));
        assert_eq!(registry.get("id").unwrap().col_type, ColumnType::Integer);
    }

    #[test]
    fn test_list_is_sorted() {
        let registry = ColumnRegistry::new();
        for name in ["zip", "amount", "label"] {
            registry.create(name.to_string(), ColumnType::Text).unwrap();
        }
        let names: Vec<String> = registry.list().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["amount", "label", "zip"]);
    }

    #[test]
    fn test_concurrent_duplicate_creates() {
        let registry = Arc::new(ColumnRegistry::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let col_type = if i % 2 == 0 { ColumnType::Text } else { ColumnType::Integer };
                thread::spawn(move || registry.create("dup".to_string(), col_type).is_ok())
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(created, 1);
        assert_eq!(registry.list().unwrap().len(), 1);
    }
}
