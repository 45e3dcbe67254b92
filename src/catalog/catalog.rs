use dashmap::DashMap;
use std::sync::Arc;

use crate::catalog::SchemaRef;
use crate::error::{MiniDBError, MiniDBResult};
use crate::storage::heap_file::HeapFile;
use crate::storage::page::TableId;

#[derive(Debug, Clone)]
pub struct CatalogTable {
    pub name: String,
    pub file: Arc<HeapFile>,
}

impl CatalogTable {
    pub fn new(name: impl Into<String>, file: Arc<HeapFile>) -> Self {
        Self {
            name: name.into(),
            file,
        }
    }
}

/// Registry of every table known to the database, keyed by the table id
/// derived from its backing file. The buffer pool uses it to route a
/// `PageId` back to the owning heap file.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: DashMap<TableId, CatalogTable>,
    names: DashMap<String, TableId>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. Re-adding a name points it at the new file.
    pub fn add_table(&self, name: impl Into<String>, file: Arc<HeapFile>) -> TableId {
        let name = name.into();
        let table_id = file.table_id();
        self.names.insert(name.clone(), table_id);
        self.tables.insert(table_id, CatalogTable::new(name, file));
        table_id
    }

    pub fn table_file(&self, table_id: TableId) -> MiniDBResult<Arc<HeapFile>> {
        self.tables
            .get(&table_id)
            .map(|entry| entry.file.clone())
            .ok_or_else(|| MiniDBError::NoSuchElement(format!("no such table id {table_id}")))
    }

    pub fn tuple_desc(&self, table_id: TableId) -> MiniDBResult<SchemaRef> {
        Ok(self.table_file(table_id)?.schema())
    }

    pub fn table_id(&self, name: &str) -> MiniDBResult<TableId> {
        self.names
            .get(name)
            .map(|entry| *entry)
            .ok_or_else(|| MiniDBError::NoSuchElement(format!("no such table \"{name}\"")))
    }

    pub fn table_name(&self, table_id: TableId) -> MiniDBResult<String> {
        self.tables
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| MiniDBError::NoSuchElement(format!("no such table id {table_id}")))
    }
}
