use log::debug;
use std::fs::{File, OpenOptions};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::buffer::{BufferPool, Permission, PAGE_SIZE};
use crate::catalog::SchemaRef;
use crate::error::{MiniDBError, MiniDBResult};
use crate::storage::codec::HeapPageCodec;
use crate::storage::page::{HeapPage, PageId, TableId};
use crate::storage::tuple::Tuple;
use crate::transaction::TransactionId;

/// A table's backing store: a flat file of fixed-size heap pages with no
/// tuple ordering. The table id is a stable hash of the absolute file
/// path. Page reads and writes open a fresh handle per call; concurrent
/// access to one page is serialized by the caller's lock on its PageId.
#[derive(Debug)]
pub struct HeapFile {
    path: PathBuf,
    schema: SchemaRef,
    table_id: TableId,
}

impl HeapFile {
    pub fn try_new(path: impl AsRef<Path>, schema: SchemaRef) -> MiniDBResult<Self> {
        // Materialize the file so the absolute path (and thus the id)
        // is stable from the start.
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;
        let path = path.as_ref().canonicalize()?;
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let table_id = hasher.finish() as TableId;
        Ok(Self {
            path,
            schema,
            table_id,
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Page count by file length, rounded up over a trailing partial
    /// page. Advisory under concurrent inserts: allocation writes a new
    /// page through before any reader can observe the grown length.
    pub fn num_pages(&self) -> MiniDBResult<u32> {
        let len = std::fs::metadata(&self.path)?.len();
        Ok(len.div_ceil(PAGE_SIZE as u64) as u32)
    }

    /// Read one page. A page past the end of the file (including a
    /// trailing partial page) is reported as absent, not an error.
    pub fn read_page(&self, pid: PageId) -> MiniDBResult<Option<HeapPage>> {
        self.check_owns(pid)?;
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(pid.page_no as u64 * PAGE_SIZE as u64))?;
        let mut buf = vec![0u8; PAGE_SIZE];
        match file.read_exact(&mut buf) {
            Ok(()) => Ok(Some(HeapPageCodec::decode(pid, &buf, self.schema.clone())?)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write one page at its offset. Atomicity with respect to readers
    /// of the same page comes from the caller holding its lock.
    pub fn write_page(&self, page: &HeapPage) -> MiniDBResult<()> {
        let pid = page.pid();
        self.check_owns(pid)?;
        let bytes = HeapPageCodec::encode(page)?;
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(pid.page_no as u64 * PAGE_SIZE as u64))?;
        file.write_all(&bytes)?;
        file.sync_data()?;
        Ok(())
    }

    /// Find room for `tuple`, scanning pages in order under ReadWrite
    /// permission. Full pages are released immediately so the scan does
    /// not pin the whole file under 2PL. When every page is full, a
    /// fresh page is populated and written through before returning, so
    /// concurrent `num_pages` readers never see it half-born.
    pub fn insert_tuple(
        &self,
        txn_id: TransactionId,
        tuple: &mut Tuple,
        pool: &BufferPool,
    ) -> MiniDBResult<PageId> {
        for page_no in 0..self.num_pages()? {
            let pid = PageId::new(self.table_id, page_no);
            let page = pool.get_page(txn_id, pid, Permission::ReadWrite)?;
            let mut guard = page.write();
            if guard.num_empty_slots() > 0 {
                guard.insert_tuple(tuple)?;
                return Ok(pid);
            }
            drop(guard);
            drop(page);
            pool.release_page(txn_id, pid);
        }

        let pid = PageId::new(self.table_id, self.num_pages()?);
        let mut page = HeapPage::empty(pid, self.schema.clone());
        page.insert_tuple(tuple)?;
        self.write_page(&page)?;
        debug!("allocated page {pid}");
        // Register the materialized page in the pool under this
        // transaction's exclusive lock.
        pool.get_page(txn_id, pid, Permission::ReadWrite)?;
        Ok(pid)
    }

    /// Delete the tuple its record id names, under ReadWrite permission.
    pub fn delete_tuple(
        &self,
        txn_id: TransactionId,
        tuple: &mut Tuple,
        pool: &BufferPool,
    ) -> MiniDBResult<PageId> {
        let rid = tuple
            .rid
            .ok_or_else(|| MiniDBError::DB("tuple has no record id".to_string()))?;
        self.check_owns(rid.page_id)?;
        let page = pool.get_page(txn_id, rid.page_id, Permission::ReadWrite)?;
        page.write().delete_tuple(tuple)?;
        Ok(rid.page_id)
    }

    fn check_owns(&self, pid: PageId) -> MiniDBResult<()> {
        if pid.table_id != self.table_id {
            return Err(MiniDBError::DB(format!(
                "page {pid} does not belong to table {}",
                self.table_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::HeapFile;
    use crate::buffer::{BufferPool, PAGE_SIZE};
    use crate::catalog::{Catalog, Column, DataType, Schema};
    use crate::config::BufferPoolConfig;
    use crate::storage::page::{HeapPage, PageId, TableId};
    use crate::storage::tuple::Tuple;
    use crate::transaction::LockManager;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn row_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Column::new("id", DataType::Int32),
            Column::new("name", DataType::Varchar(10)),
        ]))
    }

    fn setup() -> (TempDir, Arc<Catalog>, Arc<BufferPool>, TableId) {
        let temp_dir = TempDir::new().unwrap();
        let file =
            Arc::new(HeapFile::try_new(temp_dir.path().join("t.tbl"), row_schema()).unwrap());
        let catalog = Arc::new(Catalog::new());
        let table_id = catalog.add_table("t", file);
        let pool = Arc::new(BufferPool::new(
            BufferPoolConfig::default(),
            catalog.clone(),
            Arc::new(LockManager::default()),
        ));
        (temp_dir, catalog, pool, table_id)
    }

    #[test]
    fn id_is_stable_per_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.tbl");
        let a = HeapFile::try_new(&path, row_schema()).unwrap();
        let b = HeapFile::try_new(&path, row_schema()).unwrap();
        let c = HeapFile::try_new(temp_dir.path().join("u.tbl"), row_schema()).unwrap();
        assert_eq!(a.table_id(), b.table_id());
        assert_ne!(a.table_id(), c.table_id());
    }

    #[test]
    fn read_write_page_round_trip() {
        let (_temp_dir, catalog, _pool, table_id) = setup();
        let file = catalog.table_file(table_id).unwrap();
        assert_eq!(file.num_pages().unwrap(), 0);

        let pid = PageId::new(table_id, 0);
        assert!(file.read_page(pid).unwrap().is_none());

        let mut page = HeapPage::empty(pid, file.schema());
        let mut tuple = Tuple::new(file.schema(), vec![1.into(), "alice".into()]);
        page.insert_tuple(&mut tuple).unwrap();
        file.write_page(&page).unwrap();

        assert_eq!(file.num_pages().unwrap(), 1);
        let read_back = file.read_page(pid).unwrap().unwrap();
        assert_eq!(read_back.iter().count(), 1);
        assert_eq!(read_back.iter().next().unwrap().data, tuple.data);

        assert!(file.read_page(PageId::new(table_id, 1)).unwrap().is_none());
        assert!(file.read_page(PageId::new(table_id + 1, 0)).is_err());
    }

    #[test]
    fn partial_trailing_page_rounds_up() {
        let (temp_dir, catalog, _pool, table_id) = setup();
        let file = catalog.table_file(table_id).unwrap();
        std::fs::write(temp_dir.path().join("t.tbl"), vec![0u8; PAGE_SIZE + 10]).unwrap();
        assert_eq!(file.num_pages().unwrap(), 2);
        // The partial page reads as absent.
        assert!(file.read_page(PageId::new(table_id, 1)).unwrap().is_none());
    }

    #[test]
    fn insert_fills_pages_then_allocates() {
        let (_temp_dir, catalog, pool, table_id) = setup();
        let file = catalog.table_file(table_id).unwrap();
        let slots = HeapPage::slots_per_page(&file.schema());

        // Fill page 0 exactly, then one more tuple must allocate page 1.
        for i in 0..slots {
            let mut tuple =
                Tuple::new(file.schema(), vec![(i as i32).into(), "filler".into()]);
            let pid = file.insert_tuple(1, &mut tuple, &pool).unwrap();
            assert_eq!(pid, PageId::new(table_id, 0));
        }
        let mut overflow = Tuple::new(file.schema(), vec![(-1).into(), "extra".into()]);
        let pid = file.insert_tuple(1, &mut overflow, &pool).unwrap();
        assert_eq!(pid, PageId::new(table_id, 1));
        // The fresh page was written through before the commit.
        assert_eq!(file.num_pages().unwrap(), 2);
        assert_eq!(file.read_page(pid).unwrap().unwrap().iter().count(), 1);

        // The scan released its locks on the full pages it passed over.
        assert!(!pool.lock_manager().holds_lock(1, PageId::new(table_id, 0)));
        assert!(pool.lock_manager().holds_lock(1, pid));
        pool.transaction_complete(1, true).unwrap();
    }

    #[test]
    fn delete_requires_a_record_id() {
        let (_temp_dir, catalog, pool, table_id) = setup();
        let file = catalog.table_file(table_id).unwrap();

        let mut detached = Tuple::new(file.schema(), vec![1.into(), "x".into()]);
        assert!(file.delete_tuple(1, &mut detached, &pool).is_err());

        let mut tuple = Tuple::new(file.schema(), vec![1.into(), "x".into()]);
        file.insert_tuple(1, &mut tuple, &pool).unwrap();
        let pid = file.delete_tuple(1, &mut tuple, &pool).unwrap();
        assert_eq!(pid, PageId::new(table_id, 0));
        assert!(tuple.rid.is_none());
        pool.transaction_complete(1, true).unwrap();
    }
}
