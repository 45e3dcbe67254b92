use bytes::Bytes;

use crate::buffer::PAGE_SIZE;
use crate::catalog::{Schema, SchemaRef};
use crate::error::{MiniDBError, MiniDBResult};
use crate::storage::codec::HeapPageCodec;
use crate::storage::page::{PageId, RecordId};
use crate::storage::tuple::Tuple;
use crate::transaction::TransactionId;

/**
 * Slotted page with a fixed tuple width T derived from the schema:
 * ```text
 *  -------------------------------------------------------------
 *  | HEADER BITMAP | SLOT 0 | SLOT 1 | ... | SLOT N-1 | ZEROS |
 *  -------------------------------------------------------------
 * ```
 * N is the largest count satisfying ceil(N/8) + N*T <= PAGE_SIZE, i.e.
 * N = (8 * PAGE_SIZE) / (8 * T + 1). Bit i of the bitmap (LSB-first
 * within each byte) is set iff slot i holds a tuple.
 *
 * The dirty mark and the before-image exist only in memory; callers
 * serialize access through the page's lock.
 */
#[derive(Debug)]
pub struct HeapPage {
    pid: PageId,
    schema: SchemaRef,
    slots: Vec<Option<Tuple>>,
    dirty_by: Option<TransactionId>,
    before_image: Bytes,
}

impl HeapPage {
    /// Number of tuple slots a page of this schema holds.
    pub fn slots_per_page(schema: &Schema) -> usize {
        (PAGE_SIZE * 8) / (schema.tuple_len() * 8 + 1)
    }

    /// Byte length of the occupancy bitmap for `num_slots` slots.
    pub fn header_len(num_slots: usize) -> usize {
        num_slots.div_ceil(8)
    }

    /// A fresh all-empty page. Serializes to PAGE_SIZE zero bytes.
    pub fn empty(pid: PageId, schema: SchemaRef) -> Self {
        let num_slots = Self::slots_per_page(&schema);
        Self {
            pid,
            schema,
            slots: vec![None; num_slots],
            dirty_by: None,
            before_image: Bytes::from(vec![0u8; PAGE_SIZE]),
        }
    }

    pub(crate) fn from_parts(pid: PageId, schema: SchemaRef, slots: Vec<Option<Tuple>>, image: Bytes) -> Self {
        Self {
            pid,
            schema,
            slots,
            dirty_by: None,
            before_image: image,
        }
    }

    pub fn pid(&self) -> PageId {
        self.pid
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| s.is_some())
    }

    pub fn num_empty_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    /// Store `tuple` in the lowest free slot and assign its record id.
    pub fn insert_tuple(&mut self, tuple: &mut Tuple) -> MiniDBResult<()> {
        if *tuple.schema != *self.schema {
            return Err(MiniDBError::DB(format!(
                "schema mismatch inserting into page {}",
                self.pid
            )));
        }
        let slot = self
            .slots
            .iter()
            .position(|slot| slot.is_none())
            .ok_or_else(|| MiniDBError::DB(format!("no empty slot on page {}", self.pid)))?;
        let rid = RecordId::new(self.pid, slot as u32);
        tuple.rid = Some(rid);
        self.slots[slot] = Some(tuple.clone());
        Ok(())
    }

    /// Remove `tuple` from the slot its record id names and clear the id.
    pub fn delete_tuple(&mut self, tuple: &mut Tuple) -> MiniDBResult<()> {
        let rid = tuple
            .rid
            .ok_or_else(|| MiniDBError::DB("tuple has no record id".to_string()))?;
        if rid.page_id != self.pid || rid.slot_num as usize >= self.slots.len() {
            return Err(MiniDBError::DB(format!(
                "record id {rid} does not refer to page {}",
                self.pid
            )));
        }
        let slot = rid.slot_num as usize;
        match &self.slots[slot] {
            None => {
                return Err(MiniDBError::DB(format!(
                    "slot {slot} of page {} is not in use",
                    self.pid
                )))
            }
            Some(stored) if stored != &*tuple => {
                return Err(MiniDBError::DB(format!(
                    "stored tuple at {rid} does not match the tuple to delete"
                )))
            }
            Some(_) => {}
        }
        self.slots[slot] = None;
        tuple.rid = None;
        Ok(())
    }

    /// The used tuples in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn mark_dirty(&mut self, dirty: bool, txn_id: TransactionId) {
        self.dirty_by = dirty.then_some(txn_id);
    }

    /// The transaction that last dirtied this page, if any.
    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty_by
    }

    /// The page image as of construction or the last committed flush.
    pub fn before_image(&self) -> Bytes {
        self.before_image.clone()
    }

    /// Re-snapshot the before-image to the current contents.
    pub fn set_before_image(&mut self) -> MiniDBResult<()> {
        self.before_image = Bytes::from(HeapPageCodec::encode(self)?);
        Ok(())
    }
}
