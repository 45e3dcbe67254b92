use bytes::Bytes;

use crate::buffer::PAGE_SIZE;
use crate::catalog::SchemaRef;
use crate::error::{MiniDBError, MiniDBResult};
use crate::storage::codec::TupleCodec;
use crate::storage::page::{HeapPage, PageId, RecordId};

pub struct HeapPageCodec;

impl HeapPageCodec {
    pub fn encode(page: &HeapPage) -> MiniDBResult<Vec<u8>> {
        let num_slots = page.num_slots();
        let tuple_len = page.schema().tuple_len();
        let mut bytes = vec![0u8; HeapPage::header_len(num_slots)];
        bytes.reserve(PAGE_SIZE - bytes.len());

        let mut by_slot: Vec<Option<&crate::storage::tuple::Tuple>> = vec![None; num_slots];
        for tuple in page.iter() {
            // Every stored tuple carries the rid its slot assigned.
            let slot = tuple
                .rid
                .map(|rid| rid.slot_num as usize)
                .ok_or_else(|| MiniDBError::Storage("stored tuple without record id".to_string()))?;
            by_slot[slot] = Some(tuple);
        }
        for (slot, stored) in by_slot.iter().enumerate() {
            match stored {
                Some(tuple) => {
                    bytes[slot / 8] |= 1 << (slot % 8);
                    let encoded = TupleCodec::encode(tuple)?;
                    debug_assert_eq!(encoded.len(), tuple_len);
                    bytes.extend(encoded);
                }
                None => bytes.resize(bytes.len() + tuple_len, 0),
            }
        }
        bytes.resize(PAGE_SIZE, 0);
        Ok(bytes)
    }

    pub fn decode(pid: PageId, bytes: &[u8], schema: SchemaRef) -> MiniDBResult<HeapPage> {
        if bytes.len() != PAGE_SIZE {
            return Err(MiniDBError::Storage(format!(
                "heap page size is {} instead of {}",
                bytes.len(),
                PAGE_SIZE
            )));
        }
        let num_slots = HeapPage::slots_per_page(&schema);
        let header_len = HeapPage::header_len(num_slots);
        let tuple_len = schema.tuple_len();

        let mut slots = Vec::with_capacity(num_slots);
        for slot in 0..num_slots {
            let used = bytes[slot / 8] & (1 << (slot % 8)) != 0;
            if !used {
                slots.push(None);
                continue;
            }
            let offset = header_len + slot * tuple_len;
            let (mut tuple, _) = TupleCodec::decode(&bytes[offset..offset + tuple_len], schema.clone())?;
            tuple.rid = Some(RecordId::new(pid, slot as u32));
            slots.push(Some(tuple));
        }
        Ok(HeapPage::from_parts(
            pid,
            schema,
            slots,
            Bytes::copy_from_slice(bytes),
        ))
    }
}
