use crate::error::{MiniDBError, MiniDBResult};
use crate::storage::codec::DecodedData;

/// Big-endian primitive encoding shared by all page codecs.
pub struct CommonCodec;

impl CommonCodec {
    pub fn encode_u32(data: u32) -> Vec<u8> {
        data.to_be_bytes().to_vec()
    }

    pub fn decode_u32(bytes: &[u8]) -> MiniDBResult<DecodedData<u32>> {
        if bytes.len() < 4 {
            return Err(MiniDBError::Storage(format!(
                "bytes length {} is less than {}",
                bytes.len(),
                4
            )));
        }
        let data = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Ok((u32::from_be_bytes(data), 4))
    }

    pub fn encode_i32(data: i32) -> Vec<u8> {
        data.to_be_bytes().to_vec()
    }

    pub fn decode_i32(bytes: &[u8]) -> MiniDBResult<DecodedData<i32>> {
        if bytes.len() < 4 {
            return Err(MiniDBError::Storage(format!(
                "bytes length {} is less than {}",
                bytes.len(),
                4
            )));
        }
        let data = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Ok((i32::from_be_bytes(data), 4))
    }
}

#[cfg(test)]
mod tests {
    use super::CommonCodec;

    #[test]
    fn common_codec() {
        assert_eq!(
            5u32,
            CommonCodec::decode_u32(&CommonCodec::encode_u32(5u32))
                .unwrap()
                .0
        );
        assert_eq!(
            -5i32,
            CommonCodec::decode_i32(&CommonCodec::encode_i32(-5i32))
                .unwrap()
                .0
        );
        assert!(CommonCodec::decode_u32(&[1, 2]).is_err());
    }
}
