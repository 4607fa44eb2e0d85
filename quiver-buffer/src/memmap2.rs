use bytes::Bytes;
use memmap2::Mmap;

use crate::ByteBuffer;

/// The mapping stays alive for as long as any slice of the buffer does.
impl From<Mmap> for ByteBuffer {
    fn from(map: Mmap) -> Self {
        Self::from(Bytes::from_owner(map))
    }
}
