//! Fallible frame buffer allocation.

/// Allocates frame copies on the forwarding path.
///
/// Allocation must not block; on exhaustion the allocator returns `None`
/// and the caller drops the frame instead of waiting.
pub trait FrameAllocator: Send + Sync {
    fn try_copy(&self, data: &[u8]) -> Option<Vec<u8>>;
}

/// Heap allocator that reports exhaustion instead of aborting.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl FrameAllocator for HeapAllocator {
    fn try_copy(&self, data: &[u8]) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(data.len()).ok()?;
        buf.extend_from_slice(data);
        Some(buf)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FailNth;
    use super::*;

    #[test]
    fn test_heap_copy_is_exact() {
        let copy = HeapAllocator.try_copy(&[1, 2, 3]).unwrap();
        assert_eq!(copy, vec![1, 2, 3]);
    }

    #[test]
    fn test_fail_nth() {
        let alloc = FailNth::new(2);
        assert!(alloc.try_copy(&[0]).is_some());
        assert!(alloc.try_copy(&[0]).is_none());
        assert!(alloc.try_copy(&[0]).is_some());
    }
}
