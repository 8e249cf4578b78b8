use std::cell::{Cell, UnsafeCell};
use std::sync::Arc;

use crate::error::{Result, XndError};

/// A single aligned byte region owned by exactly one root view. Holds the
/// primary fixed-size data region plus, for variable-length payloads
/// (strings, bytes, reference targets), a side heap.
///
/// Mutation goes through `&self` (an `UnsafeCell`) rather than `&mut self`
/// because many `View`s alias the same arena; the `writable` flag on each
/// `View` is the access-control boundary for *read vs. write*, but two
/// writable `View`s cloned from the same root can still both reach for the
/// data region at once. `mut_borrowed` makes that case fail loudly instead
/// of handing out two live `&mut [u8]` over the same bytes: every scalar
/// write takes the flag for the duration of the write and releases it on
/// drop, so a second writer sees `ValueError` rather than aliasing memory.
/// Concurrent mutation across threads is still the host's responsibility;
/// the root's `Arc` refcount itself is atomic.
pub struct Arena {
    data: UnsafeCell<Vec<u8>>,
    heap: UnsafeCell<Vec<u8>>,
    refs: UnsafeCell<Vec<Option<(Arc<Arena>, xnd_types::Type)>>>,
    align: usize,
    device: Option<String>,
    mut_borrowed: Cell<bool>,
}

// Safety: all interior mutation is gated by the `writable` flag checked at
// the `View` API boundary, and by `mut_borrowed` for the scalar-write path
// that hands out a live `&mut [u8]`; the host is responsible for not
// mutating a read-only-shared arena from multiple threads.
unsafe impl Sync for Arena {}
unsafe impl Send for Arena {}

/// RAII handle on a live `&mut [u8]` window into an arena's data region.
/// Dropping it releases `Arena::mut_borrowed`, so at most one `ScalarMut` can
/// be outstanding per arena at a time, however many `View`s alias it.
pub struct ScalarMut<'a> {
    arena: &'a Arena,
    start: usize,
    len: usize,
}

impl<'a> std::ops::Deref for ScalarMut<'a> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.arena.as_slice()[self.start..self.start + self.len]
    }
}

impl<'a> std::ops::DerefMut for ScalarMut<'a> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.arena.as_mut_slice()[self.start..self.start + self.len]
    }
}

impl<'a> Drop for ScalarMut<'a> {
    fn drop(&mut self) {
        self.arena.mut_borrowed.set(false);
    }
}

pub type ArenaHandle = Arc<Arena>;

impl Arena {
    pub fn new(size: usize, align: usize) -> ArenaHandle {
        log::debug!("new_arena: {size} bytes, align {align}");
        Arc::new(Arena {
            data: UnsafeCell::new(vec![0u8; size]),
            heap: UnsafeCell::new(Vec::new()),
            refs: UnsafeCell::new(Vec::new()),
            align,
            device: None,
            mut_borrowed: Cell::new(false),
        })
    }

    pub fn new_device(size: usize, align: usize, device: impl Into<String>) -> ArenaHandle {
        let device = device.into();
        log::debug!("new_arena (device={device}): {size} bytes, align {align}");
        Arc::new(Arena {
            data: UnsafeCell::new(vec![0u8; size]),
            heap: UnsafeCell::new(Vec::new()),
            refs: UnsafeCell::new(Vec::new()),
            align,
            device: Some(device),
            mut_borrowed: Cell::new(false),
        })
    }

    /// Constructs an arena that borrows externally-owned memory. The core
    /// never frees `bytes`; dropping the handle simply drops the owning
    /// `Vec` the caller handed in.
    pub fn from_external(bytes: Vec<u8>, align: usize) -> ArenaHandle {
        Arc::new(Arena {
            data: UnsafeCell::new(bytes),
            heap: UnsafeCell::new(Vec::new()),
            refs: UnsafeCell::new(Vec::new()),
            align,
            device: None,
            mut_borrowed: Cell::new(false),
        })
    }

    /// Exclusively locks a byte window of the data region for mutation,
    /// failing rather than letting a second live `View` clone alias it.
    /// Released automatically when the returned `ScalarMut` drops.
    pub fn try_borrow_mut_range(&self, start: usize, len: usize) -> Result<ScalarMut<'_>> {
        if self.mut_borrowed.replace(true) {
            return Err(XndError::ValueError(
                "arena is already mutably borrowed by another view".to_string(),
            ));
        }
        if start + len > self.len() {
            self.mut_borrowed.set(false);
            return Err(XndError::MemoryError(format!("mutable borrow out of bounds at byte {start}")));
        }
        Ok(ScalarMut { arena: self, start, len })
    }

    pub fn len(&self) -> usize {
        unsafe { (*self.data.get()).len() }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn align(&self) -> usize {
        self.align
    }

    pub fn is_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn device_tag(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { &*self.data.get() }
    }

    #[allow(clippy::mut_from_ref)]
    pub fn as_mut_slice(&self) -> &mut [u8] {
        unsafe { &mut *self.data.get() }
    }

    /// Appends an immutable byte run to the variable-length heap, returning
    /// its (offset, length) — used for `string`/`bytes` payloads.
    pub fn heap_alloc(&self, bytes: &[u8]) -> (u64, u64) {
        let heap = unsafe { &mut *self.heap.get() };
        let offset = heap.len() as u64;
        heap.extend_from_slice(bytes);
        (offset, bytes.len() as u64)
    }

    pub fn heap_slice(&self, offset: u64, len: u64) -> &[u8] {
        let heap = unsafe { &*self.heap.get() };
        &heap[offset as usize..(offset + len) as usize]
    }

    pub fn heap_bytes(&self) -> &[u8] {
        unsafe { &*self.heap.get() }
    }

    pub fn heap_from_bytes(&self, bytes: Vec<u8>) {
        let heap = unsafe { &mut *self.heap.get() };
        *heap = bytes;
    }

    /// Registers a `Reference` target ,
    /// returning the slot id stored in the parent's flat bytes.
    pub fn ref_alloc(&self, arena: Arc<Arena>, ty: xnd_types::Type) -> u32 {
        let refs = unsafe { &mut *self.refs.get() };
        refs.push(Some((arena, ty)));
        (refs.len() - 1) as u32
    }

    pub fn ref_get(&self, slot: u32) -> Result<(Arc<Arena>, xnd_types::Type)> {
        let refs = unsafe { &*self.refs.get() };
        refs.get(slot as usize)
            .and_then(|s| s.clone())
            .ok_or_else(|| XndError::MemoryError(format!("dangling reference slot {slot}")))
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len())
            .field("align", &self.align)
            .field("device", &self.device)
            .finish()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        log::trace!("drop_arena: {} bytes freed", self.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_second_mutable_borrow_conflicts_with_the_first() {
        let arena = Arena::new(8, 1);
        let guard1 = arena.try_borrow_mut_range(0, 4).unwrap();
        assert!(matches!(
            arena.try_borrow_mut_range(4, 4),
            Err(XndError::ValueError(_))
        ));
        drop(guard1);
        assert!(arena.try_borrow_mut_range(4, 4).is_ok());
    }

    #[test]
    fn a_mutable_borrow_writes_through_to_the_arena() {
        let arena = Arena::new(4, 1);
        {
            let mut guard = arena.try_borrow_mut_range(0, 4).unwrap();
            guard.copy_from_slice(&[1, 2, 3, 4]);
        }
        assert_eq!(arena.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn out_of_bounds_borrow_releases_the_flag() {
        let arena = Arena::new(4, 1);
        assert!(matches!(
            arena.try_borrow_mut_range(0, 100),
            Err(XndError::MemoryError(_))
        ));
        assert!(arena.try_borrow_mut_range(0, 4).is_ok());
    }
}
