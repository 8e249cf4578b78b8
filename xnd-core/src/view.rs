//! Zero-copy view descriptors.
//!
//! A `View` is a handle into an `Arena` plus the runtime state needed to
//! address a (possibly sliced/transposed/indexed) sub-array: a chain of
//! `RtAxis` entries from outermost to innermost, and a `Cursor` saying
//! whether the next axis to consume is addressed by byte offset or by row
//! index into a var-dim table.
//!
//! Indexing a `Fixed` axis is always pure arithmetic — no allocation. Slicing
//! a `Var` axis with unit step stays zero-copy (a new, narrower window on the
//! same table). Anything that would produce a non-contiguous row window
//! (step != 1, or indexing beneath a `Var` axis whose own window is already
//! non-contiguous) is resolved by `gather`, which materializes a fresh
//! `VarTable` — this is the one place view derivation allocates.

use std::rc::Rc;

use xnd_types::{DimLayout, Type};

use crate::arena::ArenaHandle;
use crate::bitmap::Bitmap;
use crate::error::{Result, XndError};
use crate::layout::{flat_layout, DimNode, FlatLayout};

/// Whether advancing one step along a `Fixed` axis moves the cursor through
/// bytes of the main data region, or through rows of an upcoming `Var`
/// axis's table. Decided once, at layout time, from the static type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StrideUnit {
    Bytes,
    Rows,
}

/// A variable-dimension level's offset/shape table : row `r`
/// spans `[offsets[r], offsets[r] + shapes[r])` in whatever row-space the
/// next axis addresses (bytes, if the next axis is the dtype or a `Fixed`
/// run; rows of the next `Var` table, otherwise).
#[derive(Clone, Debug)]
pub struct VarTable {
    pub offsets: Rc<Vec<i64>>,
    pub shapes: Rc<Vec<i64>>,
    pub bitmap: Bitmap,
}

impl VarTable {
    pub fn row_count(&self) -> usize {
        self.shapes.len()
    }
}

#[derive(Clone, Debug)]
pub enum RtAxis {
    Fixed {
        shape: i64,
        stride: i64,
        unit: StrideUnit,
        bitmap: Bitmap,
        layout: DimLayout,
    },
    Var {
        table: Rc<VarTable>,
        /// Number of rows currently in view, starting at whatever row the
        /// live `Cursor::Rows` points at.
        len: i64,
    },
}

impl RtAxis {
    pub fn shape_hint(&self) -> Option<i64> {
        match self {
            RtAxis::Fixed { shape, .. } => Some(*shape),
            RtAxis::Var { len, .. } => Some(*len),
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            RtAxis::Fixed { bitmap, .. } => !bitmap.is_empty(),
            RtAxis::Var { table, .. } => !table.bitmap.is_empty(),
        }
    }
}

/// Where the next axis (or the dtype, if `axes` is empty) should be read
/// from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cursor {
    /// Byte offset into `arena.as_slice()` (fixed runs, dtype) or
    /// `arena.heap_bytes()` once a `Var` row has resolved into a
    /// variable-length payload (string/bytes).
    Bytes(i64),
    /// Row index into the upcoming `Var` axis's table.
    Rows(i64),
}

#[derive(Clone)]
pub struct View {
    pub(crate) arena: ArenaHandle,
    pub(crate) cursor: Cursor,
    pub(crate) axes: Vec<RtAxis>,
    pub(crate) dtype: Type,
    pub(crate) dtype_layout: FlatLayout,
    /// Missing-leaf bitmap, present only if the dtype itself is optional.
    pub(crate) leaf_bitmap: Bitmap,
    pub(crate) writable: bool,
}

impl View {
    /// Builds a root view spanning an entire freshly allocated arena holding
    /// `root_count` repetitions of `ty`'s leading dimension chain, with
    /// `axes` and `leaf_bitmap` already computed by the marshaller.
    pub(crate) fn new_root(
        arena: ArenaHandle,
        ty: Type,
        axes: Vec<RtAxis>,
        leaf_bitmap: Bitmap,
        writable: bool,
    ) -> Result<View> {
        let dtype = ty.dtype().clone();
        let dtype_layout = flat_layout(&dtype, &crate::config::LayoutConfig::default())?;
        let cursor = match axes.first() {
            Some(RtAxis::Var { .. }) => Cursor::Rows(0),
            _ => Cursor::Bytes(0),
        };
        Ok(View { arena, cursor, axes, dtype, dtype_layout, leaf_bitmap, writable })
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn dtype(&self) -> &Type {
        &self.dtype
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// Length along axis 0, or the dtype's scalar "length" (1) once all
    /// dims are consumed.
    pub fn len(&self) -> Result<usize> {
        match self.axes.first() {
            Some(axis) => Ok(axis.shape_hint().unwrap_or(0).max(0) as usize),
            None => Ok(1),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Dynamic shape: `None` entries are var dims whose length varies by
    /// row and isn't meaningful as a single number.
    pub fn shape(&self) -> Vec<Option<i64>> {
        self.axes
            .iter()
            .map(|a| match a {
                RtAxis::Fixed { shape, .. } => Some(*shape),
                RtAxis::Var { .. } => None,
            })
            .collect()
    }

    /// True if the element currently addressed by `self` (with `axes`
    /// empty, i.e. a scalar position) is missing.
    pub fn is_missing(&self) -> Result<bool> {
        if !self.axes.is_empty() {
            return Err(XndError::TypeError(
                "is_missing() requires a fully-indexed (scalar) view".to_string(),
            ));
        }
        if self.leaf_bitmap.is_empty() {
            return Ok(false);
        }
        let Cursor::Bytes(b) = self.cursor else {
            return Err(XndError::MemoryError("scalar view has a row cursor".to_string()));
        };
        let leaf_index = (b / self.dtype_layout.size.max(1) as i64).max(0) as usize;
        Ok(!self.leaf_bitmap.is_set(leaf_index)?)
    }

    /// Resolves the current cursor to concrete bytes for the dtype (only
    /// valid once `axes` is empty and the element is present).
    pub fn scalar_bytes(&self) -> Result<&[u8]> {
        if !self.axes.is_empty() {
            return Err(XndError::TypeError("not a scalar position".to_string()));
        }
        let Cursor::Bytes(b) = self.cursor else {
            return Err(XndError::MemoryError("scalar view has a row cursor".to_string()));
        };
        let b = b as usize;
        let size = self.dtype_layout.size;
        let src = self.arena.as_slice();
        src.get(b..b + size).ok_or_else(|| {
            XndError::MemoryError(format!("scalar read out of bounds at byte {b}"))
        })
    }

    /// Locks and returns the scalar's bytes for mutation. The returned guard
    /// holds the arena's single mutable-borrow slot, so calling this again
    /// on another `View` clone of the same arena before the guard drops
    /// fails with `ValueError` instead of aliasing the first guard's bytes.
    pub fn scalar_bytes_mut(&self) -> Result<crate::arena::ScalarMut<'_>> {
        if !self.writable {
            return Err(XndError::ValueError("view is not writable".to_string()));
        }
        if !self.axes.is_empty() {
            return Err(XndError::TypeError("not a scalar position".to_string()));
        }
        let Cursor::Bytes(b) = self.cursor else {
            return Err(XndError::MemoryError("scalar view has a row cursor".to_string()));
        };
        self.arena.try_borrow_mut_range(b as usize, self.dtype_layout.size)
    }

    /// Byte/row strides along each remaining axis, as reported to the host;
    /// var axes report `None`.
    pub fn strides(&self) -> Vec<Option<i64>> {
        self.axes
            .iter()
            .map(|a| match a {
                RtAxis::Fixed { stride, unit: StrideUnit::Bytes, .. } => Some(*stride),
                _ => None,
            })
            .collect()
    }

    /// Indexes a single scalar integer `i` along axis 0, consuming it and
    /// returning the narrower view.
    pub fn index_fixed(&self, i: i64, shape: i64, stride: i64, unit: StrideUnit) -> Result<(Cursor, &[RtAxis])> {
        let i = normalize_index(i, shape)?;
        let new_cursor = match (self.cursor, unit) {
            (Cursor::Bytes(b), StrideUnit::Bytes) => Cursor::Bytes(b + i * stride),
            (Cursor::Rows(r), StrideUnit::Rows) => Cursor::Rows(r + i * stride),
            _ => return Err(XndError::MemoryError("cursor/unit mismatch".to_string())),
        };
        Ok((new_cursor, &self.axes[1..]))
    }

    pub fn resolve_var_row(&self, table: &VarTable, local_len: i64, i: i64) -> Result<(i64, i64, bool)> {
        let i = normalize_index(i, local_len).map_err(|_| {
            // A window narrower than the table's full row count means this
            // view already descends from a slice or an outer row selection;
            // name that case distinctly from a plain out-of-range index.
            if local_len != table.row_count() as i64 {
                XndError::VarIndexOutOfRangeAcrossLists { index: i }
            } else {
                XndError::OutOfRange { index: i, len: local_len.max(0) as usize }
            }
        })?;
        let Cursor::Rows(base_row) = self.cursor else {
            return Err(XndError::MemoryError("var axis requires a row cursor".to_string()));
        };
        let abs_row = (base_row + i) as usize;
        let present = table.bitmap.is_set(abs_row)?;
        let start = *table.offsets.get(abs_row).ok_or(XndError::OutOfRange {
            index: abs_row as i64,
            len: table.offsets.len(),
        })?;
        let len = *table.shapes.get(abs_row).ok_or(XndError::OutOfRange {
            index: abs_row as i64,
            len: table.shapes.len(),
        })?;
        Ok((start, len, present))
    }

    pub fn arena(&self) -> &ArenaHandle {
        &self.arena
    }
}

/// Adjusts a possibly-negative index against `len` (Python-style: `-1` is
/// the last element), failing `out_of_range` outside `[-len, len)`.
pub fn normalize_index(i: i64, len: i64) -> Result<i64> {
    let adj = if i < 0 { i + len } else { i };
    if adj < 0 || adj >= len {
        Err(XndError::OutOfRange { index: i, len: len.max(0) as usize })
    } else {
        Ok(adj)
    }
}

/// Clamps a Python-style half-open slice `[start, stop)` with `step` against
/// `len`, returning the selected count and the first selected index.
pub fn clamp_slice(start: Option<i64>, stop: Option<i64>, step: i64, len: i64) -> Result<(i64, i64)> {
    if step == 0 {
        return Err(XndError::ValueError("slice step cannot be zero".to_string()));
    }
    let (lo_default, hi_default) = if step > 0 { (0, len) } else { (len - 1, -1) };
    let clamp = |v: i64, low: i64, high: i64| v.clamp(low, high);

    let resolve = |v: Option<i64>, default: i64| -> i64 {
        match v {
            None => default,
            Some(v) => {
                let adj = if v < 0 { v + len } else { v };
                if step > 0 {
                    clamp(adj, 0, len)
                } else {
                    clamp(adj, -1, len - 1)
                }
            }
        }
    };
    let first = resolve(start, lo_default);
    let last = resolve(stop, hi_default);
    let count = if step > 0 {
        if last > first { (last - first + step - 1) / step } else { 0 }
    } else {
        if first > last { (first - last + (-step) - 1) / (-step) } else { 0 }
    };
    Ok((first, count))
}

pub(crate) fn dim_node_is_var(node: &DimNode) -> bool {
    matches!(node, DimNode::Var { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_index_wraps_negative() {
        assert_eq!(normalize_index(-1, 5).unwrap(), 4);
        assert!(normalize_index(5, 5).is_err());
    }

    #[test]
    fn clamp_slice_basic_forward() {
        let (first, count) = clamp_slice(Some(1), Some(4), 1, 5).unwrap();
        assert_eq!((first, count), (1, 3));
    }

    #[test]
    fn clamp_slice_full_reverse() {
        let (first, count) = clamp_slice(None, None, -1, 5).unwrap();
        assert_eq!((first, count), (4, 5));
    }

    #[test]
    fn clamp_slice_step_two() {
        let (first, count) = clamp_slice(Some(0), Some(5), 2, 5).unwrap();
        assert_eq!((first, count), (0, 3));
    }

    #[test]
    fn cloned_views_over_the_same_arena_cannot_both_mutate_at_once() {
        use crate::config::LayoutConfig;
        use crate::value::{from_value, HostValue};

        let view = from_value(&HostValue::Int(1), None, &LayoutConfig::default()).unwrap();
        let clone = view.clone();

        let guard = view.scalar_bytes_mut().unwrap();
        assert!(matches!(
            clone.scalar_bytes_mut(),
            Err(crate::error::XndError::ValueError(_))
        ));
        drop(guard);
        assert!(clone.scalar_bytes_mut().is_ok());
    }
}
