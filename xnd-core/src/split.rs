//! `Split(n)` : divides axis 0 into `n` roughly-equal contiguous
//! chunks via a divmod schedule, so the total row count is preserved exactly
//! even when it doesn't divide evenly.

use crate::error::{Result, XndError};
use crate::view::{Cursor, RtAxis, StrideUnit, View};

impl View {
    /// Splits axis 0 into `n` contiguous, non-overlapping sub-views. The
    /// first `len % n` chunks get one extra row; `n` must not exceed axis
    /// 0's length.
    pub fn split(&self, n: usize) -> Result<Vec<View>> {
        if n == 0 {
            return Err(XndError::ValueError("split count must be positive".to_string()));
        }
        let axis = self.axes.first().ok_or_else(|| {
            XndError::TypeError("split requires at least one dimension".to_string())
        })?;
        let len = axis.shape_hint().unwrap_or(0);
        if n as i64 > len {
            return Err(XndError::ValueError(format!(
                "cannot split {len} rows into {n} non-empty chunks"
            )));
        }
        let base = len / n as i64;
        let extra = len % n as i64;

        let mut out = Vec::with_capacity(n);
        let mut start = 0i64;
        for k in 0..n {
            let count = base + if (k as i64) < extra { 1 } else { 0 };
            out.push(self.sub_range(start, count)?);
            start += count;
        }
        Ok(out)
    }

    fn sub_range(&self, start: i64, count: i64) -> Result<View> {
        match self.axes.first() {
            Some(RtAxis::Fixed { stride, unit, bitmap, layout, .. }) => {
                let new_bitmap = if bitmap.is_empty() {
                    bitmap.clone()
                } else {
                    bitmap.slice(start.max(0) as usize, count as usize)?
                };
                let new_cursor = match (self.cursor, unit) {
                    (Cursor::Bytes(b), StrideUnit::Bytes) => Cursor::Bytes(b + start * stride),
                    (Cursor::Rows(r), StrideUnit::Rows) => Cursor::Rows(r + start * stride),
                    _ => return Err(XndError::MemoryError("cursor/unit mismatch".to_string())),
                };
                let mut axes = vec![RtAxis::Fixed {
                    shape: count,
                    stride: *stride,
                    unit: *unit,
                    bitmap: new_bitmap,
                    layout: *layout,
                }];
                axes.extend(self.axes[1..].iter().cloned());
                Ok(View {
                    arena: self.arena.clone(),
                    cursor: new_cursor,
                    axes,
                    dtype: self.dtype.clone(),
                    dtype_layout: self.dtype_layout.clone(),
                    leaf_bitmap: self.leaf_bitmap.clone(),
                    writable: self.writable,
                })
            }
            Some(RtAxis::Var { table, .. }) => {
                let Cursor::Rows(base_row) = self.cursor else {
                    return Err(XndError::MemoryError("var axis requires a row cursor".to_string()));
                };
                let mut axes = vec![RtAxis::Var { table: table.clone(), len: count }];
                axes.extend(self.axes[1..].iter().cloned());
                Ok(View {
                    arena: self.arena.clone(),
                    cursor: Cursor::Rows(base_row + start),
                    axes,
                    dtype: self.dtype.clone(),
                    dtype_layout: self.dtype_layout.clone(),
                    leaf_bitmap: self.leaf_bitmap.clone(),
                    writable: self.writable,
                })
            }
            None => Err(XndError::TypeError("split requires at least one dimension".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use xnd_types::{DimLayout, PrimitiveKind, Type};

    fn flat_view(n: i64) -> View {
        let axes = vec![RtAxis::Fixed { shape: n, stride: 8, unit: StrideUnit::Bytes, bitmap: Bitmap::empty(), layout: DimLayout::CContiguous }];
        View {
            arena: crate::arena::Arena::new((n * 8).max(1) as usize, 8),
            cursor: Cursor::Bytes(0),
            axes,
            dtype: Type::primitive(PrimitiveKind::Int64),
            dtype_layout: crate::layout::FlatLayout { size: 8, align: 8, field_offsets: vec![] },
            leaf_bitmap: Bitmap::empty(),
            writable: true,
        }
    }

    #[test]
    fn split_uneven_gives_divmod_schedule() {
        let v = flat_view(10);
        let parts = v.split(3).unwrap();
        let lens: Vec<usize> = parts.iter().map(|p| p.len().unwrap()).collect();
        assert_eq!(lens, vec![4, 3, 3]);
    }

    #[test]
    fn split_more_than_len_fails() {
        let v = flat_view(2);
        assert!(v.split(5).is_err());
    }
}
