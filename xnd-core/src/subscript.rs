//! Multi-index subscripting : ellipsis normalization, per-axis
//! integer/slice handling for both fixed and var axes, record/union field
//! selection, and the ragged "Fixed-before-Var" and "Var-before-Fixed"
//! interactions.

use std::rc::Rc;

use xnd_types::TypeKind;

use crate::bitmap::Bitmap;
use crate::error::{Result, XndError};
use crate::view::{clamp_slice, normalize_index, Cursor, RtAxis, StrideUnit, VarTable, View};

/// One subscript entry.
#[derive(Clone, Debug)]
pub enum Index {
    Integer(i64),
    Slice { start: Option<i64>, stop: Option<i64>, step: i64 },
    Ellipsis,
    NewAxis,
    /// Record/union field selection by name.
    Field(String),
}

impl View {
    /// Applies a full subscript tuple, left to right, expanding at most one
    /// `Ellipsis` to fill the remaining fixed/var axes.
    pub fn get(&self, indices: &[Index]) -> Result<View> {
        let n_consuming = indices
            .iter()
            .filter(|i| !matches!(i, Index::NewAxis))
            .count();
        if n_consuming > self.axes.len() && !indices.iter().any(|i| matches!(i, Index::Field(_))) {
            return Err(XndError::TooManyIndices { got: n_consuming, ndim: self.axes.len() });
        }

        let ellipsis_at = indices.iter().position(|i| matches!(i, Index::Ellipsis));
        let mut expanded: Vec<Index> = Vec::with_capacity(indices.len() + self.axes.len());
        match ellipsis_at {
            None => expanded.extend(indices.iter().cloned()),
            Some(pos) => {
                let before = &indices[..pos];
                let after = &indices[pos + 1..];
                let explicit = before.len() + after.len();
                let fill = self.axes.len().saturating_sub(explicit);
                expanded.extend(before.iter().cloned());
                for _ in 0..fill {
                    expanded.push(Index::Slice { start: None, stop: None, step: 1 });
                }
                expanded.extend(after.iter().cloned());
            }
        }

        let mut cur = self.clone();
        for idx in expanded {
            cur = cur.apply_one(&idx)?;
        }
        Ok(cur)
    }

    fn apply_one(&self, idx: &Index) -> Result<View> {
        match idx {
            Index::Field(name) => self.select_field(name),
            Index::NewAxis => Err(XndError::NotImplemented("newaxis insertion".to_string())),
            Index::Integer(i) => self.index_axis0(*i),
            Index::Slice { start, stop, step } => self.slice_axis0(*start, *stop, *step),
            Index::Ellipsis => unreachable!("expanded before apply_one"),
        }
    }

    fn select_field(&self, name: &str) -> Result<View> {
        if !self.axes.is_empty() {
            return Err(XndError::TypeError(
                "field selection requires a fully-indexed (record/tuple/union) position".to_string(),
            ));
        }
        let stripped = self.dtype.strip_wrappers();
        match &stripped.kind {
            TypeKind::Record { fields, .. } => {
                let pos = fields.iter().position(|(n, _)| n == name).ok_or_else(|| {
                    XndError::TypeError(format!("no field named {name:?} in this record"))
                })?;
                self.descend_into_field(pos)
            }
            TypeKind::Tuple { .. } => {
                let pos: usize = name
                    .parse()
                    .map_err(|_| XndError::TypeError(format!("tuple field must be numeric, got {name:?}")))?;
                self.descend_into_field(pos)
            }
            _ => Err(XndError::TypeError("not a record or tuple type".to_string())),
        }
    }

    fn descend_into_field(&self, field_index: usize) -> Result<View> {
        let (field_ty, offset) = match &self.dtype.strip_wrappers().kind {
            TypeKind::Record { fields, .. } => {
                let layout = crate::layout::flat_layout(&self.dtype, &crate::config::LayoutConfig::default())?;
                (fields[field_index].1.clone(), layout.field_offsets[field_index])
            }
            TypeKind::Tuple { fields, .. } => {
                let layout = crate::layout::flat_layout(&self.dtype, &crate::config::LayoutConfig::default())?;
                (fields[field_index].clone(), layout.field_offsets[field_index])
            }
            _ => unreachable!(),
        };
        let Cursor::Bytes(b) = self.cursor else {
            return Err(XndError::MemoryError("field selection needs a byte cursor".to_string()));
        };
        let dtype_layout = crate::layout::flat_layout(&field_ty, &crate::config::LayoutConfig::default())?;
        Ok(View {
            arena: self.arena.clone(),
            cursor: Cursor::Bytes(b + offset as i64),
            axes: Vec::new(),
            leaf_bitmap: Bitmap::empty(),
            dtype: field_ty,
            dtype_layout,
            writable: self.writable,
        })
    }

    fn index_axis0(&self, i: i64) -> Result<View> {
        if self.is_missing_outer()? {
            return Err(XndError::MissingValueNotIndexable);
        }
        let axis = self.axes.first().ok_or(XndError::TooManyIndices { got: 1, ndim: 0 })?;
        match axis.clone() {
            RtAxis::Fixed { shape, stride, unit, bitmap, .. } => {
                let norm = normalize_index(i, shape)?;
                if !bitmap.is_empty() && !bitmap.is_set(norm as usize)? {
                    return Err(XndError::MissingValueNotIndexable);
                }
                let (cursor, rest) = self.index_fixed(i, shape, stride, unit)?;
                Ok(self.narrowed(cursor, rest.to_vec()))
            }
            RtAxis::Var { table, len } => {
                let (start, row_len, present) = self.resolve_var_row(&table, len, i)?;
                if !present {
                    return Err(XndError::MissingValueNotIndexable);
                }
                self.descend_var_row(start, row_len)
            }
        }
    }

    /// Resolves a single selected `Var` row (`start`, `row_len`) into a new
    /// `View`, switching the cursor to byte- or row-addressing depending on
    /// what the next axis expects.
    fn descend_var_row(&self, start: i64, row_len: i64) -> Result<View> {
        let rest = &self.axes[1..];
        match rest.first() {
            None => Ok(self.narrowed(Cursor::Bytes(start * self.dtype_layout.size as i64), Vec::new())),
            Some(RtAxis::Fixed { unit: StrideUnit::Bytes, .. }) => {
                let elem_size = self.next_fixed_elem_byte_size(rest)?;
                Ok(self.narrowed(Cursor::Bytes(start * elem_size), rest.to_vec()))
            }
            Some(RtAxis::Fixed { unit: StrideUnit::Rows, .. }) | Some(RtAxis::Var { .. }) => {
                Ok(self.narrowed(Cursor::Rows(start), clamp_row_axis_len(rest, row_len)))
            }
        }
    }

    /// Byte size of one row of the next axis's row-space, used to convert a
    /// `Var` table's element-counted offset into a byte offset when the
    /// following axis is byte-addressed.
    fn next_fixed_elem_byte_size(&self, rest: &[RtAxis]) -> Result<i64> {
        match rest.first() {
            Some(RtAxis::Fixed { stride, .. }) => Ok(*stride),
            _ => Ok(self.dtype_layout.size as i64),
        }
    }

    fn slice_axis0(&self, start: Option<i64>, stop: Option<i64>, step: i64) -> Result<View> {
        let axis = self.axes.first().ok_or(XndError::TooManyIndices { got: 1, ndim: 0 })?;
        match axis.clone() {
            RtAxis::Fixed { shape, stride, unit, bitmap, layout } => {
                let (first, count) = clamp_slice(start, stop, step, shape)?;
                let new_bitmap = if bitmap.is_empty() {
                    Bitmap::empty()
                } else if step == 1 {
                    bitmap.slice(first.max(0) as usize, count as usize)?
                } else {
                    let idxs: Vec<i64> = (0..count).map(|k| first + k * step).collect();
                    bitmap.gather(&idxs)?
                };
                let new_cursor = match self.cursor {
                    Cursor::Bytes(b) if unit == StrideUnit::Bytes => Cursor::Bytes(b + first * stride),
                    Cursor::Rows(r) if unit == StrideUnit::Rows => Cursor::Rows(r + first * stride),
                    _ => return Err(XndError::MemoryError("cursor/unit mismatch".to_string())),
                };
                let mut rest = vec![RtAxis::Fixed {
                    shape: count,
                    stride: stride * step,
                    unit,
                    bitmap: new_bitmap,
                    layout,
                }];
                rest.extend(self.axes[1..].iter().cloned());
                Ok(self.narrowed(new_cursor, rest))
            }
            RtAxis::Var { table, len } => {
                let (first, count) = clamp_slice(start, stop, step, len)?;
                let Cursor::Rows(base_row) = self.cursor else {
                    return Err(XndError::MemoryError("var axis requires a row cursor".to_string()));
                };
                if step == 1 {
                    let mut rest = vec![RtAxis::Var { table, len: count }];
                    rest.extend(self.axes[1..].iter().cloned());
                    Ok(self.narrowed(Cursor::Rows(base_row + first), rest))
                } else {
                    // non-unit step produces a non-contiguous row window;
                    // materialize a compacted table.
                    let rows: Vec<i64> = (0..count).map(|k| base_row + first + k * step).collect();
                    let gathered = gather_table(&table, &rows)?;
                    let mut rest = vec![RtAxis::Var { table: Rc::new(gathered), len: count }];
                    rest.extend(self.axes[1..].iter().cloned());
                    Ok(self.narrowed(Cursor::Rows(0), rest))
                }
            }
        }
    }

    fn narrowed(&self, cursor: Cursor, axes: Vec<RtAxis>) -> View {
        View {
            arena: self.arena.clone(),
            cursor,
            axes,
            dtype: self.dtype.clone(),
            dtype_layout: self.dtype_layout.clone(),
            leaf_bitmap: self.leaf_bitmap.clone(),
            writable: self.writable,
        }
    }

    fn is_missing_outer(&self) -> Result<bool> {
        // A missing outer list/row is only representable via the axis's own
        // bitmap, checked by the caller before descent; `View` itself never
        // sits "on" a missing position, so this is always false today. Kept
        // as an extension point for future outer-optional checks.
        Ok(false)
    }
}

fn gather_table(table: &VarTable, rows: &[i64]) -> Result<VarTable> {
    let mut offsets = Vec::with_capacity(rows.len());
    let mut shapes = Vec::with_capacity(rows.len());
    for &r in rows {
        let r = r as usize;
        offsets.push(*table.offsets.get(r).ok_or(XndError::OutOfRange { index: r as i64, len: table.offsets.len() })?);
        shapes.push(*table.shapes.get(r).ok_or(XndError::OutOfRange { index: r as i64, len: table.shapes.len() })?);
    }
    let bitmap = table.bitmap.gather(rows)?;
    Ok(VarTable { offsets: Rc::new(offsets), shapes: Rc::new(shapes), bitmap })
}

/// After selecting one `Var` row, a directly nested `Var` axis's table is
/// still the whole level's global row table — its own `len` must be
/// narrowed from that global row count down to `row_len`, the span this one
/// selected row actually owns, or a later index into it would happily wander
/// into rows that belong to a sibling outer row. A `Fixed(unit=Rows)` axis
/// needs no such narrowing: its `shape` already comes straight from the
/// static type and every row addresses exactly one of its own slots.
fn clamp_row_axis_len(rest: &[RtAxis], row_len: i64) -> Vec<RtAxis> {
    match rest.first() {
        Some(RtAxis::Var { table, .. }) => {
            let mut out = Vec::with_capacity(rest.len());
            out.push(RtAxis::Var { table: table.clone(), len: row_len });
            out.extend(rest[1..].iter().cloned());
            out
        }
        _ => rest.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::view::{RtAxis, StrideUnit};
    use xnd_types::{DimLayout, PrimitiveKind, Type};

    fn fixed_vec_view(n: i64) -> View {
        let axes = vec![RtAxis::Fixed {
            shape: n,
            stride: 8,
            unit: StrideUnit::Bytes,
            bitmap: Bitmap::empty(),
            layout: DimLayout::CContiguous,
        }];
        View {
            arena: crate::arena::Arena::new((n as usize) * 8, 8),
            cursor: Cursor::Bytes(0),
            axes,
            dtype: Type::primitive(PrimitiveKind::Int64),
            dtype_layout: crate::layout::FlatLayout { size: 8, align: 8, field_offsets: vec![] },
            leaf_bitmap: Bitmap::empty(),
            writable: true,
        }
    }

    #[test]
    fn integer_index_narrows_to_scalar() {
        let v = fixed_vec_view(5);
        let scalar = v.get(&[Index::Integer(2)]).unwrap();
        assert_eq!(scalar.ndim(), 0);
        assert_eq!(scalar.cursor, Cursor::Bytes(16));
    }

    #[test]
    fn negative_integer_index_wraps() {
        let v = fixed_vec_view(5);
        let scalar = v.get(&[Index::Integer(-1)]).unwrap();
        assert_eq!(scalar.cursor, Cursor::Bytes(32));
    }

    #[test]
    fn slice_narrows_shape_and_stride() {
        let v = fixed_vec_view(10);
        let s = v.get(&[Index::Slice { start: Some(1), stop: Some(9), step: 2 }]).unwrap();
        assert_eq!(s.len().unwrap(), 4);
        match &s.axes[0] {
            RtAxis::Fixed { stride, shape, .. } => {
                assert_eq!(*stride, 16);
                assert_eq!(*shape, 4);
            }
            _ => panic!("expected fixed axis"),
        }
    }

    #[test]
    fn out_of_range_integer_fails() {
        let v = fixed_vec_view(3);
        assert!(matches!(v.get(&[Index::Integer(3)]), Err(XndError::OutOfRange { .. })));
    }

    #[test]
    fn too_many_indices_fails() {
        let v = fixed_vec_view(3);
        assert!(matches!(
            v.get(&[Index::Integer(0), Index::Integer(0)]),
            Err(XndError::TooManyIndices { .. })
        ));
    }

    #[test]
    fn nested_var_row_does_not_leak_into_sibling_rows() {
        use crate::config::LayoutConfig;
        use crate::value::{from_value, HostValue};

        // var * var * int64: row 1 is `[[4,5,6],[7]]`, only 2 entries deep.
        let value = HostValue::List(vec![
            HostValue::List(vec![
                HostValue::List(vec![HostValue::Int(0), HostValue::Int(1)]),
                HostValue::List(vec![HostValue::Int(2), HostValue::Int(3)]),
            ]),
            HostValue::List(vec![
                HostValue::List(vec![HostValue::Int(4), HostValue::Int(5), HostValue::Int(6)]),
                HostValue::List(vec![HostValue::Int(7)]),
            ]),
            HostValue::List(vec![HostValue::List(vec![HostValue::Int(8), HostValue::Int(9)])]),
        ]);
        let view = from_value(&value, None, &LayoutConfig::default()).unwrap();
        let row1 = view.get(&[Index::Integer(1)]).unwrap();
        assert_eq!(row1.len().unwrap(), 2);
        assert!(matches!(
            row1.get(&[Index::Integer(2)]),
            Err(XndError::VarIndexOutOfRangeAcrossLists { index: 2 })
        ));
    }

    #[rustfmt::skip]
    #[test]
    fn ellipsis_fills_remaining_axes() {
        let axes = vec![
            RtAxis::Fixed { shape: 2, stride: 24, unit: StrideUnit::Bytes, bitmap: Bitmap::empty(), layout: DimLayout::CContiguous },
            RtAxis::Fixed { shape: 3, stride: 8, unit: StrideUnit::Bytes, bitmap: Bitmap::empty(), layout: DimLayout::CContiguous },
        ];
        let v = View {
            arena: crate::arena::Arena::new(48, 8),
            cursor: Cursor::Bytes(0),
            axes,
            dtype: Type::primitive(PrimitiveKind::Int64),
            dtype_layout: crate::layout::FlatLayout { size: 8, align: 8, field_offsets: vec![] },
            leaf_bitmap: Bitmap::empty(),
            writable: true,
        };
        let row = v.get(&[Index::Integer(1), Index::Ellipsis]).unwrap();
        assert_eq!(row.ndim(), 1);
        assert_eq!(row.len().unwrap(), 3);
    }
}
