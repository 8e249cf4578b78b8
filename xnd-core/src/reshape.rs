//! Reshape and transpose : both require the view to already be
//! fully contiguous in the requested order — hosts that hold a strided or
//! ragged view must call `copy::contiguous` first.

use xnd_types::DimLayout;

use crate::error::{Result, XndError};
use crate::view::{Cursor, RtAxis, StrideUnit, View};

/// C or Fortran iteration order, as requested by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Order {
    C,
    F,
}

impl View {
    /// True if every remaining axis is `Fixed`, byte-addressed, and its
    /// stride matches the natural row-major (or column-major) product of
    /// the shapes after (or before) it — i.e. reshape/transpose are safe.
    pub fn is_contiguous(&self, order: Order) -> bool {
        let mut expected = match self.axes.last() {
            Some(RtAxis::Fixed { .. }) | None => self.dtype_layout.size as i64,
            Some(RtAxis::Var { .. }) => return false,
        };
        let axes_in_order: Vec<&RtAxis> = match order {
            Order::C => self.axes.iter().rev().collect(),
            Order::F => self.axes.iter().collect(),
        };
        for axis in axes_in_order {
            match axis {
                RtAxis::Fixed { stride, unit: StrideUnit::Bytes, shape, .. } => {
                    if *stride != expected {
                        return false;
                    }
                    expected *= shape;
                }
                _ => return false,
            }
        }
        true
    }

    /// Reinterprets a contiguous view's flat buffer under a new shape.
    /// Fails `value_error` if the view isn't contiguous in `order` or
    /// the element counts don't match.
    pub fn reshape(&self, new_shape: &[usize], order: Order) -> Result<View> {
        if !self.is_contiguous(order) {
            return Err(XndError::ValueError(
                "reshape requires a contiguous view; call copy_contiguous() first".to_string(),
            ));
        }
        let old_count: i64 = self.axes.iter().map(|a| a.shape_hint().unwrap_or(1)).product();
        let new_count: i64 = new_shape.iter().map(|&s| s as i64).product();
        if old_count != new_count {
            return Err(XndError::ValueError(format!(
                "reshape element count mismatch: {old_count} != {new_count}"
            )));
        }
        let Cursor::Bytes(base) = self.cursor else {
            return Err(XndError::MemoryError("reshape requires a byte cursor".to_string()));
        };
        let elem = self.dtype_layout.size as i64;
        let mut axes = Vec::with_capacity(new_shape.len());
        match order {
            Order::C => {
                let mut stride = elem;
                let mut strides = Vec::with_capacity(new_shape.len());
                for &s in new_shape.iter().rev() {
                    strides.push(stride);
                    stride *= s as i64;
                }
                strides.reverse();
                for (i, &s) in new_shape.iter().enumerate() {
                    axes.push(RtAxis::Fixed {
                        shape: s as i64,
                        stride: strides[i],
                        unit: StrideUnit::Bytes,
                        bitmap: crate::bitmap::Bitmap::empty(),
                        layout: DimLayout::CContiguous,
                    });
                }
            }
            Order::F => {
                let mut stride = elem;
                let mut strides = Vec::with_capacity(new_shape.len());
                for &s in new_shape.iter() {
                    strides.push(stride);
                    stride *= s as i64;
                }
                for (i, &s) in new_shape.iter().enumerate() {
                    axes.push(RtAxis::Fixed {
                        shape: s as i64,
                        stride: strides[i],
                        unit: StrideUnit::Bytes,
                        bitmap: crate::bitmap::Bitmap::empty(),
                        layout: DimLayout::FContiguous,
                    });
                }
            }
        }
        Ok(View {
            arena: self.arena.clone(),
            cursor: Cursor::Bytes(base),
            axes,
            dtype: self.dtype.clone(),
            dtype_layout: self.dtype_layout.clone(),
            leaf_bitmap: self.leaf_bitmap.clone(),
            writable: self.writable,
        })
    }

    /// Permutes axes in place (zero-copy): `perm` must be a permutation of
    /// `0..ndim()` with no var dims among the permuted axes.
    pub fn transpose(&self, perm: &[usize]) -> Result<View> {
        if perm.len() != self.axes.len() {
            return Err(XndError::TypeError(format!(
                "transpose permutation length {} does not match ndim {}",
                perm.len(),
                self.axes.len()
            )));
        }
        let mut seen = vec![false; perm.len()];
        for &p in perm {
            if p >= perm.len() || seen[p] {
                return Err(XndError::TypeError(format!("invalid or repeated transpose axis {p}")));
            }
            seen[p] = true;
        }
        if self.axes.iter().any(|a| matches!(a, RtAxis::Var { .. })) {
            return Err(XndError::TypeError("cannot transpose a var dimension".to_string()));
        }
        let axes = perm.iter().map(|&p| self.axes[p].clone()).collect();
        Ok(View {
            arena: self.arena.clone(),
            cursor: self.cursor,
            axes,
            dtype: self.dtype.clone(),
            dtype_layout: self.dtype_layout.clone(),
            leaf_bitmap: self.leaf_bitmap.clone(),
            writable: self.writable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use xnd_types::{PrimitiveKind, Type};

    fn flat_view(shape: &[i64]) -> View {
        let mut stride = 8i64;
        let mut axes: Vec<RtAxis> = Vec::new();
        for &s in shape.iter().rev() {
            axes.push(RtAxis::Fixed { shape: s, stride, unit: StrideUnit::Bytes, bitmap: Bitmap::empty(), layout: DimLayout::CContiguous });
            stride *= s;
        }
        axes.reverse();
        let total: i64 = shape.iter().product();
        View {
            arena: crate::arena::Arena::new((total * 8).max(1) as usize, 8),
            cursor: Cursor::Bytes(0),
            axes,
            dtype: Type::primitive(PrimitiveKind::Int64),
            dtype_layout: crate::layout::FlatLayout { size: 8, align: 8, field_offsets: vec![] },
            leaf_bitmap: Bitmap::empty(),
            writable: true,
        }
    }

    #[test]
    fn reshape_preserves_element_count() {
        let v = flat_view(&[2, 3]);
        let r = v.reshape(&[3, 2], Order::C).unwrap();
        assert_eq!(r.shape(), vec![Some(3), Some(2)]);
    }

    #[test]
    fn reshape_rejects_mismatched_count() {
        let v = flat_view(&[2, 3]);
        assert!(v.reshape(&[4, 2], Order::C).is_err());
    }

    #[test]
    fn transpose_swaps_axes() {
        let v = flat_view(&[2, 3]);
        let t = v.transpose(&[1, 0]).unwrap();
        assert_eq!(t.shape(), vec![Some(3), Some(2)]);
    }

    #[test]
    fn transpose_rejects_bad_permutation() {
        let v = flat_view(&[2, 3]);
        assert!(v.transpose(&[0, 0]).is_err());
    }
}
