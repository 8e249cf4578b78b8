//! Contiguous copy , with an
//! optional dtype conversion performed element-by-element through the host
//! value layer so the same overflow/bounds rules apply as plain assignment.

use xnd_types::Type;

use crate::config::LayoutConfig;
use crate::error::{Result, XndError};
use crate::value::{from_value, HostValue};
use crate::view::View;

impl View {
    /// Reads the whole view out to a nested `HostValue` and re-marshals it,
    /// optionally under a different dtype. This is the
    /// reference "always correct, never zero-copy" path; `copy_contiguous`
    /// below is the fast path used when no conversion is requested and the
    /// view is already contiguous.
    pub fn copy_converting(&self, target_dtype: Option<&Type>) -> Result<View> {
        let value = self.to_host_value()?;
        let ty = match target_dtype {
            Some(dt) => retype_dtype(self.full_type_hint()?, dt.clone()),
            None => self.full_type_hint()?,
        };
        from_value(&value, Some(ty), &LayoutConfig::default())
    }

    /// Materializes a fresh C-contiguous copy of this view;
    /// goes through the same value round-trip as `copy_converting` since
    /// ragged var-dim regions can't be `memcpy`'d directly.
    pub fn copy_contiguous(&self) -> Result<View> {
        self.copy_converting(None)
    }

    /// Reads the entire (sub-)view into a nested `HostValue` tree.
    pub fn to_host_value(&self) -> Result<HostValue> {
        if self.ndim() == 0 {
            return self.scalar_to_host_value();
        }
        let len = self.len()?;
        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            let row = self
                .get(&[crate::subscript::Index::Integer(i as i64)])
                .map_err(|e| match e {
                    XndError::MissingValueNotIndexable => e,
                    other => other,
                })?;
            items.push(row.to_host_value()?);
        }
        Ok(HostValue::List(items))
    }

    fn scalar_to_host_value(&self) -> Result<HostValue> {
        use xnd_types::{PrimitiveKind, TypeKind};
        if self.is_missing()? {
            return Ok(HostValue::Missing);
        }
        let dtype = self.dtype.strip_wrappers();
        let bytes = self.scalar_bytes()?;
        Ok(match &dtype.kind {
            TypeKind::Primitive(p) => read_primitive(*p, bytes),
            TypeKind::Char => HostValue::Int(i32::from_le_bytes(bytes[0..4].try_into().unwrap()) as i64),
            TypeKind::String => HostValue::Str(self.read_heap_string(bytes)?),
            TypeKind::Bytes => HostValue::Bytes(self.read_heap_bytes(bytes)?),
            TypeKind::FixedString { .. } => HostValue::Str(self.read_fixed_string(bytes)?),
            TypeKind::FixedBytes { .. } => HostValue::Bytes(bytes.to_vec()),
            TypeKind::Categorical { categories } => {
                let idx = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
                categorical_to_host(&categories[idx])
            }
            TypeKind::Tuple { fields, .. } => {
                let mut items = Vec::with_capacity(fields.len());
                for i in 0..fields.len() {
                    let field = self.get(&[crate::subscript::Index::Field(i.to_string())])?;
                    items.push(field.to_host_value()?);
                }
                HostValue::Tuple(items)
            }
            TypeKind::Record { fields, .. } => {
                let mut items = Vec::with_capacity(fields.len());
                for (name, _) in fields {
                    let field = self.get(&[crate::subscript::Index::Field(name.clone())])?;
                    items.push((name.clone(), field.to_host_value()?));
                }
                HostValue::Record(items)
            }
            _ => return Err(XndError::NotImplemented(format!("reading {:?} back to a value", dtype.kind))),
        })
    }

    fn read_heap_string(&self, bytes: &[u8]) -> Result<String> {
        let off = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
        let len = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let raw = self.arena().heap_slice(off, len);
        String::from_utf8(raw.to_vec()).map_err(|e| XndError::ValueError(e.to_string()))
    }

    fn read_heap_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let off = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
        let len = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        Ok(self.arena().heap_slice(off, len).to_vec())
    }

    fn read_fixed_string(&self, bytes: &[u8]) -> Result<String> {
        let trimmed: Vec<u8> = bytes.iter().take_while(|&&b| b != 0).copied().collect();
        String::from_utf8(trimmed).map_err(|e| XndError::ValueError(e.to_string()))
    }

    /// Best-effort reconstruction of this view's full datashape, used when
    /// re-marshalling through `copy_converting`.
    fn full_type_hint(&self) -> Result<Type> {
        let mut ty = self.dtype.clone();
        for axis in self.axes.iter().rev() {
            ty = match axis {
                crate::view::RtAxis::Fixed { shape, .. } => Type::fixed_dim(*shape as usize, ty),
                crate::view::RtAxis::Var { .. } => Type::var_dim(ty),
            };
        }
        Ok(ty)
    }
}

fn retype_dtype(ty: Type, new_dtype: Type) -> Type {
    use xnd_types::TypeKind;
    match ty.kind {
        TypeKind::FixedDim { shape, layout, elem } => {
            Type::new(TypeKind::FixedDim { shape, layout, elem: Box::new(retype_dtype(*elem, new_dtype)) })
        }
        TypeKind::VarDim { layout, elem } => {
            Type::new(TypeKind::VarDim { layout, elem: Box::new(retype_dtype(*elem, new_dtype)) })
        }
        _ => new_dtype,
    }
}

fn categorical_to_host(v: &xnd_types::CategoricalValue) -> HostValue {
    use xnd_types::CategoricalValue::*;
    match v {
        Int64(i) => HostValue::Int(*i),
        Float64(f) => HostValue::Float(*f),
        Bool(b) => HostValue::Bool(*b),
        Str(s) => HostValue::Str(s.clone()),
    }
}

fn read_primitive(kind: xnd_types::PrimitiveKind, bytes: &[u8]) -> HostValue {
    use xnd_types::PrimitiveKind::*;
    match kind {
        Bool => HostValue::Bool(bytes[0] != 0),
        Int8 => HostValue::Int(bytes[0] as i8 as i64),
        Int16 => HostValue::Int(i16::from_le_bytes(bytes[0..2].try_into().unwrap()) as i64),
        Int32 => HostValue::Int(i32::from_le_bytes(bytes[0..4].try_into().unwrap()) as i64),
        Int64 => HostValue::Int(i64::from_le_bytes(bytes[0..8].try_into().unwrap())),
        Uint8 => HostValue::Int(bytes[0] as i64),
        Uint16 => HostValue::Int(u16::from_le_bytes(bytes[0..2].try_into().unwrap()) as i64),
        Uint32 => HostValue::Int(u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as i64),
        Uint64 => HostValue::Int(u64::from_le_bytes(bytes[0..8].try_into().unwrap()) as i64),
        Float32 => HostValue::Float(f32::from_le_bytes(bytes[0..4].try_into().unwrap()) as f64),
        Float64 => HostValue::Float(f64::from_le_bytes(bytes[0..8].try_into().unwrap())),
        Float16 | BFloat16 => HostValue::Float(f16_to_f32(u16::from_le_bytes(bytes[0..2].try_into().unwrap()), kind) as f64),
        Complex32 => HostValue::Complex(
            f16_to_f32(u16::from_le_bytes(bytes[0..2].try_into().unwrap()), kind) as f64,
            f16_to_f32(u16::from_le_bytes(bytes[2..4].try_into().unwrap()), kind) as f64,
        ),
        Complex64 => HostValue::Complex(
            f32::from_le_bytes(bytes[0..4].try_into().unwrap()) as f64,
            f32::from_le_bytes(bytes[4..8].try_into().unwrap()) as f64,
        ),
        Complex128 => HostValue::Complex(
            f64::from_le_bytes(bytes[0..8].try_into().unwrap()),
            f64::from_le_bytes(bytes[8..16].try_into().unwrap()),
        ),
    }
}

fn f16_to_f32(bits: u16, kind: xnd_types::PrimitiveKind) -> f32 {
    if kind == xnd_types::PrimitiveKind::BFloat16 || kind == xnd_types::PrimitiveKind::Complex32 {
        f32::from_bits((bits as u32) << 16)
    } else {
        let sign = (bits >> 15) as u32;
        let exp = ((bits >> 10) & 0x1f) as u32;
        let frac = (bits & 0x3ff) as u32;
        let bits32 = if exp == 0 {
            sign << 31
        } else if exp == 0x1f {
            (sign << 31) | 0x7f800000 | (frac << 13)
        } else {
            (sign << 31) | ((exp - 15 + 127) << 23) | (frac << 13)
        };
        f32::from_bits(bits32)
    }
}

impl std::fmt::Display for View {
    /// A compact, debugging-oriented rendering of this view's current
    /// value — not part of the wire format, just diagnostics.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_host_value() {
            Ok(v) => write!(f, "{v:?}"),
            Err(e) => write!(f, "<unreadable view: {e}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::HostValue;

    #[test]
    fn round_trips_flat_int_list() {
        let v = HostValue::List(vec![HostValue::Int(1), HostValue::Int(2), HostValue::Int(3)]);
        let view = from_value(&v, None, &LayoutConfig::default()).unwrap();
        let back = view.to_host_value().unwrap();
        assert_eq!(back, v);
    }
}
