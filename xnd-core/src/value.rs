//! Host-value marshalling : type inference from untyped nested
//! values, and the per-dtype assignment/read-back rules.

use std::rc::Rc;

use xnd_types::{CategoricalValue, PrimitiveKind, StringEncoding, Type, TypeKind};

use crate::arena::{Arena, ArenaHandle};
use crate::bitmap::Bitmap;
use crate::config::LayoutConfig;
use crate::error::{Result, XndError};
use crate::layout::{checked_mul, dim_chain, flat_layout, DimNode};
use crate::view::{RtAxis, StrideUnit, VarTable, View};

/// An untyped host value handed to the marshaller. Numbers are
/// kept as `f64`/`i64` pairs so integer and float literals both flow through
/// without the host having to pre-select a dtype.
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<HostValue>),
    Tuple(Vec<HostValue>),
    Record(Vec<(String, HostValue)>),
}

/// Infers a datashape from nested `HostValue`s , capping nesting
/// depth at `cfg.max_dim` and preferring `FixedDim` when every sibling list
/// at a given depth shares a length, falling back to `VarDim` otherwise.
pub fn infer_type(value: &HostValue, cfg: &LayoutConfig) -> Result<Type> {
    infer_at_depth(value, cfg, 0)
}

fn infer_at_depth(value: &HostValue, cfg: &LayoutConfig, depth: usize) -> Result<Type> {
    if depth > cfg.max_dim {
        return Err(XndError::TypeError(format!("nesting exceeds max_dim={}", cfg.max_dim)));
    }
    match value {
        HostValue::Missing => Ok(Type::primitive(PrimitiveKind::Float64).optional()),
        HostValue::Bool(_) => Ok(Type::primitive(PrimitiveKind::Bool)),
        HostValue::Int(_) => Ok(Type::primitive(PrimitiveKind::Int64)),
        HostValue::Float(_) => Ok(Type::primitive(PrimitiveKind::Float64)),
        HostValue::Complex(..) => Ok(Type::primitive(PrimitiveKind::Complex128)),
        HostValue::Str(_) => Ok(Type::new(TypeKind::String)),
        HostValue::Bytes(_) => Ok(Type::new(TypeKind::Bytes)),
        HostValue::Tuple(items) => {
            let fields = items
                .iter()
                .map(|v| infer_at_depth(v, cfg, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            Ok(Type::tuple(fields))
        }
        HostValue::Record(fields) => {
            let out = fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), infer_at_depth(v, cfg, depth + 1)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Type::record(out))
        }
        HostValue::List(items) => {
            if items.is_empty() {
                return Ok(Type::var_dim(Type::primitive(PrimitiveKind::Float64)));
            }
            let elem_types = items
                .iter()
                .map(|v| infer_at_depth(v, cfg, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            let elem_ty = unify(&elem_types)?;
            let all_lists_same_len = items.iter().all(|v| matches!(v, HostValue::List(_)))
                && same_list_lengths(items);
            let any_list = items.iter().any(|v| matches!(v, HostValue::List(_)));
            if !any_list || all_lists_same_len {
                Ok(Type::fixed_dim(items.len(), elem_ty))
            } else {
                Ok(Type::var_dim(elem_ty))
            }
        }
    }
}

fn same_list_lengths(items: &[HostValue]) -> bool {
    let mut len = None;
    for it in items {
        let HostValue::List(l) = it else { return false };
        match len {
            None => len = Some(l.len()),
            Some(n) if n != l.len() => return false,
            _ => {}
        }
    }
    true
}

/// Unifies sibling element types into one dtype, widening to `optional` if
/// any sibling was missing; fails `type_error` on genuine mismatches.
fn unify(types: &[Type]) -> Result<Type> {
    let mut out = types[0].clone();
    let mut optional = out.optional;
    for t in &types[1..] {
        optional |= t.optional;
        if std::mem::discriminant(&t.kind) != std::mem::discriminant(&out.kind) {
            return Err(XndError::TypeError("inferred element types differ across list entries".to_string()));
        }
    }
    out.optional = optional;
    Ok(out)
}

/// Builds a fresh root `View` holding `value`, inferring a type if `ty` is
/// `None`.
pub fn from_value(value: &HostValue, ty: Option<Type>, cfg: &LayoutConfig) -> Result<View> {
    let ty = match ty {
        Some(t) => t,
        None => infer_type(value, cfg)?,
    };
    let (chain, dtype) = dim_chain(&ty);
    let dtype_layout = flat_layout(dtype, cfg)?;

    if chain.is_empty() {
        let arena = Arena::new(dtype_layout.size.max(1), dtype_layout.align.max(1));
        write_scalar(&arena, 0, dtype, &dtype_layout, value)?;
        let leaf_bitmap = if dtype.optional {
            let mut b = Bitmap::new(1);
            if !matches!(value, HostValue::Missing) {
                b.set(0)?;
            }
            b
        } else {
            Bitmap::empty()
        };
        return View::new_root(arena, ty, Vec::new(), leaf_bitmap, true);
    }

    if chain.iter().any(|n| matches!(n, DimNode::Var { .. })) {
        build_var_root(value, &ty, &chain, dtype, &dtype_layout, cfg)
    } else {
        build_fixed_root(value, &ty, &chain, dtype, &dtype_layout, cfg)
    }
}

fn total_fixed_count(chain: &[DimNode]) -> Result<usize> {
    let mut n = 1usize;
    for node in chain {
        if let DimNode::Fixed { shape, .. } = node {
            n = checked_mul(n, *shape)?;
        }
    }
    Ok(n)
}

fn build_fixed_root(
    value: &HostValue,
    ty: &Type,
    chain: &[DimNode],
    dtype: &Type,
    dtype_layout: &crate::layout::FlatLayout,
    cfg: &LayoutConfig,
) -> Result<View> {
    let leaf_count = total_fixed_count(chain)?;
    let size = checked_mul(leaf_count, dtype_layout.size)?;
    let arena = Arena::new(size.max(1), dtype_layout.align.max(1));

    let mut axes = Vec::with_capacity(chain.len());
    let mut stride = dtype_layout.size as i64;
    for node in chain.iter().rev() {
        let DimNode::Fixed { shape, layout, optional } = node else { unreachable!() };
        let bitmap = if *optional { Bitmap::new(*shape) } else { Bitmap::empty() };
        axes.push(RtAxis::Fixed { shape: *shape as i64, stride, unit: StrideUnit::Bytes, bitmap, layout: *layout });
        stride = checked_mul(stride as usize, *shape)? as i64;
    }
    axes.reverse();

    fill_fixed(&arena, 0, chain, dtype, dtype_layout, value, cfg)?;
    View::new_root(arena, ty.clone(), axes, Bitmap::empty(), true)
}

fn fill_fixed(
    arena: &ArenaHandle,
    base: i64,
    chain: &[DimNode],
    dtype: &Type,
    dtype_layout: &crate::layout::FlatLayout,
    value: &HostValue,
    cfg: &LayoutConfig,
) -> Result<()> {
    match chain.first() {
        None => write_scalar(arena, base, dtype, dtype_layout, value),
        Some(DimNode::Fixed { shape, .. }) => {
            let HostValue::List(items) = value else {
                return Err(XndError::ValueError("expected a list for a fixed dimension".to_string()));
            };
            if items.len() != *shape {
                return Err(XndError::ValueError(format!(
                    "list length {} does not match fixed shape {}",
                    items.len(),
                    shape
                )));
            }
            let inner_count = total_fixed_count(&chain[1..])?;
            let row_bytes = checked_mul(inner_count, dtype_layout.size)?;
            for (i, item) in items.iter().enumerate() {
                fill_fixed(
                    arena,
                    base + checked_mul(i, row_bytes)? as i64,
                    &chain[1..],
                    dtype,
                    dtype_layout,
                    item,
                    cfg,
                )?;
            }
            Ok(())
        }
        Some(DimNode::Var { .. }) => unreachable!("build_fixed_root only called for var-free chains"),
    }
}

fn build_var_root(
    value: &HostValue,
    ty: &Type,
    chain: &[DimNode],
    dtype: &Type,
    dtype_layout: &crate::layout::FlatLayout,
    cfg: &LayoutConfig,
) -> Result<View> {
    // Flatten every leaf scalar in row-major order, and one table per `Var`
    // level encountered, by walking the nested host value once.
    let mut leaves: Vec<HostValue> = Vec::new();
    let mut tables: Vec<(Vec<i64>, Vec<i64>, Bitmap)> = chain
        .iter()
        .filter(|n| matches!(n, DimNode::Var { .. }))
        .map(|_| (Vec::new(), Vec::new(), Bitmap::empty()))
        .collect();

    walk_ragged(value, chain, 0, &mut tables, &mut leaves)?;

    let leaf_count = leaves.len();
    let size = checked_mul(leaf_count.max(1), dtype_layout.size)?;
    let arena = Arena::new(size, dtype_layout.align.max(1));
    for (i, leaf) in leaves.iter().enumerate() {
        write_scalar(&arena, checked_mul(i, dtype_layout.size)? as i64, dtype, dtype_layout, leaf)?;
    }

    let mut var_idx = 0;
    let mut axes = Vec::with_capacity(chain.len());
    for node in chain {
        match node {
            DimNode::Fixed { shape, layout, optional } => {
                let bitmap = if *optional { Bitmap::new(*shape) } else { Bitmap::empty() };
                // Fixed-before-var rows are addressed via the unit=Rows
                // mode; stride = product of row-counts contributed by any
                // further Fixed axes before the next Var level.
                axes.push(RtAxis::Fixed { shape: *shape as i64, stride: 1, unit: StrideUnit::Rows, bitmap, layout: *layout });
            }
            DimNode::Var { layout: _, optional } => {
                let (offsets, shapes, mut bitmap) = tables[var_idx].clone();
                if *optional && bitmap.is_empty() {
                    bitmap = Bitmap::new(shapes.len());
                    for i in 0..shapes.len() {
                        bitmap.set(i)?;
                    }
                }
                let table = VarTable { offsets: Rc::new(offsets), shapes: Rc::new(shapes), bitmap };
                axes.push(RtAxis::Var { table: Rc::new(table), len: table_len(&tables[var_idx]) });
                var_idx += 1;
            }
        }
    }
    View::new_root(arena, ty.clone(), axes, Bitmap::empty(), true)
}

fn table_len(t: &(Vec<i64>, Vec<i64>, Bitmap)) -> i64 {
    t.1.len() as i64
}

/// Recursively walks a ragged host value, appending leaf scalars to
/// `leaves` and row entries to the table for each `Var` level encountered
/// (row-major, depth-first).
fn walk_ragged(
    value: &HostValue,
    chain: &[DimNode],
    depth: usize,
    tables: &mut Vec<(Vec<i64>, Vec<i64>, Bitmap)>,
    leaves: &mut Vec<HostValue>,
) -> Result<()> {
    match chain.first() {
        None => {
            leaves.push(value.clone());
            Ok(())
        }
        Some(DimNode::Fixed { shape, .. }) => {
            let HostValue::List(items) = value else {
                return Err(XndError::ValueError("expected a list for a fixed dimension".to_string()));
            };
            if items.len() != *shape {
                return Err(XndError::ValueError("list length does not match fixed shape".to_string()));
            }
            for item in items {
                walk_ragged(item, &chain[1..], depth + 1, tables, leaves)?;
            }
            Ok(())
        }
        Some(DimNode::Var { .. }) => {
            let var_pos = chain[..depth]
                .iter()
                .filter(|n| matches!(n, DimNode::Var { .. }))
                .count();
            let HostValue::List(items) = value else {
                return Err(XndError::ValueError("expected a list for a var dimension".to_string()));
            };
            // Rows of this level point into the next var level's row-space
            // if there is one; otherwise they point directly at leaves.
            let next_var = chain[depth + 1..].iter().position(|n| matches!(n, DimNode::Var { .. }));
            let row_count = |tables: &[(Vec<i64>, Vec<i64>, Bitmap)], leaves: &[HostValue]| -> i64 {
                match next_var {
                    Some(_) => tables[var_pos + 1].1.len() as i64,
                    None => leaves.len() as i64,
                }
            };
            let start = row_count(tables, leaves);
            for item in items {
                walk_ragged(item, &chain[1..], depth + 1, tables, leaves)?;
            }
            let end = row_count(tables, leaves);
            let (offsets, shapes, _) = &mut tables[var_pos];
            offsets.push(start);
            shapes.push(end - start);
            Ok(())
        }
    }
}

fn write_scalar(
    arena: &ArenaHandle,
    offset: i64,
    dtype: &Type,
    _layout: &crate::layout::FlatLayout,
    value: &HostValue,
) -> Result<()> {
    let dtype = dtype.strip_wrappers();
    let off = offset as usize;
    if matches!(value, HostValue::Missing) {
        if !dtype.optional {
            return Err(XndError::ValueError("missing value assigned to a non-optional dtype".to_string()));
        }
        return Ok(());
    }
    match &dtype.kind {
        TypeKind::Primitive(p) => write_primitive(arena, off, *p, value),
        TypeKind::Char => {
            let HostValue::Int(c) = value else {
                return Err(XndError::ValueError("char requires an integer code point".to_string()));
            };
            arena.as_mut_slice()[off..off + 4].copy_from_slice(&(*c as u32).to_le_bytes());
            Ok(())
        }
        TypeKind::String => {
            let HostValue::Str(s) = value else {
                return Err(XndError::ValueError("expected a string".to_string()));
            };
            let (h_off, h_len) = arena.heap_alloc(s.as_bytes());
            arena.as_mut_slice()[off..off + 8].copy_from_slice(&h_off.to_le_bytes());
            arena.as_mut_slice()[off + 8..off + 16].copy_from_slice(&h_len.to_le_bytes());
            Ok(())
        }
        TypeKind::Bytes => {
            let HostValue::Bytes(b) = value else {
                return Err(XndError::ValueError("expected bytes".to_string()));
            };
            let (h_off, h_len) = arena.heap_alloc(b);
            arena.as_mut_slice()[off..off + 8].copy_from_slice(&h_off.to_le_bytes());
            arena.as_mut_slice()[off + 8..off + 16].copy_from_slice(&h_len.to_le_bytes());
            Ok(())
        }
        TypeKind::FixedString { len, encoding } => {
            let HostValue::Str(s) = value else {
                return Err(XndError::ValueError("expected a string".to_string()));
            };
            write_fixed_string(arena, off, *len, *encoding, s)
        }
        TypeKind::FixedBytes { size, .. } => {
            let HostValue::Bytes(b) = value else {
                return Err(XndError::ValueError("expected bytes".to_string()));
            };
            if b.len() != *size {
                return Err(XndError::ValueError(format!("fixed_bytes expects {size} bytes, got {}", b.len())));
            }
            arena.as_mut_slice()[off..off + size].copy_from_slice(b);
            Ok(())
        }
        TypeKind::Categorical { .. } => {
            let idx = dtype.category_index(&to_categorical_value(value)?).ok_or_else(|| {
                XndError::NotACategory { value: format!("{value:?}") }
            })?;
            arena.as_mut_slice()[off..off + 4].copy_from_slice(&(idx as u32).to_le_bytes());
            Ok(())
        }
        TypeKind::Tuple { fields, .. } => {
            let HostValue::Tuple(items) = value else {
                return Err(XndError::ValueError("expected a tuple".to_string()));
            };
            let l = flat_layout(dtype, &LayoutConfig::default())?;
            for (i, (field_ty, item)) in fields.iter().zip(items).enumerate() {
                write_scalar(arena, offset + l.field_offsets[i] as i64, field_ty, &flat_layout(field_ty, &LayoutConfig::default())?, item)?;
            }
            Ok(())
        }
        TypeKind::Record { fields, .. } => {
            let HostValue::Record(items) = value else {
                return Err(XndError::ValueError("expected a record".to_string()));
            };
            let l = flat_layout(dtype, &LayoutConfig::default())?;
            for (name, field_ty) in fields {
                let (_, v) = items.iter().find(|(k, _)| k == name).ok_or_else(|| {
                    XndError::ValueError(format!("missing record field {name:?}"))
                })?;
                let idx = dtype.record_field_index(name).unwrap();
                write_scalar(arena, offset + l.field_offsets[idx] as i64, field_ty, &flat_layout(field_ty, &LayoutConfig::default())?, v)?;
            }
            Ok(())
        }
        _ => Err(XndError::NotImplemented(format!("marshalling into {:?}", dtype.kind))),
    }
}

fn to_categorical_value(value: &HostValue) -> Result<CategoricalValue> {
    Ok(match value {
        HostValue::Int(i) => CategoricalValue::Int64(*i),
        HostValue::Float(f) => CategoricalValue::Float64(*f),
        HostValue::Bool(b) => CategoricalValue::Bool(*b),
        HostValue::Str(s) => CategoricalValue::Str(s.clone()),
        _ => return Err(XndError::ValueError("unsupported categorical value".to_string())),
    })
}

fn write_fixed_string(arena: &ArenaHandle, off: usize, len: usize, enc: StringEncoding, s: &str) -> Result<()> {
    let dst = arena.as_mut_slice();
    match enc {
        StringEncoding::Ascii | StringEncoding::Utf8 => {
            let bytes = s.as_bytes();
            if bytes.len() > len {
                return Err(XndError::ValueError("string too long for fixed_string".to_string()));
            }
            dst[off..off + bytes.len()].copy_from_slice(bytes);
            for b in &mut dst[off + bytes.len()..off + len] {
                *b = 0;
            }
        }
        StringEncoding::Utf16 => {
            let units: Vec<u16> = s.encode_utf16().collect();
            if units.len() > len {
                return Err(XndError::ValueError("string too long for fixed_string".to_string()));
            }
            for (i, u) in units.iter().enumerate() {
                dst[off + i * 2..off + i * 2 + 2].copy_from_slice(&u.to_le_bytes());
            }
            for i in units.len()..len {
                dst[off + i * 2..off + i * 2 + 2].copy_from_slice(&0u16.to_le_bytes());
            }
        }
        StringEncoding::Utf32 => {
            let chars: Vec<char> = s.chars().collect();
            if chars.len() > len {
                return Err(XndError::ValueError("string too long for fixed_string".to_string()));
            }
            for (i, c) in chars.iter().enumerate() {
                dst[off + i * 4..off + i * 4 + 4].copy_from_slice(&(*c as u32).to_le_bytes());
            }
            for i in chars.len()..len {
                dst[off + i * 4..off + i * 4 + 4].copy_from_slice(&0u32.to_le_bytes());
            }
        }
    }
    Ok(())
}

fn write_primitive(arena: &ArenaHandle, off: usize, kind: PrimitiveKind, value: &HostValue) -> Result<()> {
    let dst = arena.as_mut_slice();
    match kind {
        PrimitiveKind::Bool => {
            let HostValue::Bool(b) = value else { return Err(type_mismatch(kind)) };
            dst[off] = *b as u8;
        }
        PrimitiveKind::Int8 | PrimitiveKind::Int16 | PrimitiveKind::Int32 | PrimitiveKind::Int64 => {
            let HostValue::Int(i) = value else { return Err(type_mismatch(kind)) };
            let (lo, hi) = kind.int_bounds().unwrap();
            if (*i as i128) < lo || (*i as i128) > hi {
                return Err(XndError::Overflow(format!("{i} does not fit in {}", kind.display_name())));
            }
            write_int_le(dst, off, *i, kind.size());
        }
        PrimitiveKind::Uint8 | PrimitiveKind::Uint16 | PrimitiveKind::Uint32 | PrimitiveKind::Uint64 => {
            let HostValue::Int(i) = value else { return Err(type_mismatch(kind)) };
            let (lo, hi) = kind.int_bounds().unwrap();
            if (*i as i128) < lo || (*i as i128) > hi {
                return Err(XndError::Overflow(format!("{i} does not fit in {}", kind.display_name())));
            }
            write_int_le(dst, off, *i, kind.size());
        }
        PrimitiveKind::Float32 => {
            let f = as_f64(value)?;
            dst[off..off + 4].copy_from_slice(&(f as f32).to_le_bytes());
        }
        PrimitiveKind::Float64 => {
            let f = as_f64(value)?;
            dst[off..off + 8].copy_from_slice(&f.to_le_bytes());
        }
        PrimitiveKind::Float16 | PrimitiveKind::BFloat16 => {
            let f = as_f64(value)? as f32;
            if f.is_infinite() {
                return Err(XndError::Overflow(format!("{} overflows {}", f, kind.display_name())));
            }
            let bits = if kind == PrimitiveKind::BFloat16 { (f.to_bits() >> 16) as u16 } else { f16_from_f32(f) };
            dst[off..off + 2].copy_from_slice(&bits.to_le_bytes());
        }
        PrimitiveKind::Complex32 => {
            let (re, im) = as_complex(value)?;
            let (re, im) = (re as f32, im as f32);
            if re.is_infinite() || im.is_infinite() {
                return Err(XndError::Overflow(format!("{re}+{im}i overflows {}", kind.display_name())));
            }
            dst[off..off + 2].copy_from_slice(&f16_from_f32(re).to_le_bytes());
            dst[off + 2..off + 4].copy_from_slice(&f16_from_f32(im).to_le_bytes());
        }
        PrimitiveKind::Complex64 => {
            let (re, im) = as_complex(value)?;
            dst[off..off + 4].copy_from_slice(&(re as f32).to_le_bytes());
            dst[off + 4..off + 8].copy_from_slice(&(im as f32).to_le_bytes());
        }
        PrimitiveKind::Complex128 => {
            let (re, im) = as_complex(value)?;
            dst[off..off + 8].copy_from_slice(&re.to_le_bytes());
            dst[off + 8..off + 16].copy_from_slice(&im.to_le_bytes());
        }
    }
    Ok(())
}

fn write_int_le(dst: &mut [u8], off: usize, v: i64, size: usize) {
    let bytes = v.to_le_bytes();
    dst[off..off + size].copy_from_slice(&bytes[..size]);
}

fn as_f64(value: &HostValue) -> Result<f64> {
    match value {
        HostValue::Float(f) => Ok(*f),
        HostValue::Int(i) => Ok(*i as f64),
        _ => Err(XndError::ValueError("expected a number".to_string())),
    }
}

fn as_complex(value: &HostValue) -> Result<(f64, f64)> {
    match value {
        HostValue::Complex(re, im) => Ok((*re, *im)),
        HostValue::Float(f) => Ok((*f, 0.0)),
        HostValue::Int(i) => Ok((*i as f64, 0.0)),
        _ => Err(XndError::ValueError("expected a complex number".to_string())),
    }
}

fn type_mismatch(kind: PrimitiveKind) -> XndError {
    XndError::ValueError(format!("value does not match dtype {}", kind.display_name()))
}

/// Minimal round-to-nearest-even f32->f16 conversion.
fn f16_from_f32(f: f32) -> u16 {
    let bits = f.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32 - 127 + 15;
    let mantissa = bits & 0x7fffff;
    if exp <= 0 {
        sign
    } else if exp >= 0x1f {
        sign | 0x7c00
    } else {
        sign | ((exp as u16) << 10) | ((mantissa >> 13) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_fixed_dim_for_uniform_lists() {
        let v = HostValue::List(vec![
            HostValue::List(vec![HostValue::Int(1), HostValue::Int(2)]),
            HostValue::List(vec![HostValue::Int(3), HostValue::Int(4)]),
        ]);
        let ty = infer_type(&v, &LayoutConfig::default()).unwrap();
        assert_eq!(ty.static_shape(), vec![Some(2), Some(2)]);
    }

    #[test]
    fn infers_var_dim_for_ragged_lists() {
        let v = HostValue::List(vec![
            HostValue::List(vec![HostValue::Int(1)]),
            HostValue::List(vec![HostValue::Int(2), HostValue::Int(3)]),
        ]);
        let ty = infer_type(&v, &LayoutConfig::default()).unwrap();
        assert_eq!(ty.static_shape(), vec![None, None]);
    }

    #[test]
    fn marshals_flat_int_vector() {
        let v = HostValue::List(vec![HostValue::Int(1), HostValue::Int(2), HostValue::Int(3)]);
        let view = from_value(&v, None, &LayoutConfig::default()).unwrap();
        assert_eq!(view.len().unwrap(), 3);
    }

    #[test]
    fn overflow_is_rejected() {
        let v = HostValue::Int(1000);
        let ty = Type::primitive(PrimitiveKind::Int8);
        assert!(matches!(
            from_value(&v, Some(ty), &LayoutConfig::default()),
            Err(XndError::Overflow(_))
        ));
    }

    #[test]
    fn infinity_overflows_float16_and_bfloat16() {
        for kind in [PrimitiveKind::Float16, PrimitiveKind::BFloat16] {
            let ty = Type::primitive(kind);
            assert!(matches!(
                from_value(&HostValue::Float(f64::INFINITY), Some(ty.clone()), &LayoutConfig::default()),
                Err(XndError::Overflow(_))
            ));
            // NaN still succeeds.
            assert!(from_value(&HostValue::Float(f64::NAN), Some(ty), &LayoutConfig::default()).is_ok());
        }
    }

    #[test]
    fn infinity_overflows_complex32() {
        let ty = Type::primitive(PrimitiveKind::Complex32);
        assert!(matches!(
            from_value(&HostValue::Complex(f64::INFINITY, 0.0), Some(ty.clone()), &LayoutConfig::default()),
            Err(XndError::Overflow(_))
        ));
        assert!(from_value(&HostValue::Complex(1.0, 2.0), Some(ty), &LayoutConfig::default()).is_ok());
    }
}
