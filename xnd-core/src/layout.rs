//! The layout planner : computes byte size/alignment for
//! "flat" (dimension-free) subtrees — primitives, strings, tuples, records,
//! unions, refs, categoricals — and extracts the leading fixed/var
//! dimension chain from a type, bottom-up.

use xnd_types::{DimLayout, PrimitiveKind, Type, TypeKind};

use crate::config::LayoutConfig;
use crate::error::{Result, XndError};

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) / align * align
}

/// One dimension in the leading fixed/var prefix of a type.
#[derive(Clone, Debug)]
pub enum DimNode {
    Fixed { shape: usize, layout: DimLayout, optional: bool },
    Var { layout: DimLayout, optional: bool },
}

/// Splits `ty` into its leading dimension chain (outer→inner, transparent
/// wrappers stripped) and the remaining dtype.
pub fn dim_chain(ty: &Type) -> (Vec<DimNode>, &Type) {
    let mut chain = Vec::new();
    let mut cur = ty;
    loop {
        let stripped = cur.strip_wrappers();
        match &stripped.kind {
            TypeKind::FixedDim { shape, layout, elem } => {
                chain.push(DimNode::Fixed {
                    shape: *shape,
                    layout: *layout,
                    optional: stripped.optional,
                });
                cur = elem;
            }
            TypeKind::VarDim { layout, elem } => {
                chain.push(DimNode::Var { layout: *layout, optional: stripped.optional });
                cur = elem;
            }
            _ => return (chain, stripped),
        }
    }
}

/// Size/alignment of a tuple/record field or other composite node.
#[derive(Clone, Debug)]
pub struct FlatLayout {
    pub size: usize,
    pub align: usize,
    /// Byte offset of each field, populated for `Tuple`/`Record`/`Union`.
    pub field_offsets: Vec<usize>,
}

impl FlatLayout {
    fn scalar(size: usize, align: usize) -> Self {
        FlatLayout { size, align, field_offsets: Vec::new() }
    }
}

/// Computes size/alignment for a "flat" (no leading dims) type node. Fails
/// `not_implemented` if a dimension (fixed or var) is found nested inside a
/// tuple/record/union field — this workspace only supports array dims at a
/// type's outer prefix or behind a `Reference` indirection (see DESIGN.md).
pub fn flat_layout(ty: &Type, cfg: &LayoutConfig) -> Result<FlatLayout> {
    let ty = ty.strip_wrappers();
    match &ty.kind {
        TypeKind::Primitive(p) => Ok(FlatLayout::scalar(p.size(), p.align())),
        TypeKind::Char => Ok(FlatLayout::scalar(4, 4)),
        TypeKind::FixedString { len, encoding } => {
            let size = len * encoding.code_unit_size();
            Ok(FlatLayout::scalar(size.max(1), encoding.code_unit_size()))
        }
        TypeKind::FixedBytes { size, align } => Ok(FlatLayout::scalar(*size, *align)),
        TypeKind::String | TypeKind::Bytes => {
            // (heap offset: u64, heap len: u64)
            Ok(FlatLayout::scalar(16, 8))
        }
        TypeKind::Categorical { .. } => Ok(FlatLayout::scalar(4, 4)), // index into category list
        TypeKind::Ref(_) => Ok(FlatLayout::scalar(4, 4)),             // ref slot id
        TypeKind::Tuple { fields, pack, align } => layout_fields(
            fields.iter().map(|f| (None, f)),
            *pack,
            *align,
            cfg,
        ),
        TypeKind::Record { fields, pack, align } => layout_fields(
            fields.iter().map(|(name, f)| (Some(name.as_str()), f)),
            *pack,
            *align,
            cfg,
        ),
        TypeKind::Union { variants } => {
            let mut max_size = 0usize;
            let mut max_align = 1usize;
            for (_, v) in variants {
                let l = flat_layout(v, cfg)?;
                max_size = max_size.max(l.size);
                max_align = max_align.max(l.align);
            }
            // tag byte + max variant payload, payload aligned after the tag.
            let payload_off = align_up(1, max_align);
            let total = align_up(payload_off + max_size, max_align);
            Ok(FlatLayout { size: total, align: max_align, field_offsets: vec![payload_off] })
        }
        TypeKind::FixedDim { .. } | TypeKind::VarDim { .. } => Err(XndError::NotImplemented(
            "array dimensions nested inside a tuple/record/union field".to_string(),
        )),
        TypeKind::Constructor { .. } | TypeKind::Typedef { .. } => unreachable!("stripped above"),
    }
}

fn layout_fields<'a>(
    fields: impl Iterator<Item = (Option<&'a str>, &'a Type)>,
    pack: Option<u32>,
    align_override: Option<u32>,
    cfg: &LayoutConfig,
) -> Result<FlatLayout> {
    let mut offset = 0usize;
    let mut max_align = 1usize;
    let mut field_offsets = Vec::new();
    for (_name, field_ty) in fields {
        let l = flat_layout(field_ty, cfg)?;
        let field_align = pack.map(|p| p as usize).unwrap_or(l.align).max(1);
        offset = align_up(offset, field_align);
        field_offsets.push(offset);
        offset += l.size;
        max_align = max_align.max(field_align);
    }
    let align = align_override.map(|a| a as usize).unwrap_or(max_align).max(1);
    let size = align_up(offset, align);
    let _ = cfg;
    Ok(FlatLayout { size, align, field_offsets })
}

/// Checked multiplication used throughout the planner.
pub fn checked_mul(a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b).ok_or_else(|| XndError::Overflow(format!("{a} * {b}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnd_types::{parse, CategoricalValue};

    #[test]
    fn record_layout_packs_and_aligns() {
        let ty = parse("{a: bool, b: int64, c: int8}").unwrap();
        let l = flat_layout(&ty, &LayoutConfig::default()).unwrap();
        // bool@0 (1 byte), pad to 8 for int64@8, int8@16, total padded to 24
        assert_eq!(l.field_offsets, vec![0, 8, 16]);
        assert_eq!(l.align, 8);
        assert_eq!(l.size, 24);
    }

    #[test]
    fn categorical_requires_non_empty_list() {
        assert!(Type::categorical(vec![]).is_err());
        let t = Type::categorical(vec![CategoricalValue::Str("a".into())]).unwrap();
        let l = flat_layout(&t, &LayoutConfig::default()).unwrap();
        assert_eq!(l.size, 4);
    }

    #[test]
    fn dim_chain_splits_fixed_var_prefix() {
        let ty = parse("3 * ?var * ?int64").unwrap();
        let (chain, dtype) = dim_chain(&ty);
        assert_eq!(chain.len(), 2);
        assert!(matches!(chain[0], DimNode::Fixed { shape: 3, .. }));
        assert!(matches!(chain[1], DimNode::Var { optional: true, .. }));
        assert!(matches!(dtype.kind, TypeKind::Primitive(PrimitiveKind::Int64)));
        assert!(dtype.optional);
    }
}
