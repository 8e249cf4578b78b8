use std::fmt;

use crate::kind::{DimLayout, PrimitiveKind, StringEncoding};
use crate::types::{CategoricalValue, Type, TypeKind};

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(self))
    }
}

fn opt_prefix(t: &Type) -> &'static str {
    if t.optional {
        "?"
    } else {
        ""
    }
}

fn render(t: &Type) -> String {
    match &t.kind {
        TypeKind::FixedDim { shape, elem, layout } => {
            format!("{}{} * {}{}", opt_prefix(t), shape, layout_prefix(*layout), render(elem))
        }
        TypeKind::VarDim { elem, layout } => {
            format!("{}var{} * {}", opt_prefix(t), layout_suffix(*layout), render(elem))
        }
        TypeKind::Tuple { fields, .. } => {
            let inner: Vec<String> = fields.iter().map(render).collect();
            format!("{}({})", opt_prefix(t), inner.join(", "))
        }
        TypeKind::Record { fields, .. } => {
            let inner: Vec<String> = fields
                .iter()
                .map(|(name, ty)| format!("{}: {}", name, render(ty)))
                .collect();
            format!("{}{{{}}}", opt_prefix(t), inner.join(", "))
        }
        TypeKind::Union { variants } => {
            let inner: Vec<String> = variants
                .iter()
                .map(|(name, ty)| format!("{}: {}", name, render(ty)))
                .collect();
            format!("{}union({})", opt_prefix(t), inner.join(", "))
        }
        TypeKind::Ref(inner) => format!("{}ref({})", opt_prefix(t), render(inner)),
        TypeKind::Constructor { name, arg } => format!("{}{}({})", opt_prefix(t), name, render(arg)),
        TypeKind::Typedef { name, .. } => format!("{}{}", opt_prefix(t), name),
        TypeKind::Primitive(p) => format!("{}{}", opt_prefix(t), primitive_name(*p)),
        TypeKind::FixedString { len, encoding } => {
            format!("{}fixed_string[{}, '{}']", opt_prefix(t), len, encoding_name(*encoding))
        }
        TypeKind::FixedBytes { size, align } => {
            format!("{}fixed_bytes[size={}, align={}]", opt_prefix(t), size, align)
        }
        TypeKind::String => format!("{}string", opt_prefix(t)),
        TypeKind::Bytes => format!("{}bytes", opt_prefix(t)),
        TypeKind::Categorical { categories } => {
            let inner: Vec<String> = categories.iter().map(render_category).collect();
            format!("{}categorical({})", opt_prefix(t), inner.join(", "))
        }
        TypeKind::Char => format!("{}char", opt_prefix(t)),
    }
}

fn layout_prefix(layout: DimLayout) -> &'static str {
    match layout {
        DimLayout::CContiguous => "",
        DimLayout::FContiguous => "F:",
        DimLayout::ArrayOfPointers => "ptr:",
    }
}

fn layout_suffix(layout: DimLayout) -> &'static str {
    match layout {
        DimLayout::CContiguous => "",
        DimLayout::FContiguous => ".F",
        DimLayout::ArrayOfPointers => ".ptr",
    }
}

fn primitive_name(p: PrimitiveKind) -> &'static str {
    p.display_name()
}

fn encoding_name(e: StringEncoding) -> &'static str {
    e.display_name()
}

fn render_category(c: &CategoricalValue) -> String {
    match c {
        CategoricalValue::Int64(v) => v.to_string(),
        CategoricalValue::Float64(v) => v.to_string(),
        CategoricalValue::Bool(v) => v.to_string(),
        CategoricalValue::Str(v) => format!("{:?}", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::PrimitiveKind;

    #[test]
    fn prints_nested_optional_var_dim() {
        let t = Type::fixed_dim(
            3,
            Type::var_dim(Type::primitive(PrimitiveKind::Int64).optional()).optional(),
        );
        assert_eq!(t.to_string(), "3 * ?var * ?int64");
    }
}
