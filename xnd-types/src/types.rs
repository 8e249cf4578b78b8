use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeBuildError};
use crate::kind::{DimLayout, PrimitiveKind, StringEncoding};

/// A value usable as a categorical category. Kept deliberately small —
/// categories are scalars.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CategoricalValue {
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Str(String),
}

impl PartialEq for CategoricalValue {
    fn eq(&self, other: &Self) -> bool {
        use CategoricalValue::*;
        match (self, other) {
            (Int64(a), Int64(b)) => a == b,
            // Categorical membership is nominal: compare by bit pattern so
            // that NaN categories (unusual, but not forbidden) are
            // self-consistent the way they are looked up.
            (Float64(a), Float64(b)) => a.to_bits() == b.to_bits(),
            (Bool(a), Bool(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            _ => false,
        }
    }
}

/// Immutable datashape type descriptor tree.
///
/// This plays the role of the external type library's type objects for this
/// workspace : the container core never mutates a `Type`, only
/// walks it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub optional: bool,
    pub kind: TypeKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    FixedDim {
        shape: usize,
        layout: DimLayout,
        elem: Box<Type>,
    },
    VarDim {
        layout: DimLayout,
        elem: Box<Type>,
    },
    Tuple {
        fields: Vec<Type>,
        pack: Option<u32>,
        align: Option<u32>,
    },
    Record {
        fields: Vec<(String, Type)>,
        pack: Option<u32>,
        align: Option<u32>,
    },
    /// A tagged union; `variants` preserves declaration order, which is also
    /// tag-index order.
    Union {
        variants: Vec<(String, Type)>,
    },
    /// Indirection: one pointer-sized slot pointing at a separately owned
    /// instance of the target type.
    Ref(Box<Type>),
    /// A named wrapper around another type, transparent to layout.
    Constructor {
        name: String,
        arg: Box<Type>,
    },
    /// A nominal alias, transparent to layout.
    Typedef {
        name: String,
        target: Box<Type>,
    },
    Primitive(PrimitiveKind),
    FixedString {
        len: usize,
        encoding: StringEncoding,
    },
    FixedBytes {
        size: usize,
        align: usize,
    },
    String,
    Bytes,
    Categorical {
        categories: Vec<CategoricalValue>,
    },
    Char,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type { optional: false, kind }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn primitive(p: PrimitiveKind) -> Self {
        Type::new(TypeKind::Primitive(p))
    }

    pub fn fixed_dim(shape: usize, elem: Type) -> Self {
        Type::new(TypeKind::FixedDim {
            shape,
            layout: DimLayout::CContiguous,
            elem: Box::new(elem),
        })
    }

    pub fn var_dim(elem: Type) -> Self {
        Type::new(TypeKind::VarDim {
            layout: DimLayout::CContiguous,
            elem: Box::new(elem),
        })
    }

    pub fn tuple(fields: Vec<Type>) -> Self {
        Type::new(TypeKind::Tuple { fields, pack: None, align: None })
    }

    pub fn record(fields: Vec<(String, Type)>) -> Self {
        Type::new(TypeKind::Record { fields, pack: None, align: None })
    }

    pub fn categorical(categories: Vec<CategoricalValue>) -> Result<Self> {
        if categories.is_empty() {
            return Err(TypeBuildError::EmptyCategorical);
        }
        Ok(Type::new(TypeKind::Categorical { categories }))
    }

    /// True for nodes that only wrap another type (no layout contribution).
    pub fn is_transparent_wrapper(&self) -> bool {
        matches!(self.kind, TypeKind::Constructor { .. } | TypeKind::Typedef { .. })
    }

    /// Strips `Constructor`/`Typedef` wrappers, preserving the outermost
    /// optionality bit (it `||`s down so an optional wrapper over a
    /// non-optional target still reads as optional).
    pub fn strip_wrappers(&self) -> &Type {
        let mut cur = self;
        loop {
            match &cur.kind {
                TypeKind::Constructor { arg, .. } => cur = arg,
                TypeKind::Typedef { target, .. } => cur = target,
                _ => return cur,
            }
        }
    }

    /// Number of array dimensions at the head of this type (fixed or var),
    /// before reaching the dtype. Used by `dtype()`.
    pub fn ndim(&self) -> usize {
        match &self.strip_wrappers().kind {
            TypeKind::FixedDim { elem, .. } => 1 + elem.ndim(),
            TypeKind::VarDim { elem, .. } => 1 + elem.ndim(),
            _ => 0,
        }
    }

    /// The element type after stripping all leading dimensions.
    pub fn dtype(&self) -> &Type {
        match &self.strip_wrappers().kind {
            TypeKind::FixedDim { elem, .. } => elem.dtype(),
            TypeKind::VarDim { elem, .. } => elem.dtype(),
            _ => self,
        }
    }

    /// Shape along the leading regular dimensions; `None` entries mark var
    /// dims.
    pub fn static_shape(&self) -> Vec<Option<usize>> {
        let mut out = Vec::new();
        let mut cur = self.strip_wrappers();
        loop {
            match &cur.kind {
                TypeKind::FixedDim { shape, elem, .. } => {
                    out.push(Some(*shape));
                    cur = elem.strip_wrappers();
                }
                TypeKind::VarDim { elem, .. } => {
                    out.push(None);
                    cur = elem.strip_wrappers();
                }
                _ => break,
            }
        }
        out
    }

    pub fn record_field_index(&self, key: &str) -> Option<usize> {
        match &self.strip_wrappers().kind {
            TypeKind::Record { fields, .. } => fields.iter().position(|(name, _)| name == key),
            _ => None,
        }
    }

    pub fn category_index(&self, value: &CategoricalValue) -> Option<usize> {
        match &self.strip_wrappers().kind {
            TypeKind::Categorical { categories } => categories.iter().position(|c| c == value),
            _ => None,
        }
    }
}
