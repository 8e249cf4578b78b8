//! A typed, in-memory container runtime for scientific data: datashape
//! type descriptors (via `xnd_types`), an arena-backed memory layout
//! engine, and zero-copy views with ragged (variable-dimension) indexing,
//! reshape/transpose/split, contiguous copy, equality, and a compact
//! serialization format.

pub mod arena;
pub mod bitmap;
pub mod config;
pub mod copy;
pub mod equal;
pub mod error;
pub mod layout;
pub mod reshape;
pub mod serialize;
pub mod split;
pub mod subscript;
pub mod value;
pub mod view;

pub use arena::{Arena, ArenaHandle, ScalarMut};
pub use bitmap::Bitmap;
pub use config::LayoutConfig;
pub use error::{Result, XndError};
pub use reshape::Order;
pub use serialize::deserialize;
pub use subscript::Index;
pub use value::{from_value, infer_type, HostValue};
pub use view::View;

#[cfg(test)]
mod integration {
    use super::*;
    use xnd_types::{parse, PrimitiveKind, Type};

    #[test]
    fn builds_and_indexes_a_nested_fixed_array() {
        let v = HostValue::List(vec![
            HostValue::List(vec![HostValue::Int(1), HostValue::Int(2), HostValue::Int(3)]),
            HostValue::List(vec![HostValue::Int(4), HostValue::Int(5), HostValue::Int(6)]),
        ]);
        let view = from_value(&v, None, &LayoutConfig::default()).unwrap();
        assert_eq!(view.len().unwrap(), 2);
        let row = view.get(&[Index::Integer(1)]).unwrap();
        assert_eq!(row.len().unwrap(), 3);
        let scalar = row.get(&[Index::Integer(0)]).unwrap();
        assert_eq!(scalar.to_host_value().unwrap(), HostValue::Int(4));
    }

    #[test]
    fn ragged_var_dim_rows_keep_independent_lengths() {
        let v = HostValue::List(vec![
            HostValue::List(vec![HostValue::Int(1)]),
            HostValue::List(vec![HostValue::Int(2), HostValue::Int(3)]),
            HostValue::List(vec![]),
        ]);
        let view = from_value(&v, None, &LayoutConfig::default()).unwrap();
        assert_eq!(view.len().unwrap(), 3);
        assert_eq!(view.get(&[Index::Integer(1)]).unwrap().len().unwrap(), 2);
        assert_eq!(view.get(&[Index::Integer(2)]).unwrap().len().unwrap(), 0);
    }

    #[test]
    fn records_support_field_selection_and_equality() {
        let ty = parse("{x: int64, y: float64}").unwrap();
        let v = HostValue::Record(vec![
            ("x".to_string(), HostValue::Int(7)),
            ("y".to_string(), HostValue::Float(1.5)),
        ]);
        let view = from_value(&v, Some(ty), &LayoutConfig::default()).unwrap();
        let x = view.get(&[Index::Field("x".to_string())]).unwrap();
        assert_eq!(x.to_host_value().unwrap(), HostValue::Int(7));

        let other = from_value(
            &HostValue::Record(vec![
                ("x".to_string(), HostValue::Int(7)),
                ("y".to_string(), HostValue::Float(1.5)),
            ]),
            Some(Type::record(vec![
                ("x".to_string(), Type::primitive(PrimitiveKind::Int64)),
                ("y".to_string(), Type::primitive(PrimitiveKind::Float64)),
            ])),
            &LayoutConfig::default(),
        )
        .unwrap();
        assert!(view.equal(&other).unwrap());
    }

    #[test]
    fn reshape_then_copy_round_trips() {
        let v = HostValue::List((0..6).map(HostValue::Int).collect());
        let view = from_value(&v, None, &LayoutConfig::default()).unwrap();
        let reshaped = view.reshape(&[2, 3], Order::C).unwrap();
        let copied = reshaped.copy_contiguous().unwrap();
        assert_eq!(copied.shape(), vec![Some(2), Some(3)]);
    }

    #[test]
    fn split_covers_every_row_exactly_once() {
        let v = HostValue::List((0..7).map(HostValue::Int).collect());
        let view = from_value(&v, None, &LayoutConfig::default()).unwrap();
        let parts = view.split(3).unwrap();
        let total: usize = parts.iter().map(|p| p.len().unwrap()).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn serialize_round_trip_preserves_value() {
        let v = HostValue::Bool(true);
        let view = from_value(&v, Some(Type::primitive(PrimitiveKind::Bool)), &LayoutConfig::default()).unwrap();
        let bytes = view.serialize().unwrap();
        let back = deserialize(&bytes).unwrap();
        assert_eq!(back.to_host_value().unwrap(), v);
    }
}
