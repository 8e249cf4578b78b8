//! Compact self-describing serialization : `"XNDS"` magic,
//! version byte, then length-prefixed type (as datashape text), a
//! length-prefixed metadata section (the leaf validity bitmap, so
//! optional/nullable values survive the round trip), and the data payload.
//! Device-resident memory can't be serialized without a host round-trip, so
//! that path fails `not_implemented` rather than silently copying.

use xnd_types::parse;

use crate::bitmap::Bitmap;
use crate::config::LayoutConfig;
use crate::error::{Result, XndError};
use crate::value::from_value;
use crate::view::View;

const MAGIC: &[u8; 4] = b"XNDS";
const VERSION: u8 = 1;

/// Packs a validity bitmap as `uint32 bit count` followed by its raw bytes;
/// a non-nullable (empty) bitmap packs down to just a zero count.
fn encode_metadata(bitmap: &Bitmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + bitmap.as_bytes().len());
    out.extend_from_slice(&(bitmap.len() as u32).to_le_bytes());
    out.extend_from_slice(bitmap.as_bytes());
    out
}

fn decode_metadata(buf: &[u8]) -> Result<Bitmap> {
    if buf.len() < 4 {
        return Err(XndError::ValueError("truncated metadata payload".to_string()));
    }
    let count = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
    if count == 0 {
        return Ok(Bitmap::empty());
    }
    Ok(Bitmap::from_bytes(count, buf[4..].to_vec()))
}

impl View {
    /// Serializes this view to the wire format. Only
    /// contiguous, host-resident views are supported directly; callers
    /// holding a strided or device view should `copy_contiguous()` first.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if self.arena().is_device() {
            return Err(XndError::NotImplemented("serializing device-resident memory".to_string()));
        }
        let contiguous = self.copy_contiguous()?;
        let type_str = contiguous.full_type_string()?;
        let metadata = encode_metadata(&contiguous.leaf_bitmap);
        let data = contiguous.arena().as_slice().to_vec();

        let mut out = Vec::with_capacity(
            MAGIC.len() + 1 + 4 + type_str.len() + 8 + metadata.len() + 4 + data.len(),
        );
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&(type_str.len() as u32).to_le_bytes());
        out.extend_from_slice(type_str.as_bytes());
        out.extend_from_slice(&(metadata.len() as u64).to_le_bytes());
        out.extend_from_slice(&metadata);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&data);
        Ok(out)
    }

    fn full_type_string(&self) -> Result<String> {
        let mut ty = self.dtype().clone();
        for axis in self.axes.iter().rev() {
            ty = match axis {
                crate::view::RtAxis::Fixed { shape, .. } => xnd_types::Type::fixed_dim(*shape as usize, ty),
                crate::view::RtAxis::Var { .. } => xnd_types::Type::var_dim(ty),
            };
        }
        Ok(ty.to_string())
    }
}

/// Parses a buffer produced by `View::serialize` back into a root view.
/// The data payload is marshalled through the host-value layer
/// rather than a raw byte copy, since the wire format's type string alone
/// doesn't carry the reader's preferred internal stride layout.
pub fn deserialize(buf: &[u8]) -> Result<View> {
    if buf.len() < MAGIC.len() + 1 + 4 {
        return Err(XndError::ValueError("truncated header".to_string()));
    }
    if &buf[0..4] != MAGIC {
        return Err(XndError::ValueError("bad magic".to_string()));
    }
    let version = buf[4];
    if version != VERSION {
        return Err(XndError::NotImplemented(format!("unsupported serialization version {version}")));
    }
    let mut pos = 5usize;
    let type_len = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize;
    pos += 4;
    let type_str = std::str::from_utf8(&buf[pos..pos + type_len])
        .map_err(|e| XndError::ValueError(e.to_string()))?;
    let ty = parse(type_str).map_err(|e| XndError::TypeError(e.to_string()))?;
    pos += type_len;
    if buf.len() < pos + 8 {
        return Err(XndError::ValueError("truncated metadata length".to_string()));
    }
    let metadata_len = u64::from_le_bytes(buf[pos..pos + 8].try_into().unwrap()) as usize;
    pos += 8;
    if buf.len() < pos + metadata_len {
        return Err(XndError::ValueError("truncated metadata payload".to_string()));
    }
    let leaf_bitmap = decode_metadata(&buf[pos..pos + metadata_len])?;
    pos += metadata_len;
    if buf.len() < pos + 4 {
        return Err(XndError::ValueError("truncated data length".to_string()));
    }
    let data_len = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize;
    pos += 4;
    let data = &buf[pos..pos + data_len];

    // Round-trip through a temporary view over the raw bytes, then read it
    // back to a host value and re-marshal so var-dim tables (not present in
    // the wire format) get rebuilt correctly. This workspace only supports
    // dim-free dtypes on the wire for now; see DESIGN.md.
    let (chain, dtype) = crate::layout::dim_chain(&ty);
    if !chain.is_empty() {
        return Err(XndError::NotImplemented("deserializing dimensioned types".to_string()));
    }
    let layout = crate::layout::flat_layout(dtype, &LayoutConfig::default())?;
    if data.len() < layout.size {
        return Err(XndError::ValueError("truncated data payload".to_string()));
    }
    let arena = crate::arena::Arena::from_external(data.to_vec(), layout.align.max(1));
    let scalar = View::new_root(arena, ty, Vec::new(), leaf_bitmap, true)?;
    let value = scalar.to_host_value()?;
    from_value(&value, Some(scalar.dtype().clone()), &LayoutConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{from_value, HostValue};

    #[test]
    fn round_trips_a_scalar() {
        let v = HostValue::Int(42);
        let ty = xnd_types::Type::primitive(xnd_types::PrimitiveKind::Int64);
        let view = from_value(&v, Some(ty), &LayoutConfig::default()).unwrap();
        let bytes = view.serialize().unwrap();
        assert_eq!(&bytes[0..4], MAGIC);
        let back = deserialize(&bytes).unwrap();
        assert_eq!(back.to_host_value().unwrap(), v);
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(deserialize(b"NOPE1234").is_err());
    }

    #[test]
    fn round_trips_a_missing_optional_scalar() {
        let ty = xnd_types::Type::primitive(xnd_types::PrimitiveKind::Int64).optional();
        let view = from_value(&HostValue::Missing, Some(ty), &LayoutConfig::default()).unwrap();
        let bytes = view.serialize().unwrap();
        let back = deserialize(&bytes).unwrap();
        assert_eq!(back.to_host_value().unwrap(), HostValue::Missing);
    }

    #[test]
    fn round_trips_a_present_optional_scalar() {
        let ty = xnd_types::Type::primitive(xnd_types::PrimitiveKind::Int64).optional();
        let view = from_value(&HostValue::Int(7), Some(ty), &LayoutConfig::default()).unwrap();
        let bytes = view.serialize().unwrap();
        let back = deserialize(&bytes).unwrap();
        assert_eq!(back.to_host_value().unwrap(), HostValue::Int(7));
    }
}
