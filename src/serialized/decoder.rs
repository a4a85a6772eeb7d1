//! Schema-driven record decoder.
//!
//! One generic loop interprets the static schema tables; there is no
//! per-kind decoding code. A record either decodes completely or not at all.

use tracing::{debug, trace};

use super::reader::{ByteReader, FIELD_ALIGNMENT};
use super::schema::{layout_fields, record_fields, Field, FieldType, Layout, RecordKind, ScriptClass};
use super::value::{Record, Value};
use crate::asset::{AssetObject, AssetProvider, FormatVersion, ObjectKind};
use crate::util::{Error, Result};

/// Decode a single value of the given type.
pub fn read_value(reader: &mut ByteReader<'_>, ty: FieldType, version: &FormatVersion) -> Result<Value> {
    Ok(match ty {
        FieldType::Bool => Value::Bool(reader.read_bool()?),
        FieldType::AlignedBool => {
            let v = reader.read_bool()?;
            reader.align(FIELD_ALIGNMENT)?;
            Value::Bool(v)
        }
        FieldType::UInt8 => Value::UInt8(reader.read_u8()?),
        FieldType::UInt16 => Value::UInt16(reader.read_u16()?),
        FieldType::Int32 => Value::Int32(reader.read_i32()?),
        FieldType::Int64 => Value::Int64(reader.read_i64()?),
        FieldType::Float => Value::Float(reader.read_f32()?),
        FieldType::String => Value::String(reader.read_aligned_string()?),
        FieldType::Bytes => Value::Bytes(reader.read_byte_array()?),
        FieldType::PPtr => Value::PPtr(reader.read_pptr(version)?),
        FieldType::Array(elem) => {
            let count = reader.read_count(elem.min_size())?;
            let mut items = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                items.push(read_value(reader, *elem, version)?);
            }
            if elem.is_byte_sized() {
                reader.align(FIELD_ALIGNMENT)?;
            }
            Value::Array(items)
        }
        FieldType::Nested(layout) => {
            let mut nested = Record::new();
            read_fields(reader, layout_fields(layout, version)?, version, &mut nested)?;
            Value::Record(nested)
        }
    })
}

/// Decode `fields` in order, appending to `out`.
pub fn read_fields(
    reader: &mut ByteReader<'_>,
    fields: &'static [Field],
    version: &FormatVersion,
    out: &mut Record,
) -> Result<()> {
    for field in fields {
        let pos = reader.position();
        let value = read_value(reader, field.ty, version).map_err(|e| match e {
            Error::UnexpectedEof { .. } | Error::InvalidStructure(_) | Error::Utf8(_) => {
                Error::invalid(format!("field '{}' at {}: {}", field.name, pos, e))
            }
            other => other,
        })?;
        out.push(field.name, value);
    }
    Ok(())
}

/// Structural decoder bound to a provider (needed to resolve script classes).
pub struct StructuralDecoder<'p, P: AssetProvider + ?Sized> {
    provider: &'p P,
}

impl<'p, P: AssetProvider + ?Sized> Clone for StructuralDecoder<'p, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'p, P: AssetProvider + ?Sized> Copy for StructuralDecoder<'p, P> {}

impl<'p, P: AssetProvider + ?Sized> StructuralDecoder<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self { provider }
    }

    /// The provider this decoder resolves through.
    pub fn provider(&self) -> &'p P {
        self.provider
    }

    /// Decode `obj` as `kind`; any failure yields `None` (logged at debug level).
    pub fn decode(&self, obj: &AssetObject, kind: RecordKind) -> Option<Record> {
        match self.try_decode(obj, kind) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("{:?} {}: not decoded as {}: {}", obj.kind, obj.id, kind.name(), e);
                None
            }
        }
    }

    /// Decode `obj` as `kind`, reporting why it failed.
    ///
    /// Scripted kinds include the common header fields first.
    pub fn try_decode(&self, obj: &AssetObject, kind: RecordKind) -> Result<Record> {
        let mut reader = obj.reader();
        let mut record = Record::new();
        if let RecordKind::Script(class) = kind {
            self.read_checked_header(obj, class, &mut reader, &mut record)?;
        } else {
            check_kind(obj, kind)?;
        }
        read_fields(&mut reader, record_fields(kind, &obj.version)?, &obj.version, &mut record)?;
        trace!("decoded {} {} ({} of {} bytes)", kind.name(), obj.id, reader.position(), reader.len());
        Ok(record)
    }

    /// Header record plus a reader positioned after it, for fixed-layout bodies.
    pub fn body_reader<'o>(&self, obj: &'o AssetObject, class: ScriptClass) -> Result<(Record, ByteReader<'o>)> {
        let mut reader = obj.reader();
        let mut header = Record::new();
        self.read_checked_header(obj, class, &mut reader, &mut header)?;
        Ok((header, reader))
    }

    /// Script class of a scripted object, if it is one we know.
    pub fn script_class(&self, obj: &AssetObject) -> Option<ScriptClass> {
        let name = self.script_name(obj).ok()?;
        ScriptClass::from_class_name(&name)
    }

    /// Raw class name of a scripted object's MonoScript.
    pub fn script_name(&self, obj: &AssetObject) -> Result<String> {
        let header = self.header(obj)?;
        self.class_name_of(obj, &header)
    }

    /// Common header (`m_GameObject`, `m_Enabled`, `m_Script`, `m_Name`).
    pub fn header(&self, obj: &AssetObject) -> Result<Record> {
        if obj.kind != ObjectKind::MonoBehaviour {
            return Err(Error::KindMismatch {
                expected: "MonoBehaviour".into(),
                actual: format!("{:?}", obj.kind),
            });
        }
        let mut reader = obj.reader();
        let mut header = Record::new();
        read_fields(&mut reader, layout_fields(Layout::ScriptHeader, &obj.version)?, &obj.version, &mut header)?;
        Ok(header)
    }

    fn read_checked_header(
        &self,
        obj: &AssetObject,
        class: ScriptClass,
        reader: &mut ByteReader<'_>,
        out: &mut Record,
    ) -> Result<()> {
        if obj.kind != ObjectKind::MonoBehaviour {
            return Err(Error::KindMismatch {
                expected: class.class_name().into(),
                actual: format!("{:?}", obj.kind),
            });
        }
        read_fields(reader, layout_fields(Layout::ScriptHeader, &obj.version)?, &obj.version, out)?;
        let actual = self.class_name_of(obj, out)?;
        if actual != class.class_name() {
            return Err(Error::KindMismatch {
                expected: class.class_name().into(),
                actual,
            });
        }
        Ok(())
    }

    fn class_name_of(&self, obj: &AssetObject, header: &Record) -> Result<String> {
        let ptr = header
            .pptr("m_Script")
            .ok_or_else(|| Error::invalid("header without m_Script"))?;
        let script = self
            .provider
            .resolve(obj, ptr)
            .ok_or_else(|| Error::unresolved(format!("m_Script of {}", obj.id)))?;
        let record = self.try_decode(script, RecordKind::MonoScript)?;
        record
            .str("m_ClassName")
            .map(str::to_string)
            .ok_or_else(|| Error::invalid("MonoScript without m_ClassName"))
    }
}

fn check_kind(obj: &AssetObject, kind: RecordKind) -> Result<()> {
    if obj.kind != kind.object_kind() {
        return Err(Error::KindMismatch {
            expected: kind.name().into(),
            actual: format!("{:?}", obj.kind),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{MemoryProvider, PPtr};
    use crate::serialized::RecordWriter;

    fn provider_with_script(class: &str) -> (MemoryProvider, u32, PPtr) {
        let mut p = MemoryProvider::new();
        let f = p.add_file("test", FormatVersion::default());
        let mut w = RecordWriter::new(FormatVersion::default());
        w.string(class).i32(0).string(class).string("Live2D.Cubism").string("Assembly-CSharp");
        p.add_object(f, 900, ObjectKind::MonoScript, w.into_bytes());
        (p, f, PPtr::local(900))
    }

    #[test]
    fn test_decode_pose_part() {
        let (mut p, f, script) = provider_with_script("CubismPosePart");
        let mut w = RecordWriter::new(FormatVersion::default());
        w.script_header(PPtr::local(5), script, "")
            .i32(2)
            .i32(7)
            .count(2)
            .string("PartArmA")
            .string("PartArmB");
        let id = p.add_object(f, 1, ObjectKind::MonoBehaviour, w.into_bytes());

        let dec = StructuralDecoder::new(&p);
        let obj = p.get(id).unwrap();
        let rec = dec.decode(obj, RecordKind::Script(ScriptClass::CubismPosePart)).unwrap();
        assert_eq!(rec.pptr("m_GameObject"), Some(PPtr::local(5)));
        assert_eq!(rec.i32("GroupIndex"), Some(2));
        assert_eq!(rec.i32("PartIndex"), Some(7));
        assert_eq!(rec.strings("Link").unwrap(), vec!["PartArmA", "PartArmB"]);
        assert_eq!(dec.script_class(obj), Some(ScriptClass::CubismPosePart));
    }

    #[test]
    fn test_wrong_script_is_no_value() {
        let (mut p, f, script) = provider_with_script("CubismPart");
        let mut w = RecordWriter::new(FormatVersion::default());
        w.script_header(PPtr::local(5), script, "");
        let id = p.add_object(f, 1, ObjectKind::MonoBehaviour, w.into_bytes());
        let dec = StructuralDecoder::new(&p);
        let obj = p.get(id).unwrap();
        assert!(dec.decode(obj, RecordKind::Script(ScriptClass::CubismMoc)).is_none());
        assert!(dec.decode(obj, RecordKind::Script(ScriptClass::CubismPart)).is_some());
        assert!(dec.decode(obj, RecordKind::Texture2D).is_none());
    }

    #[test]
    fn test_truncated_buffer_fails_whole_record() {
        let (mut p, f, script) = provider_with_script("CubismExpressionData");
        let mut w = RecordWriter::new(FormatVersion::default());
        w.script_header(PPtr::NULL, script, "smile.exp3")
            .string("Live2D Expression")
            .f32(0.5)
            .f32(0.5)
            .count(3)
            .string("ParamMouthForm")
            .f32(1.0);
        let id = p.add_object(f, 1, ObjectKind::MonoBehaviour, w.into_bytes());
        let dec = StructuralDecoder::new(&p);
        let err = dec
            .try_decode(p.get(id).unwrap(), RecordKind::Script(ScriptClass::CubismExpressionData))
            .unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_unresolved_script() {
        let mut p = MemoryProvider::new();
        let f = p.add_file("test", FormatVersion::default());
        let mut w = RecordWriter::new(FormatVersion::default());
        w.script_header(PPtr::NULL, PPtr::local(77), "");
        let id = p.add_object(f, 1, ObjectKind::MonoBehaviour, w.into_bytes());
        let dec = StructuralDecoder::new(&p);
        assert!(matches!(dec.script_name(p.get(id).unwrap()), Err(Error::Unresolved(_))));
    }

    #[test]
    fn test_primitives_exact() {
        let v = FormatVersion::default();
        let mut w = RecordWriter::new(v);
        w.aligned_bool(true).u16(0xBEEF).aligned_bool(false).i32(-123456).i64(i64::MIN + 1).f32(f32::MIN_POSITIVE);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(read_value(&mut r, FieldType::AlignedBool, &v).unwrap(), Value::Bool(true));
        assert_eq!(read_value(&mut r, FieldType::UInt16, &v).unwrap(), Value::UInt16(0xBEEF));
        assert_eq!(read_value(&mut r, FieldType::AlignedBool, &v).unwrap(), Value::Bool(false));
        assert_eq!(read_value(&mut r, FieldType::Int32, &v).unwrap(), Value::Int32(-123456));
        assert_eq!(read_value(&mut r, FieldType::Int64, &v).unwrap(), Value::Int64(i64::MIN + 1));
        assert_eq!(read_value(&mut r, FieldType::Float, &v).unwrap(), Value::Float(f32::MIN_POSITIVE));
    }

    #[test]
    fn test_byte_array_realigns() {
        let v = FormatVersion::default();
        let mut w = RecordWriter::new(v);
        w.count(3).u8(1).u8(2).u8(3).align().i32(9);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let arr = read_value(&mut r, FieldType::Array(&FieldType::UInt8), &v).unwrap();
        assert_eq!(arr.as_array().unwrap().len(), 3);
        assert_eq!(r.read_i32().unwrap(), 9);
    }
}
