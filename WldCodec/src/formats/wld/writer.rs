//! WLD file writing and serialization

use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use super::container::Container;
use super::hash::xor_name_bytes;
use super::io::EncodeContext;
use super::name_table::{NameRef, NameRemap, NameTable, NameTableBuilder};
use super::version::WLD_MAGIC;
use crate::error::Result;

/// Write a container to disk
pub fn write_wld<P: AsRef<Path>>(container: &Container, path: P) -> Result<()> {
    let bytes = serialize_wld(container)?;
    std::fs::write(path.as_ref(), &bytes)?;
    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.as_ref().display());
    Ok(())
}

/// Serialize a container to bytes
///
/// The name table is rebuilt from the names the fragments actually use, and
/// the header counts are recomputed from the content.
pub fn serialize_wld(container: &Container) -> Result<Vec<u8>> {
    let (names, remap) = rebuild_names(container)?;
    let ctx = EncodeContext::new(container.format, &remap);

    let mut records = Vec::new();
    let mut max_fragment_size = 0u32;
    for (ordinal, fragment) in container.iter() {
        let (type_code, payload) = fragment.encode(&ctx).map_err(|e| with_ordinal(e, ordinal))?;
        let size = payload.len() as u32;
        max_fragment_size = max_fragment_size.max(size);

        records.write_u32::<LittleEndian>(size)?;
        records.write_u32::<LittleEndian>(type_code)?;
        records.extend_from_slice(&payload);
        tracing::trace!("Fragment {} type 0x{:02X}, {} bytes", ordinal, type_code, size);
    }

    let mut blob = names.blob().to_vec();
    xor_name_bytes(&mut blob);

    let mut output = Vec::with_capacity(28 + blob.len() + records.len());
    output.extend_from_slice(&WLD_MAGIC);
    output.write_u32::<LittleEndian>(container.format.version())?;
    output.write_u32::<LittleEndian>(container.fragment_count() as u32)?;
    output.write_u32::<LittleEndian>(container.region_fragment_count())?;
    output.write_u32::<LittleEndian>(max_fragment_size)?;
    output.write_u32::<LittleEndian>(blob.len() as u32)?;
    output.write_u32::<LittleEndian>(names.len().saturating_sub(1) as u32)?;
    output.extend_from_slice(&blob);
    output.extend_from_slice(&records);

    tracing::debug!(
        "Serialized {} fragments, {} names, {} bytes",
        container.fragment_count(),
        names.len(),
        output.len()
    );
    Ok(output)
}

/// Collect every referenced string in fragment order into a fresh table.
fn rebuild_names(container: &Container) -> Result<(NameTable, NameRemap)> {
    let mut builder = NameTableBuilder::new();
    let mut remap = NameRemap::new();
    let mut missing = None;

    for (ordinal, fragment) in container.iter() {
        fragment.visit_names(|name| {
            let NameRef::Offset(offset) = name else {
                return;
            };
            match container.name_table.lookup(name, ordinal) {
                Ok(value) => {
                    let new_offset = match builder.add(value) {
                        NameRef::Offset(o) => o,
                        NameRef::None => 0,
                    };
                    remap.insert(offset, new_offset);
                }
                Err(e) => {
                    missing.get_or_insert(e);
                }
            }
        });
        if let Some(e) = missing.take() {
            return Err(e);
        }
    }

    Ok((builder.finish(), remap))
}

fn with_ordinal(error: crate::Error, ordinal: u32) -> crate::Error {
    match error {
        crate::Error::NameNotFound { offset, .. } => crate::Error::NameNotFound { ordinal, offset },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::wld::fragment::{Fragment, GlobalAmbientLightDef, InstanceRef, Region};
    use crate::formats::wld::reader::parse_wld_bytes;
    use crate::formats::wld::version::WorldFormat;
    use pretty_assertions::assert_eq;

    fn named(container: &mut Container, names: &[&str]) -> Vec<NameRef> {
        let mut builder = NameTableBuilder::new();
        let refs = names.iter().map(|n| builder.add(n)).collect();
        container.name_table = builder.finish();
        refs
    }

    #[test]
    fn test_unused_names_are_dropped() {
        let mut container = Container::new(WorldFormat::Old);
        let refs = named(&mut container, &["UNUSED_NAME", "SKY_LIGHT"]);
        container.push(Fragment::GlobalAmbientLightDef(GlobalAmbientLightDef { name_ref: refs[1] }));

        let bytes = serialize_wld(&container).unwrap();
        let decoded = parse_wld_bytes(&bytes).unwrap();
        assert_eq!(decoded.name_table.blob(), b"\0SKY_LIGHT\0");
        assert_eq!(decoded.name(decoded.fragments[0].name_ref()), Some("SKY_LIGHT"));
    }

    #[test]
    fn test_shared_names_are_stored_once() {
        let mut container = Container::new(WorldFormat::Old);
        let refs = named(&mut container, &["FIRE_SPRITE"]);
        for _ in 0..3 {
            container.push(Fragment::Sprite2D(InstanceRef {
                name_ref: refs[0],
                reference: 1,
                flags: 0,
            }));
        }
        let bytes = serialize_wld(&container).unwrap();
        let decoded = parse_wld_bytes(&bytes).unwrap();
        assert_eq!(decoded.name_table.len(), 2);
        assert!(decoded.fragments.iter().all(|f| f.name_ref() == NameRef::Offset(1)));
    }

    #[test]
    fn test_header_is_recomputed() {
        let mut container = Container::new(WorldFormat::New);
        let refs = named(&mut container, &["R000001", "R000002"]);
        container.region_count = 99;
        for name_ref in refs {
            container.push(Fragment::Region(Region {
                name_ref,
                ..Region::default()
            }));
        }

        let bytes = serialize_wld(&container).unwrap();
        let word = |i: usize| u32::from_le_bytes(bytes[i..i + 4].try_into().unwrap());
        assert_eq!(word(4), 0x1000C800);
        assert_eq!(word(8), 2);
        assert_eq!(word(12), 2);
        assert_eq!(word(20), 17);
        assert_eq!(word(24), 2);

        let decoded = parse_wld_bytes(&bytes).unwrap();
        assert_eq!(decoded.region_count, 2);
        // both regions encode to the same size, so the records fill the rest
        let max = word(16) as usize;
        assert_eq!(bytes.len(), 28 + 17 + 2 * (8 + max));
    }

    #[test]
    fn test_dangling_name_fails() {
        let mut container = Container::new(WorldFormat::Old);
        container.push(Fragment::Sprite2D(InstanceRef::default()));
        container.push(Fragment::GlobalAmbientLightDef(GlobalAmbientLightDef {
            name_ref: NameRef::Offset(40),
        }));
        assert!(matches!(
            serialize_wld(&container),
            Err(crate::Error::NameNotFound { ordinal: 2, offset: 40 })
        ));
    }

    #[test]
    fn test_write_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zone.wld");
        let mut container = Container::new(WorldFormat::Old);
        container.push(Fragment::GlobalAmbientLightDef(GlobalAmbientLightDef::default()));
        write_wld(&container, &path).unwrap();

        let decoded = crate::formats::wld::reader::read_wld(&path).unwrap();
        assert_eq!(decoded.fragments, container.fragments);
    }
}
