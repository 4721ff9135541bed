//! Records kept as raw bytes

use super::FragmentLayout;
use crate::error::Result;
use crate::formats::wld::io::{FragmentReader, FragmentWriter};
use crate::formats::wld::name_table::NameRef;

/// Payload carried through unchanged.
///
/// When the payload starts with a name slot that hits the name table, that
/// slot is split off into `name_ref` so the writer can remap it; the rest
/// stays in `body`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Opaque {
    pub name_ref: Option<NameRef>,
    pub body: Vec<u8>,
}

impl FragmentLayout for Opaque {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = match r.peek_name_ref() {
            Some(name) => {
                r.i32("name_ref")?;
                Some(name)
            }
            None => None,
        };
        Ok(Self {
            name_ref,
            body: r.rest(),
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        if let Some(name) = self.name_ref {
            w.name_ref(name)?;
        }
        w.bytes(&self.body)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::wld::fragment::tests::{decode_only, names, round_trip};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_named_payload_is_split() {
        let frag = Opaque {
            name_ref: Some(names::offset("FIRE_SPRITE")),
            body: vec![1, 2, 3, 4, 5],
        };
        let (decoded, bytes) = round_trip(&frag, 0x2E);
        assert_eq!(decoded, frag);
        assert_eq!(bytes.len(), 9);
    }

    #[test]
    fn test_unnamed_payload_is_kept_whole() {
        // positive leading word, not a name slot
        let raw = [7u8, 0, 0, 0, 9, 9];
        let decoded = decode_only::<Opaque>(&raw, 0x2B).unwrap();
        assert_eq!(decoded.name_ref, None);
        assert_eq!(decoded.body, raw.to_vec());

        let short = [0xFFu8, 0xFF];
        let decoded = decode_only::<Opaque>(&short, 0x00).unwrap();
        assert_eq!(decoded.name_ref, None);
        assert_eq!(decoded.body, short.to_vec());
    }

    #[test]
    fn test_unknown_offset_is_not_a_name() {
        // -3 points into the middle of an entry
        let mut raw = (-3i32).to_le_bytes().to_vec();
        raw.extend_from_slice(&[1, 2]);
        let decoded = decode_only::<Opaque>(&raw, 0x27).unwrap();
        assert_eq!(decoded.name_ref, None);
        assert_eq!(decoded.body, raw);
    }
}
