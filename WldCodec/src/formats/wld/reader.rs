//! WLD file reading and parsing

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::container::Container;
use super::fragment::Fragment;
use super::hash::xor_name_bytes;
use super::io::DecodeContext;
use super::name_table::NameTable;
use super::options::ReadOptions;
use super::version::{WLD_MAGIC, WorldFormat};
use crate::error::{Error, Result};

/// Header fields as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WldHeader {
    pub format: WorldFormat,
    pub fragment_count: u32,
    pub region_count: u32,
    pub max_fragment_size: u32,
    pub name_table_size: u32,
    pub string_count: u32,
}

impl WldHeader {
    /// Magic, version and five `u32` fields.
    pub const SIZE: usize = 28;

    fn read(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if magic != WLD_MAGIC {
            return Err(Error::BadMagic(magic));
        }

        let format = WorldFormat::from_version(cursor.read_u32::<LittleEndian>()?)?;
        Ok(Self {
            format,
            fragment_count: cursor.read_u32::<LittleEndian>()?,
            region_count: cursor.read_u32::<LittleEndian>()?,
            max_fragment_size: cursor.read_u32::<LittleEndian>()?,
            name_table_size: cursor.read_u32::<LittleEndian>()?,
            string_count: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// Read a WLD file from disk
///
/// # Errors
/// Returns an error if the file cannot be read or has an invalid format.
pub fn read_wld<P: AsRef<Path>>(path: P) -> Result<Container> {
    read_wld_with_options(path, &ReadOptions::default())
}

/// Read a WLD file from disk with explicit options
///
/// # Errors
/// Returns an error if the file cannot be read or has an invalid format.
pub fn read_wld_with_options<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Container> {
    let mut file = File::open(path.as_ref())?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    tracing::debug!("Read {} bytes from {}", buffer.len(), path.as_ref().display());
    parse_wld_bytes_with_options(&buffer, options)
}

/// Parse WLD data from bytes
///
/// # Errors
/// Returns an error if the data has an invalid WLD format.
pub fn parse_wld_bytes(data: &[u8]) -> Result<Container> {
    parse_wld_bytes_with_options(data, &ReadOptions::default())
}

/// Parse WLD data from bytes with explicit options
///
/// # Errors
/// Returns an error if the data has an invalid WLD format.
pub fn parse_wld_bytes_with_options(data: &[u8], options: &ReadOptions) -> Result<Container> {
    let mut cursor = Cursor::new(data);
    let header = WldHeader::read(&mut cursor)?;
    tracing::debug!(
        "WLD header: {:?}, {} fragments, {} regions, name table {} bytes",
        header.format,
        header.fragment_count,
        header.region_count,
        header.name_table_size
    );

    let name_table = read_name_table(&mut cursor, header.name_table_size as usize)?;
    if name_table.len().saturating_sub(1) != header.string_count as usize {
        tracing::warn!(
            "Name table holds {} strings, header says {}",
            name_table.len().saturating_sub(1),
            header.string_count
        );
    }

    let ctx = DecodeContext::new(header.format, &name_table).with_validate_names(options.validate_names);
    let fragments = read_fragments(&mut cursor, header.fragment_count, &ctx)?;

    let container = Container {
        format: header.format,
        region_count: header.region_count,
        name_table,
        fragments,
    };

    let regions = container.region_fragment_count();
    if regions != header.region_count {
        if options.strict_region_count {
            return Err(Error::RegionCountMismatch {
                expected: header.region_count,
                found: regions,
            });
        }
        tracing::warn!("Header region count {} but {} region fragments", header.region_count, regions);
    }

    Ok(container)
}

fn read_name_table(cursor: &mut Cursor<&[u8]>, size: usize) -> Result<NameTable> {
    let start = cursor.position() as usize;
    let available = cursor.get_ref().len().saturating_sub(start);
    if available < size {
        return Err(Error::TruncatedNameBlob { expected: size, available });
    }

    let mut blob = cursor.get_ref()[start..start + size].to_vec();
    xor_name_bytes(&mut blob);
    cursor.set_position((start + size) as u64);
    NameTable::decode(&blob, size)
}

fn read_fragments(cursor: &mut Cursor<&[u8]>, count: u32, ctx: &DecodeContext<'_>) -> Result<Vec<Fragment>> {
    let data = *cursor.get_ref();
    let mut fragments = Vec::with_capacity((count as usize).min(data.len() / 8));

    for ordinal in 1..=count {
        let (Ok(size), Ok(code)) = (cursor.read_u32::<LittleEndian>(), cursor.read_i32::<LittleEndian>()) else {
            return Err(Error::FragmentCountMismatch {
                expected: count,
                found: ordinal - 1,
            });
        };
        let type_code = u32::try_from(code).map_err(|_| Error::UnknownFragmentType { ordinal, code })?;

        let start = cursor.position() as usize;
        let end = start
            .checked_add(size as usize)
            .filter(|&end| end <= data.len())
            .ok_or(Error::FragmentTruncated {
                ordinal,
                type_code,
                field: "payload",
            })?;

        tracing::trace!("Fragment {} type 0x{:02X}, {} bytes", ordinal, type_code, size);
        let fragment = Fragment::decode(type_code, &data[start..end], &ctx.with_ordinal(ordinal))?;
        fragments.push(fragment);

        cursor.set_position(end as u64);
    }

    let trailing = data.len() - cursor.position() as usize;
    if trailing > 0 {
        tracing::debug!("{} bytes after the last fragment ignored", trailing);
    }

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header_bytes(version: u32, fragments: u32, regions: u32, names: &[u8]) -> Vec<u8> {
        let mut out = WLD_MAGIC.to_vec();
        for word in [version, fragments, regions, 0, names.len() as u32, 0] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        let mut hashed = names.to_vec();
        xor_name_bytes(&mut hashed);
        out.extend_from_slice(&hashed);
        out
    }

    fn record(code: i32, payload: &[u8]) -> Vec<u8> {
        let mut out = (payload.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&code.to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_bad_magic() {
        let mut data = header_bytes(0x00015500, 0, 0, b"\0");
        data[0] = 0x03;
        assert!(matches!(parse_wld_bytes(&data), Err(Error::BadMagic([0x03, 0x3D, 0x50, 0x54]))));
    }

    #[test]
    fn test_unsupported_version() {
        let data = header_bytes(0x12345678, 0, 0, b"\0");
        assert!(matches!(parse_wld_bytes(&data), Err(Error::UnsupportedVersion(0x12345678))));
    }

    #[test]
    fn test_truncated_name_table() {
        let mut data = header_bytes(0x00015500, 0, 0, b"\0ABC\0");
        data.truncate(data.len() - 2);
        assert!(matches!(
            parse_wld_bytes(&data),
            Err(Error::TruncatedNameBlob { expected: 5, available: 3 })
        ));
    }

    #[test]
    fn test_reader_resumes_after_declared_size() {
        let mut data = header_bytes(0x1000C800, 2, 0, b"\0SKY\0");
        // name slot plus two padding bytes the layout does not use
        let mut payload = (-1i32).to_le_bytes().to_vec();
        payload.extend_from_slice(&[0xAA, 0xBB]);
        data.extend(record(0x35, &payload));
        data.extend(record(0x35, &(-1i32).to_le_bytes()));

        let container = parse_wld_bytes(&data).unwrap();
        assert_eq!(container.format, WorldFormat::New);
        assert_eq!(container.fragment_count(), 2);
        assert_eq!(container.name(container.fragments[1].name_ref()), Some("SKY"));
    }

    #[test]
    fn test_payload_past_end() {
        let mut data = header_bytes(0x00015500, 1, 0, b"\0");
        let mut rec = record(0x35, &[0; 4]);
        rec[0] = 40;
        data.extend(rec);
        assert!(matches!(
            parse_wld_bytes(&data),
            Err(Error::FragmentTruncated { ordinal: 1, type_code: 0x35, field: "payload" })
        ));
    }

    #[test]
    fn test_negative_and_unknown_codes() {
        let mut data = header_bytes(0x00015500, 1, 0, b"\0");
        data.extend(record(-2, &[0; 4]));
        assert!(matches!(
            parse_wld_bytes(&data),
            Err(Error::UnknownFragmentType { ordinal: 1, code: -2 })
        ));

        let mut data = header_bytes(0x00015500, 2, 0, b"\0");
        data.extend(record(0x35, &[0; 4]));
        data.extend(record(0x99, &[0; 4]));
        assert!(matches!(
            parse_wld_bytes(&data),
            Err(Error::UnknownFragmentType { ordinal: 2, code: 0x99 })
        ));
    }

    #[test]
    fn test_missing_records() {
        let mut data = header_bytes(0x00015500, 3, 0, b"\0");
        data.extend(record(0x35, &[0; 4]));
        assert!(matches!(
            parse_wld_bytes(&data),
            Err(Error::FragmentCountMismatch { expected: 3, found: 1 })
        ));
    }

    #[test]
    fn test_region_count_policy() {
        let data = header_bytes(0x00015500, 0, 4, b"\0");
        assert!(matches!(
            parse_wld_bytes(&data),
            Err(Error::RegionCountMismatch { expected: 4, found: 0 })
        ));

        let options = ReadOptions::new().with_strict_region_count(false);
        let container = parse_wld_bytes_with_options(&data, &options).unwrap();
        assert_eq!(container.region_count, 4);
    }

    #[test]
    fn test_name_validation_policy() {
        let mut data = header_bytes(0x00015500, 1, 0, b"\0");
        data.extend(record(0x35, &(-7i32).to_le_bytes()));
        assert!(matches!(parse_wld_bytes(&data), Err(Error::NameNotFound { ordinal: 1, offset: 7 })));

        let options = ReadOptions::new().with_validate_names(false);
        assert!(parse_wld_bytes_with_options(&data, &options).is_ok());
    }
}
