//! Parsing for the packed symbol table returned by `getSymbols`.

use crate::error::{ClientError, Result};

/// A single entry of the remote device's symbol table.
///
/// Returned by [`Connection::get_symbols`](crate::Connection::get_symbols). `index_group`/
/// `index_offset`/`size` are carried over from the wire record in addition to the four
/// fields named by the high-level API, since a caller walking the symbol table almost
/// always wants them to issue a direct `read`/`write` without a second `getHandle` round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub type_name: String,
    pub comment: String,
    pub type_code: u32,
    pub flags: u32,
    pub index_group: u32,
    pub index_offset: u32,
    pub size: u32,
}

/// Fixed portion of one symbol record: recordLen, group, offset, size, typeCode, flags
/// (6 u32s) followed by nameLen, typeLen, commentLen (3 u16s).
const FIXED_HEADER_LEN: usize = 6 * 4 + 3 * 2;

/// Parses the packed symbol table blob returned by an `SYM_UPLOAD` read.
///
/// Each record is `{recordLen u32, group u32, offset u32, size u32, typeCode u32,
/// flags u32, nameLen u16, typeLen u16, commentLen u16, name, 0x00, type, 0x00,
/// comment, 0x00}`, followed by any padding up to `recordLen`. A record whose declared
/// length or string lengths overrun the remaining buffer stops the walk rather than
/// panicking or returning partially garbage data, mirroring the notification parser's
/// underflow handling.
pub fn parse_symbol_table(mut buf: &[u8], expected_count: u32) -> Result<Vec<SymbolInfo>> {
    let mut symbols = Vec::with_capacity(expected_count as usize);

    while !buf.is_empty() {
        match parse_one_record(buf) {
            Some((symbol, consumed)) => {
                symbols.push(symbol);
                buf = &buf[consumed..];
            }
            None => break,
        }
    }

    Ok(symbols)
}

fn parse_one_record(buf: &[u8]) -> Option<(SymbolInfo, usize)> {
    if buf.len() < FIXED_HEADER_LEN {
        return None;
    }

    let record_len = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
    let index_group = u32::from_le_bytes(buf[4..8].try_into().unwrap());
    let index_offset = u32::from_le_bytes(buf[8..12].try_into().unwrap());
    let size = u32::from_le_bytes(buf[12..16].try_into().unwrap());
    let type_code = u32::from_le_bytes(buf[16..20].try_into().unwrap());
    let flags = u32::from_le_bytes(buf[20..24].try_into().unwrap());
    let name_len = u16::from_le_bytes(buf[24..26].try_into().unwrap()) as usize;
    let type_len = u16::from_le_bytes(buf[26..28].try_into().unwrap()) as usize;
    let comment_len = u16::from_le_bytes(buf[28..30].try_into().unwrap()) as usize;

    let mut cursor = FIXED_HEADER_LEN;
    let name = read_nul_terminated(buf, &mut cursor, name_len)?;
    let type_name = read_nul_terminated(buf, &mut cursor, type_len)?;
    let comment = read_nul_terminated(buf, &mut cursor, comment_len)?;

    let consumed = record_len.max(cursor);
    if consumed > buf.len() {
        return None;
    }

    Some((
        SymbolInfo {
            name,
            type_name,
            comment,
            type_code,
            flags,
            index_group,
            index_offset,
            size,
        },
        consumed,
    ))
}

/// Reads `len` bytes of a string plus its trailing NUL, advancing `cursor`.
fn read_nul_terminated(buf: &[u8], cursor: &mut usize, len: usize) -> Option<String> {
    let start = *cursor;
    let end = start.checked_add(len)?;
    if end + 1 > buf.len() {
        return None;
    }
    let s = String::from_utf8_lossy(&buf[start..end]).into_owned();
    *cursor = end + 1; // skip the NUL terminator
    Some(s)
}

pub(crate) fn too_long(what: &str, max: usize) -> ClientError {
    ClientError::Encoding(format!("{what} exceeds maximum wire length of {max} bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_record(name: &str, type_name: &str, comment: &str, group: u32, offset: u32, size: u32, type_code: u32, flags: u32) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&group.to_le_bytes());
        body.extend_from_slice(&offset.to_le_bytes());
        body.extend_from_slice(&size.to_le_bytes());
        body.extend_from_slice(&type_code.to_le_bytes());
        body.extend_from_slice(&flags.to_le_bytes());
        body.extend_from_slice(&(name.len() as u16).to_le_bytes());
        body.extend_from_slice(&(type_name.len() as u16).to_le_bytes());
        body.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        body.extend_from_slice(name.as_bytes());
        body.push(0);
        body.extend_from_slice(type_name.as_bytes());
        body.push(0);
        body.extend_from_slice(comment.as_bytes());
        body.push(0);

        let record_len = (body.len() + 4) as u32;
        let mut record = record_len.to_le_bytes().to_vec();
        record.extend_from_slice(&body);
        record
    }

    #[test]
    fn parses_single_record() {
        let record = build_record("MAIN.counter", "INT", "", 0x4020, 0, 2, 0x02, 0);
        let symbols = parse_symbol_table(&record, 1).unwrap();

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "MAIN.counter");
        assert_eq!(symbols[0].type_name, "INT");
        assert_eq!(symbols[0].size, 2);
        assert_eq!(symbols[0].index_group, 0x4020);
    }

    #[test]
    fn parses_multiple_records() {
        let mut buf = build_record("a", "BOOL", "", 1, 0, 1, 0x10, 0);
        buf.extend(build_record("b", "REAL", "speed", 1, 1, 4, 0x05, 1));

        let symbols = parse_symbol_table(&buf, 2).unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[1].name, "b");
        assert_eq!(symbols[1].comment, "speed");
    }

    #[test]
    fn stops_on_truncated_trailing_record() {
        let mut buf = build_record("a", "BOOL", "", 1, 0, 1, 0x10, 0);
        buf.extend_from_slice(&[0xAA; 4]); // a record length header with no body

        let symbols = parse_symbol_table(&buf, 2).unwrap();
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn empty_table() {
        let symbols = parse_symbol_table(&[], 0).unwrap();
        assert!(symbols.is_empty());
    }
}
