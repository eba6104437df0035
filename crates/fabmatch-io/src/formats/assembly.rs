//! Fabrication assembly XML reader.
//!
//! Parts are `PART` elements directly below `ASSEMBLY`, which itself sits
//! directly below the document root:
//!
//! ```text
//! <ROOT>
//!   <ASSEMBLY>
//!     <PART ID="17" NAME="Plate" TYPE="P">
//!       <FRAME>
//!         <BASE X="0" Y="0" Z="0"/>
//!         <RX X="1" Y="0" Z="0"/>
//!         <RY X="0" Y="1" Z="0"/>
//!       </FRAME>
//!       <REFERENCE FILE_NAME="P-17.nc"/>
//!     </PART>
//!   </ASSEMBLY>
//! </ROOT>
//! ```

use fabmatch_core::RawPart;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{IoError, Result};
use crate::traits::SourceReader;

/// Reader for assembly XML files.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblyReader;

impl AssemblyReader {
    pub fn new() -> Self {
        Self
    }
}

impl SourceReader for AssemblyReader {
    type Record = RawPart;

    fn name(&self) -> &'static str {
        "assembly"
    }

    fn extensions(&self) -> &[&'static str] {
        &["xml", "wia"]
    }

    fn can_read(&self, data: &[u8]) -> bool {
        let head = &data[..data.len().min(8192)];
        String::from_utf8_lossy(head).contains("<ASSEMBLY")
    }

    fn read(&self, data: &[u8]) -> Result<Vec<RawPart>> {
        let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
        // Attribute text is decoded with the encoding the declaration names
        let mut reader = Reader::from_reader(data);
        reader.trim_text(true);

        // Element names from the root down to the current element
        let mut path: Vec<Vec<u8>> = Vec::new();
        let mut current: Option<RawPart> = None;
        let mut parts = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    visit(&reader, &e, &path, &mut current);
                    path.push(e.name().as_ref().to_vec());
                }
                Event::Empty(e) => {
                    visit(&reader, &e, &path, &mut current);
                    if is_part(&path, e.name().as_ref()) {
                        parts.extend(current.take());
                    }
                }
                Event::End(e) => {
                    path.pop();
                    if is_part(&path, e.name().as_ref()) {
                        parts.extend(current.take());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !path.is_empty() {
            return Err(IoError::parse_context(
                "unexpected end of document",
                String::from_utf8_lossy(&path.join(&b'/')).into_owned(),
            ));
        }

        debug!(parts = parts.len(), "parsed assembly XML");
        Ok(parts)
    }
}

/// `PART` directly under `ASSEMBLY` directly under the root.
fn is_part(parents: &[Vec<u8>], name: &[u8]) -> bool {
    name == b"PART" && parents.len() == 2 && parents[1] == b"ASSEMBLY"
}

fn visit(
    reader: &Reader<&[u8]>,
    element: &BytesStart,
    parents: &[Vec<u8>],
    current: &mut Option<RawPart>,
) {
    let name = element.name();
    let name = name.as_ref();

    if is_part(parents, name) {
        *current = Some(RawPart {
            id: attribute(reader, element, b"ID"),
            name: attribute(reader, element, b"NAME"),
            kind: attribute(reader, element, b"TYPE"),
            ..RawPart::default()
        });
        return;
    }

    let Some(part) = current.as_mut() else {
        return;
    };

    match (parents.len(), name) {
        (3, b"REFERENCE") => part.reference.extend(attribute(reader, element, b"FILE_NAME")),
        (4, b"BASE" | b"RX" | b"RY") if parents[3] == b"FRAME" => {
            let slot = match name {
                b"BASE" => &mut part.base,
                b"RX" => &mut part.rx,
                _ => &mut part.ry,
            };
            // First occurrence wins
            if slot.is_none() {
                *slot = coordinates(reader, element);
            }
        }
        _ => {}
    }
}

fn attribute(reader: &Reader<&[u8]>, element: &BytesStart, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.decode_and_unescape_value(reader).ok())
        .map(|v| v.into_owned())
}

/// `X`, `Y`, `Z` attributes; all three must parse.
fn coordinates(reader: &Reader<&[u8]>, element: &BytesStart) -> Option<Vec<f64>> {
    [b"X".as_slice(), b"Y", b"Z"]
        .into_iter()
        .map(|key| attribute(reader, element, key)?.trim().parse::<f64>().ok())
        .collect()
}
