//! HL7 v2 document model and codec
//!
//! A [`Document`] is an ordered list of segments. Repeated segment names
//! (several `OBX`, for instance) are kept as distinct entries in their
//! original order. Each segment maps 1-based field indices to raw field text.
//!
//! Reads never fail: absent segments, fields and components read as the
//! empty string. Writes pad missing components transparently.

use super::coordinate::Coordinate;
use super::errors::UnsupportedVersion;
use std::collections::BTreeMap;

/// Field separator
pub const FIELD_SEPARATOR: char = '|';
/// Component separator
pub const COMPONENT_SEPARATOR: char = '^';
/// Segment terminator
pub const SEGMENT_TERMINATOR: char = '\r';

/// A single segment: three-character name plus indexed fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    /// Segment name, e.g. `PID`
    pub name: String,
    /// Field text keyed by 1-based index
    pub fields: BTreeMap<usize, String>,
}

impl Segment {
    /// Create an empty segment
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Raw text of a field, empty when absent
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(&index).map(String::as_str).unwrap_or("")
    }

    fn parse_line(line: &str) -> Self {
        let name_end = line
            .char_indices()
            .nth(3)
            .map(|(idx, _)| idx)
            .unwrap_or(line.len());
        let name = &line[..name_end];
        let rest = &line[name_end..];

        let mut segment = Segment::new(name);
        if let Some(body) = rest.strip_prefix(FIELD_SEPARATOR) {
            for (index, value) in body.split(FIELD_SEPARATOR).enumerate() {
                segment.fields.insert(index + 1, value.to_string());
            }
        }
        segment
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.name);
        out.push(FIELD_SEPARATOR);
        let max_index = self.fields.keys().next_back().copied().unwrap_or(0);
        for index in 1..=max_index {
            if index > 1 {
                out.push(FIELD_SEPARATOR);
            }
            out.push_str(self.field(index));
        }
    }
}

/// Parsed HL7 v2 message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    segments: Vec<Segment>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from segments in order
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse raw message bytes
    ///
    /// Decoding is lossy: invalid UTF-8 sequences are replaced rather than
    /// rejected, so parsing itself never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7bridge::domain::{Coordinate, Document};
    ///
    /// let doc = Document::parse(b"MSH|^~\\&|APP\rPID|1||12345^^^HOSP\r");
    /// let mrn = Coordinate::parse("PID-3.1").unwrap();
    /// assert_eq!(doc.get(&mrn), "12345");
    /// ```
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_matches(|c| c == '\r' || c == '\n');
        let segments = text
            .split(SEGMENT_TERMINATOR)
            .filter(|line| !line.is_empty())
            .map(Segment::parse_line)
            .collect();
        Self { segments }
    }

    /// Parse raw bytes and check MSH-12 against an allow-list
    ///
    /// An empty `supported` list accepts every version.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedVersion`] when the message version is not listed.
    pub fn parse_supported(
        raw: &[u8],
        supported: &[String],
    ) -> Result<Self, UnsupportedVersion> {
        let doc = Self::parse(raw);
        if supported.is_empty() {
            return Ok(doc);
        }
        let version = doc.version();
        if supported.iter().any(|v| v == version) {
            Ok(doc)
        } else {
            Err(UnsupportedVersion {
                version: version.to_string(),
            })
        }
    }

    /// Serialize to wire format, each segment terminated by `\r`
    ///
    /// Gaps in field indices are rendered as empty fields.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_hl7_string().into_bytes()
    }

    /// Serialize to a string, each segment terminated by `\r`
    pub fn to_hl7_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            segment.write_to(&mut out);
            out.push(SEGMENT_TERMINATOR);
        }
        out
    }

    /// All segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments with the given name, in order
    pub fn segments_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Segment> {
        self.segments.iter().filter(move |s| s.name == name)
    }

    /// First segment with the given name
    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// Append a segment
    pub fn push_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the document has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Read the value at a coordinate, empty when absent
    pub fn get(&self, coord: &Coordinate) -> &str {
        let field = self
            .segment(&coord.segment)
            .map(|s| s.field(coord.field))
            .unwrap_or("");
        match coord.component {
            None => field,
            Some(component) => component
                .checked_sub(1)
                .and_then(|slot| field.split(COMPONENT_SEPARATOR).nth(slot))
                .unwrap_or(""),
        }
    }

    /// Write a value at a coordinate
    ///
    /// Without a component index the field is replaced wholesale. With one,
    /// the field's components are right-padded with empty slots as needed and
    /// only the addressed slot is overwritten. A missing segment is appended.
    pub fn set(&mut self, coord: &Coordinate, value: &str) {
        let position = match self.segments.iter().position(|s| s.name == coord.segment) {
            Some(position) => position,
            None => {
                self.segments.push(Segment::new(coord.segment.clone()));
                self.segments.len() - 1
            }
        };
        let fields = &mut self.segments[position].fields;

        let Some(component) = coord.component else {
            fields.insert(coord.field, value.to_string());
            return;
        };

        let existing = fields.get(&coord.field).map(String::as_str).unwrap_or("");
        let mut parts: Vec<&str> = if existing.is_empty() {
            Vec::new()
        } else {
            existing.split(COMPONENT_SEPARATOR).collect()
        };
        let slot = component.saturating_sub(1);
        if parts.len() <= slot {
            parts.resize(slot + 1, "");
        }
        parts[slot] = value;
        let joined = parts.join("^");
        fields.insert(coord.field, joined);
    }

    // The parser indexes MSH from the encoding characters, so HL7 field
    // MSH-n sits at document index n - 1.
    fn msh_field(&self, hl7_index: usize) -> &str {
        self.segment("MSH")
            .map(|s| s.field(hl7_index - 1))
            .unwrap_or("")
    }

    /// Sending application (MSH-3)
    pub fn sending_application(&self) -> &str {
        self.msh_field(3)
    }

    /// Sending facility (MSH-4)
    pub fn sending_facility(&self) -> &str {
        self.msh_field(4)
    }

    /// Receiving application (MSH-5)
    pub fn receiving_application(&self) -> &str {
        self.msh_field(5)
    }

    /// Receiving facility (MSH-6)
    pub fn receiving_facility(&self) -> &str {
        self.msh_field(6)
    }

    /// Message type (MSH-9), e.g. `ADT^A01`
    pub fn message_type(&self) -> &str {
        self.msh_field(9)
    }

    /// Message control ID (MSH-10)
    pub fn control_id(&self) -> &str {
        self.msh_field(10)
    }

    /// Version ID (first component of MSH-12)
    pub fn version(&self) -> &str {
        self.msh_field(12)
            .split(COMPONENT_SEPARATOR)
            .next()
            .unwrap_or("")
    }
}
