//! Minimal WordprocessingML package codec.
//!
//! A `.docx` file is a ZIP package whose main part, `word/document.xml`, looks
//! like:
//! ```xml
//! <w:document xmlns:w="...">
//!   <w:body>
//!     <w:p><w:r><w:t>First paragraph</w:t></w:r></w:p>
//!     <w:tbl>...</w:tbl>
//!     <w:sectPr>...</w:sectPr>
//!   </w:body>
//! </w:document>
//! ```
//!
//! Only the list of top-level body children is modelled. Each child is kept as
//! its original XML text, so tables, styles and every other package part
//! survive a load/save cycle byte for byte. Paragraph text is the concatenation
//! of the `w:t` runs, with `w:tab` read as `\t` and `w:cr` or a line-wrapping
//! `w:br` as `\n`. Page and column breaks read as nothing.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const DOCUMENT_PART: &str = "word/document.xml";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
const DOCUMENT_CLOSE: &str = "</w:body></w:document>";

/// US Letter with one-inch margins, matching what Word writes for a blank document.
const DEFAULT_SECT_PR: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#;

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("invalid docx package: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("invalid document XML: {0}")]
    Xml(String),
    #[error("package has no {0} part")]
    MissingPart(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One top-level child of `w:body`.
#[derive(Debug, Clone)]
struct BodyItem {
    raw: String,
    /// Text content, present only for `w:p` children.
    paragraph: Option<String>,
}

impl BodyItem {
    fn is_section_properties(&self) -> bool {
        self.raw.starts_with("<w:sectPr")
    }
}

/// An editable view over the paragraphs of a `.docx` package.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    /// Original package bytes; `None` for a document created in memory.
    package: Option<Vec<u8>>,
    prefix: String,
    items: Vec<BodyItem>,
    suffix: String,
}

impl Default for DocxDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxDocument {
    /// An empty document with a single section.
    pub fn new() -> Self {
        Self {
            package: None,
            prefix: format!("{XML_DECL}\n{DOCUMENT_OPEN}"),
            items: vec![BodyItem {
                raw: DEFAULT_SECT_PR.to_string(),
                paragraph: None,
            }],
            suffix: DOCUMENT_CLOSE.to_string(),
        }
    }

    pub fn open(path: &Path) -> Result<Self, DocxError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DocxError> {
        let xml = {
            let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
            let mut part = match archive.by_name(DOCUMENT_PART) {
                Ok(part) => part,
                Err(zip::result::ZipError::FileNotFound) => {
                    return Err(DocxError::MissingPart(DOCUMENT_PART));
                }
                Err(e) => return Err(e.into()),
            };
            let mut xml = String::new();
            part.read_to_string(&mut xml)?;
            xml
        };

        let (prefix, items, suffix) = parse_body(&xml)?;
        Ok(Self {
            package: Some(bytes),
            prefix,
            items,
            suffix,
        })
    }

    /// Text of each top-level paragraph, in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| item.paragraph.as_deref())
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// All paragraph texts joined with `\n`.
    pub fn text(&self) -> String {
        self.paragraphs().collect::<Vec<_>>().join("\n")
    }

    /// Append `text` as a new paragraph after the last body content.
    ///
    /// Returns the paragraph text exactly as [`paragraphs`](Self::paragraphs)
    /// will report it: line endings become `\n` and characters XML 1.0 cannot
    /// carry are dropped.
    pub fn append_paragraph(&mut self, text: &str) -> String {
        let stored = normalize_paragraph_text(text);
        let item = BodyItem {
            raw: paragraph_xml(&stored),
            paragraph: Some(stored.clone()),
        };

        // New content goes before the final section properties, as Word expects.
        match self.items.last() {
            Some(last) if last.is_section_properties() => {
                let at = self.items.len() - 1;
                self.items.insert(at, item);
            }
            _ => self.items.push(item),
        }
        stored
    }

    /// Remove the last paragraph whose text equals `text` exactly.
    ///
    /// Scans from the end of the body backward; returns false when no
    /// paragraph matches.
    pub fn remove_last_matching(&mut self, text: &str) -> bool {
        let found = self
            .items
            .iter()
            .rposition(|item| item.paragraph.as_deref() == Some(text));
        match found {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn document_xml(&self) -> String {
        let body_len: usize = self.items.iter().map(|i| i.raw.len()).sum();
        let mut xml = String::with_capacity(self.prefix.len() + body_len + self.suffix.len());
        xml.push_str(&self.prefix);
        for item in &self.items {
            xml.push_str(&item.raw);
        }
        xml.push_str(&self.suffix);
        xml
    }

    /// Serialize the package. Parts other than `word/document.xml` are copied
    /// from the original package without recompression.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let document_xml = self.document_xml();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        match &self.package {
            Some(bytes) => {
                let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
                for i in 0..archive.len() {
                    let part = archive.by_index_raw(i)?;
                    if part.name() == DOCUMENT_PART {
                        drop(part);
                        writer.start_file(DOCUMENT_PART, options)?;
                        writer.write_all(document_xml.as_bytes())?;
                    } else {
                        writer.raw_copy_file(part)?;
                    }
                }
            }
            None => {
                writer.start_file("[Content_Types].xml", options)?;
                writer.write_all(CONTENT_TYPES_XML.as_bytes())?;
                writer.start_file("_rels/.rels", options)?;
                writer.write_all(PACKAGE_RELS_XML.as_bytes())?;
                writer.start_file(DOCUMENT_PART, options)?;
                writer.write_all(document_xml.as_bytes())?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write the package to `path`, replacing any existing file atomically.
    pub fn save(&self, path: &Path) -> Result<(), DocxError> {
        let tmp = self.write_temp_beside(path)?;
        tmp.persist(path).map_err(|e| DocxError::Io(e.error))?;
        Ok(())
    }

    /// Write the package to `path`, failing with
    /// [`std::io::ErrorKind::AlreadyExists`] if the file is already there.
    pub fn save_new(&self, path: &Path) -> Result<(), DocxError> {
        let tmp = self.write_temp_beside(path)?;
        tmp.persist_noclobber(path)
            .map_err(|e| DocxError::Io(e.error))?;
        Ok(())
    }

    fn write_temp_beside(&self, path: &Path) -> Result<tempfile::NamedTempFile, DocxError> {
        let bytes = self.to_bytes()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }
}

/// Split `document.xml` into (text up to and including `<w:body>`, body
/// children, text from `</w:body>` on).
fn parse_body(xml: &str) -> Result<(String, Vec<BodyItem>, String), DocxError> {
    let mut reader = Reader::from_str(xml);

    let mut depth: usize = 0;
    // Depth at which direct children of w:body start.
    let mut child_depth: Option<usize> = None;
    let mut prefix_end = 0;
    let mut items = Vec::new();

    let mut item_start = 0;
    let mut in_paragraph = false;
    let mut in_run = false;
    let mut in_text = false;
    let mut text = String::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| DocxError::Xml(e.to_string()))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(ref e) => {
                let name = e.name();
                match child_depth {
                    None => {
                        if name.as_ref() == b"w:body" {
                            child_depth = Some(depth + 1);
                            prefix_end = after;
                        }
                    }
                    Some(cd) if depth == cd => {
                        item_start = before;
                        in_paragraph = name.as_ref() == b"w:p";
                        text.clear();
                    }
                    Some(_) if in_paragraph => match name.as_ref() {
                        b"w:r" => in_run = true,
                        b"w:t" if in_run => in_text = true,
                        _ => {}
                    },
                    Some(_) => {}
                }
                depth += 1;
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                match child_depth {
                    Some(cd) if depth == cd => {
                        items.push(BodyItem {
                            raw: xml[item_start..after].to_string(),
                            paragraph: in_paragraph.then(|| std::mem::take(&mut text)),
                        });
                        in_paragraph = false;
                        in_run = false;
                        in_text = false;
                    }
                    Some(cd) if depth + 1 == cd => {
                        return Ok((
                            xml[..prefix_end].to_string(),
                            items,
                            xml[before..].to_string(),
                        ));
                    }
                    Some(_) if in_paragraph => match e.name().as_ref() {
                        b"w:r" => in_run = false,
                        b"w:t" => in_text = false,
                        _ => {}
                    },
                    _ => {}
                }
            }
            Event::Empty(ref e) => {
                let name = e.name();
                match child_depth {
                    None => {
                        if name.as_ref() == b"w:body" {
                            return Ok((
                                format!("{}<w:body>", &xml[..before]),
                                Vec::new(),
                                format!("</w:body>{}", &xml[after..]),
                            ));
                        }
                    }
                    Some(cd) if depth == cd => items.push(BodyItem {
                        raw: xml[before..after].to_string(),
                        paragraph: (name.as_ref() == b"w:p").then(String::new),
                    }),
                    Some(_) if in_run => match name.as_ref() {
                        b"w:tab" => text.push('\t'),
                        b"w:br" if !is_layout_break(e) => text.push('\n'),
                        b"w:cr" => text.push('\n'),
                        _ => {}
                    },
                    Some(_) => {}
                }
            }
            Event::Text(ref t) if in_text => {
                let unescaped = t.unescape().map_err(|e| DocxError::Xml(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(ref c) if in_text => {
                text.push_str(&String::from_utf8_lossy(c));
            }
            Event::Comment(_) | Event::PI(_) if child_depth == Some(depth) => {
                items.push(BodyItem {
                    raw: xml[before..after].to_string(),
                    paragraph: None,
                });
            }
            Event::Eof => {
                return Err(DocxError::Xml(
                    "document ended before </w:body>".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Page and column breaks carry no text; only line breaks read as `\n`.
fn is_layout_break(e: &BytesStart<'_>) -> bool {
    match e.try_get_attribute("w:type") {
        Ok(Some(attr)) => matches!(attr.value.as_ref(), b"page" | b"column"),
        _ => false,
    }
}

fn normalize_paragraph_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|&c| c == '\t' || c == '\n' || !c.is_control())
        .collect()
}

/// Serialize paragraph text as a single run, mapping tabs and newlines to
/// their run-level elements.
fn paragraph_xml(text: &str) -> String {
    let mut xml = String::from("<w:p><w:r>");
    let mut chunk = String::new();

    let flush = |xml: &mut String, chunk: &mut String| {
        if !chunk.is_empty() {
            xml.push_str(r#"<w:t xml:space="preserve">"#);
            xml.push_str(&escape(chunk.as_str()));
            xml.push_str("</w:t>");
            chunk.clear();
        }
    };

    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut xml, &mut chunk);
                xml.push_str("<w:tab/>");
            }
            '\n' => {
                flush(&mut xml, &mut chunk);
                xml.push_str("<w:br/>");
            }
            _ => chunk.push(c),
        }
    }
    flush(&mut xml, &mut chunk);

    xml.push_str("</w:r></w:p>");
    xml
}
