use std::str::Utf8Error;

use jspc_core::{CompileConfig, CompileError, CompileResult, TemplateTree};
use jspc_tree::TreeBuilder;
use log::{debug, trace};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("line {line}: malformed XML: {source}")]
    Xml {
        line: u32,
        #[source]
        source: quick_xml::Error,
    },

    #[error("line {line}: {source}")]
    Encoding {
        line: u32,
        #[source]
        source: Utf8Error,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Reads an XML-syntax page into a validated tree
pub fn read_template(source: &str, filename: &str, config: &CompileConfig) -> Result<TemplateTree, ReadError> {
    let lines = LineIndex::new(source);

    let mut reader = Reader::from_str(source);
    let reader_config = reader.config_mut();
    reader_config.trim_text(false);
    // Mismatched end tags are reported by the builder, with the tag they should have closed
    reader_config.check_end_names = false;

    let mut builder = TreeBuilder::new(config, filename);
    let mut text = TextBuffer::default();

    loop {
        let line = lines.line_of(reader.buffer_position());
        let event = reader.read_event().map_err(|source| ReadError::Xml {
            line: lines.line_of(reader.error_position()),
            source,
        })?;

        match event {
            Event::Start(start) => {
                text.flush(&mut builder)?;
                start_element(&mut builder, &start, line)?;
            }
            Event::Empty(start) => {
                text.flush(&mut builder)?;
                let name = start_element(&mut builder, &start, line)?;
                builder.close_element(&name, line)?;
            }
            Event::End(end) => {
                text.flush(&mut builder)?;
                let end_name = end.name();
                builder.close_element(decode(end_name.as_ref(), line)?, line)?;
            }
            Event::Text(chunk) => {
                let chunk = chunk
                    .unescape()
                    .map_err(|source| ReadError::Xml { line, source })?;
                text.push(&chunk, line);
            }
            Event::CData(chunk) => {
                let chunk = chunk.into_inner();
                text.push(decode(&chunk, line)?, line);
            }
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    text.flush(&mut builder)?;
    let tree = builder.finish()?;
    debug!("Read {} nodes from {}", tree.len(), filename);

    Ok(tree)
}

/// Starts an element and binds its attributes, returning the element name
fn start_element(builder: &mut TreeBuilder, start: &BytesStart, line: u32) -> Result<String, ReadError> {
    let name = decode(start.name().as_ref(), line)?.to_owned();
    trace!("<{name}> at line {line}");
    builder.start_element(&name, line)?;

    for attr in start.attributes() {
        let attr = attr.map_err(|err| ReadError::Xml {
            line,
            source: err.into(),
        })?;
        let key = decode(attr.key.as_ref(), line)?;
        let value = attr
            .unescape_value()
            .map_err(|source| ReadError::Xml { line, source })?;
        builder.attribute(key, &value)?;
    }

    builder.close_attributes()?;
    Ok(name)
}

fn decode(bytes: &[u8], line: u32) -> Result<&str, ReadError> {
    std::str::from_utf8(bytes).map_err(|source| ReadError::Encoding { line, source })
}

/// Adjacent text and CDATA sections become a single text node
#[derive(Default)]
struct TextBuffer {
    text: String,
    /// Line of the first chunk
    line: u32,
}

impl TextBuffer {
    fn push(&mut self, chunk: &str, line: u32) {
        if self.text.is_empty() {
            self.line = line;
        }
        self.text.push_str(chunk);
    }

    fn flush(&mut self, builder: &mut TreeBuilder) -> CompileResult<()> {
        if self.text.is_empty() {
            return Ok(());
        }

        let text = std::mem::take(&mut self.text);
        builder.text(&text, self.line)
    }
}

/// Byte offsets of line starts
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        LineIndex { starts }
    }

    fn line_of(&self, position: u64) -> u32 {
        let position = usize::try_from(position).unwrap_or(usize::MAX);
        self.starts.partition_point(|&start| start <= position) as u32
    }
}

#[cfg(test)]
mod tests {
    use jspc_core::{CompileErrorKind, NodeKind};
    use pretty_assertions::assert_eq;

    use super::*;

    fn read(source: &str) -> Result<TemplateTree, ReadError> {
        read_template(source, "test.jsp", &CompileConfig::default())
    }

    #[test]
    fn it_indexes_lines() {
        let lines = LineIndex::new("a\nbc\n\nd");
        assert_eq!(lines.line_of(0), 1);
        assert_eq!(lines.line_of(1), 1);
        assert_eq!(lines.line_of(2), 2);
        assert_eq!(lines.line_of(5), 3);
        assert_eq!(lines.line_of(6), 4);
    }

    #[test]
    fn it_reads_elements_and_lines() {
        let tree = read("<jsp:root xmlns:jsp=\"http://java.sun.com/JSP/Page\">\n<p>\n  <c:out value=\"x\"/>\n</p></jsp:root>")
            .unwrap();

        let p = tree
            .children(tree.root())
            .iter()
            .copied()
            .find(|&child| tree.node(child).name.is_plain("p"))
            .unwrap();
        assert_eq!(tree.node(p).location.line, 2);
        assert_eq!(tree.node(p).end_line, 4);

        let out = tree
            .children(p)
            .iter()
            .copied()
            .find(|&child| matches!(tree.kind(child), NodeKind::Out(_)))
            .unwrap();
        assert_eq!(tree.node(out).location.line, 3);
    }

    #[test]
    fn it_coalesces_cdata() {
        let tree = read("<jsp:root><jsp:text>a &amp; <![CDATA[<b>]]> c</jsp:text></jsp:root>").unwrap();

        let text = tree.children(tree.root())[0];
        assert!(matches!(tree.kind(text), NodeKind::JspText));
        assert_eq!(tree.static_text(text).as_deref(), Some("a & <b> c"));
    }

    #[test]
    fn it_reports_malformed_xml() {
        let err = read("<jsp:root>\n<p a=\"1></p></jsp:root>").unwrap_err();
        assert!(matches!(err, ReadError::Xml { .. }));
    }

    #[test]
    fn it_propagates_compile_errors() {
        let err = read("<jsp:root>\n<p>\n</div></jsp:root>").unwrap_err();
        let ReadError::Compile(err) = err else {
            panic!("expected a compile error, got {err:?}");
        };

        assert_eq!(
            err.kind,
            CompileErrorKind::MismatchedEndTag {
                expected: "p".to_owned(),
                found: "div".to_owned()
            }
        );
        assert_eq!(err.location.line, 2);
    }
}
