use std::{
    fs,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::{
    error::{Error, Result, Stage},
    page::{AccessClass, PageNumber, PageSize},
    trace::{parse_address, AccessEvent},
};

/// Ordered page references of one access class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceStream {
    class: AccessClass,
    pages: Vec<PageNumber>,
}

impl ReferenceStream {
    pub fn new(class: AccessClass, pages: Vec<PageNumber>) -> Self {
        ReferenceStream { class, pages }
    }

    pub fn class(&self) -> AccessClass {
        self.class
    }

    pub fn pages(&self) -> &[PageNumber] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Loads a persisted reference string: one hexadecimal page number per line.
    pub fn load(path: &Path, class: AccessClass) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingResource {
                stage: Stage::References,
                path: path.to_owned(),
            });
        }
        let file = fs::File::open(path).map_err(Error::io(Stage::References, path))?;
        let mut pages = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(Error::io(Stage::References, path))?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            let page = parse_address(text).ok_or_else(|| Error::MalformedReference {
                path: path.to_owned(),
                line: idx + 1,
                text: text.to_owned(),
            })?;
            pages.push(PageNumber(page));
        }
        log::debug!("loaded {} {} references from {}", pages.len(), class, path.display());
        Ok(ReferenceStream { class, pages })
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path).map_err(Error::io(Stage::References, path))?;
        let mut out = BufWriter::new(file);
        self.pages
            .iter()
            .try_for_each(|page| write_page(&mut out, *page))
            .and_then(|()| out.flush())
            .map_err(Error::io(Stage::References, path))
    }
}

/// Both streams built from one trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceStreams {
    pub instruction: ReferenceStream,
    pub data: ReferenceStream,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamCounts {
    pub instruction: u64,
    pub data: u64,
}

/// Lazily maps events to the page numbers of a single class, in trace order.
pub fn references<I>(
    events: I,
    page_size: PageSize,
    class: AccessClass,
) -> impl Iterator<Item = PageNumber>
where
    I: IntoIterator<Item = AccessEvent>,
{
    events
        .into_iter()
        .filter(move |event| event.kind.class() == class)
        .map(move |event| page_size.page_of(&event))
}

pub fn build<I>(events: I, page_size: PageSize) -> ReferenceStreams
where
    I: IntoIterator<Item = AccessEvent>,
{
    let mut instruction = Vec::new();
    let mut data = Vec::new();
    for event in events {
        let page = page_size.page_of(&event);
        match event.kind.class() {
            AccessClass::Instruction => instruction.push(page),
            AccessClass::Data => data.push(page),
        }
    }
    ReferenceStreams {
        instruction: ReferenceStream::new(AccessClass::Instruction, instruction),
        data: ReferenceStream::new(AccessClass::Data, data),
    }
}

/// Writes both reference strings in a single pass without holding the trace
/// in memory.
pub fn split_into<I, W1, W2>(
    events: I,
    page_size: PageSize,
    instruction: &mut W1,
    data: &mut W2,
) -> io::Result<StreamCounts>
where
    I: IntoIterator<Item = AccessEvent>,
    W1: Write,
    W2: Write,
{
    let mut counts = StreamCounts::default();
    for event in events {
        let page = page_size.page_of(&event);
        match event.kind.class() {
            AccessClass::Instruction => {
                write_page(instruction, page)?;
                counts.instruction += 1;
            }
            AccessClass::Data => {
                write_page(data, page)?;
                counts.data += 1;
            }
        }
    }
    instruction.flush()?;
    data.flush()?;
    Ok(counts)
}

fn write_page<W: Write>(out: &mut W, page: PageNumber) -> io::Result<()> {
    writeln!(out, "{page:X}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::parse_line;

    fn events(lines: &[&str]) -> Vec<AccessEvent> {
        lines.iter().filter_map(|line| parse_line(line)).collect()
    }

    fn pages(raw: &[u64]) -> Vec<PageNumber> {
        raw.iter().copied().map(PageNumber).collect()
    }

    #[test]
    fn splits_by_class_in_trace_order() {
        let trace = events(&["I 0x1000,4", "L 0x2004,8", "I 0x1008,4"]);
        let streams = build(trace, PageSize::default());
        assert_eq!(streams.instruction.pages(), pages(&[0x1000, 0x1000]));
        assert_eq!(streams.data.pages(), pages(&[0x2000]));
        assert_eq!(streams.instruction.class(), AccessClass::Instruction);
        assert_eq!(streams.data.class(), AccessClass::Data);
    }

    #[test]
    fn keeps_repeats_and_counts_modify_once() {
        let trace = events(&[
            "S 0x5000,4",
            "M 0x5008,4",
            "==7== noise",
            "L 0x5010,4",
            "S 0x9000,4",
            "L 0x5000,4",
        ]);
        let streams = build(trace, PageSize::default());
        assert!(streams.instruction.is_empty());
        assert_eq!(
            streams.data.pages(),
            pages(&[0x5000, 0x5000, 0x5000, 0x9000, 0x5000])
        );
    }

    #[test]
    fn lazy_references_match_build() {
        let trace = events(&["I 0x1000,4", "S 0x20ff,8", "I 0x3004,4", "L 0x2100,8"]);
        let page_size = PageSize::new(256).unwrap();
        let streams = build(trace.clone(), page_size);

        let instruction: Vec<_> =
            references(trace.iter().copied(), page_size, AccessClass::Instruction).collect();
        let data: Vec<_> = references(trace, page_size, AccessClass::Data).collect();
        assert_eq!(instruction, streams.instruction.pages());
        assert_eq!(data, pages(&[0x2000, 0x2100]));
    }

    #[test]
    fn split_writes_uppercase_hex_lines() {
        let trace = events(&["I 0x1a2b,4", "L 0x2004,8", "I 0x1008,4", "M 0xabcdef,2"]);
        let mut instruction = Vec::new();
        let mut data = Vec::new();
        let counts =
            split_into(trace, PageSize::default(), &mut instruction, &mut data).unwrap();
        assert_eq!(
            counts,
            StreamCounts {
                instruction: 2,
                data: 2,
            }
        );
        assert_eq!(String::from_utf8(instruction).unwrap(), "1000\n1000\n");
        assert_eq!(String::from_utf8(data).unwrap(), "2000\nABC000\n");
    }

    #[test]
    fn persisted_stream_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_reference_string.txt");
        let stream = ReferenceStream::new(AccessClass::Data, pages(&[0x2000, 0x7ff000000, 0x2000]));
        stream.persist(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "2000\n7FF000000\n2000\n");
        assert_eq!(ReferenceStream::load(&path, AccessClass::Data).unwrap(), stream);
    }

    #[test]
    fn load_tolerates_prefixes_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.txt");
        fs::write(&path, "0x1000\n\n1A000").unwrap();
        let stream = ReferenceStream::load(&path, AccessClass::Instruction).unwrap();
        assert_eq!(stream.pages(), pages(&[0x1000, 0x1A000]));
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.txt");
        fs::write(&path, "1000\nnot-a-page\n").unwrap();
        match ReferenceStream::load(&path, AccessClass::Data) {
            Err(Error::MalformedReference { line, text, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(text, "not-a-page");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReferenceStream::load(&dir.path().join("gone.txt"), AccessClass::Data)
            .unwrap_err();
        assert_eq!(err.stage(), Stage::References);
    }
}
