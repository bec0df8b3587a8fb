use std::{
    fs,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use xz2::read::XzDecoder;

use crate::error::{Error, Result, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Instruction,
    Load,
    Store,
    Modify,
}

impl AccessKind {
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'I' => Some(AccessKind::Instruction),
            'L' => Some(AccessKind::Load),
            'S' => Some(AccessKind::Store),
            'M' => Some(AccessKind::Modify),
            _ => None,
        }
    }

    pub fn tag(self) -> char {
        match self {
            AccessKind::Instruction => 'I',
            AccessKind::Load => 'L',
            AccessKind::Store => 'S',
            AccessKind::Modify => 'M',
        }
    }
}

/// One memory access as recorded by the profiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessEvent {
    pub kind: AccessKind,
    pub address: u64,
    pub size: u32,
}

/// Parses a single trace record of the form `<class> <address>,<size>`.
///
/// The address is hexadecimal, with or without a `0x` prefix. Anything that
/// does not look like a record (profiler banners, program output, truncated
/// lines) yields `None`.
pub fn parse_line(line: &str) -> Option<AccessEvent> {
    let line = line.trim();
    let mut chars = line.chars();
    let kind = AccessKind::from_tag(chars.next()?)?;

    let rest = chars.as_str();
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();

    let addr_end = rest.find(|c: char| c == ',' || c.is_whitespace())?;
    let (addr, rest) = rest.split_at(addr_end);
    let address = parse_address(addr)?;

    let rest = rest.trim_start();
    let rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let size = rest[..digits].parse().ok()?;

    Some(AccessEvent {
        kind,
        address,
        size,
    })
}

pub fn parse_address(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// A trace log on disk. Plain text, or xz-compressed when the name ends in `.xz`.
#[derive(Debug, Clone)]
pub struct TraceFile {
    path: PathBuf,
}

impl TraceFile {
    pub fn open(path: impl Into<PathBuf>) -> Result<TraceFile> {
        let path = path.into();
        if !path.is_file() {
            return Err(Error::MissingResource {
                stage: Stage::Trace,
                path,
            });
        }
        Ok(TraceFile { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_compressed(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "xz")
    }

    /// Starts a fresh pass over the trace. Every call re-opens the file, so
    /// the event sequence can be replayed from the beginning any number of times.
    pub fn events(&self) -> Result<Events> {
        let stream = fs::File::open(&self.path).map_err(Error::io(Stage::Trace, &self.path))?;
        let reader: Box<dyn BufRead> = if self.is_compressed() {
            Box::new(BufReader::new(XzDecoder::new(stream)))
        } else {
            Box::new(BufReader::new(stream))
        };
        Ok(Events::new(self.path.clone(), reader))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraceSummary {
    pub lines: u64,
    pub events: u64,
    pub skipped: u64,
}

/// Lazy iterator over the events of one trace pass.
///
/// A read error ends the iteration; it is reported by [`Events::finish`].
pub struct Events {
    path: PathBuf,
    reader: Box<dyn BufRead>,
    buf: Vec<u8>,
    summary: TraceSummary,
    error: Option<io::Error>,
}

impl Events {
    pub fn new(path: PathBuf, reader: Box<dyn BufRead>) -> Self {
        Events {
            path,
            reader,
            buf: Vec::new(),
            summary: TraceSummary::default(),
            error: None,
        }
    }

    pub fn finish(self) -> Result<TraceSummary> {
        match self.error {
            Some(source) => Err(Error::Io {
                stage: Stage::Trace,
                path: self.path,
                source,
            }),
            None => Ok(self.summary),
        }
    }
}

impl Iterator for Events {
    type Item = AccessEvent;

    fn next(&mut self) -> Option<AccessEvent> {
        if self.error.is_some() {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    log::error!("reading {} failed: {}", self.path.display(), err);
                    self.error = Some(err);
                    return None;
                }
            }
            self.summary.lines += 1;
            match parse_line(&String::from_utf8_lossy(&self.buf)) {
                Some(event) => {
                    self.summary.events += 1;
                    return Some(event);
                }
                None => {
                    log::trace!("skipping trace line {}", self.summary.lines);
                    self.summary.skipped += 1;
                }
            }
        }
    }
}
