use std::{fmt, ops::Not};

use serde::Serialize;

use crate::{
    error::{Error, Result},
    trace::{AccessEvent, AccessKind},
};

pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Page-aligned address. Displayed in hexadecimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PageNumber(pub u64);

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::UpperHex for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessClass {
    Instruction,
    Data,
}

impl fmt::Display for AccessClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessClass::Instruction => "instruction",
            AccessClass::Data => "data",
        })
    }
}

impl AccessKind {
    pub fn class(self) -> AccessClass {
        match self {
            AccessKind::Instruction => AccessClass::Instruction,
            AccessKind::Load | AccessKind::Store | AccessKind::Modify => AccessClass::Data,
        }
    }
}

/// Validated page size; clears the offset bits of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    bytes: u64,
    mask: u64,
}

impl PageSize {
    pub fn new(bytes: u64) -> Result<Self> {
        if !bytes.is_power_of_two() {
            return Err(Error::Configuration(format!(
                "page size {bytes} is not a positive power of two"
            )));
        }
        Ok(PageSize {
            bytes,
            mask: (bytes - 1).not(),
        })
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn offset_bits(&self) -> u32 {
        self.bytes.ilog2()
    }

    pub fn reduce(&self, address: u64) -> PageNumber {
        PageNumber(address & self.mask)
    }

    pub fn page_of(&self, event: &AccessEvent) -> PageNumber {
        self.reduce(event.address)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize {
            bytes: DEFAULT_PAGE_SIZE,
            mask: (DEFAULT_PAGE_SIZE - 1).not(),
        }
    }
}
