//! Gateway result types
//!
//! Defines what the gateway hands back to the protocol engine.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

use crate::storage::EntryInfo;

/// Random-access byte source over a resolved file
#[derive(Debug)]
pub struct FileReader {
    file: File,
}

impl FileReader {
    pub(crate) fn new(file: File) -> Self {
        Self { file }
    }

    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.file.read_at(buf, offset)
    }

    /// Read everything from `offset` to the end of the file
    pub fn read_to_end_at(&self, offset: u64) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        let mut buffer = [0; 8192];
        let mut position = offset;

        loop {
            let n = self.file.read_at(&mut buffer, position)?;
            if n == 0 {
                break;
            }
            content.extend_from_slice(&buffer[..n]);
            position += n as u64;
        }

        Ok(content)
    }
}

/// Random-access byte sink over a resolved file
#[derive(Debug)]
pub struct FileWriter {
    file: File,
}

impl FileWriter {
    pub(crate) fn new(file: File) -> Self {
        Self { file }
    }

    pub fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.file.write_at(buf, offset)
    }

    pub fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()> {
        self.file.write_all_at(buf, offset)
    }
}

/// Outcome of a command operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Entry created or modified; ownership fixup was attempted
    Applied,
    /// Entry deleted; nothing further was done
    Removed,
}

/// Successful result of any dispatched request
#[derive(Debug)]
pub enum Response {
    Reader(FileReader),
    Writer(FileWriter),
    Entries(Vec<EntryInfo>),
    Command(CommandOutcome),
}
