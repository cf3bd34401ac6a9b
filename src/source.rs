// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_WINDOW_SIZE: usize = 512 * 1024;

/// A contiguous byte range of a file. Windows arrive in order and cover the
/// file exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub bytes: Vec<u8>,
    pub is_last: bool,
}

pub trait ChunkSource {
    /// The next window, or `None` once the source is exhausted. An empty
    /// source yields `None` straight away.
    fn next_window(&mut self) -> io::Result<Option<Window>>;
}

/// Fixed-size windows over any reader. Reads one window ahead so the final
/// window is flagged without knowing the total length.
pub struct ReaderSource<R> {
    reader: R,
    window_size: usize,
    ahead: Option<Vec<u8>>,
    done: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R, window_size: usize) -> Self {
        ReaderSource {
            reader,
            window_size: window_size.max(1),
            ahead: None,
            done: false,
        }
    }

    fn read_window(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.window_size);
        self.reader
            .by_ref()
            .take(self.window_size as u64)
            .read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read> ChunkSource for ReaderSource<R> {
    fn next_window(&mut self) -> io::Result<Option<Window>> {
        if self.done {
            return Ok(None);
        }
        let current = match self.ahead.take() {
            Some(buf) => buf,
            None => self.read_window()?,
        };
        if current.is_empty() {
            self.done = true;
            return Ok(None);
        }
        let next = self.read_window()?;
        let is_last = next.is_empty();
        if is_last {
            self.done = true;
        } else {
            self.ahead = Some(next);
        }
        Ok(Some(Window {
            bytes: current,
            is_last,
        }))
    }
}

/// Pre-cut windows, for feeding exact window boundaries into the aggregator.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    windows: VecDeque<Vec<u8>>,
}

impl MemorySource {
    pub fn new<I, B>(windows: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        MemorySource {
            windows: windows
                .into_iter()
                .map(Into::into)
                .filter(|w: &Vec<u8>| !w.is_empty())
                .collect(),
        }
    }

    /// Cuts `data` into `window_size` pieces.
    pub fn split(data: &[u8], window_size: usize) -> Self {
        Self::new(data.chunks(window_size.max(1)).map(<[u8]>::to_vec))
    }
}

impl ChunkSource for MemorySource {
    fn next_window(&mut self) -> io::Result<Option<Window>> {
        Ok(self.windows.pop_front().map(|bytes| Window {
            bytes,
            is_last: self.windows.is_empty(),
        }))
    }
}

/// Where a selected file's bytes come from. Reopened for every processing
/// pass so nothing but the window in flight is held in memory.
#[derive(Debug, Clone)]
pub enum FileOrigin {
    Path { path: PathBuf, len: u64 },
    Memory(Arc<[u8]>),
}

impl FileOrigin {
    pub fn path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = fs::metadata(&path)?.len();
        Ok(FileOrigin::Path { path, len })
    }

    pub fn memory(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        FileOrigin::Memory(Arc::from(bytes))
    }

    pub fn len(&self) -> u64 {
        match self {
            FileOrigin::Path { len, .. } => *len,
            FileOrigin::Memory(bytes) => bytes.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn open(&self, window_size: usize) -> io::Result<Box<dyn ChunkSource>> {
        Ok(match self {
            FileOrigin::Path { path, .. } => {
                Box::new(ReaderSource::new(File::open(path)?, window_size))
            }
            FileOrigin::Memory(bytes) => {
                Box::new(ReaderSource::new(Cursor::new(bytes.clone()), window_size))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most one byte per read call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    fn drain(mut src: impl ChunkSource) -> Vec<Window> {
        let mut out = Vec::new();
        while let Some(w) = src.next_window().unwrap() {
            out.push(w);
        }
        out
    }

    #[test]
    fn reader_source_fills_windows_across_short_reads() {
        let windows = drain(ReaderSource::new(Trickle(b"abcdefg"), 3));
        let bytes: Vec<&[u8]> = windows.iter().map(|w| w.bytes.as_slice()).collect();
        assert_eq!(bytes, vec![&b"abc"[..], &b"def"[..], &b"g"[..]]);
        assert_eq!(
            windows.iter().map(|w| w.is_last).collect::<Vec<_>>(),
            vec![false, false, true]
        );
    }

    #[test]
    fn exact_multiple_flags_last_full_window() {
        let windows = drain(ReaderSource::new(Cursor::new(b"abcdef".to_vec()), 3));
        assert_eq!(windows.len(), 2);
        assert!(windows[1].is_last);
    }

    #[test]
    fn empty_reader_yields_nothing() {
        assert!(drain(ReaderSource::new(Cursor::new(Vec::new()), 8)).is_empty());
    }

    #[test]
    fn memory_source_split_marks_final_window() {
        let windows = drain(MemorySource::split(b"12345", 2));
        assert_eq!(windows.len(), 3);
        assert!(!windows[0].is_last && windows[2].is_last);
    }
}
