//! A single segment file: an append-only sequence of [Entry] records (§4.C).

use cbordata::{Cbor, FromCbor};

use std::{ffi, fs, path};

use crate::{
    err_at,
    util::{self, files as ufiles},
    wral::{entry::Entry, files},
    Result,
};

/// The writer's current append target: one open segment file.
pub struct Segment {
    pub number: u32,
    pub path: path::PathBuf,
    /// Highest `recno` written so far; 0 means the segment is empty.
    pub count: u64,
    file: fs::File,
}

impl Segment {
    /// Create a brand new, empty segment file. Fails if one already exists
    /// at that path.
    pub fn create(dir: &ffi::OsStr, name: &str, number: u32) -> Result<Segment> {
        let path = Segment::path_for(dir, name, number);
        let file = ufiles::create_file_a(path.as_os_str())?;
        Ok(Segment {
            number,
            path,
            count: 0,
            file,
        })
    }

    /// Open an existing segment for further appends, scanning it first to
    /// recover the record count already on disk.
    pub fn open_for_append(dir: &ffi::OsStr, name: &str, number: u32) -> Result<Segment> {
        let path = Segment::path_for(dir, name, number);
        let count = match Segment::iter_from(&path, 1)?.last() {
            Some(entry) => entry?.recno,
            None => 0,
        };
        let file = ufiles::open_file_a(path.as_os_str())?;
        Ok(Segment {
            number,
            path,
            count,
            file,
        })
    }

    pub fn path_for(dir: &ffi::OsStr, name: &str, number: u32) -> path::PathBuf {
        let fname = files::make_filename(name, number);
        util::join_dir(path::Path::new(dir), &fname)
    }

    /// Append `data`, returning the recno assigned to it.
    pub fn append(&mut self, data: Vec<u8>, fsync: bool) -> Result<u64> {
        let recno = self.count + 1;
        let bytes = util::into_cbor_bytes(Entry::new(recno, data))?;

        if fsync {
            ufiles::sync_write(&mut self.file, &bytes)?;
        } else {
            use std::io::Write;
            let n = err_at!(IOError, self.file.write(&bytes))?;
            if n != bytes.len() {
                err_at!(IOError, msg: "partial write to segment {:?}", self.path)?;
            }
        }
        self.count = recno;
        Ok(recno)
    }

    /// Iterate every record in the segment file at `path` whose recno is
    /// `>= from`, in ascending order.
    pub fn iter_from(path: &path::Path, from: u64) -> Result<impl Iterator<Item = Result<Entry>>> {
        let data = err_at!(IOError, fs::read(path))?;
        Ok(SegmentIter { data, pos: 0, from })
    }
}

struct SegmentIter {
    data: Vec<u8>,
    pos: usize,
    from: u64,
}

impl Iterator for SegmentIter {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Result<Entry>> {
        loop {
            if self.pos >= self.data.len() {
                return None;
            }
            let mut slice = &self.data[self.pos..];
            let (cbor, n) = match Cbor::decode(&mut slice) {
                Ok(v) => v,
                Err(err) => return Some(err_at!(FailCbor, Err(err))),
            };
            self.pos += n;
            let entry: Entry = match Entry::from_cbor(cbor) {
                Ok(v) => v,
                Err(err) => return Some(err_at!(FailCbor, Err(err))),
            };
            if entry.recno >= self.from {
                return Some(Ok(entry));
            }
        }
    }
}

#[cfg(test)]
#[path = "segment_test.rs"]
mod segment_test;
