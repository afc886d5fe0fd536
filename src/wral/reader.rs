//! A sequential cursor over a segmented log, with a durable checkpoint
//! (§4.C; the standalone writer/reader pairing used when the transactional
//! entry/index layer is not wanted).

use cbordata::Cborize;

use std::{ffi, path};

use crate::{
    err_at,
    util,
    wral::{entry::Entry, logindex::LogIndex, segment::Segment},
    Result,
};

const CHECKPOINT_VER: u32 = 0x00030003;

#[derive(Clone, Copy, Debug, PartialEq, Cborize)]
pub(crate) struct Checkpoint {
    pub(crate) segment: u32,
    pub(crate) recno: u64,
}

impl Checkpoint {
    const ID: u32 = CHECKPOINT_VER;

    fn path(dir: &ffi::OsStr, name: &str, reader_name: &str) -> path::PathBuf {
        let fname = format!("{}.checkpoint.{}", name, reader_name);
        util::join_dir(path::Path::new(dir), ffi::OsStr::new(&fname))
    }

    fn load(dir: &ffi::OsStr, name: &str, reader_name: &str) -> Result<Option<Checkpoint>> {
        Checkpoint::load_from(&Checkpoint::path(dir, name, reader_name))
    }

    pub(crate) fn load_from(path: &path::Path) -> Result<Option<Checkpoint>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = err_at!(IOError, std::fs::read(path))?;
        let (checkpoint, _) = util::from_cbor_bytes(&data)?;
        Ok(Some(checkpoint))
    }

    fn save(&self, dir: &ffi::OsStr, name: &str, reader_name: &str) -> Result<()> {
        let path = Checkpoint::path(dir, name, reader_name);
        let bytes = util::into_cbor_bytes(*self)?;
        err_at!(IOError, std::fs::write(&path, &bytes))?;
        Ok(())
    }
}

/// A named, checkpointed reader of a segmented log. Reading advances and
/// persists the checkpoint one record at a time.
pub struct Reader {
    dir: ffi::OsString,
    name: String,
    reader_name: String,
    checkpoint: Checkpoint,
}

impl Reader {
    /// Open a reader, resuming from its durable checkpoint if one exists,
    /// else starting from the lowest segment currently on disk.
    pub fn open(dir: &ffi::OsStr, name: &str, reader_name: &str) -> Result<Reader> {
        let checkpoint = match Checkpoint::load(dir, name, reader_name)? {
            Some(checkpoint) => checkpoint,
            None => {
                let logindex = LogIndex::load(dir, name)?;
                let segment = logindex.numbers().into_iter().next().unwrap_or(1);
                Checkpoint { segment, recno: 1 }
            }
        };
        Ok(Reader {
            dir: dir.to_os_string(),
            name: name.to_string(),
            reader_name: reader_name.to_string(),
            checkpoint,
        })
    }

    /// The next unread record, or `None` if the reader has caught up with
    /// the writer.
    pub fn next_record(&mut self) -> Result<Option<Entry>> {
        loop {
            let logindex = LogIndex::load(&self.dir, &self.name)?;

            if !logindex.contains(self.checkpoint.segment) {
                match logindex
                    .numbers()
                    .into_iter()
                    .find(|&n| n >= self.checkpoint.segment)
                {
                    Some(n) => {
                        self.checkpoint = Checkpoint { segment: n, recno: 1 };
                        continue;
                    }
                    None => return Ok(None),
                }
            }

            let path = Segment::path_for(&self.dir, &self.name, self.checkpoint.segment);
            let mut iter = Segment::iter_from(&path, self.checkpoint.recno)?;
            match iter.next() {
                Some(entry) => {
                    let entry = entry?;
                    self.checkpoint.recno = entry.recno + 1;
                    self.checkpoint.save(&self.dir, &self.name, &self.reader_name)?;
                    return Ok(Some(entry));
                }
                None => {
                    match logindex
                        .numbers()
                        .into_iter()
                        .find(|&n| n > self.checkpoint.segment)
                    {
                        Some(n) => {
                            self.checkpoint = Checkpoint { segment: n, recno: 1 };
                            self.checkpoint.save(&self.dir, &self.name, &self.reader_name)?;
                        }
                        None => {
                            self.checkpoint.save(&self.dir, &self.name, &self.reader_name)?;
                            return Ok(None);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod reader_test;
