//! The segmented log writer (§4.C): synchronous, single-process, rotating
//! on record count rather than byte size.

use crate::{
    err_at,
    wral::{config::Config, logindex::LogIndex, segment::Segment},
    Result,
};

/// Append-only writer over a rotating sequence of segment files.
pub struct Writer {
    config: Config,
    logindex: LogIndex,
    current: Option<Segment>,
    /// Set once the current segment has hit `max_log_events`; the rotation
    /// itself is deferred to the *next* append, so the record that filled
    /// the segment is never lost waiting for a successor file to exist.
    next_will_rotate: bool,
}

impl Writer {
    /// Open (or start afresh) the writer for `config`, recovering its
    /// logindex from disk.
    pub fn open(config: Config) -> Result<Writer> {
        let logindex = LogIndex::load(&config.dir, &config.name)?;
        Ok(Writer {
            config,
            logindex,
            current: None,
            next_will_rotate: false,
        })
    }

    /// Ensure `self.current` is an open segment usable for the next append,
    /// rotating to a new segment file when the existing one is full.
    fn set_current_log(&mut self) -> Result<()> {
        if self.logindex.is_empty() {
            let seg = Segment::create(&self.config.dir, &self.config.name, 1)?;
            self.logindex.push(
                &self.config.dir,
                &self.config.name,
                1,
                seg.path.file_name().unwrap().to_string_lossy().into_owned(),
            )?;
            self.current = Some(seg);
            return Ok(());
        }

        let number = self.logindex.last().unwrap();
        let seg = Segment::open_for_append(&self.config.dir, &self.config.name, number)?;
        if seg.count >= self.config.max_log_events {
            let next_number = number + 1;
            let next_seg = Segment::create(&self.config.dir, &self.config.name, next_number)?;
            self.logindex.push(
                &self.config.dir,
                &self.config.name,
                next_number,
                next_seg.path.file_name().unwrap().to_string_lossy().into_owned(),
            )?;
            tracing::debug!(name = %self.config.name, from = number, to = next_number, "log rotated");
            self.current = Some(next_seg);
        } else {
            self.current = Some(seg);
        }
        Ok(())
    }

    /// Append `data`, returning the `(segment_number, recno)` it landed at.
    pub fn append(&mut self, data: Vec<u8>) -> Result<(u32, u64)> {
        if self.next_will_rotate {
            self.current = None;
            self.next_will_rotate = false;
        }
        if self.current.is_none() {
            self.set_current_log()?;
        }

        let fsync = self.config.fsync;
        let seg = self.current.as_mut().unwrap();
        let recno = seg.append(data, fsync)?;
        let number = seg.number;

        if recno >= self.config.max_log_events {
            self.next_will_rotate = true;
        }
        Ok((number, recno))
    }

    /// Delete a segment that is no longer needed. Fails with *illegal-state*
    /// if the segment is the writer's current target or any reader's
    /// checkpoint still points into it; fails with *not-found* if the
    /// segment is unknown.
    pub fn delete(&mut self, segment_number: u32) -> Result<()> {
        if !self.logindex.contains(segment_number) {
            return err_at!(NotFound, msg: "no such segment {}", segment_number);
        }
        if let Some(seg) = &self.current {
            if seg.number == segment_number {
                return err_at!(IllegalState, msg: "segment {} is the current log", segment_number);
            }
        }
        if self.segment_in_use_by_reader(segment_number)? {
            return err_at!(
                IllegalState,
                msg: "segment {} still in use by a reader",
                segment_number
            );
        }

        let path = Segment::path_for(&self.config.dir, &self.config.name, segment_number);
        err_at!(IOError, std::fs::remove_file(&path))?;
        tracing::debug!(name = %self.config.name, segment_number, "segment deleted");
        self.logindex
            .remove(&self.config.dir, &self.config.name, segment_number)
    }

    fn segment_in_use_by_reader(&self, segment_number: u32) -> Result<bool> {
        let entries = match std::fs::read_dir(&self.config.dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(false),
        };
        let prefix = format!("{}.checkpoint.", self.config.name);
        for entry in entries {
            let entry = err_at!(IOError, entry)?;
            let fname = entry.file_name();
            let fname = fname.to_string_lossy();
            if !fname.starts_with(&prefix) {
                continue;
            }
            if let Some(checkpoint) =
                crate::wral::reader::Checkpoint::load_from(&entry.path())?
            {
                if checkpoint.segment <= segment_number {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
