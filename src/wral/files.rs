//! Segment file naming: `<prefix>.<n>`, one file per segment (§4.C).

use std::ffi;

/// Build the file name for segment `num` of the log named `name`.
pub fn make_filename(name: &str, num: u32) -> ffi::OsString {
    format!("{}.{}", name, num).into()
}

/// Parse a segment file name back into `(name, num)`, or `None` if it
/// doesn't match the `<prefix>.<n>` shape this module writes.
pub fn unwrap_filename(file_name: &ffi::OsStr) -> Option<(String, u32)> {
    let file_name = file_name.to_str()?;
    let (name, num) = file_name.rsplit_once('.')?;
    let num: u32 = num.parse().ok()?;
    Some((name.to_string(), num))
}
