//! Plain-text report output.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{IndexError, IndexResult};

/// Write one `word : count` line per entry, in the order given.
///
/// Missing parent directories are created.
pub fn write_report<'a, I>(path: &Path, entries: I) -> IndexResult<()>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| IndexError::io(parent, err))?;
    }

    let file = File::create(path).map_err(|err| IndexError::io(path, err))?;
    let mut out = BufWriter::new(file);
    for (word, count) in entries {
        writeln!(out, "{word}              :         {count}")
            .map_err(|err| IndexError::io(path, err))?;
    }
    out.flush().map_err(|err| IndexError::io(path, err))
}
