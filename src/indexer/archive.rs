//! In-memory archive access for zip-tagged units.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::{IndexError, IndexResult};

/// Reader over an archive held entirely in memory.
pub struct ArchiveReader<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

/// A regular member of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub name: String,
    pub size: u64,
}

impl<'a> ArchiveReader<'a> {
    /// Parse the central directory of `bytes`.
    pub fn open(bytes: &'a [u8]) -> IndexResult<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive })
    }

    /// Regular (non-directory) members in archive order.
    pub fn members(&mut self) -> IndexResult<Vec<ArchiveMember>> {
        let mut members = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i)?;
            if file.is_file() {
                members.push(ArchiveMember {
                    name: file.name().to_string(),
                    size: file.size(),
                });
            }
        }
        Ok(members)
    }

    /// Decompressed contents of the member called `name`.
    ///
    /// At most `limit` bytes are inflated. A member whose data reaches
    /// `limit` is an error whatever size the directory declared for it.
    pub fn read_member(&mut self, name: &str, limit: u64) -> IndexResult<Vec<u8>> {
        let file = self.archive.by_name(name).map_err(|err| match err {
            zip::result::ZipError::FileNotFound => {
                IndexError::NotFound(format!("archive member {name}"))
            }
            other => other.into(),
        })?;

        let mut buf = Vec::with_capacity(file.size().min(limit) as usize);
        file.take(limit)
            .read_to_end(&mut buf)
            .map_err(|err| IndexError::Archive(format!("{name}: {err}")))?;
        if buf.len() as u64 >= limit {
            return Err(IndexError::Archive(format!(
                "{name} inflates to {limit} bytes or more"
            )));
        }
        Ok(buf)
    }
}
