pub mod archive;
pub mod source;
pub mod text;
pub mod walker;

pub use archive::{ArchiveMember, ArchiveReader};
pub use source::{read_file, RawUnit, SourceKind};
pub use walker::{WalkEntry, Walker};
