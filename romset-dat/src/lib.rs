//! DAT catalog files, header detection rules and header-aware ROM hashing,
//! including files stored in zip archives.

pub mod archive;
pub mod dat;
pub mod error;
pub mod hasher;
pub mod header;
pub mod matcher;

pub use archive::{ArchiveMember, hash_zip_members, is_zip_path};
pub use dat::{DatFile, DatGame, DatRelease, DatRom, RomStatus, parse_dat, parse_dat_file};
pub use error::{DatError, HeaderRuleError};
pub use hasher::{FileHashes, HashOptions, hash_file, hash_reader, hash_stream};
pub use header::{HeaderOperation, HeaderRule, HeaderRules, HeaderTest};
pub use matcher::{ChecksumIndex, ChecksumMatch, MatchMethod};
