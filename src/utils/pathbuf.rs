//! Extensions to [`PathBuf`] for locating companion files.
//!
//! Index files conventionally sit next to the file they index, named
//! `<filename>.<index extension>`: `sample.bam` is indexed by
//! `sample.bam.bai`.
//!
//! ```
//! use std::path::PathBuf;
//! // Trait must be in scope to use it.
//! use sashimi::utils::pathbuf::AppendExtension;
//!
//! assert_eq!(
//!     PathBuf::from("sample.bam").append_extension("bai"),
//!     PathBuf::from("sample.bam.bai"),
//! );
//! ```

use std::ffi::OsStr;
use std::path::PathBuf;

/// Adds an [`append_extension`][AppendExtension::append_extension] method to
/// [`PathBuf`].
pub trait AppendExtension {
    /// Appends `ext` after any existing extension. A path without an extension
    /// simply gains `ext` as its extension.
    fn append_extension<P>(self, ext: P) -> Self
    where
        P: AsRef<OsStr>;
}

impl AppendExtension for PathBuf {
    fn append_extension<P>(mut self, ext: P) -> Self
    where
        P: AsRef<OsStr>,
    {
        let new_ext = match self.extension() {
            Some(existing) => {
                let mut joined = existing.to_os_string();
                joined.push(".");
                joined.push(ext);
                joined
            }
            None => ext.as_ref().to_os_string(),
        };

        self.set_extension(new_ext);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_to_existing_extension() {
        let bai = PathBuf::from("/data/run/S1.sorted.bam").append_extension("bai");
        assert_eq!(bai, PathBuf::from("/data/run/S1.sorted.bam.bai"));
    }

    #[test]
    fn test_append_without_extension() {
        let bai = PathBuf::from("S1").append_extension("bai");
        assert_eq!(bai, PathBuf::from("S1.bai"));
    }
}
