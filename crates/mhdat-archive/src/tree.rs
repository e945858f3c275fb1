//! Offset-indexed entry tree.
//!
//! Entries are kept in decode order; a hash map from record offset to index
//! resolves parent links.

use std::hash::BuildHasherDefault;
use std::path::PathBuf;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::entry::Entry;
use crate::{Error, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// All entries of one archive, addressable by offset.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    entries: Vec<Entry>,
    by_offset: FxHashMap<u32, usize>,
}

impl TreeIndex {
    /// Index a complete entry list.
    ///
    /// Fails with [`Error::DuplicateOffset`] if two entries share an offset.
    pub fn new(entries: Vec<Entry>) -> Result<Self> {
        let mut by_offset = FxHashMap::with_capacity_and_hasher(entries.len(), Default::default());

        for (index, entry) in entries.iter().enumerate() {
            if by_offset.insert(entry.offset, index).is_some() {
                return Err(Error::DuplicateOffset(entry.offset));
            }
        }

        Ok(Self { entries, by_offset })
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in decode order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter()
    }

    /// Iterate over file entries in decode order.
    pub fn files(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter().filter(|e| e.is_file())
    }

    /// Look an entry up by its record offset.
    #[inline]
    pub fn get(&self, offset: u32) -> Option<&Entry> {
        self.by_offset.get(&offset).map(|&i| &self.entries[i])
    }

    /// Names from the top-level ancestor down to `entry`.
    ///
    /// Fails with [`Error::MissingParent`] if a parent offset is unknown and
    /// with [`Error::ParentCycle`] if the chain is longer than the entry count.
    pub fn resolve_path<'a>(&'a self, entry: &'a Entry) -> Result<Vec<&'a str>> {
        let mut names = vec![entry.name.as_str()];
        let mut current = entry;

        while let Some(parent) = current.parent() {
            if names.len() > self.entries.len() {
                return Err(Error::ParentCycle {
                    offset: entry.offset,
                });
            }

            current = self.get(parent).ok_or(Error::MissingParent {
                offset: current.offset,
                parent,
            })?;
            names.push(current.name.as_str());
        }

        names.reverse();
        Ok(names)
    }

    /// Resolved path joined with `/`, for display and matching.
    pub fn display_path(&self, entry: &Entry) -> Result<String> {
        Ok(self.resolve_path(entry)?.join("/"))
    }

    /// Resolved path as a relative filesystem path.
    ///
    /// Every component must be a plain name: empty names, `.`, `..` and names
    /// containing a path separator are rejected with [`Error::InvalidName`].
    pub fn relative_path(&self, entry: &Entry) -> Result<PathBuf> {
        let mut path = PathBuf::new();

        for name in self.resolve_path(entry)? {
            if !is_plain_name(name) {
                return Err(Error::InvalidName {
                    offset: entry.offset,
                    name: name.to_string(),
                });
            }
            path.push(name);
        }

        Ok(path)
    }

    /// Find a file by its `/`-joined path (case-insensitive).
    pub fn find(&self, path: &str) -> Option<&Entry> {
        let wanted = path.trim_start_matches('/').replace('\\', "/");
        self.files().find(|e| {
            self.display_path(e)
                .map(|p| p.eq_ignore_ascii_case(&wanted))
                .unwrap_or(false)
        })
    }

    /// Check that every entry's parent chain resolves.
    ///
    /// Returns the first reference error found.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.entries {
            self.resolve_path(entry)?;
        }
        Ok(())
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryKind, FileRecord, TreeLinks};

    fn entry(offset: u32, parent: u32, name: &str, is_file: bool) -> Entry {
        let kind = if is_file {
            EntryKind::File(FileRecord {
                file_type: 1,
                unk2: 0,
                unk3: 0,
                compressed_size: 0,
                decompressed_size: 0,
                payload_offset: 0,
            })
        } else {
            EntryKind::Directory
        };

        Entry {
            offset,
            flags: 0,
            offset_prev: 0,
            offset_next: 0,
            links: TreeLinks {
                parent,
                ..Default::default()
            },
            name: name.to_string(),
            kind,
        }
    }

    fn sample() -> TreeIndex {
        TreeIndex::new(vec![
            entry(76, 0, "root", false),
            entry(188, 76, "gfx", false),
            entry(300, 188, "logo.bmp", true),
            entry(420, 76, "a.bin", true),
            entry(540, 0, "top.txt", true),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_nested() {
        let tree = sample();
        let logo = tree.get(300).unwrap();

        assert_eq!(tree.resolve_path(logo).unwrap(), ["root", "gfx", "logo.bmp"]);
        assert_eq!(
            tree.relative_path(logo).unwrap(),
            PathBuf::from("root").join("gfx").join("logo.bmp")
        );
    }

    #[test]
    fn test_root_level_single_segment() {
        let tree = sample();

        assert_eq!(tree.resolve_path(tree.get(76).unwrap()).unwrap(), ["root"]);
        assert_eq!(tree.resolve_path(tree.get(540).unwrap()).unwrap(), ["top.txt"]);
    }

    #[test]
    fn test_files_in_order() {
        let tree = sample();
        let names: Vec<&str> = tree.files().map(|e| e.name.as_str()).collect();

        assert_eq!(names, ["logo.bmp", "a.bin", "top.txt"]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_missing_parent() {
        let tree = TreeIndex::new(vec![
            entry(76, 0, "root", false),
            entry(188, 999, "orphan.bin", true),
        ])
        .unwrap();

        let err = tree.resolve_path(tree.get(188).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingParent {
                offset: 188,
                parent: 999
            }
        ));
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_cycle_terminates() {
        let tree = TreeIndex::new(vec![
            entry(76, 188, "a", false),
            entry(188, 76, "b", false),
            entry(300, 188, "c.bin", true),
        ])
        .unwrap();

        let err = tree.resolve_path(tree.get(300).unwrap()).unwrap_err();
        assert!(matches!(err, Error::ParentCycle { offset: 300 }));
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let tree = TreeIndex::new(vec![entry(76, 76, "loop", false)]).unwrap();
        assert!(matches!(
            tree.validate().unwrap_err(),
            Error::ParentCycle { offset: 76 }
        ));
    }

    #[test]
    fn test_parent_chains_terminate() {
        let tree = sample();
        for e in tree.iter() {
            let mut steps = 0;
            let mut current = e;
            while let Some(parent) = current.parent() {
                current = tree.get(parent).unwrap();
                steps += 1;
                assert!(steps <= tree.len());
            }
        }
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_duplicate_offset() {
        let err = TreeIndex::new(vec![entry(76, 0, "a", false), entry(76, 0, "b", false)])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateOffset(76)));
    }

    #[test]
    fn test_unsafe_names_rejected() {
        for name in ["..", ".", "", "a/b", "a\\b"] {
            let tree = TreeIndex::new(vec![entry(76, 0, name, true)]).unwrap();
            let err = tree.relative_path(tree.get(76).unwrap()).unwrap_err();
            assert!(matches!(err, Error::InvalidName { offset: 76, .. }), "{name:?}");
        }
    }

    #[test]
    fn test_find() {
        let tree = sample();

        assert_eq!(tree.find("root/GFX/logo.bmp").unwrap().offset, 300);
        assert_eq!(tree.find("/top.txt").unwrap().offset, 540);
        assert!(tree.find("root/gfx").is_none());
        assert!(tree.find("missing").is_none());
    }
}
