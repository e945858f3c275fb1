//! Builders for in-memory test archives.
//!
//! Everything here panics on failure; it is only compiled for tests.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::cipher::encode;
use crate::entry::{type_code, DIR_BLOCK_LEN, FILE_BLOCK_LEN, FILE_RECORD_OFFSET, LINKS_LEN};
use crate::header::{RawArchiveHeader, NAME_LEN};

const PLAIN_LEN: usize = 16;

struct Node {
    name: String,
    parent: Option<usize>,
    parent_override: Option<u32>,
    file: Option<FileNode>,
}

struct FileNode {
    payload: Vec<u8>,
    decompressed_size: u32,
}

/// Compress `data` the way archive payloads are stored.
pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Lays out a complete archive: header, entry records, terminator, payloads.
pub(crate) struct ArchiveBuilder {
    name: String,
    version: u32,
    terminator: Option<u32>,
    nodes: Vec<Node>,
}

impl ArchiveBuilder {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: 1,
            terminator: Some(type_code::END),
            nodes: Vec::new(),
        }
    }

    /// Use a different terminator code, or none to end at the stream end.
    pub(crate) fn terminator(mut self, code: Option<u32>) -> Self {
        self.terminator = code;
        self
    }

    pub(crate) fn dir(&mut self, name: &str, parent: Option<usize>) -> usize {
        self.push(name, parent, None)
    }

    /// Add a file with zlib-compressed `content`.
    pub(crate) fn file(&mut self, name: &str, parent: Option<usize>, content: &[u8]) -> usize {
        let file = FileNode {
            payload: zlib(content),
            decompressed_size: content.len() as u32,
        };
        self.push(name, parent, Some(file))
    }

    /// Add a file whose payload bytes are stored exactly as given.
    pub(crate) fn raw_file(
        &mut self,
        name: &str,
        parent: Option<usize>,
        payload: Vec<u8>,
        decompressed_size: u32,
    ) -> usize {
        let file = FileNode {
            payload,
            decompressed_size,
        };
        self.push(name, parent, Some(file))
    }

    /// Store `parent` verbatim as the parent offset of node `index`.
    pub(crate) fn set_parent_offset(&mut self, index: usize, parent: u32) {
        self.nodes[index].parent_override = Some(parent);
    }

    /// Byte offset node `index` will be written at.
    pub(crate) fn offset_of(&self, index: usize) -> u32 {
        let mut offset = RawArchiveHeader::SIZE;
        for node in &self.nodes[..index] {
            offset += record_len(node);
        }
        offset as u32
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let offsets: Vec<u32> = (0..self.nodes.len()).map(|i| self.offset_of(i)).collect();
        let entries_end = self.offset_of(self.nodes.len()) as usize;
        let mut payload_offset = entries_end + if self.terminator.is_some() { 4 } else { 0 };

        let mut out = vec![0u8; NAME_LEN];
        out[..self.name.len()].copy_from_slice(self.name.as_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(RawArchiveHeader::SIZE as u32).to_le_bytes());

        let mut payloads = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let parent = node
                .parent_override
                .unwrap_or_else(|| node.parent.map_or(0, |p| offsets[p]));
            let siblings: Vec<usize> = (0..self.nodes.len())
                .filter(|&j| self.nodes[j].parent == node.parent)
                .collect();
            let position = siblings.iter().position(|&j| j == i).unwrap();
            let prev_sibling = position
                .checked_sub(1)
                .map_or(0, |p| offsets[siblings[p]]);
            let next_sibling = siblings.get(position + 1).map_or(0, |&j| offsets[j]);
            let first_child = (0..self.nodes.len())
                .find(|&j| self.nodes[j].parent == Some(i))
                .map_or(0, |j| offsets[j]);

            let code = if node.file.is_some() {
                type_code::FILE
            } else {
                type_code::DIRECTORY
            };
            let prev = i.checked_sub(1).map_or(0, |p| offsets[p]);
            let next = offsets.get(i + 1).copied().unwrap_or(0);
            for value in [code, 0, prev, next] {
                out.extend_from_slice(&value.to_le_bytes());
            }

            let mut links = Vec::with_capacity(LINKS_LEN);
            for value in [prev_sibling, next_sibling, parent, first_child] {
                links.extend_from_slice(&value.to_le_bytes());
            }
            out.extend_from_slice(&encode(&links));

            let mut block = match &node.file {
                Some(_) => vec![0u8; FILE_BLOCK_LEN],
                None => vec![0u8; DIR_BLOCK_LEN],
            };
            block[..node.name.len()].copy_from_slice(node.name.as_bytes());
            if let Some(file) = &node.file {
                let fields = [
                    1,
                    0xA0 + i as u32,
                    0xB0 + i as u32,
                    file.payload.len() as u32,
                    file.decompressed_size,
                    payload_offset as u32,
                ];
                for (k, value) in fields.iter().enumerate() {
                    let at = FILE_RECORD_OFFSET + 4 * k;
                    block[at..at + 4].copy_from_slice(&value.to_le_bytes());
                }
                payload_offset += file.payload.len();
                payloads.extend_from_slice(&file.payload);
            }
            out.extend_from_slice(&encode(&block));
        }

        if let Some(code) = self.terminator {
            out.extend_from_slice(&code.to_le_bytes());
        }
        out.extend_from_slice(&payloads);
        out
    }

    fn push(&mut self, name: &str, parent: Option<usize>, file: Option<FileNode>) -> usize {
        let limit = if file.is_some() {
            FILE_RECORD_OFFSET
        } else {
            DIR_BLOCK_LEN
        };
        assert!(name.len() < limit, "test name too long");
        self.nodes.push(Node {
            name: name.to_string(),
            parent,
            parent_override: None,
            file,
        });
        self.nodes.len() - 1
    }
}

fn record_len(node: &Node) -> usize {
    let block = if node.file.is_some() {
        FILE_BLOCK_LEN
    } else {
        DIR_BLOCK_LEN
    };
    PLAIN_LEN + LINKS_LEN + block
}
