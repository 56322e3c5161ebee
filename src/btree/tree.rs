//! # B+Tree Index
//!
//! The core index structure: a disk-resident B+ tree mapping 32-bit
//! integer keys to record identifiers in a heap relation. One index covers
//! one `(relation, attribute byte offset)` pair and lives in its own file
//! named `"<relation>.<offset>"`.
//!
//! ## File Layout
//!
//! ```text
//! Page 0:   IndexFileHeader (relation, offset, key type, root page)
//! Page 1:   initial root (starts life as an empty leaf)
//! Page 2+:  nodes allocated as the tree grows
//! ```
//!
//! ## Insert Algorithm
//!
//! ```text
//! 1. Read the file header for the current root (re-read every call,
//!    since the root moves when the tree grows a level)
//! 2. Descend: at each interior node pick the child for the key, pushing
//!    the page number onto a path stack; stop at level 1
//! 3. Insert into the leaf; if full, split it:
//!    - upper half moves to a fresh right sibling, chain relinked
//!    - the right node's first key is promoted with the new page number
//! 4. Walk the path stack upward inserting the promoted separator;
//!    a full interior node splits around its median (the median moves up,
//!    kept by neither half)
//! 5. If the stack empties with a promotion pending, the root has split:
//!    allocate a new root one level up and rewrite the file header
//! ```
//!
//! Splitting an interior node materializes its separators and children,
//! splices the incoming pair in sorted position, and deals the halves, so
//! insertion order cannot perturb key order.
//!
//! ## Page Access Discipline
//!
//! Every page access goes through the buffer pool and is scoped: a guard
//! is taken, the node view is used, and the guard drops before the next
//! page is touched (the parent stack holds page numbers, not pins). Public
//! operations therefore return with zero pages pinned, which `flush_file`
//! requires and tests assert.
//!
//! ## Bulk Load
//!
//! Creating an index over an existing relation scans the heap file and
//! feeds each record's key through the normal insert path, then flushes.
//! Reopening an existing index validates the stored metadata against the
//! caller's arguments instead.
//!
//! ## Concurrency
//!
//! The index is single-threaded and non-reentrant; callers order all
//! operations. Inserting while a scan is open is permitted but the scan's
//! position is unspecified afterward (a split may reorganize the leaf it
//! points at).

use std::path::Path;
use std::sync::Arc;

use eyre::{ensure, Result, WrapErr};
use smallvec::SmallVec;
use zerocopy::IntoBytes;

use crate::buffer::BufferPool;
use crate::config::{FILE_HEADER_SIZE, KEY_SIZE, MAX_RELATION_NAME_LEN, PAGE_SIZE};
use crate::error::IndexError;
use crate::heap::HeapFile;
use crate::storage::{IndexFileHeader, PageHeader, PagedFile};
use crate::types::{Datatype, RecordId};

use super::interior::{InteriorNode, InteriorNodeMut};
use super::leaf::LeafNodeMut;
use super::scan::ScanState;

/// Root-to-leaf page stack. Eight levels is far beyond any tree this
/// page size produces, so the stack stays inline.
pub(crate) type DescentPath = SmallVec<[u32; 8]>;

#[derive(Debug)]
pub struct BTreeIndex {
    pub(crate) pool: Arc<BufferPool>,
    pub(crate) file: Arc<PagedFile>,
    pub(crate) scan: Option<ScanState>,
    index_name: String,
    attr_byte_offset: usize,
}

impl BTreeIndex {
    /// Opens the index for `(relation_name, attr_byte_offset)`, creating
    /// and bulk-loading it from the relation's heap file if it does not
    /// exist yet. Returns the index and its file name.
    ///
    /// Only `Datatype::Integer` attributes are supported.
    pub fn open(
        dir: &Path,
        relation_name: &str,
        attr_byte_offset: usize,
        attr_type: Datatype,
        pool: Arc<BufferPool>,
    ) -> Result<(Self, String)> {
        ensure!(
            attr_type == Datatype::Integer,
            "only Integer attributes are indexable, got {:?}",
            attr_type
        );
        ensure!(
            relation_name.len() <= MAX_RELATION_NAME_LEN,
            "relation name '{}' exceeds {} bytes",
            relation_name,
            MAX_RELATION_NAME_LEN
        );

        let index_name = format!("{}.{}", relation_name, attr_byte_offset);
        let index_path = dir.join(&index_name);

        let index = if index_path.exists() {
            Self::open_existing(
                &index_path,
                index_name.clone(),
                relation_name,
                attr_byte_offset,
                attr_type,
                pool,
            )?
        } else {
            Self::create(
                dir,
                &index_path,
                index_name.clone(),
                relation_name,
                attr_byte_offset,
                attr_type,
                pool,
            )?
        };

        Ok((index, index_name))
    }

    fn open_existing(
        index_path: &Path,
        index_name: String,
        relation_name: &str,
        attr_byte_offset: usize,
        attr_type: Datatype,
        pool: Arc<BufferPool>,
    ) -> Result<Self> {
        let file = Arc::new(PagedFile::open(index_path)?);

        {
            let guard = pool.fetch(&file, 0)?;
            let header = IndexFileHeader::from_bytes(guard.data())?;

            let matches = header.relation_name()? == relation_name
                && header.attr_byte_offset() as usize == attr_byte_offset
                && header.attr_type() == Some(attr_type)
                && header.page_size() as usize == PAGE_SIZE;
            if !matches {
                return Err(IndexError::IndexInfoMismatch.into());
            }
        }

        Ok(Self {
            pool,
            file,
            scan: None,
            index_name,
            attr_byte_offset,
        })
    }

    fn create(
        dir: &Path,
        index_path: &Path,
        index_name: String,
        relation_name: &str,
        attr_byte_offset: usize,
        attr_type: Datatype,
        pool: Arc<BufferPool>,
    ) -> Result<Self> {
        let result = Self::create_and_load(
            dir,
            index_path,
            index_name,
            relation_name,
            attr_byte_offset,
            attr_type,
            pool,
        );

        // A failed build removes the file: the partial tree has a valid
        // header, and a later open would accept it with records missing.
        if result.is_err() {
            let _ = std::fs::remove_file(index_path);
        }

        result
    }

    fn create_and_load(
        dir: &Path,
        index_path: &Path,
        index_name: String,
        relation_name: &str,
        attr_byte_offset: usize,
        attr_type: Datatype,
        pool: Arc<BufferPool>,
    ) -> Result<Self> {
        let file = Arc::new(PagedFile::create(index_path)?);

        {
            let (meta_no, mut meta) = pool.allocate(&file)?;
            ensure!(meta_no == 0, "file header must land on page 0");
            let header =
                IndexFileHeader::new(relation_name, attr_byte_offset as u32, attr_type, 1, true)?;
            meta.data_mut()[..FILE_HEADER_SIZE].copy_from_slice(header.as_bytes());
        }

        {
            let (root_no, mut root) = pool.allocate(&file)?;
            ensure!(root_no == 1, "initial root must land on page 1");
            LeafNodeMut::init(root.data_mut())?;
        }

        let mut index = Self {
            pool,
            file,
            scan: None,
            index_name,
            attr_byte_offset,
        };

        index
            .bulk_load(&dir.join(relation_name))
            .wrap_err_with(|| format!("bulk load from relation '{}' failed", relation_name))?;
        index.pool.flush_file(&index.file)?;

        Ok(index)
    }

    fn bulk_load(&mut self, relation_path: &Path) -> Result<()> {
        let heap = HeapFile::open(relation_path)?;

        for item in heap.scan() {
            let (record, rid) = item?;
            let key = key_at_offset(&record, self.attr_byte_offset)?;
            self.insert(key, rid)?;
        }

        Ok(())
    }

    /// Name of the index file, `"<relation>.<offset>"`.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn attr_byte_offset(&self) -> usize {
        self.attr_byte_offset
    }

    /// Whether the root page is still a leaf (tree of height 1).
    pub fn root_is_leaf(&self) -> Result<bool> {
        Ok(self.read_meta()?.1)
    }

    /// Number of node levels from root to leaf inclusive.
    pub fn height(&self) -> Result<u32> {
        let (root, root_is_leaf) = self.read_meta()?;
        if root_is_leaf {
            return Ok(1);
        }
        let guard = self.pool.fetch(&self.file, root)?;
        let level = PageHeader::from_bytes(guard.data())?.level();
        Ok(level as u32 + 1)
    }

    /// Inserts `(key, rid)`. Duplicate keys are permitted and keep their
    /// arrival order.
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        let (leaf_no, mut path) = self.descend_to_leaf(key)?;

        if let Some((sep, new_page)) = self.insert_into_leaf(leaf_no, key, rid)? {
            self.propagate_split(&mut path, sep, new_page)?;
        }

        Ok(())
    }

    /// Current root and whether it is a leaf, read fresh from the file
    /// header (the root moves when the tree grows).
    pub(crate) fn read_meta(&self) -> Result<(u32, bool)> {
        let guard = self.pool.fetch(&self.file, 0)?;
        let header = IndexFileHeader::from_bytes(guard.data())?;
        Ok((header.root_page(), header.root_is_leaf()))
    }

    fn write_meta_root(&self, root_page: u32, root_is_leaf: bool) -> Result<()> {
        let mut guard = self.pool.fetch(&self.file, 0)?;
        let header = IndexFileHeader::from_bytes_mut(guard.data_mut())?;
        header.set_root_page(root_page);
        header.set_root_is_leaf(root_is_leaf);
        Ok(())
    }

    /// Descends to the leaf that would hold `key`, returning its page
    /// number and the stack of interior pages visited. Each page is
    /// unpinned before its child is fetched.
    pub(crate) fn descend_to_leaf(&self, key: i32) -> Result<(u32, DescentPath)> {
        let (root, root_is_leaf) = self.read_meta()?;
        let mut path = DescentPath::new();

        if root_is_leaf {
            return Ok((root, path));
        }

        let mut current = root;
        loop {
            let (child, at_leaf_level) = {
                let guard = self.pool.fetch(&self.file, current)?;
                let node = InteriorNode::from_page(guard.data())?;
                (node.find_child(key)?, node.level() == 1)
            };

            path.push(current);
            current = child;

            if at_leaf_level {
                return Ok((current, path));
            }
        }
    }

    /// Returns the promoted `(separator, new page)` pair if the leaf split.
    fn insert_into_leaf(
        &mut self,
        page_no: u32,
        key: i32,
        rid: RecordId,
    ) -> Result<Option<(i32, u32)>> {
        {
            let mut guard = self.pool.fetch(&self.file, page_no)?;
            let mut leaf = LeafNodeMut::from_page(guard.data_mut())?;
            if !leaf.is_full() {
                leaf.insert(key, rid)?;
                return Ok(None);
            }
        }

        let split = self.split_leaf(page_no, key, rid)?;
        Ok(Some(split))
    }

    fn split_leaf(&mut self, page_no: u32, key: i32, rid: RecordId) -> Result<(i32, u32)> {
        let (new_page_no, mut new_guard) = self.pool.allocate(&self.file)?;
        let mut old_guard = self.pool.fetch(&self.file, page_no)?;

        let mut right = LeafNodeMut::init(new_guard.data_mut())?;
        let mut left = LeafNodeMut::from_page(old_guard.data_mut())?;

        left.split_into(&mut right)?;
        right.set_next_leaf(left.next_leaf())?;
        left.set_next_leaf(new_page_no)?;

        let sep = right.key_at(0)?;
        if key < sep {
            left.insert(key, rid)?;
        } else {
            right.insert(key, rid)?;
        }

        Ok((sep, new_page_no))
    }

    /// Carries a promoted separator up the descent stack, splitting full
    /// interior nodes along the way; grows the tree when the root splits.
    fn propagate_split(&mut self, path: &mut DescentPath, sep: i32, new_page: u32) -> Result<()> {
        let mut sep = sep;
        let mut new_page = new_page;

        while let Some(parent_no) = path.pop() {
            let inserted = {
                let mut guard = self.pool.fetch(&self.file, parent_no)?;
                let mut node = InteriorNodeMut::from_page(guard.data_mut())?;
                if node.is_full() {
                    false
                } else {
                    node.insert_separator(sep, new_page)?;
                    true
                }
            };

            if inserted {
                return Ok(());
            }

            let (promoted, new_interior) = self.split_interior(parent_no, sep, new_page)?;
            sep = promoted;
            new_page = new_interior;
        }

        self.grow_root(sep, new_page)
    }

    /// Splits a full interior node around its median. All separators and
    /// children are materialized with the incoming pair in sorted
    /// position, the median is promoted, and the halves are dealt back.
    fn split_interior(&mut self, page_no: u32, sep: i32, new_child: u32) -> Result<(i32, u32)> {
        let (mut keys, mut children, level) = {
            let guard = self.pool.fetch(&self.file, page_no)?;
            let node = InteriorNode::from_page(guard.data())?;
            let count = node.entry_count() as usize;

            let mut keys = Vec::with_capacity(count + 1);
            let mut children = Vec::with_capacity(count + 2);
            for i in 0..count {
                let entry = node.entry_at(i)?;
                keys.push(entry.key());
                children.push(entry.child());
            }
            children.push(node.right_link());

            (keys, children, node.level())
        };

        let pos = keys.partition_point(|&k| k <= sep);
        keys.insert(pos, sep);
        children.insert(pos + 1, new_child);

        let mid = keys.len() / 2;
        let promoted = keys[mid];

        let (new_page_no, mut new_guard) = self.pool.allocate(&self.file)?;
        let mut old_guard = self.pool.fetch(&self.file, page_no)?;

        let mut right =
            InteriorNodeMut::init(new_guard.data_mut(), level, children[children.len() - 1])?;
        for (i, &k) in keys[mid + 1..].iter().enumerate() {
            right.push_entry(k, children[mid + 1 + i])?;
        }

        let mut left = InteriorNodeMut::init(old_guard.data_mut(), level, children[mid])?;
        for (i, &k) in keys[..mid].iter().enumerate() {
            left.push_entry(k, children[i])?;
        }

        Ok((promoted, new_page_no))
    }

    /// The root split: allocate a new root one level up and point the
    /// file header at it.
    fn grow_root(&mut self, sep: i32, new_page: u32) -> Result<()> {
        let (old_root, root_is_leaf) = self.read_meta()?;

        let old_level = if root_is_leaf {
            0
        } else {
            let guard = self.pool.fetch(&self.file, old_root)?;
            PageHeader::from_bytes(guard.data())?.level()
        };

        let (new_root_no, mut guard) = self.pool.allocate(&self.file)?;
        {
            let mut root = InteriorNodeMut::init(guard.data_mut(), old_level + 1, new_page)?;
            root.push_entry(sep, old_root)?;
        }
        drop(guard);

        self.write_meta_root(new_root_no, false)
    }
}

impl Drop for BTreeIndex {
    fn drop(&mut self) {
        // End any open scan, then flush best-effort; Drop cannot surface
        // errors and the file stays consistent either way.
        self.scan = None;
        let _ = self.pool.flush_file(&self.file);
    }
}

/// Reads the indexed key out of a heap record.
fn key_at_offset(record: &[u8], offset: usize) -> Result<i32> {
    ensure!(
        offset + KEY_SIZE <= record.len(),
        "record of {} bytes has no {}-byte key at offset {}",
        record.len(),
        KEY_SIZE,
        offset
    );
    let bytes: [u8; KEY_SIZE] = record[offset..offset + KEY_SIZE].try_into().unwrap(); // INVARIANT: length checked above
    Ok(i32::from_le_bytes(bytes))
}
