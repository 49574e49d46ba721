use super::{Page, PageId, PAGE_SIZE};
use crate::error::Result;
use crate::Error;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file of `PAGE_SIZE` pages addressed by `PageId`.
///
/// Reads go through `&File` so that query evaluators can fetch pages while
/// holding only a shared borrow of the relation.
pub struct PageFile {
    file: File,
    path: PathBuf,
    /// Label used in allocation errors ("data", "tsig", ...).
    kind: &'static str,
    npages: PageId,
}

impl PageFile {
    /// Creates a new, empty page file, failing if it already exists.
    pub fn create(path: impl AsRef<Path>, kind: &'static str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        Ok(Self {
            file,
            path,
            kind,
            npages: 0,
        })
    }

    /// Opens an existing page file.
    pub fn open(path: impl AsRef<Path>, kind: &'static str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();
        if len % PAGE_SIZE as u64 != 0 {
            return Err(Error::InvalidState(format!(
                "{} file {} has a partial page ({} bytes)",
                kind,
                path.display(),
                len
            )));
        }
        Ok(Self {
            file,
            path,
            kind,
            npages: (len / PAGE_SIZE as u64) as PageId,
        })
    }

    pub fn npages(&self) -> PageId {
        self.npages
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a zeroed page and returns its id.
    pub fn add_page(&mut self) -> Result<PageId> {
        let pid = self.npages;
        let page = Page::new();
        self.write_at(pid, &page)
            .map_err(|e| Error::Allocation(self.kind, e))?;
        self.npages += 1;
        tracing::debug!(file = self.kind, page = pid, "Allocated page");
        Ok(pid)
    }

    pub fn get_page(&self, pid: PageId) -> Result<Page> {
        if pid >= self.npages {
            return Err(Error::InvalidState(format!(
                "{} page {} out of range ({} pages)",
                self.kind, pid, self.npages
            )));
        }
        let mut data = vec![0u8; PAGE_SIZE];
        let mut file = &self.file;
        file.seek(SeekFrom::Start(Self::offset(pid)))?;
        file.read_exact(&mut data)
            .map_err(|e| Error::Decode("page", e))?;
        Ok(Page::from_vec(data))
    }

    pub fn put_page(&mut self, pid: PageId, page: &Page) -> Result<()> {
        if pid >= self.npages {
            return Err(Error::InvalidState(format!(
                "{} page {} out of range ({} pages)",
                self.kind, pid, self.npages
            )));
        }
        self.write_at(pid, page)?;
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn write_at(&mut self, pid: PageId, page: &Page) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(Self::offset(pid)))?;
        self.file.write_all(page.as_bytes())
    }

    fn offset(pid: PageId) -> u64 {
        pid as u64 * PAGE_SIZE as u64
    }
}
