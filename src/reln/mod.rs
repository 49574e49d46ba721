//! Relations: a data file plus its three signature files.
//!
//! A relation named `r` in directory `d` is stored as:
//!
//! ```text
//! d/r.info   header: static parameters and counters (RelnParams)
//! d/r.data   data pages of fixed-size tuples
//! d/r.tsig   tuple signatures, one per tuple, in insertion order
//! d/r.psig   page signatures, one per data page
//! d/r.bsig   bit-slices of the page signatures, pm of them
//! d/r.lock   held exclusively while the relation is open
//! ```
//!
//! The header counters are authoritative only after a clean close; on open
//! they are checked against the page counts of the files.

mod header;
mod insert;

pub use header::{RelnParams, HEADER_SIZE};

use crate::config::RelnConfig;
use crate::error::Result;
use crate::flock::FileLock;
use crate::page::{PageFile, PageId};
use crate::sig::bsig;
use crate::Error;

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub struct Relation {
    name: String,
    dir: PathBuf,
    params: RelnParams,
    info: File,
    data: PageFile,
    tsig: PageFile,
    psig: PageFile,
    bsig: PageFile,
    /// Set when an insert fails part-way; the files may disagree until reopened.
    poisoned: bool,
    closed: bool,
    _lock: FileLock,
}

fn file_path(dir: &Path, name: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, suffix))
}

impl Relation {
    /// Creates a new relation and leaves it open.
    ///
    /// The data, tuple-signature and page-signature files start with one
    /// empty page each; the bit-slice file holds `pm` zeroed slices.
    pub fn create(dir: impl AsRef<Path>, name: &str, config: &RelnConfig) -> Result<Self> {
        let dir = dir.as_ref();
        let mut params = config.params()?;
        if Self::exists(dir, name) {
            return Err(Error::RelationExists(name.to_string()));
        }

        let lock = FileLock::lock(file_path(dir, name, "lock")).map_err(Error::LockError)?;
        let info = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(file_path(dir, name, "info"))?;

        let mut data = PageFile::create(file_path(dir, name, "data"), "data")?;
        data.add_page()?;
        params.npages = 1;
        let mut tsig = PageFile::create(file_path(dir, name, "tsig"), "tsig")?;
        tsig.add_page()?;
        params.tsig_npages = 1;
        let mut psig = PageFile::create(file_path(dir, name, "psig"), "psig")?;
        psig.add_page()?;
        params.psig_npages = 1;
        let mut bsig = PageFile::create(file_path(dir, name, "bsig"), "bsig")?;
        bsig::init_slices(&mut bsig, &mut params)?;

        let mut reln = Self {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            params,
            info,
            data,
            tsig,
            psig,
            bsig,
            poisoned: false,
            closed: false,
            _lock: lock,
        };
        reln.write_header()?;

        tracing::info!(
            relation = name,
            nattrs = reln.params.nattrs,
            tm = reln.params.tm,
            pm = reln.params.pm,
            bm = reln.params.bm,
            "Created relation"
        );
        Ok(reln)
    }

    /// Opens an existing relation.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        if !Self::exists(dir, name) {
            return Err(Error::RelationNotFound(name.to_string()));
        }

        let lock = FileLock::lock(file_path(dir, name, "lock")).map_err(Error::LockError)?;
        let mut info = OpenOptions::new()
            .read(true)
            .write(true)
            .open(file_path(dir, name, "info"))?;
        let mut buf = [0u8; HEADER_SIZE];
        info.read_exact(&mut buf)
            .map_err(|e| Error::Decode("relation header", e))?;
        let params = RelnParams::decode(&buf)?;

        let data = PageFile::open(file_path(dir, name, "data"), "data")?;
        let tsig = PageFile::open(file_path(dir, name, "tsig"), "tsig")?;
        let psig = PageFile::open(file_path(dir, name, "psig"), "psig")?;
        let bsig = PageFile::open(file_path(dir, name, "bsig"), "bsig")?;

        for (kind, counted, actual) in [
            ("data", params.npages, data.npages()),
            ("tsig", params.tsig_npages, tsig.npages()),
            ("psig", params.psig_npages, psig.npages()),
            ("bsig", params.bsig_npages, bsig.npages()),
        ] {
            if counted != actual {
                return Err(Error::InvalidState(format!(
                    "header records {} {} pages but file has {}",
                    counted, kind, actual
                )));
            }
        }

        tracing::info!(
            relation = name,
            tuples = params.ntups,
            pages = params.npages,
            "Opened relation"
        );
        Ok(Self {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            params,
            info,
            data,
            tsig,
            psig,
            bsig,
            poisoned: false,
            closed: false,
            _lock: lock,
        })
    }

    /// Whether a relation called `name` exists in `dir`.
    pub fn exists(dir: impl AsRef<Path>, name: &str) -> bool {
        file_path(dir.as_ref(), name, "info").exists()
    }

    /// Persists the header, syncs every file and releases the lock.
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        self.closed = true;
        tracing::info!(relation = %self.name, "Closed relation");
        Ok(())
    }

    /// Writes the header and syncs all files without closing.
    pub fn flush(&mut self) -> Result<()> {
        self.write_header()?;
        for file in [&self.data, &self.tsig, &self.psig, &self.bsig] {
            file.sync()?;
        }
        self.info.sync_all()?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn params(&self) -> &RelnParams {
        &self.params
    }

    /// The tuples stored on data page `pid`, in slot order.
    pub fn get_page_tuples(&self, pid: PageId) -> Result<Vec<String>> {
        let page = self.data.get_page(pid)?;
        let size = self.params.tup_size as usize;
        (0..page.nitems() as usize)
            .map(|slot| {
                String::from_utf8(page.item(slot, size).to_vec()).map_err(|e| {
                    Error::Decode("tuple", io::Error::new(io::ErrorKind::InvalidData, e))
                })
            })
            .collect()
    }

    pub(crate) fn tsig_file(&self) -> &PageFile {
        &self.tsig
    }

    pub(crate) fn psig_file(&self) -> &PageFile {
        &self.psig
    }

    pub(crate) fn bsig_file(&self) -> &PageFile {
        &self.bsig
    }

    fn write_header(&mut self) -> Result<()> {
        self.info.seek(SeekFrom::Start(0))?;
        self.info.write_all(&self.params.encode())?;
        Ok(())
    }
}

impl Drop for Relation {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.write_header() {
            tracing::warn!(relation = %self.name, error = %e, "Failed to persist header on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> RelnConfig {
        RelnConfig::new(3).tuple_size(5).tk(2).tm(16).pm(64).bm(64)
    }

    #[test]
    fn test_create_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        assert!(!Relation::exists(temp_dir.path(), "r"));

        let reln = Relation::create(temp_dir.path(), "r", &config())
            .expect("Failed to create relation");
        assert!(Relation::exists(temp_dir.path(), "r"));
        for suffix in ["info", "data", "tsig", "psig", "bsig", "lock"] {
            assert!(file_path(temp_dir.path(), "r", suffix).exists(), "{}", suffix);
        }

        let params = reln.params();
        assert_eq!(params.npages, 1);
        assert_eq!(params.ntups, 0);
        assert_eq!(params.tsig_npages, 1);
        assert_eq!(params.psig_npages, 1);
        assert_eq!(params.bsig_npages, 1);
        assert_eq!(params.nbsigs, 64);
        assert_eq!(reln.name(), "r");
        assert_eq!(reln.dir(), temp_dir.path());
    }

    #[test]
    fn test_create_existing_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Relation::create(temp_dir.path(), "r", &config())
            .expect("Failed to create relation")
            .close()
            .expect("Failed to close relation");

        assert!(matches!(
            Relation::create(temp_dir.path(), "r", &config()),
            Err(Error::RelationExists(_))
        ));
    }

    #[test]
    fn test_invalid_config_creates_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let bad = config().tk(17);
        assert!(matches!(
            Relation::create(temp_dir.path(), "r", &bad),
            Err(Error::InvalidConfig(_))
        ));
        assert!(!Relation::exists(temp_dir.path(), "r"));
        assert!(!file_path(temp_dir.path(), "r", "data").exists());
    }

    #[test]
    fn test_open_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        assert!(matches!(
            Relation::open(temp_dir.path(), "nope"),
            Err(Error::RelationNotFound(_))
        ));
    }

    #[test]
    fn test_reopen_preserves_state() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut reln = Relation::create(temp_dir.path(), "r", &config())
            .expect("Failed to create relation");
        for tuple in ["a,b,c", "d,e,f", "a,x,y"] {
            reln.add_to_relation(tuple).expect("Failed to insert");
        }
        let before = reln.params().clone();
        reln.close().expect("Failed to close relation");

        let reln = Relation::open(temp_dir.path(), "r").expect("Failed to open relation");
        assert_eq!(reln.params(), &before);
        assert_eq!(
            reln.get_page_tuples(0).expect("Failed to read page"),
            vec!["a,b,c", "d,e,f", "a,x,y"]
        );
    }

    #[test]
    fn test_header_persisted_on_drop() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        {
            let mut reln = Relation::create(temp_dir.path(), "r", &config())
                .expect("Failed to create relation");
            reln.add_to_relation("a,b,c").expect("Failed to insert");
        }

        let reln = Relation::open(temp_dir.path(), "r").expect("Failed to open relation");
        assert_eq!(reln.params().ntups, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_single_opener() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let _reln = Relation::create(temp_dir.path(), "r", &config())
            .expect("Failed to create relation");

        assert!(matches!(
            Relation::open(temp_dir.path(), "r"),
            Err(Error::LockError(_))
        ));
    }

    #[test]
    fn test_open_detects_header_mismatch() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Relation::create(temp_dir.path(), "r", &config())
            .expect("Failed to create relation")
            .close()
            .expect("Failed to close relation");

        // Grow the data file behind the header's back
        let mut data = PageFile::open(file_path(temp_dir.path(), "r", "data"), "data")
            .expect("Failed to open data file");
        data.add_page().expect("Failed to add page");

        assert!(matches!(
            Relation::open(temp_dir.path(), "r"),
            Err(Error::InvalidState(_))
        ));
    }
}
