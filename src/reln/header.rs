use crate::error::Result;
use crate::hasher::Hasher;
use crate::page::{Count, PageId};
use crate::Error;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{Cursor, Read};

pub const HEADER_SIZE: usize = 128;
const CHECKSUM_OFFSET: usize = HEADER_SIZE - 8;
const MAGIC: &[u8; 8] = b"SIGFILE\0";
const VERSION: u32 = 1;

/// Static shape and dynamic counters of a relation, persisted in the
/// `.info` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelnParams {
    pub nattrs: Count,
    pub pf: f64,
    pub tup_size: Count,
    pub tup_pp: Count,
    pub tk: Count,
    pub tm: Count,
    pub tsig_size: Count,
    pub tsig_pp: Count,
    pub pm: Count,
    pub psig_size: Count,
    pub psig_pp: Count,
    pub bm: Count,
    pub bsig_size: Count,
    pub bsig_pp: Count,

    pub npages: PageId,
    pub ntups: Count,
    pub tsig_npages: PageId,
    pub ntsigs: Count,
    pub psig_npages: PageId,
    pub npsigs: Count,
    pub bsig_npages: PageId,
    pub nbsigs: Count,
}

impl RelnParams {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(MAGIC);
        let mut cursor = Cursor::new(&mut buf[8..CHECKSUM_OFFSET]);
        for value in self.fields() {
            cursor.write_u32::<BigEndian>(value).unwrap();
        }
        cursor.write_f64::<BigEndian>(self.pf).unwrap();

        let mut hasher = Hasher::new();
        hasher.write(&buf[..CHECKSUM_OFFSET]);
        (&mut buf[CHECKSUM_OFFSET..])
            .write_u64::<BigEndian>(hasher.checksum())
            .unwrap();
        buf
    }

    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut cursor = Cursor::new(&buf[..]);

        let mut magic = [0u8; 8];
        cursor.read_exact(&mut magic)?;
        if magic != *MAGIC {
            return Err(Error::InvalidHeader);
        }

        let stored = (&buf[CHECKSUM_OFFSET..]).read_u64::<BigEndian>()?;
        let mut hasher = Hasher::new();
        hasher.write(&buf[..CHECKSUM_OFFSET]);
        if hasher.checksum() != stored {
            return Err(Error::ChecksumMismatch);
        }

        let version = cursor.read_u32::<BigEndian>()?;
        if version != VERSION {
            return Err(Error::InvalidHeader);
        }

        let mut read = || {
            cursor
                .read_u32::<BigEndian>()
                .map_err(|e| Error::Decode("relation header", e))
        };
        let mut params = Self {
            nattrs: read()?,
            tup_size: read()?,
            tup_pp: read()?,
            tk: read()?,
            tm: read()?,
            tsig_size: read()?,
            tsig_pp: read()?,
            pm: read()?,
            psig_size: read()?,
            psig_pp: read()?,
            bm: read()?,
            bsig_size: read()?,
            bsig_pp: read()?,
            npages: read()?,
            ntups: read()?,
            tsig_npages: read()?,
            ntsigs: read()?,
            psig_npages: read()?,
            npsigs: read()?,
            bsig_npages: read()?,
            nbsigs: read()?,
            ..Self::default()
        };
        params.pf = cursor
            .read_f64::<BigEndian>()
            .map_err(|e| Error::Decode("relation header", e))?;
        Ok(params)
    }

    // Version first, then fields in declaration order minus `pf`.
    fn fields(&self) -> [u32; 22] {
        [
            VERSION,
            self.nattrs,
            self.tup_size,
            self.tup_pp,
            self.tk,
            self.tm,
            self.tsig_size,
            self.tsig_pp,
            self.pm,
            self.psig_size,
            self.psig_pp,
            self.bm,
            self.bsig_size,
            self.bsig_pp,
            self.npages,
            self.ntups,
            self.tsig_npages,
            self.ntsigs,
            self.psig_npages,
            self.npsigs,
            self.bsig_npages,
            self.nbsigs,
        ]
    }
}

/// Relation statistics report.
impl fmt::Display for RelnParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Global Info:")?;
        writeln!(f, "Dynamic:")?;
        writeln!(
            f,
            "  #items:  tuples: {}  tsigs: {}  psigs: {}  bsigs: {}",
            self.ntups, self.ntsigs, self.npsigs, self.nbsigs
        )?;
        writeln!(
            f,
            "  #pages:  tuples: {}  tsigs: {}  psigs: {}  bsigs: {}",
            self.npages, self.tsig_npages, self.psig_npages, self.bsig_npages
        )?;
        writeln!(f, "Static:")?;
        writeln!(
            f,
            "  tups   #attrs: {}  size: {} bytes  max/page: {}",
            self.nattrs, self.tup_size, self.tup_pp
        )?;
        writeln!(f, "  sigs   bits/attr: {}  pF: {}", self.tk, self.pf)?;
        writeln!(
            f,
            "  tsigs  size: {} bits ({} bytes)  max/page: {}",
            self.tm, self.tsig_size, self.tsig_pp
        )?;
        writeln!(
            f,
            "  psigs  size: {} bits ({} bytes)  max/page: {}",
            self.pm, self.psig_size, self.psig_pp
        )?;
        write!(
            f,
            "  bsigs  size: {} bits ({} bytes)  max/page: {}",
            self.bm, self.bsig_size, self.bsig_pp
        )
    }
}
