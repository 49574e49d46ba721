//! Bit-sliced page signatures.
//!
//! Slice `i` is a `bm`-bit vector whose bit `p` equals bit `i` of data page
//! `p`'s signature. Slices are packed `bsig_pp` to a page in order, so slice
//! `i` lives on bsig page `i / bsig_pp`, slot `i % bsig_pp`. A query then only
//! needs to fetch the slices for the bits set in its own page signature and
//! AND them together.

use super::psig::make_page_sig;
use crate::bits::Bits;
use crate::error::Result;
use crate::page::{Page, PageFile, PageId};
use crate::query::Query;
use crate::reln::{RelnParams, Relation};
use crate::Error;

fn slice_location(params: &RelnParams, i: usize) -> (PageId, usize) {
    let per_page = params.bsig_pp as usize;
    ((i / per_page) as PageId, i % per_page)
}

/// Fills a fresh bsig file with `pm` all-zero slices.
pub(crate) fn init_slices(bsig: &mut PageFile, params: &mut RelnParams) -> Result<()> {
    let mut remaining = params.pm;
    while remaining > 0 {
        let pid = bsig.add_page()?;
        let n = remaining.min(params.bsig_pp);
        let mut page = Page::new();
        page.set_nitems(n);
        bsig.put_page(pid, &page)?;

        remaining -= n;
        params.nbsigs += n;
    }
    params.bsig_npages = bsig.npages();
    Ok(())
}

/// Sets bit `pid` in every slice selected by `psig`. Each bsig page is read
/// and written at most once, and only if one of its slices changes.
pub(crate) fn set_page_bits(
    bsig: &mut PageFile,
    params: &RelnParams,
    psig: &Bits,
    pid: PageId,
) -> Result<()> {
    let mut slice = Bits::new(params.bm as usize);
    let mut page = Page::new();
    let mut loaded: Option<PageId> = None;
    let mut dirty = false;

    for i in psig.iter_ones() {
        let (bpid, slot) = slice_location(params, i);
        if loaded != Some(bpid) {
            if let (Some(prev), true) = (loaded, dirty) {
                bsig.put_page(prev, &page)?;
            }
            page = bsig.get_page(bpid)?;
            loaded = Some(bpid);
            dirty = false;
        }
        page.get_bits(slot, &mut slice);
        if !slice.is_set(pid as usize) {
            slice.set(pid as usize);
            page.put_bits(slot, &slice);
            dirty = true;
        }
    }
    if let (Some(prev), true) = (loaded, dirty) {
        bsig.put_page(prev, &page)?;
    }
    Ok(())
}

/// Reads slice `i`: one bit per data page.
pub fn read_bit_slice(reln: &Relation, i: usize) -> Result<Bits> {
    let params = reln.params();
    if i >= params.pm as usize {
        return Err(Error::InvalidState(format!(
            "bit-slice {} out of range ({} slices)",
            i, params.pm
        )));
    }
    let (bpid, slot) = slice_location(params, i);
    let page = reln.bsig_file().get_page(bpid)?;
    let mut slice = Bits::new(params.bm as usize);
    page.get_bits(slot, &mut slice);
    Ok(slice)
}

/// Candidate pages from the bit-slice index.
///
/// Starts from every existing data page and intersects with the slice of
/// each bit set in the query's page signature. A fully wildcarded query has
/// an empty signature and so yields every page.
pub fn find_pages_using_page_sigs(query: &mut Query<'_>) -> Result<()> {
    let reln = query.reln();
    let params = reln.params();
    let qsig = make_page_sig(reln, query.qstring());

    let mut matches = Bits::new(params.bm as usize);
    matches.set_prefix(params.npages as usize);

    let mut slice = Bits::new(params.bm as usize);
    let mut page = Page::new();
    let mut loaded: Option<PageId> = None;
    for i in qsig.iter_ones() {
        let (bpid, slot) = slice_location(params, i);
        if loaded != Some(bpid) {
            page = reln.bsig_file().get_page(bpid)?;
            loaded = Some(bpid);
            query.stats.nsigpages += 1;
        }
        page.get_bits(slot, &mut slice);
        matches.and_with(&slice);
        query.stats.nsigs += 1;
    }
    query.pages.or_with(&matches);

    tracing::debug!(
        query = query.qstring(),
        slices = query.stats.nsigs,
        slice_pages = query.stats.nsigpages,
        matched = query.pages.count_ones(),
        "Bit-slice lookup finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelnConfig;
    use crate::sig::read_page_sig;
    use tempfile::TempDir;

    const TUPLE_SIZE: usize = 1000;

    fn tuple(a: &str) -> String {
        format!("{},{}", a, "_".repeat(TUPLE_SIZE - a.len() - 1))
    }

    fn create_relation(temp_dir: &TempDir, pm: u32) -> Relation {
        let config = RelnConfig::new(2)
            .tuple_size(TUPLE_SIZE as u32)
            .tk(4)
            .tm(64)
            .pm(pm)
            .bm(64);
        Relation::create(temp_dir.path(), "r", &config).expect("Failed to create relation")
    }

    /// Every slice bit equals the matching page-signature bit.
    fn assert_transposed(reln: &Relation) {
        let params = reln.params();
        let psigs: Vec<Bits> = (0..params.npsigs)
            .map(|pid| read_page_sig(reln, pid).expect("Failed to read psig"))
            .collect();
        for i in 0..params.pm as usize {
            let slice = read_bit_slice(reln, i).expect("Failed to read slice");
            for p in 0..params.bm as usize {
                let expected = psigs.get(p).map_or(false, |psig| psig.is_set(i));
                assert_eq!(slice.is_set(p), expected, "slice {} page {}", i, p);
            }
        }
    }

    #[test]
    fn test_slices_created_zero() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        // 8-byte slices: 511 per page, so 1200 slices span three pages
        let reln = create_relation(&temp_dir, 1200);
        let params = reln.params();

        assert_eq!(params.nbsigs, 1200);
        assert_eq!(params.bsig_npages, 3);
        assert_eq!(reln.bsig_file().npages(), 3);
        let last = reln.bsig_file().get_page(2).expect("Failed to read bsig page");
        assert_eq!(last.nitems(), 1200 - 2 * 511);

        for i in [0, 510, 511, 1199] {
            assert!(read_bit_slice(&reln, i).expect("Failed to read slice").is_zero());
        }
        assert!(matches!(read_bit_slice(&reln, 1200), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_slices_track_page_sigs() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut reln = create_relation(&temp_dir, 1200);

        for i in 0..13 {
            reln.add_to_relation(&tuple(&format!("value{}", i)))
                .expect("Failed to insert");
            assert_transposed(&reln);
        }
        assert_eq!(reln.params().npages, 4);
    }

    #[test]
    fn test_bit_slice_query() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut reln = create_relation(&temp_dir, 256);
        for i in 0..12 {
            reln.add_to_relation(&tuple(&format!("value{}", i)))
                .expect("Failed to insert");
        }

        let mut query = Query::new(&reln, "value9,?").expect("Failed to build query");
        find_pages_using_page_sigs(&mut query).expect("Lookup failed");
        assert!(query.pages().is_set(2));
        assert_eq!(query.stats().nsigs, 4);
        assert_eq!(query.stats().nsigpages, 1);
        // Pages that do not exist are never candidates
        assert!(query.candidate_pages().iter().all(|&p| p < 3));
    }

    #[test]
    fn test_wildcard_query_yields_all_pages() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut reln = create_relation(&temp_dir, 256);
        for i in 0..6 {
            reln.add_to_relation(&tuple(&format!("value{}", i)))
                .expect("Failed to insert");
        }

        let mut query = Query::new(&reln, "?,?").expect("Failed to build query");
        find_pages_using_page_sigs(&mut query).expect("Lookup failed");
        assert_eq!(query.candidate_pages(), vec![0, 1]);
        assert_eq!(query.stats().nsigs, 0);
    }
}
