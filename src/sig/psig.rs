use super::superimpose;
use crate::bits::Bits;
use crate::error::Result;
use crate::page::PageId;
use crate::query::Query;
use crate::reln::Relation;
use crate::Error;

/// One tuple's contribution to the signature of the page it lands on:
/// `pm` bits, wildcards contribute nothing. Merging into the stored page
/// signature is the insertion path's job.
pub fn make_page_sig(reln: &Relation, tuple: &str) -> Bits {
    let params = reln.params();
    superimpose(tuple, params.pm as usize, params.tk as usize)
}

/// Reads the stored signature of data page `pid`.
pub fn read_page_sig(reln: &Relation, pid: PageId) -> Result<Bits> {
    let params = reln.params();
    if pid >= params.npsigs {
        return Err(Error::InvalidState(format!(
            "no page signature for data page {} ({} stored)",
            pid, params.npsigs
        )));
    }
    let page = reln.psig_file().get_page(pid / params.psig_pp)?;
    let mut psig = Bits::new(params.pm as usize);
    page.get_bits((pid % params.psig_pp) as usize, &mut psig);
    Ok(psig)
}

/// Scans every stored page signature and marks each data page whose
/// signature covers the query's page-width signature.
pub fn scan_page_sigs(query: &mut Query<'_>) -> Result<()> {
    let reln = query.reln();
    let params = reln.params();
    let qsig = make_page_sig(reln, query.qstring());

    let mut psig = Bits::new(params.pm as usize);
    let mut data_pid: usize = 0;
    for pid in 0..params.psig_npages {
        let page = reln.psig_file().get_page(pid)?;
        query.stats.nsigpages += 1;
        for slot in 0..page.nitems() as usize {
            page.get_bits(slot, &mut psig);
            query.stats.nsigs += 1;
            if qsig.is_subset_of(&psig) {
                query.pages.set(data_pid);
            }
            data_pid += 1;
        }
    }

    tracing::debug!(
        query = query.qstring(),
        sigs = query.stats.nsigs,
        sig_pages = query.stats.nsigpages,
        matched = query.pages.count_ones(),
        "Page signature scan finished"
    );
    Ok(())
}
