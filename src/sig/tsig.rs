use super::superimpose;
use crate::bits::Bits;
use crate::error::Result;
use crate::query::Query;
use crate::reln::Relation;

/// Tuple signature of `tuple`: `tm` bits, wildcards contribute nothing.
pub fn make_tuple_sig(reln: &Relation, tuple: &str) -> Bits {
    let params = reln.params();
    superimpose(tuple, params.tm as usize, params.tk as usize)
}

/// Scans every stored tuple signature and marks the data page of each tuple
/// whose signature covers the query signature.
///
/// Tuple signatures are stored in insertion order and data pages fill
/// completely before the next one is opened, so tuple `n` lives on data page
/// `n / tup_pp`.
pub fn find_pages_using_tup_sigs(query: &mut Query<'_>) -> Result<()> {
    let reln = query.reln();
    let params = reln.params();
    let qsig = make_tuple_sig(reln, query.qstring());

    let mut tsig = Bits::new(params.tm as usize);
    let mut tuple_no: u32 = 0;
    for pid in 0..params.tsig_npages {
        let page = reln.tsig_file().get_page(pid)?;
        query.stats.nsigpages += 1;
        for slot in 0..page.nitems() as usize {
            page.get_bits(slot, &mut tsig);
            query.stats.nsigs += 1;
            if qsig.is_subset_of(&tsig) {
                query.pages.set((tuple_no / params.tup_pp) as usize);
            }
            tuple_no += 1;
        }
    }

    tracing::debug!(
        query = query.qstring(),
        sigs = query.stats.nsigs,
        sig_pages = query.stats.nsigpages,
        matched = query.pages.count_ones(),
        "Tuple signature scan finished"
    );
    Ok(())
}
