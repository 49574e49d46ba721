use super::Relation;
use crate::bits::Bits;
use crate::error::Result;
use crate::page::{Page, PageId};
use crate::sig::{bsig, make_page_sig, make_tuple_sig};
use crate::tuple::tuple_vals;
use crate::Error;

impl Relation {
    /// Inserts `tuple` and returns the data page it was stored on.
    ///
    /// The data file, the tuple-signature log, the page signature of the
    /// target page and the bit-slices are all updated before this returns.
    /// If any step fails the relation refuses further inserts until it is
    /// reopened, since the files may no longer agree with each other.
    ///
    /// # Panics
    ///
    /// Panics if `tuple` does not have the relation's tuple size or
    /// attribute count.
    pub fn add_to_relation(&mut self, tuple: &str) -> Result<PageId> {
        assert_eq!(
            tuple.len(),
            self.params.tup_size as usize,
            "tuple {:?} does not have the relation's tuple size",
            tuple
        );
        assert_eq!(
            tuple_vals(tuple).len(),
            self.params.nattrs as usize,
            "tuple {:?} does not have the relation's attribute count",
            tuple
        );
        if self.poisoned {
            return Err(Error::InvalidState(format!(
                "relation {} is unusable after a failed insert",
                self.name
            )));
        }

        match self.insert(tuple) {
            Ok(pid) => Ok(pid),
            Err(e) => {
                self.poisoned = true;
                tracing::warn!(relation = %self.name, error = %e, "Insert failed");
                Err(e)
            }
        }
    }

    fn insert(&mut self, tuple: &str) -> Result<PageId> {
        let pid = self.append_tuple(tuple)?;

        let tsig = make_tuple_sig(self, tuple);
        self.append_tuple_sig(&tsig)?;

        let contribution = make_page_sig(self, tuple);
        let psig = self.merge_page_sig(pid, contribution)?;

        bsig::set_page_bits(&mut self.bsig, &self.params, &psig, pid)?;
        Ok(pid)
    }

    /// Stores the tuple on the last data page, opening a new page when the
    /// last one is full.
    fn append_tuple(&mut self, tuple: &str) -> Result<PageId> {
        let params = &mut self.params;
        let mut pid = params.npages - 1;
        let mut page = self.data.get_page(pid)?;
        if page.nitems() == params.tup_pp {
            // Each data page needs a bit in every slice
            if params.npages == params.bm {
                return Err(Error::NoSpace(format!(
                    "bit-slices hold at most {} data pages",
                    params.bm
                )));
            }
            pid = self.data.add_page()?;
            params.npages += 1;
            page = Page::new();
        }

        page.put_item(page.nitems() as usize, tuple.as_bytes());
        page.add_one_item();
        self.data.put_page(pid, &page)?;
        params.ntups += 1;
        Ok(pid)
    }

    /// Appends one entry to the tuple-signature log.
    fn append_tuple_sig(&mut self, tsig: &Bits) -> Result<()> {
        let params = &mut self.params;
        let mut pid = params.tsig_npages - 1;
        let mut page = self.tsig.get_page(pid)?;
        if page.nitems() == params.tsig_pp {
            pid = self.tsig.add_page()?;
            params.tsig_npages += 1;
            page = Page::new();
        }

        page.put_bits(page.nitems() as usize, tsig);
        page.add_one_item();
        self.tsig.put_page(pid, &page)?;
        params.ntsigs += 1;
        Ok(())
    }

    /// ORs `contribution` into the signature of data page `pid` and returns
    /// the merged signature.
    ///
    /// Page signatures are stored one per data page in page order, so the
    /// target page's entry is either the last one stored (same page as the
    /// previous insert) or does not exist yet (a data page was just opened).
    fn merge_page_sig(&mut self, pid: PageId, contribution: Bits) -> Result<Bits> {
        let params = &mut self.params;
        let mut ppid = params.psig_npages - 1;
        let mut page = self.psig.get_page(ppid)?;
        let mut psig = contribution;

        if params.npsigs == pid + 1 {
            debug_assert!(page.nitems() > 0);
            let slot = page.nitems() as usize - 1;
            let mut stored = Bits::new(params.pm as usize);
            page.get_bits(slot, &mut stored);
            psig.or_with(&stored);
            page.put_bits(slot, &psig);
        } else {
            debug_assert_eq!(params.npsigs, pid);
            if page.nitems() == params.psig_pp {
                ppid = self.psig.add_page()?;
                params.psig_npages += 1;
                page = Page::new();
            }
            page.put_bits(page.nitems() as usize, &psig);
            page.add_one_item();
            params.npsigs += 1;
        }

        self.psig.put_page(ppid, &page)?;
        Ok(psig)
    }
}
