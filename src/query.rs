//! Partial-match queries over a relation.
//!
//! A query string has one entry per attribute, `?` for attributes that are
//! not constrained. Evaluators set bits in the query's page bitmap; the
//! result is a superset of the pages holding matching tuples, and
//! [`Query::matching_tuples`] does the exact check against the data.

use crate::bits::Bits;
use crate::error::Result;
use crate::page::PageId;
use crate::reln::Relation;
use crate::sig::{self, make_page_sig};
use crate::tuple::{tuple_matches, tuple_vals};
use crate::Error;

/// Work done by the evaluators run on a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Signatures (or slices) read
    pub nsigs: u64,
    /// Signature file pages read
    pub nsigpages: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Scan the tuple-signature log
    TupleSigs,
    /// Scan the page signatures
    PageSigs,
    /// AND the bit-slices selected by the query signature
    BitSlices,
    /// Bit-slices, unless the query needs more slices than there are
    /// tuple-signature pages to scan
    Auto,
}

pub struct Query<'a> {
    reln: &'a Relation,
    qstring: String,
    pub(crate) pages: Bits,
    pub(crate) stats: QueryStats,
}

impl<'a> Query<'a> {
    pub fn new(reln: &'a Relation, qstring: &str) -> Result<Self> {
        let nvals = tuple_vals(qstring).len();
        if nvals != reln.params().nattrs as usize {
            return Err(Error::InvalidQuery(format!(
                "{:?} has {} attributes, relation {} has {}",
                qstring,
                nvals,
                reln.name(),
                reln.params().nattrs
            )));
        }
        Ok(Self {
            reln,
            qstring: qstring.to_string(),
            pages: Bits::new(reln.params().bm as usize),
            stats: QueryStats::default(),
        })
    }

    pub fn reln(&self) -> &'a Relation {
        self.reln
    }

    pub fn qstring(&self) -> &str {
        &self.qstring
    }

    /// Candidate page bitmap, one bit per possible data page.
    pub fn pages(&self) -> &Bits {
        &self.pages
    }

    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    pub fn candidate_pages(&self) -> Vec<PageId> {
        self.pages.iter_ones().map(|p| p as PageId).collect()
    }

    /// Clears the result bitmap and counters.
    pub fn reset(&mut self) {
        self.pages.unset_all();
        self.stats = QueryStats::default();
    }

    /// Runs one evaluator, returning the strategy actually used.
    pub fn run(&mut self, strategy: Strategy) -> Result<Strategy> {
        let strategy = match strategy {
            Strategy::Auto => self.choose_strategy(),
            other => other,
        };
        match strategy {
            Strategy::TupleSigs => sig::find_pages_using_tup_sigs(self)?,
            Strategy::PageSigs => sig::scan_page_sigs(self)?,
            Strategy::BitSlices | Strategy::Auto => sig::find_pages_using_page_sigs(self)?,
        }
        Ok(strategy)
    }

    /// Tuples on the candidate pages that really match the query.
    pub fn matching_tuples(&self) -> Result<Vec<String>> {
        let mut matches = Vec::new();
        for pid in self.candidate_pages() {
            if pid >= self.reln.params().npages {
                break;
            }
            matches.extend(
                self.reln
                    .get_page_tuples(pid)?
                    .into_iter()
                    .filter(|t| tuple_matches(t, &self.qstring)),
            );
        }
        Ok(matches)
    }

    fn choose_strategy(&self) -> Strategy {
        let slices = make_page_sig(self.reln, &self.qstring).count_ones();
        if slices > self.reln.params().tsig_npages as usize {
            Strategy::TupleSigs
        } else {
            Strategy::BitSlices
        }
    }
}
