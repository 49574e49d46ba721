use crate::error::Result;
use crate::page::PAGE_AVAILABLE;
use crate::reln::RelnParams;
use crate::Error;

use std::f64::consts::LN_2;

/// Parameters for creating a relation.
///
/// Signature widths are given in bits and are rounded up to a whole byte when
/// the relation is created.
#[derive(Debug, Clone)]
pub struct RelnConfig {
    /// Number of attributes per tuple
    pub nattrs: u32,

    /// Byte size of every tuple, separators included (default: 14 + 7 * nattrs)
    pub tuple_size: u32,

    /// Target false-match probability the signature widths were derived from
    /// (default: 0.001)
    pub false_match_prob: f64,

    /// Bits set per attribute codeword
    pub tk: u32,

    /// Tuple signature width in bits
    pub tm: u32,

    /// Page signature width in bits
    pub pm: u32,

    /// Bit-slice width in bits, i.e. the maximum number of data pages (default: 1024)
    pub bm: u32,
}

impl RelnConfig {
    /// Create a config for `nattrs` attributes with signature widths derived
    /// from the default false-match probability.
    pub fn new(nattrs: u32) -> Self {
        Self {
            nattrs,
            tuple_size: 14 + 7 * nattrs,
            false_match_prob: 0.001,
            tk: 0,
            tm: 0,
            pm: 0,
            bm: 1024,
        }
        .derive_from_pf()
    }

    /// Set the tuple byte size
    pub fn tuple_size(mut self, size: u32) -> Self {
        self.tuple_size = size;
        self
    }

    /// Set the target false-match probability (does not re-derive widths)
    pub fn false_match_prob(mut self, pf: f64) -> Self {
        self.false_match_prob = pf;
        self
    }

    /// Set the codeword weight
    pub fn tk(mut self, tk: u32) -> Self {
        self.tk = tk;
        self
    }

    /// Set the tuple signature width
    pub fn tm(mut self, tm: u32) -> Self {
        self.tm = tm;
        self
    }

    /// Set the page signature width
    pub fn pm(mut self, pm: u32) -> Self {
        self.pm = pm;
        self
    }

    /// Set the bit-slice width
    pub fn bm(mut self, bm: u32) -> Self {
        self.bm = bm;
        self
    }

    /// Recompute `tk`, `tm` and `pm` for superimposed coding from
    /// `false_match_prob`, `nattrs` and the tuples that fit on a page.
    ///
    /// With `n` codewords per signature the optimal weight is
    /// `k = log2(1/pf)` and the optimal width `m = n * ln(1/pf) / ln(2)^2`.
    pub fn derive_from_pf(mut self) -> Self {
        let pf = self.false_match_prob;
        if !(pf > 0.0 && pf < 1.0) || self.tuple_size == 0 {
            return self;
        }
        let ln_inv = (1.0 / pf).ln();
        let tup_pp = (PAGE_AVAILABLE as u32 / self.tuple_size).max(1);

        self.tk = (ln_inv / LN_2).ceil() as u32;
        self.tm = (self.nattrs as f64 * ln_inv / (LN_2 * LN_2)).ceil() as u32;
        self.pm = ((self.nattrs * tup_pp) as f64 * ln_inv / (LN_2 * LN_2)).ceil() as u32;
        self
    }

    /// Validate the configuration and compute the relation's static parameters.
    pub fn params(&self) -> Result<RelnParams> {
        if self.nattrs == 0 {
            return Err(Error::InvalidConfig("relation needs at least one attribute".into()));
        }
        if self.tuple_size < 2 * self.nattrs - 1 {
            return Err(Error::InvalidConfig(format!(
                "tuple size {} cannot hold {} attributes",
                self.tuple_size, self.nattrs
            )));
        }
        if !(self.false_match_prob > 0.0 && self.false_match_prob < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "false match probability {} not in (0, 1)",
                self.false_match_prob
            )));
        }

        let available = PAGE_AVAILABLE as u32;
        let tup_pp = available / self.tuple_size;
        if tup_pp == 0 {
            return Err(Error::InvalidConfig(format!(
                "tuple size {} exceeds page capacity {}",
                self.tuple_size, available
            )));
        }

        let tm = round_to_byte(self.tm);
        let pm = round_to_byte(self.pm);
        let bm = round_to_byte(self.bm);
        if self.tk == 0 {
            return Err(Error::InvalidConfig("codeword weight must be positive".into()));
        }
        if self.tk > tm || self.tk > pm {
            return Err(Error::InvalidConfig(format!(
                "codeword weight {} exceeds signature width (tm {}, pm {})",
                self.tk, tm, pm
            )));
        }
        if bm == 0 {
            return Err(Error::InvalidConfig("bit-slice width must be positive".into()));
        }

        let tsig_pp = available / (tm / 8);
        let psig_pp = available / (pm / 8);
        let bsig_pp = available / (bm / 8);
        for (name, per_page) in [("tsig", tsig_pp), ("psig", psig_pp), ("bsig", bsig_pp)] {
            if per_page < 2 {
                return Err(Error::InvalidConfig(format!(
                    "{} entries too wide: {} per page",
                    name, per_page
                )));
            }
        }

        Ok(RelnParams {
            nattrs: self.nattrs,
            pf: self.false_match_prob,
            tup_size: self.tuple_size,
            tup_pp,
            tk: self.tk,
            tm,
            tsig_size: tm / 8,
            tsig_pp,
            pm,
            psig_size: pm / 8,
            psig_pp,
            bm,
            bsig_size: bm / 8,
            bsig_pp,
            ..RelnParams::default()
        })
    }
}

fn round_to_byte(bits: u32) -> u32 {
    bits.div_ceil(8) * 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelnConfig::new(2);
        assert_eq!(config.nattrs, 2);
        assert_eq!(config.tuple_size, 28);
        assert_eq!(config.bm, 1024);
        // log2(1000) ~ 9.97
        assert_eq!(config.tk, 10);
        assert!(config.tm >= 2 * config.tk);
        assert!(config.pm > config.tm);

        config.params().expect("Default config should be valid");
    }

    #[test]
    fn test_config_builder() {
        let config = RelnConfig::new(3)
            .tuple_size(5)
            .tk(2)
            .tm(13)
            .pm(30)
            .bm(100);

        let params = config.params().expect("Failed to compute params");
        assert_eq!(params.tup_size, 5);
        assert_eq!(params.tup_pp, 4092 / 5);
        assert_eq!(params.tm, 16);
        assert_eq!(params.tsig_size, 2);
        assert_eq!(params.pm, 32);
        assert_eq!(params.psig_size, 4);
        assert_eq!(params.bm, 104);
        assert_eq!(params.bsig_size, 13);
        assert_eq!(params.bsig_pp, 4092 / 13);
    }

    #[test]
    fn test_derive_from_pf() {
        let narrow = RelnConfig::new(4).false_match_prob(0.1).derive_from_pf();
        let wide = RelnConfig::new(4).false_match_prob(0.0001).derive_from_pf();
        assert!(narrow.tk < wide.tk);
        assert!(narrow.tm < wide.tm);
        assert!(narrow.pm < wide.pm);
    }

    #[test]
    fn test_weight_exceeds_width() {
        let result = RelnConfig::new(2).tuple_size(3).tk(9).tm(8).pm(64).params();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = RelnConfig::new(2).tuple_size(3).tk(9).tm(64).pm(8).params();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_signature_too_wide() {
        // 2048 bytes per page signature leaves room for only one per page
        let result = RelnConfig::new(2).tuple_size(3).tk(2).tm(8).pm(2048 * 8).params();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = RelnConfig::new(2).tuple_size(3).tk(2).tm(8).pm(8).bm(3000 * 8).params();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(matches!(
            RelnConfig::new(0).params(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            RelnConfig::new(3).tuple_size(4).params(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            RelnConfig::new(2).tuple_size(5000).params(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            RelnConfig::new(2).false_match_prob(1.5).params(),
            Err(Error::InvalidConfig(_))
        ));
    }
}
