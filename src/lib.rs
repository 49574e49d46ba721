pub mod bits;
pub mod config;
pub mod error;
pub mod flock;
pub mod hasher;
pub mod page;
pub mod query;
pub mod reln;
pub mod sig;
pub mod tuple;

pub use bits::Bits;
pub use config::RelnConfig;
pub use error::{Error, Result};
pub use page::PageId;
pub use query::{Query, QueryStats, Strategy};
pub use reln::{RelnParams, Relation};
pub use sig::{
    codeword, find_pages_using_page_sigs, find_pages_using_tup_sigs, make_page_sig,
    make_tuple_sig,
};
