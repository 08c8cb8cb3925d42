//! Core math modules.

pub mod autocorr;
pub mod binomial;
pub mod stable;
