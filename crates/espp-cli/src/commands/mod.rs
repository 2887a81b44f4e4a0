pub mod irs_limit;
pub mod market;
pub mod offering;
pub mod purchase;
