#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
pub use error::IcpError;

mod icp;
pub use icp::*;

mod ops;
pub use ops::{find_correspondences, fit_transformation, Correspondences};
