//! Zowe client session resolution
//!
//! Facade over [`zowe_imperative`]; see that crate for the details.

pub use zowe_imperative::*;
