//! Response bodies. None of them carry token material.

pub(crate) mod connection;
pub(crate) mod session;
