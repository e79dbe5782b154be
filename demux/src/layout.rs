//! Per-title sector layouts
//!
//! Every layout parser looks at a sector on its own and either recognizes it
//! or yields `None`. Parsers never fail in any other way, and never depend on
//! which parsers were tried before them.

pub(crate) mod chrono;
pub(crate) mod ff7;
pub(crate) mod ff8;
pub(crate) mod ff9;
pub(crate) mod str_header;

