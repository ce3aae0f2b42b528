//! Lists installed apps together with the moment they were last used.
//! Usage statistics are resolved into app names, sorted, filtered by a debounced search term and
//! grouped by day. Rendering is left to the caller, the bundled cli being one of them.
//!

pub mod cli;
pub mod identity;
pub mod listing;
pub mod search;
pub mod usage;
pub mod utils;
