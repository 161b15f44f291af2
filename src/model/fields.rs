//! Well-known field names.
//!
//! Field names are case-sensitive keys. Only the ones the cross-reference
//! engine reads or writes are listed here.

pub const ADDRESS: &str = "address";
pub const BOOKTITLE: &str = "booktitle";
pub const ISBN: &str = "isbn";
pub const LOCATION: &str = "location";
pub const MONTH: &str = "month";
pub const PUBLISHER: &str = "publisher";
pub const YEAR: &str = "year";
pub const TITLE: &str = "title";
pub const JOURNAL: &str = "journal";
pub const CROSSREF: &str = "crossref";

/// Venue-level fields moved from cluster members onto the aggregate, in
/// harvesting order.
pub const VENUE_FIELDS: [&str; 7] = [ADDRESS, BOOKTITLE, ISBN, LOCATION, MONTH, PUBLISHER, YEAR];
