//! Calendar date used by loan, fine and reminder rules.
//!
//! Services take the date as a parameter; handlers call [`today`].

use chrono::{NaiveDate, Utc};

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
