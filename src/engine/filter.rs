use chrono::{Local, NaiveDate};

use crate::records::Snapshot;

/// Keep records whose date falls within the inclusive `[from, to]` range.
///
/// A `None` bound is open on that side. Records without a parseable date
/// are excluded once any bound is given — unless the source had no date
/// column at all, in which case filtering is a no-op over the full set.
pub fn by_date(snapshot: &Snapshot, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Snapshot {
    if !snapshot.has_date_column || (from.is_none() && to.is_none()) {
        return snapshot.clone();
    }

    let records = snapshot
        .records
        .iter()
        .filter(|rec| match rec.date {
            Some(date) => {
                from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
            }
            None => false,
        })
        .cloned()
        .collect();

    Snapshot {
        records,
        has_date_column: snapshot.has_date_column,
    }
}

/// Keep records paid to the given doctor.
pub fn by_doctor(snapshot: &Snapshot, doctor: &str) -> Snapshot {
    let records = snapshot
        .records
        .iter()
        .filter(|rec| rec.doctor == doctor)
        .cloned()
        .collect();

    Snapshot {
        records,
        has_date_column: snapshot.has_date_column,
    }
}

/// Min and max record dates, for default statement periods. Falls back to
/// today on both ends when no record carries a date.
pub fn date_bounds(snapshot: &Snapshot) -> (NaiveDate, NaiveDate) {
    let dates: Vec<NaiveDate> = snapshot.records.iter().filter_map(|rec| rec.date).collect();
    let today = Local::now().date_naive();
    let min = dates.iter().min().copied().unwrap_or(today);
    let max = dates.iter().max().copied().unwrap_or(today);
    (min, max)
}
