use super::PoolError;
use crate::model::Person;
use chrono::{Days, NaiveDate};

/// Bornes `[date - gap, date + gap]` du repos imposé après une sélection réelle.
pub(super) fn gap_bounds(date: NaiveDate, gap: i64) -> Result<(NaiveDate, NaiveDate), PoolError> {
    let days = Days::new(gap.unsigned_abs());
    let start = date
        .checked_sub_days(days)
        .ok_or(PoolError::DateOutOfRange(date))?;
    let end = date
        .checked_add_days(days)
        .ok_or(PoolError::DateOutOfRange(date))?;
    Ok((start, end))
}

/// Tri stable par rang croissant : les égalités gardent l'ordre précédent.
pub(super) fn sort_by_rank(order: &mut [usize], members: &[Person]) {
    order.sort_by(|&a, &b| members[a].rank.total_cmp(&members[b].rank));
}
