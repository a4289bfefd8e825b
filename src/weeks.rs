/// Sort key of a week label: the first run of ASCII digits, or 0 when there is none.
///
/// Runs too long for `u64` saturate, so "Week 99999999999999999999" still sorts last.
pub fn week_key(label: &str) -> u64 {
    let digits: &str = match label.find(|c: char| c.is_ascii_digit()) {
        Some(start) => {
            let rest = &label[start..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        }
        None => return 0,
    };

    digits.parse().unwrap_or(u64::MAX)
}

/// Orders week labels by their embedded week number, then lexically.
///
/// Keys are computed once per label before sorting. Used for every week axis.
pub fn order_weeks<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut keyed: Vec<(u64, String)> = labels
        .into_iter()
        .map(Into::into)
        .map(|label: String| (week_key(&label), label))
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, label)| label).collect()
}

/// Whether a week falls inside an inclusive key range. Open bounds accept everything.
pub fn in_range(label: &str, from: Option<u64>, to: Option<u64>) -> bool {
    let key = week_key(label);
    from.map_or(true, |lo| key >= lo) && to.map_or(true, |hi| key <= hi)
}
