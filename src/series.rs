//! Overview chart series built straight from report count maps.

use std::collections::BTreeMap;

use crate::models::{CountMap, LabeledSeries};
use crate::weeks;

/// Ranks a count map: count descending, label ascending on ties.
pub fn ranked_counts(map: &CountMap) -> LabeledSeries<u64> {
    let mut pairs: Vec<(&String, &u64)> = map.iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    pairs
        .into_iter()
        .map(|(label, count)| (label.clone(), *count))
        .collect()
}

/// Week keyed values laid out along the shared week axis.
pub fn weekly_series<V: Copy>(map: &BTreeMap<String, V>) -> LabeledSeries<V> {
    weeks::order_weeks(map.keys().cloned())
        .into_iter()
        .filter_map(|week| map.get(&week).map(|value| (week, *value)))
        .collect()
}
