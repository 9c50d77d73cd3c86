//! Equal-population quartile binning.
//!
//! Edges are the 0, 25, 50, 75 and 100th percentiles of the population,
//! linearly interpolated between order statistics at position `p·(n−1)`.
//! A value falls in the first bin whose upper edge is `>=` it; the lowest
//! edge belongs to bin 1. All arithmetic is exact decimal.

use rust_decimal::Decimal;

use super::Metric;
use crate::error::EtlError;

/// Number of bins.
pub const QUARTILES: usize = 4;

/// Distinct values in `values`.
pub fn distinct_count(values: &[Decimal]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// The five quartile edges of a non-empty population, lowest first.
///
/// Returns `None` for an empty slice.
pub fn quartile_edges(values: &[Decimal]) -> Option<[Decimal; QUARTILES + 1]> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let last = sorted.len() - 1;

    let mut edges = [Decimal::ZERO; QUARTILES + 1];
    for (q, edge) in edges.iter_mut().enumerate() {
        // position q·last/4, split into whole and fractional parts
        let lo = q * last / QUARTILES;
        let rem = q * last % QUARTILES;
        let hi = (lo + 1).min(last);
        let frac = Decimal::from(rem) / Decimal::from(QUARTILES);
        *edge = sorted[lo] + (sorted[hi] - sorted[lo]) * frac;
    }
    Some(edges)
}

/// Bin (1-based) of `value` against `edges`.
pub fn bin_of(value: Decimal, edges: &[Decimal; QUARTILES + 1]) -> u8 {
    let idx = edges[1..]
        .iter()
        .position(|&upper| value <= upper)
        .unwrap_or(QUARTILES - 1);
    (idx + 1) as u8
}

/// 1-based ranks, ties broken by position (first occurrence ranks lower).
pub fn rank_first(values: &[Decimal]) -> Vec<Decimal> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].cmp(&values[b]).then(a.cmp(&b)));

    let mut ranks = vec![Decimal::ZERO; values.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = Decimal::from(rank + 1);
    }
    ranks
}

/// Quartile scores (`1..=4`) for one metric across the whole population.
///
/// Recency is inverted (smallest recency scores 4). Frequency is binned on
/// its first-occurrence rank rather than the raw count, because order counts
/// tie heavily; callers control tie order through the order of `raw`.
///
/// # Errors
///
/// * [`EtlError::DegeneratePopulation`] when `raw` has fewer than four
///   distinct values (checked on raw values, before any ranking).
/// * [`EtlError::DuplicateQuartileEdges`] when the edges are not strictly
///   increasing.
pub fn quartile_scores(raw: &[Decimal], metric: Metric) -> Result<Vec<u8>, EtlError> {
    let distinct = distinct_count(raw);
    if distinct < QUARTILES {
        return Err(EtlError::DegeneratePopulation { metric, distinct });
    }

    let binned = match metric {
        Metric::Frequency => rank_first(raw),
        Metric::Recency | Metric::MonetaryValue => raw.to_vec(),
    };
    let edges = quartile_edges(&binned).ok_or(EtlError::EmptyPopulation)?;
    if edges.windows(2).any(|w| w[0] >= w[1]) {
        return Err(EtlError::DuplicateQuartileEdges { metric });
    }

    Ok(binned
        .iter()
        .map(|&v| {
            let bin = bin_of(v, &edges);
            match metric {
                Metric::Recency => (QUARTILES as u8 + 1) - bin,
                Metric::Frequency | Metric::MonetaryValue => bin,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;

    fn decs(v: &[i64]) -> Vec<Decimal> {
        v.iter().copied().map(Decimal::from).collect()
    }

    #[test]
    fn edges_interpolate_linearly() {
        let edges = quartile_edges(&decs(&[1, 2, 3, 4, 5, 6, 7, 8])).unwrap();
        assert_eq!(edges, [dec!(1), dec!(2.75), dec!(4.5), dec!(6.25), dec!(8)]);

        let edges = quartile_edges(&decs(&[10, 20, 30, 40, 50])).unwrap();
        assert_eq!(edges, [dec!(10), dec!(20), dec!(30), dec!(40), dec!(50)]);
        assert!(quartile_edges(&[]).is_none());
    }

    #[test]
    fn bins_are_right_closed_with_lowest_edge_included() {
        let edges = [dec!(10), dec!(20), dec!(30), dec!(40), dec!(50)];
        assert_eq!(bin_of(dec!(10), &edges), 1);
        assert_eq!(bin_of(dec!(20), &edges), 1);
        assert_eq!(bin_of(dec!(20.01), &edges), 2);
        assert_eq!(bin_of(dec!(50), &edges), 4);
    }

    #[test]
    fn rank_first_breaks_ties_by_position() {
        let ranks = rank_first(&decs(&[3, 1, 3, 2, 1]));
        assert_eq!(ranks, decs(&[4, 1, 5, 3, 2]));
    }

    #[test]
    fn recency_is_inverted() {
        let scores = quartile_scores(&decs(&[1, 4, 7, 10]), Metric::Recency).unwrap();
        assert_eq!(scores, vec![4, 3, 2, 1]);
    }

    #[test]
    fn frequency_bins_on_rank() {
        // four distinct counts, with heavy ties on 1
        let raw = decs(&[1, 1, 1, 1, 2, 3, 4, 1]);
        let scores = quartile_scores(&raw, Metric::Frequency).unwrap();
        assert_eq!(scores, vec![1, 1, 2, 2, 3, 4, 4, 3]);
    }

    #[test]
    fn too_few_distinct_values_is_degenerate() {
        let err = quartile_scores(&decs(&[1, 1, 2, 3, 3]), Metric::Frequency).unwrap_err();
        assert!(matches!(
            err,
            EtlError::DegeneratePopulation { metric: Metric::Frequency, distinct: 3 }
        ));
    }

    #[test]
    fn collapsed_edges_are_rejected() {
        // four distinct values but most of the mass on one
        let raw = decs(&[1, 5, 5, 5, 5, 5, 5, 9, 10]);
        let err = quartile_scores(&raw, Metric::MonetaryValue).unwrap_err();
        assert!(matches!(
            err,
            EtlError::DuplicateQuartileEdges { metric: Metric::MonetaryValue }
        ));
    }

    proptest! {
        #[test]
        fn scores_are_monotone_and_in_range(raw in prop::collection::vec(0i64..10_000, 4..60)) {
            let values = decs(&raw);
            if let Ok(scores) = quartile_scores(&values, Metric::MonetaryValue) {
                prop_assert_eq!(scores.len(), values.len());
                for (i, a) in values.iter().enumerate() {
                    prop_assert!((1..=4).contains(&scores[i]));
                    for (j, b) in values.iter().enumerate() {
                        if a < b {
                            prop_assert!(scores[i] <= scores[j]);
                        }
                    }
                }
            }
        }
    }
}
