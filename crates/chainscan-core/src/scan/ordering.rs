//! Row orderings applied once a scan completes.
//!
//! All orderings share one rule: rows without any `Done` sub-row sink to the bottom no matter
//! what their numeric keys say. Sorting uses the stable `sort_by`, so equal rows keep their
//! relative order and sorting an already sorted set changes nothing.

use std::cmp::Ordering;

use crate::scan::{
    aggregator::{RowStatus, ScanRow, SubRow},
    fetchers::{BalancePayload, GasPricePayload},
};

/// Compares two `Done` sub-rows. Error sinking is handled by [`sort_rows`].
pub trait RowOrdering<P>: Send + Sync {
    fn compare(&self, a: &SubRow<P>, b: &SubRow<P>) -> Ordering;
}

/// The sub-row a row is ranked by: its first `Done` sub-row, mainnet first.
fn sort_key<P>(row: &ScanRow<P>) -> Option<&SubRow<P>> {
    row.sub_rows().map(|(_, sub)| sub).find(|sub| sub.status == RowStatus::Done)
}

/// Stable sort of `rows` by `ordering`, rows with nothing done last.
pub fn sort_rows<P>(rows: &mut [ScanRow<P>], ordering: &dyn RowOrdering<P>) {
    rows.sort_by(|a, b| match (sort_key(a), sort_key(b)) {
        (Some(a), Some(b)) => ordering.compare(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn by_payload<P>(a: &SubRow<P>, b: &SubRow<P>, cmp: impl Fn(&P, &P) -> Ordering) -> Ordering {
    match (&a.payload, &b.payload) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => Ordering::Equal,
    }
}

/// Balance view: converted USD value descending, then native balance descending.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceOrdering;

impl RowOrdering<BalancePayload> for BalanceOrdering {
    fn compare(&self, a: &SubRow<BalancePayload>, b: &SubRow<BalancePayload>) -> Ordering {
        by_payload(a, b, |a, b| {
            let usd_a = a.usd.unwrap_or(0.0);
            let usd_b = b.usd.unwrap_or(0.0);
            usd_b.total_cmp(&usd_a).then_with(|| b.wei.cmp(&a.wei))
        })
    }
}

/// Gas view: cheapest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct GasPriceOrdering;

impl RowOrdering<GasPricePayload> for GasPriceOrdering {
    fn compare(&self, a: &SubRow<GasPricePayload>, b: &SubRow<GasPricePayload>) -> Ordering {
        by_payload(a, b, |a, b| a.wei.cmp(&b.wei))
    }
}

/// Orders by measured latency, for any payload.
#[derive(Debug, Clone, Copy)]
pub struct LatencyOrdering {
    descending: bool,
}

impl LatencyOrdering {
    #[must_use]
    pub fn ascending() -> Self {
        Self { descending: false }
    }

    #[must_use]
    pub fn descending() -> Self {
        Self { descending: true }
    }
}

impl<P> RowOrdering<P> for LatencyOrdering {
    fn compare(&self, a: &SubRow<P>, b: &SubRow<P>) -> Ordering {
        let ordering = a.latency.cmp(&b.latency);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}
