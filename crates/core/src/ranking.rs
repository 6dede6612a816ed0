//! Quote ranking and spread statistics

use std::cmp::Ordering;

use crate::Quote;

/// Ordered quotes with best/worst and spread
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub quotes: Vec<Quote>,
    pub best: Quote,
    pub worst: Quote,
    pub absolute_spread: f64,
    pub percent_spread: f64,
}

/// Rank quotes highest price first.
///
/// The sort is stable, so quotes with an identical price keep the order in
/// which they were handed in (source registration order). Callers must only
/// pass validated quotes: the percent spread divides by the worst price.
/// Returns `None` for an empty input.
pub fn rank(mut quotes: Vec<Quote>) -> Option<Ranking> {
    quotes.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(Ordering::Equal));

    let best = quotes.first()?.clone();
    let worst = quotes.last()?.clone();

    let absolute_spread = best.price - worst.price;
    let percent_spread = if quotes.len() > 1 {
        (best.price - worst.price) / worst.price * 100.0
    } else {
        0.0
    };

    Some(Ranking {
        quotes,
        best,
        worst,
        absolute_spread,
        percent_spread,
    })
}
