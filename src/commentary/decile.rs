//! Decile-level commentary.

use crate::domain::DecileBucket;

/// Decile 1 minus decile 10 bad rate (percentage points) above which separation is good.
const GOOD_SEPARATION_PP: f64 = 5.0;

/// Usable (decile, bad rate) pairs in decile order.
pub(crate) fn usable_rates(deciles: &[DecileBucket]) -> Vec<(u8, f64)> {
    deciles
        .iter()
        .filter_map(|d| d.bad_rate.map(|r| (d.decile, r)))
        .collect()
}

pub fn generate_decile_commentary(deciles: &[DecileBucket]) -> String {
    if deciles.is_empty() {
        return "No decile data available; decile commentary not computed.".to_string();
    }
    let rates = usable_rates(deciles);
    let (top, bottom) = match rates.as_slice() {
        [] => return "Decile table available; bad rate by decile not computed.".to_string(),
        [_] => {
            return "Only one decile has observations; separation across score bands not computed.".to_string();
        }
        [top, .., bottom] => (*top, *bottom),
    };

    let (top_pct, bottom_pct) = (top.1 * 100.0, bottom.1 * 100.0);
    let separation_pp = top_pct - bottom_pct;

    if separation_pp > GOOD_SEPARATION_PP {
        let mut text = format!(
            "Decile {} (highest risk) bad rate {top_pct:.1}% versus {bottom_pct:.1}% in decile {}. \
             Good separation across score deciles.",
            top.0, bottom.0
        );
        let breaks = rank_order_breaks(&rates);
        if !breaks.is_empty() {
            let list: Vec<String> = breaks.iter().map(u8::to_string).collect();
            text.push_str(&format!(
                " Rank ordering breaks at decile(s) {}.",
                list.join(", ")
            ));
        }
        text
    } else if separation_pp > 0.0 {
        format!(
            "Decile {} bad rate: {top_pct:.1}%; decile {}: {bottom_pct:.1}%. \
             Moderate separation; review if a stronger monotonic pattern is expected.",
            top.0, bottom.0
        )
    } else {
        format!(
            "Decile {} bad rate ({top_pct:.1}%) is not above decile {} ({bottom_pct:.1}%). \
             The risk gradient is inverted or flat; review score direction and calibration.",
            top.0, bottom.0
        )
    }
}

/// Deciles whose bad rate exceeds the previous usable decile's.
fn rank_order_breaks(rates: &[(u8, f64)]) -> Vec<u8> {
    rates
        .windows(2)
        .filter(|w| w[1].1 > w[0].1)
        .map(|w| w[1].0)
        .collect()
}
