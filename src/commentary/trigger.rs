//! KS trigger explanation using decile context.
//!
//! Weak separation in the riskiest deciles is the usual driver of a low KS,
//! so the explanation cites the decile 1 versus decile 10 bad-rate gap.

use crate::commentary::decile::usable_rates;
use crate::domain::DecileBucket;

const HEALTHY_KS: f64 = 0.3;
const RED_KS: f64 = 0.2;

pub fn generate_ks_trigger_insight(ks: Option<f64>, deciles: &[DecileBucket]) -> String {
    let Some(ks) = ks else {
        return "KS not available; no trigger assessment.".to_string();
    };
    if ks >= HEALTHY_KS {
        return format!(
            "KS = {ks:.3} (at or above {HEALTHY_KS}). Model discrimination is healthy; no trigger."
        );
    }
    if deciles.is_empty() {
        return format!("KS = {ks:.3}. No decile data available to explain which score bands drive this value.");
    }

    let rates = usable_rates(deciles);
    let (top, bottom) = match rates.as_slice() {
        [top, .., bottom] => (*top, *bottom),
        _ => {
            return format!(
                "KS = {ks:.3} (below {HEALTHY_KS}). Insufficient decile bad-rate data to explain the trigger."
            );
        }
    };
    let (d1, d10) = (top.1 * 100.0, bottom.1 * 100.0);
    let gap = d1 - d10;

    if ks < RED_KS {
        format!(
            "KS = {ks:.3} (red trigger: below {RED_KS}). \
             Decile {} bad rate ({d1:.1}%) vs decile {} ({d10:.1}%) shows {gap:.1}pp separation. \
             Weak discrimination in the riskiest deciles is the likely driver; \
             investigate the score distribution and recent population shift.",
            top.0, bottom.0
        )
    } else {
        format!(
            "KS = {ks:.3} (amber: between {RED_KS} and {HEALTHY_KS}). \
             Decile {} bad rate {d1:.1}%, decile {} {d10:.1}% ({gap:.1}pp gap). \
             Improving separation in the top deciles (1-3) could lift KS above {HEALTHY_KS}.",
            top.0, bottom.0
        )
    }
}
