//! # Deterministic fallback estimator
//!
//! ## Responsibility
//! Price a shipment from static geography tables alone. This is the path
//! every estimate takes when the completion service cannot be used.
//!
//! ## Guarantees
//! - Total: every request yields a quote, there is no error path
//! - Pure: no I/O, no shared state, identical requests give identical quotes
//! - Fee is at least [`crate::MIN_SHIPPING_FEE`] and days at least 1
//! - Weight surcharge is additive and non-decreasing in weight
//!
//! ## Tier order (first match wins)
//! ```text
//! same city → same province → hub↔adjacent → same island group
//!   → Luzon↔Visayas → Luzon↔Mindanao → Visayas↔Mindanao → default
//! ```

use crate::geo::{locate_normalized, normalize, MacroRegion, Place};
use crate::{
    finalize_fee, CourierType, Distance, EstimateRequest, EstimateResult, DEFAULT_SELLER_LOCATION,
};
use tracing::debug;

/// Weight included in every tier's base fee, in kilograms.
pub const FREE_WEIGHT_KG: f64 = 2.0;

/// Surcharge per kilogram above [`FREE_WEIGHT_KG`], in PHP.
pub const SURCHARGE_PER_KG: f64 = 10.0;

/// Geographic pricing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Seller location and buyer city name the same place.
    SameLocality,
    /// Seller and buyer are in the same province.
    SameProvince,
    /// One side is the metro hub, the other a province bordering it.
    HubAdjacent,
    /// Both sides are in the same island group.
    SameRegion(MacroRegion),
    /// Luzon and Visayas, either direction.
    LuzonVisayas,
    /// Luzon and Mindanao, either direction.
    LuzonMindanao,
    /// Visayas and Mindanao, either direction.
    VisayasMindanao,
    /// At least one side could not be classified.
    Default,
}

impl Tier {
    /// Fee before weight surcharge, in PHP.
    pub fn base_fee(&self) -> f64 {
        match self {
            Self::SameLocality => 40.0,
            Self::SameProvince => 45.0,
            Self::HubAdjacent => 55.0,
            Self::SameRegion(_) => 70.0,
            Self::LuzonVisayas => 120.0,
            Self::LuzonMindanao => 150.0,
            Self::VisayasMindanao => 130.0,
            Self::Default => 50.0,
        }
    }

    /// Delivery window in days as `(min, max)`.
    pub fn delivery_window(&self) -> (u32, u32) {
        match self {
            Self::SameLocality => (1, 1),
            Self::SameProvince => (1, 2),
            Self::HubAdjacent => (2, 2),
            Self::SameRegion(_) => (2, 3),
            Self::LuzonVisayas | Self::VisayasMindanao => (3, 4),
            Self::LuzonMindanao => (4, 5),
            Self::Default => (2, 2),
        }
    }

    /// Days reported to the caller: the upper end of the window.
    pub fn estimated_days(&self) -> u32 {
        self.delivery_window().1
    }

    /// Distance bucket.
    pub fn distance(&self) -> Distance {
        match self {
            Self::SameLocality | Self::SameProvince | Self::HubAdjacent => Distance::Short,
            Self::SameRegion(_) | Self::Default => Distance::Medium,
            Self::LuzonVisayas | Self::LuzonMindanao | Self::VisayasMindanao => Distance::Long,
        }
    }

    /// Short rationale shown to the buyer.
    pub fn explanation(&self) -> String {
        let text = match self {
            Self::SameLocality => return "Same city delivery".to_string(),
            Self::Default => return "Standard shipping".to_string(),
            Self::SameProvince => "Within same province".to_string(),
            Self::HubAdjacent => "Metro Manila to nearby province".to_string(),
            Self::SameRegion(region) => format!("Within {region}"),
            Self::LuzonVisayas => "Inter-island: Luzon to Visayas".to_string(),
            Self::LuzonMindanao => "Inter-island: Luzon to Mindanao".to_string(),
            Self::VisayasMindanao => "Inter-island: Visayas to Mindanao".to_string(),
        };
        match self.delivery_window() {
            (min, max) if min == max => format!("{text} ({max} days)"),
            (min, max) => format!("{text} ({min}-{max} days)"),
        }
    }

    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SameLocality => "same_locality",
            Self::SameProvince => "same_province",
            Self::HubAdjacent => "hub_adjacent",
            Self::SameRegion(_) => "same_region",
            Self::LuzonVisayas => "luzon_visayas",
            Self::LuzonMindanao => "luzon_mindanao",
            Self::VisayasMindanao => "visayas_mindanao",
            Self::Default => "default",
        }
    }

    fn cross_region(a: MacroRegion, b: MacroRegion) -> Self {
        use MacroRegion::{Luzon, Mindanao, Visayas};
        match (a, b) {
            (Luzon, Visayas) | (Visayas, Luzon) => Self::LuzonVisayas,
            (Luzon, Mindanao) | (Mindanao, Luzon) => Self::LuzonMindanao,
            (Visayas, Mindanao) | (Mindanao, Visayas) => Self::VisayasMindanao,
            (same, _) => Self::SameRegion(same),
        }
    }
}

/// Weight surcharge: `ceil((kg - 2) * 10)` above two kilograms, else zero.
///
/// The product is rounded to six decimals before the ceiling so that
/// representation noise (`2.1 - 2.0 = 0.10000000000000009`) does not add a peso.
/// Products too large for that scaling are already whole and are only
/// saturated at `f64::MAX`.
pub fn weight_surcharge(kg: f64) -> f64 {
    if !kg.is_finite() || kg <= FREE_WEIGHT_KG {
        return 0.0;
    }
    let raw = ((kg - FREE_WEIGHT_KG) * SURCHARGE_PER_KG).min(f64::MAX);
    let scaled = raw * 1e6;
    if !scaled.is_finite() {
        return raw.ceil();
    }
    ((scaled.round() / 1e6).ceil()).min(f64::MAX)
}

/// Pick the pricing tier for a request.
pub fn classify(req: &EstimateRequest) -> Tier {
    let mut seller = normalize(req.effective_seller());
    if !readable(&seller) {
        seller = normalize(DEFAULT_SELLER_LOCATION);
    }
    let city = normalize(&req.buyer_city);
    let province = normalize(&req.buyer_province);

    if readable(&city) && (seller.contains(&city) || city.contains(&seller)) {
        return Tier::SameLocality;
    }

    let seller_place = locate_normalized(&seller);
    let buyer_place = match locate_normalized(&province) {
        Place::Unknown => locate_normalized(&city),
        place => place,
    };

    if same_province(&seller_place, &buyer_place, &province) {
        return Tier::SameProvince;
    }

    if (seller_place.is_hub() && buyer_place.is_hub_adjacent())
        || (buyer_place.is_hub() && seller_place.is_hub_adjacent())
    {
        return Tier::HubAdjacent;
    }

    match (seller_place.region(), buyer_place.region()) {
        (Some(a), Some(b)) => Tier::cross_region(a, b),
        _ => Tier::Default,
    }
}

/// At least one letter or digit; empty strings and bare punctuation would
/// otherwise match inside any other name.
fn readable(norm: &str) -> bool {
    norm.chars().any(|c| c.is_ascii_alphanumeric())
}

fn same_province(seller: &Place, buyer: &Place, buyer_province: &str) -> bool {
    let Some(label) = seller.label() else {
        return false;
    };
    if seller == buyer {
        return true;
    }
    readable(buyer_province)
        && (label == buyer_province
            || label.contains(buyer_province)
            || buyer_province.contains(label))
}

/// Rule-based estimator over the static geography tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEstimator;

impl RuleEstimator {
    /// Create the estimator. It carries no state.
    pub fn new() -> Self {
        Self
    }

    /// Price a request. Never fails.
    pub fn quote(&self, req: &EstimateRequest) -> EstimateResult {
        let tier = classify(req);
        let weight = req.effective_weight();
        let surcharge = weight_surcharge(weight);
        let fee = finalize_fee(tier.base_fee() + surcharge);

        debug!(
            seller = %req.effective_seller(),
            buyer_city = %req.buyer_city,
            buyer_province = %req.buyer_province,
            tier = tier.label(),
            weight,
            fee,
            "fallback quote"
        );

        let mut explanation = tier.explanation();
        if surcharge > 0.0 {
            explanation.push_str(&format!(", +PHP {surcharge:.0} for {weight} kg"));
        }

        EstimateResult {
            success: true,
            shipping_fee: fee,
            estimated_days: tier.estimated_days(),
            courier_type: CourierType::Standard,
            distance: tier.distance(),
            explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(seller: &str, city: &str, province: &str) -> EstimateRequest {
        EstimateRequest::new(seller, city, province)
    }

    #[test]
    fn test_same_city_is_first_tier() {
        assert_eq!(classify(&req("Manila", "Manila", "Metro Manila")), Tier::SameLocality);
        assert_eq!(classify(&req("Cebu City", "cebu", "Cebu")), Tier::SameLocality);
        // Buyer city containing the seller also counts.
        assert_eq!(classify(&req("Makati", "Makati City", "")), Tier::SameLocality);
    }

    #[test]
    fn test_empty_city_never_matches_locality() {
        assert_ne!(classify(&req("Manila", "", "Ilocos Norte")), Tier::SameLocality);
    }

    #[test]
    fn test_unreadable_seller_is_treated_as_hub() {
        for seller in ["\u{200B}", "\u{FEFF}", "-", "\u{200B}\u{FEFF}"] {
            assert_eq!(
                classify(&req(seller, "Davao City", "Davao")),
                Tier::LuzonMindanao,
                "{seller:?}"
            );
            assert_ne!(
                classify(&req(seller, "Lapu-Lapu", "Cebu")),
                Tier::SameLocality,
                "{seller:?}"
            );
        }
    }

    #[test]
    fn test_punctuation_city_never_matches_locality() {
        assert_ne!(classify(&req("Lapu-Lapu", "-", "")), Tier::SameLocality);
        assert_ne!(classify(&req("Lapu-Lapu", "-", "-")), Tier::SameProvince);
    }

    #[test]
    fn test_same_province_by_extracted_province() {
        assert_eq!(classify(&req("Lipa", "Tanauan", "Batangas")), Tier::SameProvince);
        assert_eq!(classify(&req("Makati", "Taguig", "Metro Manila")), Tier::SameProvince);
        assert_eq!(classify(&req("Dumaguete", "Bais", "Negros Oriental")), Tier::SameProvince);
    }

    #[test]
    fn test_same_province_when_province_field_is_blank() {
        assert_eq!(classify(&req("Baguio", "La Trinidad", "")), Tier::SameProvince);
    }

    #[test]
    fn test_hub_adjacent_both_directions() {
        assert_eq!(classify(&req("Manila", "Lipa", "Batangas")), Tier::HubAdjacent);
        assert_eq!(classify(&req("Bacoor, Cavite", "Pasig", "Metro Manila")), Tier::HubAdjacent);
    }

    #[test]
    fn test_same_region() {
        assert_eq!(
            classify(&req("Manila", "Laoag", "Ilocos Norte")),
            Tier::SameRegion(MacroRegion::Luzon)
        );
        assert_eq!(
            classify(&req("Iloilo City", "Tacloban", "Leyte")),
            Tier::SameRegion(MacroRegion::Visayas)
        );
    }

    #[test]
    fn test_cross_region_tiers() {
        assert_eq!(classify(&req("Manila", "Cebu City", "Cebu")), Tier::LuzonVisayas);
        assert_eq!(classify(&req("Manila", "Davao City", "Davao")), Tier::LuzonMindanao);
        assert_eq!(classify(&req("Cebu City", "Davao City", "Davao")), Tier::VisayasMindanao);
    }

    #[test]
    fn test_blank_seller_defaults_to_hub() {
        assert_eq!(classify(&req("", "Lipa", "Batangas")), Tier::HubAdjacent);
        assert_eq!(classify(&req("  ", "Davao City", "Davao")), Tier::LuzonMindanao);
    }

    #[test]
    fn test_unknown_buyer_is_default() {
        assert_eq!(classify(&req("Manila", "", "")), Tier::Default);
        assert_eq!(classify(&req("Manila", "Mars", "Mars")), Tier::Default);
        assert_eq!(classify(&req("Gotham", "Cebu City", "Cebu")), Tier::Default);
    }

    #[test]
    fn test_weight_surcharge() {
        assert_eq!(weight_surcharge(0.5), 0.0);
        assert_eq!(weight_surcharge(2.0), 0.0);
        assert_eq!(weight_surcharge(2.1), 1.0);
        assert_eq!(weight_surcharge(2.3), 3.0);
        assert_eq!(weight_surcharge(2.05), 1.0);
        assert_eq!(weight_surcharge(5.0), 30.0);
        assert_eq!(weight_surcharge(f64::NAN), 0.0);
    }

    #[test]
    fn test_weight_surcharge_stays_finite_for_huge_weights() {
        assert_eq!(
            weight_surcharge(1e305),
            (1e305 - FREE_WEIGHT_KG) * SURCHARGE_PER_KG
        );
        assert_eq!(weight_surcharge(f64::MAX), f64::MAX);
        assert!(weight_surcharge(1e303) >= weight_surcharge(1e302));
    }

    #[test]
    fn test_huge_weight_never_prices_below_lighter_one() {
        let route = req("Cebu City", "Davao City", "Davao");
        let heavy = RuleEstimator.quote(&route.clone().with_weight(1e6));
        assert_eq!(heavy.shipping_fee, 10_000_110.0);

        for kg in [1e302, 1e305, 1e307, f64::MAX] {
            let heavier = RuleEstimator.quote(&route.clone().with_weight(kg));
            assert!(heavier.shipping_fee >= heavy.shipping_fee, "{kg} kg");
            assert!(heavier.shipping_fee.is_finite(), "{kg} kg");
            assert!(!heavier.explanation.contains("inf"), "{kg} kg");
        }
    }

    #[test]
    fn test_quote_scenarios() {
        let q = RuleEstimator.quote(&req("Manila", "Manila", "Metro Manila").with_weight(1.0));
        assert_eq!((q.shipping_fee, q.estimated_days, q.distance), (40.0, 1, Distance::Short));
        assert_eq!(q.explanation, "Same city delivery");

        let q = RuleEstimator.quote(&req("Manila", "Lipa", "Batangas"));
        assert_eq!((q.shipping_fee, q.distance), (55.0, Distance::Short));

        let q = RuleEstimator.quote(&req("Cebu City", "Davao City", "Davao"));
        assert_eq!((q.shipping_fee, q.distance), (130.0, Distance::Long));
        assert_eq!(q.estimated_days, 4);

        let q = RuleEstimator.quote(&req("Manila", "Laoag", "Ilocos Norte"));
        assert_eq!((q.shipping_fee, q.distance), (70.0, Distance::Medium));

        let q = RuleEstimator.quote(&req("Manila", "Manila", "Metro Manila").with_weight(5.0));
        assert_eq!(q.shipping_fee, 70.0);

        let q = RuleEstimator.quote(&req("Manila", "Mars", ""));
        assert_eq!((q.shipping_fee, q.estimated_days, q.distance), (50.0, 2, Distance::Medium));
        assert_eq!(q.explanation, "Standard shipping");
    }

    #[test]
    fn test_quote_invalid_weight_uses_default() {
        let q = RuleEstimator.quote(&req("Manila", "Manila", "").with_weight(-3.0));
        assert_eq!(q.shipping_fee, 40.0);
    }

    #[test]
    fn test_surcharge_is_mentioned_in_explanation() {
        let q = RuleEstimator.quote(&req("Manila", "Cebu City", "Cebu").with_weight(4.0));
        assert_eq!(q.shipping_fee, 140.0);
        assert!(q.explanation.contains("+PHP 20"), "{}", q.explanation);
    }

    #[test]
    fn test_tier_windows_are_ordered_and_positive() {
        let tiers = [
            Tier::SameLocality,
            Tier::SameProvince,
            Tier::HubAdjacent,
            Tier::SameRegion(MacroRegion::Mindanao),
            Tier::LuzonVisayas,
            Tier::LuzonMindanao,
            Tier::VisayasMindanao,
            Tier::Default,
        ];
        for tier in tiers {
            let (min, max) = tier.delivery_window();
            assert!(min >= 1 && min <= max, "{tier:?}");
            assert!(tier.base_fee() >= crate::MIN_SHIPPING_FEE);
        }
    }

    #[test]
    fn test_explanation_names_the_window() {
        assert_eq!(Tier::SameProvince.explanation(), "Within same province (1-2 days)");
        assert_eq!(
            Tier::SameRegion(MacroRegion::Luzon).explanation(),
            "Within Luzon (2-3 days)"
        );
        assert_eq!(Tier::HubAdjacent.explanation(), "Metro Manila to nearby province (2 days)");
    }
}
