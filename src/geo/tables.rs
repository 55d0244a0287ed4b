//! Static geography tables.
//!
//! All keys are already normalized (ASCII, lowercase, single spaces) so they
//! can be compared directly against [`super::normalize`] output.

use super::MacroRegion::{self, Luzon, Mindanao, Visayas};

/// A province and the city names that should resolve to it.
#[derive(Debug, PartialEq, Eq)]
pub struct Province {
    /// Normalized province name.
    pub name: &'static str,
    /// Island group the province belongs to.
    pub region: MacroRegion,
    /// Normalized city or short names that identify this province.
    pub aliases: &'static [&'static str],
}

const fn p(
    name: &'static str,
    region: MacroRegion,
    aliases: &'static [&'static str],
) -> Province {
    Province {
        name,
        region,
        aliases,
    }
}

/// Every province the classifier recognises, grouped by island group.
pub static PROVINCES: &[Province] = &[
    // ── Luzon ──
    p("abra", Luzon, &[]),
    p("albay", Luzon, &["legazpi"]),
    p("apayao", Luzon, &[]),
    p("aurora", Luzon, &["baler"]),
    p("bataan", Luzon, &["balanga"]),
    p("batanes", Luzon, &["basco"]),
    p("batangas", Luzon, &["lipa", "tanauan"]),
    p("benguet", Luzon, &["baguio", "la trinidad"]),
    p("bulacan", Luzon, &["malolos", "meycauayan"]),
    p("cagayan", Luzon, &["tuguegarao"]),
    p("camarines norte", Luzon, &["daet"]),
    p("camarines sur", Luzon, &["iriga"]),
    p("catanduanes", Luzon, &["virac"]),
    p("cavite", Luzon, &["bacoor", "imus", "dasmarinas", "tagaytay"]),
    p("ifugao", Luzon, &["banaue"]),
    p("ilocos norte", Luzon, &["laoag"]),
    p("ilocos sur", Luzon, &["vigan"]),
    p("isabela", Luzon, &["ilagan", "cauayan", "santiago city"]),
    p("kalinga", Luzon, &["tabuk"]),
    p("la union", Luzon, &[]),
    p("laguna", Luzon, &["calamba", "san pablo", "binan"]),
    p("marinduque", Luzon, &[]),
    p("masbate", Luzon, &[]),
    p("mountain province", Luzon, &["sagada"]),
    p("nueva ecija", Luzon, &["cabanatuan"]),
    p("nueva vizcaya", Luzon, &[]),
    p("occidental mindoro", Luzon, &[]),
    p("oriental mindoro", Luzon, &["calapan"]),
    p("palawan", Luzon, &["puerto princesa"]),
    p("pampanga", Luzon, &["angeles city", "clark"]),
    p("pangasinan", Luzon, &["dagupan"]),
    p("quezon", Luzon, &["lucena"]),
    p("quirino", Luzon, &[]),
    p("rizal", Luzon, &["antipolo"]),
    p("romblon", Luzon, &[]),
    p("sorsogon", Luzon, &[]),
    p("tarlac", Luzon, &[]),
    p("zambales", Luzon, &["olongapo", "subic"]),
    // ── Visayas ──
    p("aklan", Visayas, &["kalibo", "boracay"]),
    p("antique", Visayas, &[]),
    p("biliran", Visayas, &[]),
    p("bohol", Visayas, &["tagbilaran"]),
    p("capiz", Visayas, &[]),
    p("cebu", Visayas, &["mandaue", "lapu-lapu"]),
    p("eastern samar", Visayas, &["borongan"]),
    p("guimaras", Visayas, &[]),
    p("iloilo", Visayas, &[]),
    p("leyte", Visayas, &["tacloban", "ormoc"]),
    p("negros occidental", Visayas, &["bacolod", "negros"]),
    p("negros oriental", Visayas, &["dumaguete"]),
    p("northern samar", Visayas, &["catarman"]),
    p("samar", Visayas, &["catbalogan"]),
    p("siquijor", Visayas, &[]),
    p("southern leyte", Visayas, &["maasin"]),
    // ── Mindanao ──
    p("agusan del norte", Mindanao, &["butuan"]),
    p("agusan del sur", Mindanao, &[]),
    p("basilan", Mindanao, &[]),
    p("bukidnon", Mindanao, &["malaybalay"]),
    p("camiguin", Mindanao, &[]),
    p("cotabato", Mindanao, &["kidapawan"]),
    p("davao de oro", Mindanao, &[]),
    p("davao del norte", Mindanao, &["tagum"]),
    p("davao del sur", Mindanao, &["davao", "digos"]),
    p("davao occidental", Mindanao, &[]),
    p("davao oriental", Mindanao, &[]),
    p("dinagat islands", Mindanao, &[]),
    p("lanao del norte", Mindanao, &["iligan"]),
    p("lanao del sur", Mindanao, &["marawi"]),
    p("maguindanao", Mindanao, &[]),
    p("misamis occidental", Mindanao, &["ozamiz"]),
    p("misamis oriental", Mindanao, &["cagayan de oro"]),
    p("sarangani", Mindanao, &[]),
    p("south cotabato", Mindanao, &["general santos", "koronadal"]),
    p("sultan kudarat", Mindanao, &[]),
    p("sulu", Mindanao, &["jolo"]),
    p("surigao del norte", Mindanao, &["surigao", "siargao"]),
    p("surigao del sur", Mindanao, &[]),
    p("tawi-tawi", Mindanao, &[]),
    p("zamboanga del norte", Mindanao, &["dipolog"]),
    p("zamboanga del sur", Mindanao, &["zamboanga", "pagadian"]),
    p("zamboanga sibugay", Mindanao, &[]),
];

/// District and city names that make up the metro hub.
pub static METRO_HUB_DISTRICTS: &[&str] = &[
    "metro manila",
    "national capital region",
    "ncr",
    "manila",
    "quezon city",
    "caloocan",
    "las pinas",
    "makati",
    "malabon",
    "mandaluyong",
    "marikina",
    "muntinlupa",
    "navotas",
    "paranaque",
    "pasay",
    "pasig",
    "pateros",
    "san juan",
    "taguig",
    "valenzuela",
];

/// Provinces bordering the metro hub, priced as short-haul.
pub static HUB_ADJACENT_PROVINCES: &[&str] =
    &["bulacan", "cavite", "laguna", "rizal", "batangas", "pampanga"];

/// Canonical label used for the metro hub when it stands in for a province.
pub const METRO_HUB_LABEL: &str = "metro manila";
