//! Static conference theme catalog.
//!
//! Sub-themes are free text on the submission form; the parent theme is
//! derived from this table at write time and stored denormalized so the
//! dashboard can group by it without re-deriving.

pub const FALLBACK_THEME: &str = "Other";

const THEME_CATALOG: &[(&str, &[&str])] = &[
    (
        "Engineering & Technology",
        &[
            "Artificial Intelligence",
            "Renewable Energy",
            "Robotics & Automation",
            "Civil Infrastructure",
            "Materials Science",
        ],
    ),
    (
        "Health Sciences",
        &[
            "Public Health",
            "Biomedical Engineering",
            "Clinical Research",
            "Nutrition & Food Science",
        ],
    ),
    (
        "Environmental Sciences",
        &[
            "Climate Change",
            "Marine Ecology",
            "Sustainable Agriculture",
            "Water Resources",
        ],
    ),
    (
        "Social Sciences & Humanities",
        &[
            "Education",
            "Economics & Development",
            "Cultural Studies",
            "Public Policy",
        ],
    ),
];

/// All themes with their sub-themes, for the submission form.
pub fn catalog() -> &'static [(&'static str, &'static [&'static str])] {
    THEME_CATALOG
}

/// Derive the parent theme for a sub-theme. Unknown sub-themes are kept as
/// free text under the fallback theme.
pub fn theme_for(sub_theme: &str) -> &'static str {
    let needle = sub_theme.trim();
    for (theme, sub_themes) in THEME_CATALOG {
        if sub_themes.iter().any(|s| s.eq_ignore_ascii_case(needle)) {
            return theme;
        }
    }
    FALLBACK_THEME
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sub_theme_maps_to_theme() {
        assert_eq!(theme_for("Artificial Intelligence"), "Engineering & Technology");
        assert_eq!(theme_for("Public Health"), "Health Sciences");
        assert_eq!(theme_for("Water Resources"), "Environmental Sciences");
    }

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        assert_eq!(theme_for("  artificial intelligence "), "Engineering & Technology");
        assert_eq!(theme_for("CLIMATE CHANGE"), "Environmental Sciences");
    }

    #[test]
    fn test_unknown_sub_theme_falls_back() {
        assert_eq!(theme_for("Quantum Basket Weaving"), FALLBACK_THEME);
        assert_eq!(theme_for(""), FALLBACK_THEME);
    }

    #[test]
    fn test_catalog_has_no_duplicate_sub_themes() {
        let mut seen = std::collections::HashSet::new();
        for (_, sub_themes) in catalog() {
            for s in *sub_themes {
                assert!(seen.insert(s.to_lowercase()), "duplicate sub-theme {}", s);
            }
        }
    }
}
