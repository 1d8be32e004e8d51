//! Static unit table and quantity conversion.
//!
//! Every recognised unit belongs to a dimension and carries a factor to the
//! dimension's base unit (grams, millilitres, pieces). Package units (cans,
//! jars, bunches) and unknown strings have no factor and only combine with
//! themselves.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Measurement dimension of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Mass,
    Volume,
    Count,
    Package,
    Unknown,
}

/// A unit string resolved against the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUnit {
    pub canonical: String,
    pub kind: UnitKind,
    /// Multiplier to the base unit of `kind`; 1.0 for package and unknown units
    pub factor: f64,
}

/// A summed quantity expressed in one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Combined {
    pub quantity: f64,
    pub unit: String,
    /// At least one input had to be converted to reach `unit`
    pub converted: bool,
}

const GRAMS_PER_OZ: f64 = 28.35;
const GRAMS_PER_LB: f64 = 453.6;
const ML_PER_TSP: f64 = 5.0;
const ML_PER_TBSP: f64 = 15.0;
const ML_PER_CUP: f64 = 240.0;
const ML_PER_FL_OZ: f64 = 29.57;
const ML_PER_PINT: f64 = 473.0;
const ML_PER_QUART: f64 = 946.0;
const ML_PER_GALLON: f64 = 3785.0;

/// Alias → (canonical, kind, factor).
static UNIT_TABLE: LazyLock<HashMap<&'static str, (&'static str, UnitKind, f64)>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();
        let mut add = |aliases: &[&'static str], canonical: &'static str, kind, factor| {
            for alias in aliases {
                m.insert(*alias, (canonical, kind, factor));
            }
        };

        // === Mass ===
        add(&["mg", "milligram", "milligrams"], "mg", UnitKind::Mass, 0.001);
        add(&["g", "gr", "gram", "grams", "gramme", "grammes"], "g", UnitKind::Mass, 1.0);
        add(&["kg", "kgs", "kilo", "kilos", "kilogram", "kilograms"], "kg", UnitKind::Mass, 1000.0);
        add(&["oz", "ounce", "ounces"], "oz", UnitKind::Mass, GRAMS_PER_OZ);
        add(&["lb", "lbs", "pound", "pounds"], "lb", UnitKind::Mass, GRAMS_PER_LB);

        // === Volume ===
        add(
            &["ml", "milliliter", "milliliters", "millilitre", "millilitres"],
            "ml",
            UnitKind::Volume,
            1.0,
        );
        add(&["l", "liter", "liters", "litre", "litres"], "l", UnitKind::Volume, 1000.0);
        add(&["tsp", "teaspoon", "teaspoons"], "tsp", UnitKind::Volume, ML_PER_TSP);
        add(&["tbsp", "tbs", "tablespoon", "tablespoons"], "tbsp", UnitKind::Volume, ML_PER_TBSP);
        add(&["cup", "cups"], "cup", UnitKind::Volume, ML_PER_CUP);
        add(
            &["fl oz", "floz", "fluid ounce", "fluid ounces"],
            "fl oz",
            UnitKind::Volume,
            ML_PER_FL_OZ,
        );
        add(&["pint", "pints", "pt"], "pint", UnitKind::Volume, ML_PER_PINT);
        add(&["quart", "quarts", "qt"], "quart", UnitKind::Volume, ML_PER_QUART);
        add(&["gallon", "gallons", "gal"], "gallon", UnitKind::Volume, ML_PER_GALLON);

        // === Count ===
        add(
            &[
                "", "pc", "pcs", "piece", "pieces", "each", "ea", "whole", "unit", "units", "x",
                "item", "items",
            ],
            "pcs",
            UnitKind::Count,
            1.0,
        );
        add(&["dozen", "dz"], "dozen", UnitKind::Count, 12.0);

        // === Packages ===
        add(&["can", "cans", "tin", "tins"], "can", UnitKind::Package, 1.0);
        add(&["jar", "jars"], "jar", UnitKind::Package, 1.0);
        add(&["bunch", "bunches"], "bunch", UnitKind::Package, 1.0);
        add(&["clove", "cloves"], "clove", UnitKind::Package, 1.0);
        add(&["slice", "slices"], "slice", UnitKind::Package, 1.0);
        add(&["pack", "packs", "packet", "packets", "pkg"], "pack", UnitKind::Package, 1.0);
        add(&["bottle", "bottles"], "bottle", UnitKind::Package, 1.0);
        add(&["box", "boxes"], "box", UnitKind::Package, 1.0);
        add(&["bag", "bags"], "bag", UnitKind::Package, 1.0);
        add(&["head", "heads"], "head", UnitKind::Package, 1.0);
        add(&["loaf", "loaves"], "loaf", UnitKind::Package, 1.0);
        add(&["stick", "sticks"], "stick", UnitKind::Package, 1.0);

        m
    });

/// Resolve a free-text unit.
pub fn parse_unit(raw: &str) -> ParsedUnit {
    let cleaned = raw.trim().trim_end_matches('.').to_lowercase();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    match UNIT_TABLE.get(cleaned.as_str()) {
        Some((canonical, kind, factor)) => ParsedUnit {
            canonical: (*canonical).to_string(),
            kind: *kind,
            factor: *factor,
        },
        None => ParsedUnit {
            canonical: cleaned,
            kind: UnitKind::Unknown,
            factor: 1.0,
        },
    }
}

/// Canonical spelling of a unit, or the cleaned input when unknown.
pub fn canonical_unit(raw: &str) -> String {
    parse_unit(raw).canonical
}

fn scalable(kind: UnitKind) -> bool {
    matches!(kind, UnitKind::Mass | UnitKind::Volume | UnitKind::Count)
}

/// Whether two units can be summed without judgement.
pub fn combinable(a: &str, b: &str) -> bool {
    let (a, b) = (parse_unit(a), parse_unit(b));
    if a.canonical == b.canonical {
        return true;
    }
    a.kind == b.kind && scalable(a.kind)
}

/// Convert `quantity` from one unit to another of the same dimension.
pub fn convert(quantity: f64, from: &str, to: &str) -> Option<f64> {
    let (from, to) = (parse_unit(from), parse_unit(to));
    if from.canonical == to.canonical {
        return Some(quantity);
    }
    if from.kind != to.kind || !scalable(from.kind) {
        return None;
    }
    Some(quantity * from.factor / to.factor)
}

/// Sum quantities that may be in different units.
///
/// Identical units keep that unit. Mixed units of one dimension are summed in
/// the base unit and promoted to kg / l at 1000. Returns `None` when the
/// units do not share a scalable dimension.
pub fn sum_quantities<'a, I>(parts: I) -> Option<Combined>
where
    I: IntoIterator<Item = (f64, &'a str)>,
{
    let parsed: Vec<(f64, ParsedUnit)> = parts
        .into_iter()
        .map(|(quantity, unit)| (quantity, parse_unit(unit)))
        .collect();
    let (_, first) = parsed.first()?;

    if parsed.iter().all(|(_, u)| u.canonical == first.canonical) {
        let total: f64 = parsed.iter().map(|(q, _)| q).sum();
        return Some(Combined {
            quantity: round2(total),
            unit: first.canonical.clone(),
            converted: false,
        });
    }

    let kind = first.kind;
    if !scalable(kind) || parsed.iter().any(|(_, u)| u.kind != kind) {
        return None;
    }

    let base_total: f64 = parsed.iter().map(|(q, u)| q * u.factor).sum();
    let (quantity, unit) = match kind {
        UnitKind::Mass if base_total >= 1000.0 => (base_total / 1000.0, "kg"),
        UnitKind::Mass => (base_total, "g"),
        UnitKind::Volume if base_total >= 1000.0 => (base_total / 1000.0, "l"),
        UnitKind::Volume => (base_total, "ml"),
        _ => (base_total, "pcs"),
    };
    Some(Combined {
        quantity: round2(quantity),
        unit: unit.to_string(),
        converted: true,
    })
}

/// Round to two decimals for display and storage.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(parse_unit("Grams").canonical, "g");
        assert_eq!(parse_unit(" tbsp. ").canonical, "tbsp");
        assert_eq!(parse_unit("").canonical, "pcs");
        assert_eq!(parse_unit("Fluid  Ounces").canonical, "fl oz");
        assert_eq!(parse_unit("cans").kind, UnitKind::Package);
        assert_eq!(parse_unit("sprig").kind, UnitKind::Unknown);
    }

    #[test]
    fn test_combinable() {
        assert!(combinable("g", "kg"));
        assert!(combinable("cup", "ml"));
        assert!(combinable("pcs", "dozen"));
        assert!(combinable("can", "cans"));
        assert!(!combinable("can", "g"));
        assert!(!combinable("jar", "can"));
        assert!(!combinable("g", "ml"));
        assert!(combinable("sprig", "Sprig"));
    }

    #[test]
    fn test_convert() {
        assert_eq!(convert(2.0, "kg", "g"), Some(2000.0));
        assert_eq!(convert(3.0, "tsp", "tbsp"), Some(1.0));
        assert_eq!(convert(1.0, "dozen", "pcs"), Some(12.0));
        assert_eq!(convert(1.0, "can", "g"), None);
    }

    #[test]
    fn test_sum_same_unit_keeps_unit() {
        let combined = sum_quantities([(2.0, "pcs"), (3.0, "piece")]).unwrap();
        assert_eq!(combined.quantity, 5.0);
        assert_eq!(combined.unit, "pcs");
        assert!(!combined.converted);
    }

    #[test]
    fn test_sum_mixed_mass_promotes_to_kg() {
        let combined = sum_quantities([(400.0, "g"), (1.0, "kg")]).unwrap();
        assert_eq!(combined.quantity, 1.4);
        assert_eq!(combined.unit, "kg");
        assert!(combined.converted);

        let combined = sum_quantities([(2.0, "tbsp"), (1.0, "tsp")]).unwrap();
        assert_eq!(combined.quantity, 35.0);
        assert_eq!(combined.unit, "ml");
    }

    #[test]
    fn test_sum_rejects_mixed_dimensions() {
        assert!(sum_quantities([(2.0, "can"), (400.0, "g")]).is_none());
        assert!(sum_quantities(std::iter::empty::<(f64, &str)>()).is_none());
    }
}
