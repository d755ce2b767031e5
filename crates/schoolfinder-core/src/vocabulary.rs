//! Listing vocabularies and the random draws over them, shared by the
//! catalog generator and the placeholder fill for third-party listings.

use rand::seq::SliceRandom;
use rand::Rng;

pub const CURRICULA: &[&str] = &["British", "Nigerian", "American", "Montessori", "IB", "Christian"];

pub const FACILITIES: &[&str] = &[
    "Swimming Pool",
    "Tech Lab",
    "Music Room",
    "Sports Field",
    "Art Studio",
    "Boarding",
    "Bus Service",
    "Sick Bay",
    "Library",
];

/// Fee band such as "₦450,000 - ₦2,300,000".
pub fn random_price_range<R: Rng + ?Sized>(rng: &mut R) -> String {
    let low: u64 = (300 + rng.gen_range(0..1700)) * 1000;
    let high: u64 = (2000 + rng.gen_range(0..1000)) * 1000;
    format!("₦{} - ₦{}", group_thousands(low), group_thousands(high))
}

/// Random subset of `vocabulary`, each entry kept with probability `p`.
pub fn random_subset<R: Rng + ?Sized>(vocabulary: &[&str], p: f64, rng: &mut R) -> Vec<String> {
    vocabulary
        .iter()
        .filter(|_| rng.gen_bool(p))
        .map(|s| s.to_string())
        .collect()
}

/// One random entry of `vocabulary`.
pub fn pick<R: Rng + ?Sized>(vocabulary: &[&str], rng: &mut R) -> Option<String> {
    vocabulary.choose(rng).map(|s| s.to_string())
}

/// 1500000 -> "1,500,000"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PriceRange;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(300_000), "300,000");
        assert_eq!(group_thousands(1_500_000), "1,500,000");
    }

    #[test]
    fn price_ranges_parse_back() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..20 {
            let text = random_price_range(&mut rng);
            let range = PriceRange::parse(&text);
            assert!((300_000..2_000_000).contains(&range.low), "{text}");
            assert!(range.high.is_some_and(|h| (2_000_000..3_000_000).contains(&h)), "{text}");
        }
    }

    #[test]
    fn subset_and_pick_draw_from_vocabulary() {
        let mut rng = StdRng::seed_from_u64(5);
        let subset = random_subset(FACILITIES, 1.0, &mut rng);
        assert_eq!(subset.len(), FACILITIES.len());
        assert!(random_subset(FACILITIES, 0.0, &mut rng).is_empty());
        let picked = pick(CURRICULA, &mut rng).unwrap();
        assert!(CURRICULA.contains(&picked.as_str()));
        assert!(pick(&[], &mut rng).is_none());
    }
}
