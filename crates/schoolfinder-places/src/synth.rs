//! Placeholder attributes for listings whose source has no notion of fees,
//! curriculum or facilities. Off unless explicitly enabled; the values are
//! random and must not be presented as facts.

use rand::Rng;

use schoolfinder_core::School;
use schoolfinder_core::vocabulary::{pick, random_price_range, random_subset, CURRICULA, FACILITIES};

/// Fill every absent price range, curriculum and facility list.
/// Fields that are already present are left alone.
pub fn fill_missing<R: Rng + ?Sized>(school: &mut School, rng: &mut R) {
    if school.price_range.is_none() && rng.gen_bool(0.7) {
        school.price_range = Some(random_price_range(rng));
    }
    if school.curriculum.is_none() {
        let mut tags = Vec::with_capacity(2);
        if let Some(primary) = pick(CURRICULA, rng) {
            tags.push(primary);
        }
        if !tags.iter().any(|t| t == "Nigerian") {
            tags.push("Nigerian".to_string());
        }
        school.curriculum = Some(tags);
    }
    if school.facilities.is_none() {
        school.facilities = Some(random_subset(FACILITIES, 0.5, rng));
    }
}
