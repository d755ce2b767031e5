//! Mock catalog generator used when no real listing data is available.

use rand::Rng;

use schoolfinder_core::school::{Address, ContactInfo, Coordinates};
use schoolfinder_core::vocabulary::{random_price_range, random_subset, CURRICULA, FACILITIES};
use schoolfinder_core::{School, SchoolId};

pub const SCHOOL_NAMES: &[&str] = &[
    "Grace Springs College",
    "Imperial Lights College",
    "Pinefield Schools",
    "Meadow Hall",
    "Greensprings School",
    "Corona School",
    "Chrisland School",
    "Dowen College",
    "British International School",
    "Lekki British School",
    "Whitesands School",
    "Grange School",
    "St. Saviours School",
    "Children International School",
    "Riverbank School",
    "Emerald Schools",
    "Rainbow College",
    "Temple School",
];

pub const LOCALITIES: &[&str] = &["Lekki", "Ikeja", "Victoria Island", "Surulere"];

/// Generate `count` listings. Deterministic for a seeded `rng`.
pub fn generate_catalog<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<School> {
    (0..count).map(|i| generate_school(i, rng)).collect()
}

fn generate_school<R: Rng + ?Sized>(index: usize, rng: &mut R) -> School {
    let base = SCHOOL_NAMES[index % SCHOOL_NAMES.len()];
    let cycle = index / SCHOOL_NAMES.len();
    let name = if cycle > 0 {
        format!("{base} {}", cycle + 1)
    } else {
        base.to_string()
    };
    let slug: String = base
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let price_range = rng.gen_bool(0.7).then(|| random_price_range(rng));

    let curriculum = rng.gen_bool(0.8).then(|| {
        vec![
            CURRICULA[index % CURRICULA.len()].to_string(),
            "Nigerian".to_string(),
        ]
    });

    let facilities = random_subset(FACILITIES, 0.5, rng);

    School {
        id: SchoolId::from_raw(format!("gmap-{}", index + 1)),
        name,
        coordinates: Coordinates {
            lat: round6(6.45 + rng.gen_range(0.0..0.2)),
            lng: round6(3.40 + rng.gen_range(0.0..0.2)),
        },
        address: Address {
            street: format!("{} Random Street", rng.gen_range(1..=100)),
            lga: LOCALITIES[index % LOCALITIES.len()].to_string(),
            state: "Lagos".into(),
        },
        price_range,
        curriculum,
        facilities: Some(facilities),
        school_type: Some(if index % 3 == 0 { "Boarding" } else { "Day" }.to_string()),
        verified: index < 5,
        rating: (rng.gen_range(3.5..=5.0_f64) * 10.0).round() / 10.0,
        contact_info: ContactInfo {
            phone: format!("+234 8{}0 000 0000", rng.gen_range(0..10)),
            email: Some(format!("info@{slug}.com")),
            website: Some(format!("https://{slug}.com")),
        },
        image: None,
    }
}

fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}
