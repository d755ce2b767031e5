use std::sync::OnceLock;

use regex::Regex;

/// Numeric reading of a free-text fee string such as "₦350,000 - ₦500,000"
/// or "₦1,500,000+". `high == None` means open-ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceRange {
    pub low: u64,
    pub high: Option<u64>,
}

fn noise() -> &'static Regex {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    NOISE.get_or_init(|| Regex::new(r"[^0-9+\-]").expect("static pattern"))
}

impl PriceRange {
    /// Parse a fee string. Everything except digits, `-` and `+` is dropped
    /// first. A part with no leading digits reads as 0.
    pub fn parse(text: &str) -> Self {
        let cleaned = noise().replace_all(text, "");

        if cleaned.contains('+') {
            Self {
                low: leading_number(&cleaned.replace('+', "")),
                high: None,
            }
        } else if let Some((low, high)) = cleaned.split_once('-') {
            Self {
                low: leading_number(low),
                high: Some(leading_number(high)),
            }
        } else {
            let point = leading_number(&cleaned);
            Self {
                low: point,
                high: Some(point),
            }
        }
    }

    /// True if this range intersects `[min, max]`; an unset bound is open.
    pub fn overlaps(&self, min: Option<u64>, max: Option<u64>) -> bool {
        if let (Some(min), Some(high)) = (min, self.high) {
            if high < min {
                return false;
            }
        }
        if let Some(max) = max {
            if self.low > max {
                return false;
            }
        }
        true
    }
}

/// Integer value of the leading run of ASCII digits, or 0.
fn leading_number(s: &str) -> u64 {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().unwrap_or(0)
}
