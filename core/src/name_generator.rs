//! Deterministic company and merchant names for synthetic datasets.
//!
//! Same RNG stream in, same names out.

use crate::rng::StreamRng;

pub struct NameGenerator;

impl NameGenerator {
    /// "Prefix Industry Suffix N", e.g. "Summit Analytics Group 17".
    /// The ordinal keeps names unique within one dataset.
    pub fn company_name(rng: &mut StreamRng, ordinal: usize) -> String {
        format!(
            "{} {} {} {}",
            rng.pick(Self::prefixes()),
            rng.pick(Self::industries()),
            rng.pick(Self::suffixes()),
            ordinal
        )
    }

    /// "<Brand> <first word of category>", e.g. "Premier Hotels".
    pub fn merchant_name(rng: &mut StreamRng, category: &str) -> String {
        let head = category.split_whitespace().next().unwrap_or(category);
        format!("{} {}", rng.pick(Self::merchant_brands()), head)
    }

    fn prefixes() -> &'static [&'static str] {
        &[
            "Apex", "Global", "Horizon", "Nexus", "Pinnacle", "Quantum", "Stellar",
            "Summit", "Velocity", "Fusion", "Innovation", "Meridian", "Atlas", "Vertex",
        ]
    }

    fn industries() -> &'static [&'static str] {
        &[
            "Technologies", "Consulting", "Analytics", "Financial", "Logistics",
            "Systems", "Ventures", "Dynamics", "Industries", "Labs", "Solutions",
        ]
    }

    fn suffixes() -> &'static [&'static str] {
        &["Inc", "Ltd", "Corp", "Group", "LLC", "Holdings", "Partners"]
    }

    fn merchant_brands() -> &'static [&'static str] {
        &["Acme", "Global", "Premier", "Express"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    #[test]
    fn company_names_are_deterministic() {
        let mut a = RngBank::new(12345).for_stream(StreamSlot::Customers);
        let mut b = RngBank::new(12345).for_stream(StreamSlot::Customers);
        for i in 1..=20 {
            assert_eq!(NameGenerator::company_name(&mut a, i), NameGenerator::company_name(&mut b, i));
        }
    }

    #[test]
    fn company_names_have_four_parts_and_end_with_ordinal() {
        let mut rng = RngBank::new(12345).for_stream(StreamSlot::Customers);
        for i in 1..=50 {
            let name = NameGenerator::company_name(&mut rng, i);
            let parts: Vec<&str> = name.split_whitespace().collect();
            assert_eq!(parts.len(), 4, "unexpected company name shape: {name}");
            assert_eq!(parts[3], i.to_string());
        }
    }

    #[test]
    fn merchant_name_uses_first_word_of_category() {
        let mut rng = RngBank::new(1).for_stream(StreamSlot::Transactions);
        let name = NameGenerator::merchant_name(&mut rng, "Hotels & Lodging");
        assert!(name.ends_with(" Hotels"), "got {name}");
    }
}
