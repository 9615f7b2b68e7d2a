use std::collections::HashSet;

use inmo_types::Listing;

/// Drop later occurrences of an id already seen, keeping first-occurrence order.
///
/// Applied to the listings of a single assistant turn; two turns may show the
/// same property and both keep it.
pub fn dedupe(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::with_capacity(listings.len());
    listings
        .into_iter()
        .filter(|listing| seen.insert(listing.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn listing(id: &str, title: &str) -> Listing {
        Listing::new(id, title)
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_keeps_first_occurrence() {
        let out = dedupe(vec![
            listing("A", "first A"),
            listing("A", "second A"),
            listing("B", "B"),
            listing("A", "third A"),
        ]);
        assert_eq!(ids(&out), vec!["A", "B"]);
        assert_eq!(out[0].title, "first A");
    }

    #[test]
    fn test_empty_input() {
        assert!(dedupe(Vec::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_idempotent(raw in proptest::collection::vec(0u8..6, 0..30)) {
            let input: Vec<Listing> = raw.iter().enumerate()
                .map(|(i, id)| listing(&id.to_string(), &i.to_string()))
                .collect();
            let once = dedupe(input);
            let twice = dedupe(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_first_occurrence_order(raw in proptest::collection::vec(0u8..6, 0..30)) {
            let input: Vec<Listing> = raw.iter().enumerate()
                .map(|(i, id)| listing(&id.to_string(), &i.to_string()))
                .collect();

            let mut expected: Vec<String> = Vec::new();
            for id in &raw {
                let id = id.to_string();
                if !expected.contains(&id) {
                    expected.push(id);
                }
            }

            let out = dedupe(input);
            let got: Vec<String> = out.iter().map(|l| l.id.clone()).collect();
            prop_assert_eq!(&got, &expected);

            // each survivor is the earliest record carrying its id
            for l in &out {
                let first = raw.iter().position(|r| r.to_string() == l.id).unwrap();
                prop_assert_eq!(l.title.clone(), first.to_string());
            }
        }
    }
}
