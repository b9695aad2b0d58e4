//! Skip-list reconciliation
//!
//! A test that fails on the unmodified base or on the clean merge commit is
//! not a valid signal about the patch under test; the union of the two red
//! sets is excluded from every later stage's verdict.

use patch_qa_core::{Result, TestIdentity, TicketRegistry};
use std::collections::BTreeSet;

/// Candidate skip set: union of the base and merge red sets
#[must_use]
pub fn compute(
    base_red: &BTreeSet<TestIdentity>,
    merge_red: &BTreeSet<TestIdentity>,
) -> BTreeSet<TestIdentity> {
    base_red.union(merge_red).cloned().collect()
}

/// Persist the skip set into the ticket's registry row
///
/// Tokens are written sorted and comma-joined, wholesale-replacing any
/// prior entry.
///
/// # Errors
///
/// Fails loudly when the ticket is not a pre-registered row, so results
/// for unknown tickets are never silently orphaned.
pub fn persist(
    registry: &dyn TicketRegistry,
    ticket: &str,
    skip: &BTreeSet<TestIdentity>,
) -> Result<()> {
    let tokens: Vec<String> = skip.iter().map(TestIdentity::token).collect();
    registry.update_skipped_tests(ticket, &tokens.join(","))
}

/// Reload a previously persisted skip set
///
/// Malformed fragments are dropped silently; a missing ticket row is a
/// hard error, distinguishing "ticket known, nothing to skip" from
/// "ticket never evaluated".
///
/// # Errors
///
/// Returns the registry's not-found error for unknown tickets.
pub fn load(registry: &dyn TicketRegistry, ticket: &str) -> Result<BTreeSet<TestIdentity>> {
    let record = registry.get(ticket)?;
    let cell = record.skipped_tests.unwrap_or_default();
    Ok(cell
        .split(|c| c == ',' || c == '\n')
        .filter_map(TestIdentity::parse_token)
        .collect())
}

/// Build the surefire exclusion filter for a skip set
///
/// Non-empty sets yield `*,!ClassA#m1,!ClassB#m2,…` with tokens in sorted
/// order so the emitted filter, and therefore the build-tool invocation,
/// is deterministic. An empty set yields `None`: run everything.
#[must_use]
pub fn build_filter(skip: &BTreeSet<TestIdentity>) -> Option<String> {
    if skip.is_empty() {
        return None;
    }
    let mut filter = String::from("*");
    for identity in skip {
        filter.push_str(",!");
        filter.push_str(&identity.token());
    }
    Some(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use patch_qa_core::CsvTicketRegistry;
    use proptest::prelude::*;
    use std::io::Write as _;

    fn registry_with(content: &str) -> (tempfile::TempDir, CsvTicketRegistry) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pr_states.csv");
        let mut file = std::fs::File::create(&path).expect("create csv");
        file.write_all(content.as_bytes()).expect("write csv");
        (dir, CsvTicketRegistry::new(path))
    }

    fn identities(tokens: &[&str]) -> BTreeSet<TestIdentity> {
        tokens
            .iter()
            .filter_map(|token| TestIdentity::parse_token(token))
            .collect()
    }

    #[test]
    fn test_compute_is_union() {
        let base = identities(&["A#x", "B#y"]);
        let merge = identities(&["B#y", "C#z"]);
        let skip = compute(&base, &merge);
        assert_eq!(skip, identities(&["A#x", "B#y", "C#z"]));
    }

    #[test]
    fn test_compute_commutative() {
        let base = identities(&["A#x"]);
        let merge = identities(&["B#y"]);
        assert_eq!(compute(&base, &merge), compute(&merge, &base));
    }

    #[test]
    fn test_persist_then_load_round_trip() {
        let (_dir, registry) =
            registry_with("ticket,before_commit,merge_commit\nEAK-76,a,b\n");
        let skip = identities(&["FooTest#bar", "BazTest#boom"]);

        persist(&registry, "EAK-76", &skip).expect("persist");
        let loaded = load(&registry, "EAK-76").expect("load");

        assert_eq!(loaded, skip);
    }

    #[test]
    fn test_persist_unknown_ticket_aborts() {
        let (_dir, registry) =
            registry_with("ticket,before_commit,merge_commit\nEAK-76,a,b\n");
        let err = persist(&registry, "EAK-99", &identities(&["A#x"])).expect_err("unknown");
        assert!(matches!(err, patch_qa_core::Error::TicketNotFound { .. }));
    }

    #[test]
    fn test_load_unknown_ticket_aborts() {
        let (_dir, registry) =
            registry_with("ticket,before_commit,merge_commit\nEAK-76,a,b\n");
        let err = load(&registry, "EAK-99").expect_err("unknown");
        assert!(matches!(err, patch_qa_core::Error::TicketNotFound { .. }));
    }

    #[test]
    fn test_load_known_ticket_without_entry_is_empty() {
        let (_dir, registry) =
            registry_with("ticket,before_commit,merge_commit\nEAK-76,a,b\n");
        let loaded = load(&registry, "EAK-76").expect("load");
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_drops_malformed_fragments() {
        let (_dir, registry) = registry_with(
            "ticket,before_commit,merge_commit,skipped_tests\nEAK-76,a,b,\"A#x,garbage,B#y,#\"\n",
        );
        let loaded = load(&registry, "EAK-76").expect("load");
        assert_eq!(loaded, identities(&["A#x", "B#y"]));
    }

    #[test]
    fn test_load_newline_separated_tokens() {
        let (_dir, registry) = registry_with(
            "ticket,before_commit,merge_commit,skipped_tests\nEAK-76,a,b,\"A#x\nB#y\"\n",
        );
        let loaded = load(&registry, "EAK-76").expect("load");
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_build_filter_empty_runs_everything() {
        assert!(build_filter(&BTreeSet::new()).is_none());
    }

    #[test]
    fn test_build_filter_sorted_exclusions() {
        let skip = identities(&["ZTest#late", "ATest#early"]);
        let filter = build_filter(&skip).expect("filter");
        assert_eq!(filter, "*,!ATest#early,!ZTest#late");
    }

    #[test]
    fn test_build_filter_deterministic() {
        let skip = identities(&["B#y", "A#x", "C#z"]);
        assert_eq!(build_filter(&skip), build_filter(&skip));
    }

    proptest! {
        #[test]
        fn prop_compute_commutative(
            base in proptest::collection::btree_set(
                ("[A-Z][a-z]{1,6}", "[a-z]{1,6}")
                    .prop_map(|(c, m)| TestIdentity::new(c, m)),
                0..8,
            ),
            merge in proptest::collection::btree_set(
                ("[A-Z][a-z]{1,6}", "[a-z]{1,6}")
                    .prop_map(|(c, m)| TestIdentity::new(c, m)),
                0..8,
            ),
        ) {
            prop_assert_eq!(compute(&base, &merge), compute(&merge, &base));
        }

        #[test]
        fn prop_round_trip_well_formed_sets(
            tokens in proptest::collection::btree_set(
                ("[A-Z][A-Za-z0-9]{0,8}", "[a-z][A-Za-z0-9]{0,8}")
                    .prop_map(|(c, m)| TestIdentity::new(c, m)),
                1..10,
            ),
        ) {
            let (_dir, registry) =
                registry_with("ticket,before_commit,merge_commit\nT-1,a,b\n");
            persist(&registry, "T-1", &tokens).expect("persist");
            let loaded = load(&registry, "T-1").expect("load");
            prop_assert_eq!(loaded, tokens);
        }
    }
}
