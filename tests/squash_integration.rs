//! Integration tests for squashing branch history.
//!
//! Each test builds a history with the git CLI, squashes it through the
//! library and checks the result with the git CLI again.

mod support;

use proptest::prelude::*;

use githook::core::types::Oid;
use githook::squash::{self, update_branch, RefUpdateOutcome, SquashError, SquashRequest};
use support::{branch, TestRepo};

fn request(start: &Oid, message: &str) -> SquashRequest {
    SquashRequest::new(branch("main"), start.as_str(), message)
}

fn object_exists(repo: &TestRepo, oid: &Oid) -> bool {
    repo.git_cli(&["cat-file", "-t", oid.as_str()]) == "commit"
}

// =============================================================================
// Successful Squashes
// =============================================================================

#[test]
fn root_middle_tip_scenario() {
    let repo = TestRepo::empty();
    let a = repo.commit_file("a.txt", "a", "A");
    let b = repo.commit_as("Bea", "bea@example.com", "b.txt", "b", "B");
    let c = repo.commit_file("c.txt", "c", "C");

    let outcome = squash::run(&repo.git(), &request(&b, "B and C")).unwrap();
    let n = outcome.squashed.clone();

    assert_eq!(repo.tip("main"), n);
    assert_eq!(repo.parents_of(&n), vec![a.to_string()]);
    assert_eq!(repo.tree_of(&n), repo.tree_of(&c));
    assert_eq!(
        repo.git_cli(&["log", "-1", "--format=%an <%ae>|%cn <%ce>", n.as_str()]),
        "Bea <bea@example.com>|Bea <bea@example.com>"
    );
    assert_eq!(repo.git_cli(&["log", "-1", "--format=%s", n.as_str()]), "B and C");

    assert_eq!(outcome.previous_tip, c);
    assert_eq!(outcome.parent, Some(a.clone()));
    assert_eq!(outcome.squashed_count, 2);

    // Replaced commits stay in the object store.
    assert!(object_exists(&repo, &b));
    assert!(object_exists(&repo, &c));
    assert_eq!(repo.git_cli(&["rev-list", "--count", "main"]), "2");
}

#[test]
fn committer_time_follows_start_author() {
    let repo = TestRepo::new();
    let start = repo.commit_as("Ada", "ada@example.com", "a.txt", "a", "Add a");
    repo.commit_file("b.txt", "b", "Add b");

    let outcome = squash::run(&repo.git(), &request(&start, "Squashed")).unwrap();
    let dates = repo.git_cli(&["log", "-1", "--format=%aI|%cI", outcome.squashed.as_str()]);
    assert_eq!(dates, "2024-03-01T12:00:00+02:00|2024-03-01T12:00:00+02:00");
}

#[test]
fn root_start_makes_a_new_root() {
    let repo = TestRepo::new();
    let root = repo.head();
    repo.commit_file("a.txt", "a", "Add a");
    let tip = repo.commit_file("b.txt", "b", "Add b");

    let outcome = squash::run(&repo.git(), &request(&root, "Everything")).unwrap();

    assert!(repo.parents_of(&outcome.squashed).is_empty());
    assert_eq!(outcome.parent, None);
    assert_eq!(outcome.squashed_count, 3);
    assert_eq!(repo.tree_of(&outcome.squashed), repo.tree_of(&tip));
}

#[test]
fn single_commit_range() {
    let repo = TestRepo::new();
    let base = repo.head();
    let tip = repo.commit_file("a.txt", "a", "Add a");

    let outcome = squash::run(&repo.git(), &request(&tip, "Reworded")).unwrap();
    assert_eq!(outcome.squashed_count, 1);
    assert_eq!(repo.parents_of(&outcome.squashed), vec![base.to_string()]);
    assert_eq!(repo.git_cli(&["log", "-1", "--format=%s", "main"]), "Reworded");
}

#[test]
fn start_accepts_revision_expressions() {
    let repo = TestRepo::new();
    let base = repo.head();
    repo.commit_file("a.txt", "a", "Add a");
    repo.commit_file("b.txt", "b", "Add b");

    let req = SquashRequest::new(branch("main"), "main~1", "Both");
    let outcome = squash::run(&repo.git(), &req).unwrap();
    assert_eq!(outcome.parent, Some(base));
    assert_eq!(outcome.squashed_count, 2);
}

#[test]
fn start_reachable_only_through_merge() {
    let repo = TestRepo::new();
    let base = repo.head();
    repo.create_branch("side");
    repo.checkout("side");
    let side = repo.commit_file("side.txt", "s", "Side work");
    repo.checkout("main");
    repo.commit_file("main.txt", "m", "Main work");
    let merge = repo.merge("side", "Merge side");

    let outcome = squash::run(&repo.git(), &request(&side, "Flattened")).unwrap();

    assert_eq!(repo.parents_of(&outcome.squashed), vec![base.to_string()]);
    assert_eq!(repo.tree_of(&outcome.squashed), repo.tree_of(&merge));
    assert_eq!(outcome.squashed_count, 3);
}

#[test]
fn merge_start_keeps_first_parent_only() {
    let repo = TestRepo::new();
    repo.create_branch("side");
    repo.checkout("side");
    let side = repo.commit_file("side.txt", "s", "Side work");
    repo.checkout("main");
    let main_work = repo.commit_file("main.txt", "m", "Main work");
    let merge = repo.merge("side", "Merge side");
    let tip = repo.commit_file("after.txt", "x", "After merge");

    let outcome = squash::run(&repo.git(), &request(&merge, "Merge and after")).unwrap();

    let parents = repo.parents_of(&outcome.squashed);
    assert_eq!(parents, vec![main_work.to_string()]);
    assert!(!parents.contains(&side.to_string()));
    assert_eq!(repo.tree_of(&outcome.squashed), repo.tree_of(&tip));
}

#[test]
fn squashing_twice_keeps_tree_and_parent() {
    let repo = TestRepo::new();
    let base = repo.head();
    let start = repo.commit_file("a.txt", "a", "Add a");
    let tip = repo.commit_file("b.txt", "b", "Add b");
    let git = repo.git();

    let first = squash::run(&git, &request(&start, "Once")).unwrap();
    let second = squash::run(&git, &request(&first.squashed, "Twice")).unwrap();

    assert_eq!(repo.tree_of(&second.squashed), repo.tree_of(&tip));
    assert_eq!(repo.parents_of(&second.squashed), vec![base.to_string()]);
    assert_eq!(second.squashed_count, 1);
    assert_eq!(repo.tip("main"), second.squashed);
}

#[test]
fn squash_in_bare_repository() {
    let repo = TestRepo::new();
    let base = repo.head();
    let start = repo.commit_file("a.txt", "a", "Add a");
    let tip = repo.commit_file("b.txt", "b", "Add b");
    let bare = repo.bare_sibling("server.git");
    repo.git_cli(&["push", "-q", bare.to_str().unwrap(), "main"]);

    let git = githook::git::Git::open(&bare).unwrap();
    let outcome = squash::run(&git, &request(&start, "Server side")).unwrap();

    assert_eq!(outcome.previous_tip, tip);
    assert_eq!(outcome.parent, Some(base));
    assert_eq!(
        support::git_output(&bare, &["rev-parse", "main"]),
        outcome.squashed.to_string()
    );
}

#[test]
fn reflog_records_squash() {
    let repo = TestRepo::new();
    let start = repo.commit_file("a.txt", "a", "Add a");
    repo.commit_file("b.txt", "b", "Add b");

    squash::run(&repo.git(), &request(&start, "Both")).unwrap();
    let entry = repo.git_cli(&["reflog", "-n", "1", "--format=%gs", "main"]);
    assert_eq!(entry, format!("githook: squash 2 commits from {}", start.short(7)));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn start_outside_history() {
    let repo = TestRepo::new();
    repo.create_branch("other");
    repo.checkout("other");
    let elsewhere = repo.commit_file("o.txt", "o", "Elsewhere");
    repo.checkout("main");
    let tip = repo.commit_file("a.txt", "a", "Add a");

    let err = squash::run(&repo.git(), &request(&elsewhere, "msg")).unwrap_err();
    match err {
        SquashError::HistoryNotFound {
            branch: b,
            start,
            tip: t,
        } => {
            assert_eq!(b.as_str(), "main");
            assert_eq!(start, elsewhere);
            assert_eq!(t, tip);
        }
        other => panic!("expected HistoryNotFound, got {other:?}"),
    }
    assert_eq!(repo.tip("main"), tip);
}

#[test]
fn unknown_branch() {
    let repo = TestRepo::new();
    let head = repo.head();
    let req = SquashRequest::new(branch("missing"), head.as_str(), "msg");
    let err = squash::run(&repo.git(), &req).unwrap_err();
    assert!(matches!(err, SquashError::RefResolution { .. }), "{err:?}");
    assert!(!err.is_retryable());
}

#[test]
fn unknown_start() {
    let repo = TestRepo::new();
    let req = SquashRequest::new(branch("main"), "does-not-exist", "msg");
    let err = squash::run(&repo.git(), &req).unwrap_err();
    match err {
        SquashError::RefResolution { revision, .. } => assert_eq!(revision, "does-not-exist"),
        other => panic!("expected RefResolution, got {other:?}"),
    }
}

#[test]
fn empty_message_rejected() {
    let repo = TestRepo::new();
    let tip = repo.head();
    let err = squash::run(&repo.git(), &request(&tip, "  \n")).unwrap_err();
    assert!(matches!(err, SquashError::InvalidMessage { .. }));
    assert_eq!(repo.tip("main"), tip);
}

#[test]
fn branch_moved_after_expected_tip() {
    let repo = TestRepo::new();
    let start = repo.commit_file("a.txt", "a", "Add a");
    let observed = repo.commit_file("b.txt", "b", "Add b");
    let racer = repo.commit_file("c.txt", "c", "Concurrent push");

    let req = request(&start, "msg").with_expected_tip(observed.clone());
    let err = squash::run(&repo.git(), &req).unwrap_err();

    match err {
        SquashError::ConcurrentUpdate {
            expected, actual, ..
        } => {
            assert_eq!(expected, observed);
            assert_eq!(actual, racer.to_string());
        }
        other => panic!("expected ConcurrentUpdate, got {other:?}"),
    }
    assert_eq!(repo.tip("main"), racer);
}

#[test]
fn expected_tip_matching_branch_succeeds() {
    let repo = TestRepo::new();
    let start = repo.commit_file("a.txt", "a", "Add a");
    let tip = repo.commit_file("b.txt", "b", "Add b");

    let req = request(&start, "msg").with_expected_tip(tip.clone());
    let outcome = squash::run(&repo.git(), &req).unwrap();
    assert_eq!(outcome.previous_tip, tip);
}

#[test]
fn missing_branch_with_expected_tip() {
    let repo = TestRepo::new();
    let start = repo.commit_file("a.txt", "a", "Add a");
    let tip = repo.commit_file("b.txt", "b", "Add b");

    let req = SquashRequest::new(branch("missing"), start.as_str(), "msg").with_expected_tip(tip);
    let err = squash::run(&repo.git(), &req).unwrap_err();
    match err {
        SquashError::RefResolution { revision, .. } => assert_eq!(revision, "missing"),
        other => panic!("expected RefResolution, got {other:?}"),
    }
    assert!(!repo.git().ref_exists("refs/heads/missing"));
}

#[test]
fn start_checked_against_branch_not_expected_tip() {
    let repo = TestRepo::new();
    repo.create_branch("sibling");
    repo.checkout("sibling");
    let sibling = repo.commit_file("s.txt", "s", "Sibling work");
    repo.checkout("main");
    let start = repo.commit_file("a.txt", "a", "Add a");

    // start is main's tip but not in sibling's history.
    let req = request(&start, "msg").with_expected_tip(sibling);
    let err = squash::run(&repo.git(), &req).unwrap_err();
    match err {
        SquashError::ConcurrentUpdate { actual, .. } => assert_eq!(actual, start.to_string()),
        other => panic!("expected ConcurrentUpdate, got {other:?}"),
    }
    assert_eq!(repo.tip("main"), start);
}

#[test]
fn locked_branch_is_retryable() {
    let repo = TestRepo::new();
    let start = repo.commit_file("a.txt", "a", "Add a");
    let tip = repo.commit_file("b.txt", "b", "Add b");
    std::fs::write(repo.path().join(".git/refs/heads/main.lock"), "").unwrap();

    let err = squash::run(&repo.git(), &request(&start, "msg")).unwrap_err();
    assert!(matches!(err, SquashError::LockFailure { .. }), "{err:?}");
    assert!(err.is_retryable());
    assert_eq!(repo.tip("main"), tip);
}

#[test]
fn update_branch_outcomes() {
    let repo = TestRepo::new();
    let first = repo.head();
    let second = repo.commit_file("a.txt", "a", "Add a");
    let git = repo.git();
    let main = branch("main");

    match update_branch(&git, &main, &first, &first, "test") {
        RefUpdateOutcome::ConcurrentUpdate { expected, actual } => {
            assert_eq!(expected, first);
            assert_eq!(actual, second.to_string());
        }
        other => panic!("expected ConcurrentUpdate, got {other:?}"),
    }

    assert!(update_branch(&git, &main, &first, &second, "test").is_updated());
    assert_eq!(repo.tip("main"), first);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn linear_squash_keeps_tip_tree_and_start_parent(
        (len, start_index) in (1usize..6).prop_flat_map(|len| (Just(len), 0..len))
    ) {
        let repo = TestRepo::new();
        let root = repo.head();
        let mut commits = Vec::new();
        for i in 0..len {
            commits.push(repo.commit_file(&format!("f{i}.txt"), &i.to_string(), &format!("c{i}")));
        }
        let start = &commits[start_index];
        let expected_parent = if start_index == 0 { root } else { commits[start_index - 1].clone() };

        let outcome = squash::run(&repo.git(), &request(start, "squashed")).unwrap();

        prop_assert_eq!(repo.tree_of(&outcome.squashed), repo.tree_of(&commits[len - 1]));
        prop_assert_eq!(repo.parents_of(&outcome.squashed), vec![expected_parent.to_string()]);
        prop_assert_eq!(outcome.squashed_count, len - start_index);
    }
}
