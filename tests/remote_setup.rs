//! Integration tests for remote setup against a mock forge.
//!
//! The mock forge hands out clone URLs inside a temp directory, so pushes
//! land in real bare repositories.

mod support;

use githook::core::types::RepoName;
use githook::forge::mock::{MockForge, MockOperation};
use githook::forge::{ForgeError, Protocol};
use githook::remote::{setup_remote, RemoteSetupError, SetupOptions};
use support::{git_output, run_git, TestRepo};

/// A mock forge whose repositories live in `<scratch>/remotes`, with the
/// bare repository for `name` already created.
fn forge_for(repo: &TestRepo, name: &str) -> (MockForge, std::path::PathBuf) {
    let remotes = repo.scratch().join("remotes");
    std::fs::create_dir_all(&remotes).unwrap();
    run_git(&remotes, &["init", "-q", "--bare", &format!("{}.git", name)]);
    let forge = MockForge::with_url_base(remotes.to_str().unwrap());
    (forge, remotes.join(format!("{}.git", name)))
}

#[tokio::test]
async fn creates_configures_and_pushes_all_branches() {
    let repo = TestRepo::new();
    repo.create_branch("feature");
    repo.checkout("feature");
    let feature = repo.commit_file("f.txt", "f", "Feature work");
    repo.checkout("main");
    let main = repo.head();
    let (forge, bare) = forge_for(&repo, "project");

    let outcome = setup_remote(&repo.git(), &forge, None, &SetupOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.repo_name.as_str(), "project");
    assert_eq!(outcome.remote, "origin");
    assert_eq!(outcome.url, bare.to_str().unwrap());
    let pushed: Vec<&str> = outcome.pushed.iter().map(|b| b.as_str()).collect();
    assert_eq!(pushed, ["feature", "main"]);

    assert_eq!(
        forge.operations(),
        vec![MockOperation::CreateRepository {
            name: "project".into(),
            private: true,
        }]
    );

    assert_eq!(repo.git_cli(&["config", "remote.origin.url"]), outcome.url);
    assert_eq!(
        repo.git_cli(&["config", "remote.origin.fetch"]),
        "+refs/heads/*:refs/remotes/origin/*"
    );
    for name in ["main", "feature"] {
        assert_eq!(
            repo.git_cli(&["config", &format!("branch.{}.remote", name)]),
            "origin"
        );
        assert_eq!(
            repo.git_cli(&["config", &format!("branch.{}.merge", name)]),
            format!("refs/heads/{}", name)
        );
    }

    assert_eq!(git_output(&bare, &["rev-parse", "refs/heads/main"]), main.to_string());
    assert_eq!(
        git_output(&bare, &["rev-parse", "refs/heads/feature"]),
        feature.to_string()
    );
}

#[tokio::test]
async fn configured_name_and_remote() {
    let repo = TestRepo::new();
    let (forge, bare) = forge_for(&repo, "service-api");
    let options = SetupOptions {
        remote: "upstream".into(),
        repo_name: Some(RepoName::new("service-api").unwrap()),
        private: false,
        description: Some("API".into()),
        protocol: Protocol::Ssh,
    };

    let outcome = setup_remote(&repo.git(), &forge, None, &options).await.unwrap();

    assert_eq!(outcome.remote, "upstream");
    assert_eq!(repo.git_cli(&["config", "remote.upstream.url"]), bare.to_str().unwrap());
    assert_eq!(repo.git_cli(&["config", "branch.main.remote"]), "upstream");
    assert!(!forge.repository("service-api").unwrap().private);
}

#[tokio::test]
async fn forge_failure_leaves_config_untouched() {
    let repo = TestRepo::new();
    let forge = MockForge::new().fail_with(ForgeError::AuthFailed("bad token".into()));

    let err = setup_remote(&repo.git(), &forge, Some("ghp_x"), &SetupOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteSetupError::Forge(ForgeError::AuthFailed(_))));
    assert_eq!(repo.git().remote_url("origin").unwrap(), None);
    assert_eq!(repo.git().config_string("branch.main.remote").unwrap(), None);
}

#[tokio::test]
async fn invalid_remote_name_rejected_before_forge_call() {
    let repo = TestRepo::new();
    let forge = MockForge::new();
    let options = SetupOptions {
        remote: "bad name".into(),
        ..Default::default()
    };

    let err = setup_remote(&repo.git(), &forge, None, &options).await.unwrap_err();
    assert!(matches!(err, RemoteSetupError::InvalidRemote(_)));
    assert!(forge.operations().is_empty());
}

#[tokio::test]
async fn name_derived_from_bare_repository() {
    let repo = TestRepo::new();
    let server = repo.bare_sibling("hooks-demo.git");
    repo.git_cli(&["push", "-q", server.to_str().unwrap(), "main"]);
    let (forge, published) = forge_for(&repo, "hooks-demo");

    let git = githook::git::Git::open(&server).unwrap();
    let outcome = setup_remote(&git, &forge, None, &SetupOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.repo_name.as_str(), "hooks-demo");
    assert_eq!(
        git_output(&published, &["rev-parse", "main"]),
        repo.head().to_string()
    );
}

#[tokio::test]
async fn empty_repository_configures_without_push() {
    let repo = TestRepo::empty();
    let (forge, bare) = forge_for(&repo, "project");

    let outcome = setup_remote(&repo.git(), &forge, None, &SetupOptions::default())
        .await
        .unwrap();

    assert!(outcome.pushed.is_empty());
    assert_eq!(repo.git_cli(&["config", "remote.origin.url"]), bare.to_str().unwrap());
}

#[tokio::test]
async fn existing_repository_on_forge() {
    let repo = TestRepo::new();
    let (forge, _) = forge_for(&repo, "project");
    setup_remote(&repo.git(), &forge, None, &SetupOptions::default())
        .await
        .unwrap();

    let err = setup_remote(&repo.git(), &forge, None, &SetupOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteSetupError::Forge(ForgeError::AlreadyExists(_))));
}
