// tests/integration_test.rs
use std::env;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use git2::{Oid, Repository as Git2Repo};
use serial_test::serial;
use tempfile::TempDir;
use xchelper::domain::GitTagComponent;
use xchelper::git::{Git2Repository, Repository, TagManager};
use xchelper::XcHelperError;

fn xchelper(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xchelper"))
        .args(args)
        .current_dir(dir)
        .env_remove("XCHELPER_CONFIG")
        .env_remove("GIT_TAG_VERSION")
        .env_remove("GIT_TAG_INCREMENT")
        .env_remove("GIT_TAG_PUSH")
        .env_remove("BUILD_DIR")
        .output()
        .expect("Failed to execute xchelper")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// Helper function to setup a temporary git repo with `commits` commits
fn setup_test_repo(commits: usize) -> (TempDir, Vec<Oid>) {
    let temp_dir = TempDir::new().expect("Could not create temp dir");
    let repo = Git2Repo::init(temp_dir.path()).expect("Could not init git repo");

    {
        let mut config = repo.config().expect("Could not get config");
        config
            .set_str("user.name", "Test User")
            .expect("Could not set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Could not set user.email");
    }

    let mut oids = Vec::new();
    for i in 0..commits {
        fs::write(temp_dir.path().join("README.md"), format!("revision {}\n", i))
            .expect("Could not write file");

        let mut index = repo.index().expect("Could not get index");
        index
            .add_path(Path::new("README.md"))
            .expect("Could not add file to index");
        index.write().expect("Could not write index");

        let tree_id = index.write_tree().expect("Could not write tree");
        let tree = repo.find_tree(tree_id).expect("Could not find tree");
        let sig = repo.signature().expect("Could not get sig");
        let parents: Vec<git2::Commit> = oids
            .last()
            .map(|oid| repo.find_commit(*oid).expect("Could not find parent"))
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        let oid = repo
            .commit(
                Some("HEAD"),
                &sig,
                &sig,
                &format!("commit {}", i),
                &tree,
                &parent_refs,
            )
            .expect("Could not create commit");
        oids.push(oid);
    }

    (temp_dir, oids)
}

fn tag_lightweight(dir: &Path, name: &str, oid: Oid) {
    let repo = Git2Repo::open(dir).unwrap();
    let object = repo.find_object(oid, None).unwrap();
    repo.tag_lightweight(name, &object, false).unwrap();
}

fn tag_names(dir: &Path) -> Vec<String> {
    let repo = Git2Repo::open(dir).unwrap();
    let mut names: Vec<String> = repo
        .tag_names(None)
        .unwrap()
        .iter()
        .flatten()
        .map(String::from)
        .collect();
    names.sort();
    names
}

// ============================================================================
// Binary
// ============================================================================

#[test]
fn test_xchelper_help() {
    let dir = TempDir::new().unwrap();
    let output = xchelper(dir.path(), &["--help"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Usage: xchelper"));
    assert!(text.contains("upload-archive"));
    assert!(text.contains("DOCKER_BUILD_PERSISTENT_VOLUME"));
}

#[test]
fn test_xchelper_version() {
    let dir = TempDir::new().unwrap();
    let output = xchelper(dir.path(), &["--version"]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("xchelper {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_xchelper_unknown_command() {
    let dir = TempDir::new().unwrap();
    let output = xchelper(dir.path(), &["publish"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert!(err.contains("Unknown command 'publish'"));
    assert!(err.contains("symlink-dependencies"));
}

#[test]
fn test_xchelper_create_archive_without_files() {
    let dir = TempDir::new().unwrap();
    let output = xchelper(dir.path(), &["create-archive", "out.tar.gz"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("You didn't provide any files to archive."));
}

#[cfg(unix)]
#[test]
fn test_xchelper_non_utf8_argument() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_xchelper"))
        .arg("create-archive")
        .arg(OsStr::from_bytes(b"out\xff.tar"))
        .current_dir(dir.path())
        .output()
        .expect("Failed to execute xchelper");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("not valid UTF-8"));
}

#[test]
fn test_xchelper_create_xcarchive() {
    let dir = TempDir::new().unwrap();
    let output = xchelper(
        dir.path(),
        &["create-xcarchive", "App.xcarchive", "-n", "App", "--scheme", "App"],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let created = stdout(&output).trim().to_string();
    assert!(created.ends_with("App.xcarchive"));
    assert!(Path::new(&created).join("Products").is_dir());
    assert!(Path::new(&created).join("Info.plist").is_file());
}

#[test]
fn test_xchelper_git_tag_seeds_initial_tag() {
    let (dir, _) = setup_test_repo(1);
    let output = xchelper(dir.path(), &["git-tag"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "0.0.1\n");
    assert!(stderr(&output).contains("WARNING"));
    assert_eq!(tag_names(dir.path()), vec!["0.0.1"]);
}

#[test]
fn test_xchelper_git_tag_increment_minor() {
    let (dir, oids) = setup_test_repo(2);
    tag_lightweight(dir.path(), "1.2.3", oids[0]);

    let output = xchelper(dir.path(), &["git-tag", "-i", "minor"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "1.3.0\n");
    assert_eq!(tag_names(dir.path()), vec!["1.2.3", "1.3.0"]);
}

#[test]
fn test_xchelper_git_tag_outside_repository() {
    let dir = TempDir::new().unwrap();
    let output = xchelper(dir.path(), &["git-tag"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Not in a git repository"));
}

// ============================================================================
// git2 repository
// ============================================================================

#[test]
fn test_latest_tag_is_nearest_reachable() {
    let (dir, oids) = setup_test_repo(3);
    tag_lightweight(dir.path(), "0.9.0", oids[0]);
    tag_lightweight(dir.path(), "1.0.0", oids[1]);

    let repo = Git2Repository::open(dir.path()).unwrap();
    assert_eq!(repo.latest_tag().unwrap(), Some("1.0.0".to_string()));
}

#[test]
fn test_latest_tag_annotated_and_highest_on_same_commit() {
    let (dir, oids) = setup_test_repo(1);
    {
        let repo = Git2Repo::open(dir.path()).unwrap();
        let object = repo.find_object(oids[0], None).unwrap();
        let sig = repo.signature().unwrap();
        repo.tag("2.0.0", &object, &sig, "release 2.0.0", false)
            .unwrap();
    }
    tag_lightweight(dir.path(), "1.9.9", oids[0]);

    let repo = Git2Repository::open(dir.path()).unwrap();
    assert_eq!(repo.latest_tag().unwrap(), Some("2.0.0".to_string()));
}

#[test]
fn test_no_tag_in_fresh_repository() {
    let (dir, _) = setup_test_repo(1);
    let repo = Git2Repository::open(dir.path()).unwrap();
    let err = TagManager::new(&repo, "origin")
        .increment(GitTagComponent::Patch)
        .unwrap_err();
    assert!(matches!(err, XcHelperError::NoTag(_)));
}

#[test]
fn test_increment_creates_tag_on_head() {
    let (dir, oids) = setup_test_repo(2);
    tag_lightweight(dir.path(), "v1.4.7", oids[0]);

    let repo = Git2Repository::open(dir.path()).unwrap();
    let tag = TagManager::new(&repo, "origin")
        .increment(GitTagComponent::Major)
        .unwrap();
    assert_eq!(tag, "2.0.0");

    let raw = Git2Repo::open(dir.path()).unwrap();
    let target = raw
        .revparse_single("refs/tags/2.0.0")
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .id();
    assert_eq!(target, oids[1]);
}

#[test]
fn test_duplicate_tag_is_error() {
    let (dir, oids) = setup_test_repo(1);
    tag_lightweight(dir.path(), "1.0.0", oids[0]);

    let repo = Git2Repository::open(dir.path()).unwrap();
    assert!(TagManager::new(&repo, "origin").tag("1.0.0").is_err());
}

#[test]
fn test_push_branch_then_tag_to_local_remote() {
    let (dir, oids) = setup_test_repo(1);
    let remote_dir = TempDir::new().unwrap();
    Git2Repo::init_bare(remote_dir.path()).unwrap();
    {
        let raw = Git2Repo::open(dir.path()).unwrap();
        raw.remote("origin", &remote_dir.path().display().to_string())
            .unwrap();
    }

    let repo = Git2Repository::open(dir.path()).unwrap();
    let manager = TagManager::new(&repo, "origin");
    manager.tag("0.1.0").unwrap();
    manager.push("0.1.0").unwrap();

    let remote = Git2Repo::open_bare(remote_dir.path()).unwrap();
    let branch = repo.current_branch().unwrap();
    let pushed_branch = remote
        .find_reference(&format!("refs/heads/{}", branch))
        .unwrap()
        .target()
        .unwrap();
    assert_eq!(pushed_branch, oids[0]);
    assert!(remote.find_reference("refs/tags/0.1.0").is_ok());
}

#[test]
fn test_push_to_missing_remote_is_remote_error() {
    let (dir, _) = setup_test_repo(1);
    let repo = Git2Repository::open(dir.path()).unwrap();
    let err = TagManager::new(&repo, "origin").push("0.0.1").unwrap_err();
    assert!(matches!(err, XcHelperError::Remote(_)));
}

#[test]
#[serial]
fn test_open_discovers_from_subdirectory() {
    let (dir, _) = setup_test_repo(1);
    let nested = dir.path().join("Sources/App");
    fs::create_dir_all(&nested).unwrap();

    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(&nested).expect("Could not change to nested dir");
    let repo = Git2Repository::open(".");
    env::set_current_dir(original_dir).unwrap();

    let repo = repo.expect("open should discover the enclosing repository");
    assert!(repo.head_oid().is_ok());
}
