//! End-to-end scenarios over the library API: objects, index, refs and the
//! tree build/diff/checkout cycle.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use grit::areas::repository::Repository;
use grit::areas::workspace::Workspace;
use grit::artifacts::checkout::migration::Migration;
use grit::artifacts::diff::tree_diff::TreeDiff;
use grit::artifacts::objects::blob::Blob;
use grit::artifacts::objects::object::Object;
use grit::artifacts::objects::object_type::ObjectType;
use grit::errors::GitError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::{Path, PathBuf};

const HELLO_BLOB_OID: &str = "b45ef6fec89518d314f546fd6c3025367b721684";

fn init_repository(temp: &TempDir) -> Repository {
    std::env::set_var("GIT_AUTHOR_NAME", "Test Author");
    std::env::set_var("GIT_AUTHOR_EMAIL", "test@example.com");

    let repository = Repository::new(temp.path(), Box::new(std::io::sink())).unwrap();
    repository.init().unwrap();
    repository
}

#[rstest]
fn storing_a_blob_twice_yields_the_same_loose_file() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    let blob = Blob::new("Hello, World!".into());
    let first = repository.database().store(&blob).unwrap();
    assert_eq!(first.as_ref(), HELLO_BLOB_OID);

    let object_path = temp
        .path()
        .join(".git/objects")
        .join(&HELLO_BLOB_OID[..2])
        .join(&HELLO_BLOB_OID[2..]);
    let bytes_after_first = std::fs::read(&object_path).unwrap();

    let second = repository.database().store(&blob).unwrap();
    assert_eq!(second, first);
    assert_eq!(std::fs::read(&object_path).unwrap(), bytes_after_first);
}

#[rstest]
fn stored_objects_parse_back_with_their_content() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    let sentence: String = {
        use fake::faker::lorem::en::Sentence;
        use fake::Fake;
        Sentence(3..8).fake()
    };
    let oid = repository
        .database()
        .store(&Blob::new(sentence.clone().into()))
        .unwrap();

    let blob = repository.database().parse_object_as_blob(&oid).unwrap();
    assert_eq!(blob.content().as_ref(), sentence.as_bytes());
}

#[rstest]
fn a_hex_prefix_resolves_to_the_stored_object() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    repository
        .database()
        .store(&Blob::new("Hello, World!".into()))
        .unwrap();

    let resolved = repository
        .refs()
        .find_object(repository.database(), &HELLO_BLOB_OID[..6], None, true)
        .unwrap()
        .unwrap();
    assert_eq!(resolved.as_ref(), HELLO_BLOB_OID);

    // upper case works too
    let resolved = repository
        .refs()
        .find_object(
            repository.database(),
            &HELLO_BLOB_OID[..8].to_ascii_uppercase(),
            None,
            true,
        )
        .unwrap()
        .unwrap();
    assert_eq!(resolved.as_ref(), HELLO_BLOB_OID);
}

#[rstest]
fn an_unknown_name_is_no_such_reference() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    let err = repository
        .refs()
        .find_object(repository.database(), "does-not-exist", None, true)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GitError>(),
        Some(GitError::NoSuchReference(name)) if name == "does-not-exist"
    ));
}

#[rstest]
fn a_name_that_is_both_branch_and_tag_is_ambiguous() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    let branch_oid = grit::artifacts::objects::object_id::ObjectId::try_parse(
        "a".repeat(40),
    )
    .unwrap();
    let tag_oid =
        grit::artifacts::objects::object_id::ObjectId::try_parse("b".repeat(40)).unwrap();
    repository.refs().create_branch("v1", &branch_oid).unwrap();
    repository.refs().create_tag_ref("v1", &tag_oid).unwrap();

    let err = repository
        .refs()
        .find_object(repository.database(), "v1", None, true)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GitError>(),
        Some(GitError::AmbiguousReference { name, candidates })
            if name == "v1" && candidates.len() == 2
    ));
}

#[rstest]
fn two_objects_sharing_a_prefix_are_ambiguous() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    // deterministic brute force: hash numbered blobs until two share the
    // first four hex characters, then store just that pair
    let mut seen: std::collections::HashMap<String, Blob> = std::collections::HashMap::new();
    let (first, second, prefix) = (0u32..)
        .find_map(|i| {
            let blob = Blob::new(format!("payload {}", i).into());
            let prefix = blob.object_id().unwrap().as_ref()[..4].to_string();
            match seen.entry(prefix.clone()) {
                std::collections::hash_map::Entry::Occupied(entry) => {
                    Some((entry.get().clone(), blob, prefix))
                }
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(blob);
                    None
                }
            }
        })
        .unwrap();

    let first_oid = repository.database().store(&first).unwrap();
    let second_oid = repository.database().store(&second).unwrap();

    let err = repository
        .refs()
        .find_object(repository.database(), &prefix, None, true)
        .unwrap_err();
    match err.downcast_ref::<GitError>() {
        Some(GitError::AmbiguousReference { name, candidates }) => {
            assert_eq!(name, &prefix);
            let mut expected = vec![first_oid.to_string(), second_oid.to_string()];
            expected.sort();
            assert_eq!(candidates, &expected);
        }
        other => panic!("expected AmbiguousReference, got {:?}", other),
    }
}

#[rstest]
fn switch_creates_a_branch_at_head_and_moves_head() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    temp.child("a.txt").write_str("content\n").unwrap();
    repository.add(&[PathBuf::from("a.txt")]).unwrap();
    let first = repository.commit("on master").unwrap();

    repository.switch_create("topic").unwrap();
    assert_eq!(
        repository.refs().current_branch().unwrap(),
        Some("topic".to_string())
    );
    assert_eq!(
        repository.refs().resolve_ref("refs/heads/topic").unwrap(),
        Some(first.clone())
    );

    // a commit on the new branch leaves the old one behind
    temp.child("b.txt").write_str("more\n").unwrap();
    repository.add(&[PathBuf::from("b.txt")]).unwrap();
    let second = repository.commit("on topic").unwrap();

    assert_eq!(
        repository.refs().resolve_ref("refs/heads/topic").unwrap(),
        Some(second)
    );
    assert_eq!(
        repository.refs().resolve_ref("refs/heads/master").unwrap(),
        Some(first)
    );

    // creating the same branch again is refused
    assert!(repository.switch_create("topic").is_err());
}

#[rstest]
fn add_commit_checkout_round_trip() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    temp.child("README.md").write_str("# demo\n").unwrap();
    temp.child("src/lib.rs").write_str("pub fn answer() -> u32 { 42 }\n").unwrap();
    temp.child("src/nested/deep.txt").write_str("deep\n").unwrap();

    repository.add(&[PathBuf::from(".")]).unwrap();
    let commit_oid = repository.commit("initial import").unwrap();

    // HEAD now resolves to the commit, and to its tree when a tree is wanted
    let head = repository
        .refs()
        .find_object(repository.database(), "HEAD", None, true)
        .unwrap()
        .unwrap();
    assert_eq!(head, commit_oid);

    let tree_oid = repository
        .refs()
        .find_object(repository.database(), "HEAD", Some(ObjectType::Tree), true)
        .unwrap()
        .unwrap();
    let commit = repository
        .database()
        .parse_object_as_commit(&commit_oid)
        .unwrap();
    assert_eq!(commit.tree_oid().unwrap(), tree_oid);

    // materialize the tree elsewhere and compare the files
    let out = TempDir::new().unwrap();
    repository.checkout("HEAD", out.path()).unwrap();

    for file in ["README.md", "src/lib.rs", "src/nested/deep.txt"] {
        assert_eq!(
            std::fs::read(out.path().join(file)).unwrap(),
            std::fs::read(temp.path().join(file)).unwrap(),
            "file {:?}",
            file
        );
    }
}

#[rstest]
fn an_empty_message_does_not_commit() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    temp.child("a.txt").write_str("content\n").unwrap();
    repository.add(&[PathBuf::from("a.txt")]).unwrap();

    assert!(repository.commit("   ").is_err());
    assert!(repository
        .refs()
        .resolve_ref("HEAD")
        .unwrap()
        .is_none());
}

#[rstest]
fn a_second_commit_links_to_its_parent() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    temp.child("a.txt").write_str("one\n").unwrap();
    repository.add(&[PathBuf::from("a.txt")]).unwrap();
    let first = repository.commit("first").unwrap();

    temp.child("a.txt").write_str("two\n").unwrap();
    repository.add(&[PathBuf::from("a.txt")]).unwrap();
    let second = repository.commit("second").unwrap();

    let commit = repository.database().parse_object_as_commit(&second).unwrap();
    assert_eq!(commit.parents().unwrap(), vec![first]);
}

#[rstest]
fn applying_a_tree_diff_converges_the_working_directory() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    temp.child("keep.txt").write_str("kept\n").unwrap();
    temp.child("old.txt").write_str("to be deleted\n").unwrap();
    temp.child("change.txt").write_str("before\n").unwrap();
    repository.add(&[PathBuf::from(".")]).unwrap();
    let first = repository.commit("first state").unwrap();

    std::fs::remove_file(temp.path().join("old.txt")).unwrap();
    temp.child("change.txt").write_str("after\n").unwrap();
    temp.child("new.txt").write_str("created\n").unwrap();
    repository
        .rm(&[PathBuf::from("old.txt")], false, false)
        .unwrap();
    repository.add(&[PathBuf::from(".")]).unwrap();
    let second = repository.commit("second state").unwrap();

    // materialize the first state in a scratch directory
    let scratch = TempDir::new().unwrap();
    repository
        .checkout(first.as_ref(), scratch.path())
        .unwrap();

    // diff the two commits and apply the changes to the scratch copy
    let mut diff = TreeDiff::new(repository.database());
    diff.compare(Some(&first), Some(&second)).unwrap();

    let changes = diff.changes();
    assert_eq!(
        changes.keys().cloned().collect::<Vec<_>>(),
        vec![
            PathBuf::from("change.txt"),
            PathBuf::from("new.txt"),
            PathBuf::from("old.txt"),
        ]
    );
    assert!(changes[Path::new("old.txt")].new.is_none());
    assert!(changes[Path::new("new.txt")].old.is_none());

    let scratch_workspace = Workspace::new(scratch.path().to_path_buf().into_boxed_path());
    Migration::new(repository.database(), &scratch_workspace)
        .apply(changes)
        .unwrap();

    assert!(!scratch.path().join("old.txt").exists());
    assert_eq!(
        std::fs::read_to_string(scratch.path().join("change.txt")).unwrap(),
        "after\n"
    );
    assert_eq!(
        std::fs::read_to_string(scratch.path().join("new.txt")).unwrap(),
        "created\n"
    );
    assert_eq!(
        std::fs::read_to_string(scratch.path().join("keep.txt")).unwrap(),
        "kept\n"
    );
}

#[rstest]
fn diffing_a_commit_against_itself_is_empty() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    temp.child("a.txt").write_str("content\n").unwrap();
    repository.add(&[PathBuf::from("a.txt")]).unwrap();
    let commit = repository.commit("only").unwrap();

    let mut diff = TreeDiff::new(repository.database());
    diff.compare(Some(&commit), Some(&commit)).unwrap();
    assert!(diff.changes().is_empty());
}

#[rstest]
fn annotated_tags_peel_to_their_target() {
    let temp = TempDir::new().unwrap();
    let repository = init_repository(&temp);

    temp.child("a.txt").write_str("content\n").unwrap();
    repository.add(&[PathBuf::from("a.txt")]).unwrap();
    let commit_oid = repository.commit("tagged state").unwrap();

    repository
        .tag("v1.0", "HEAD", true, Some("first release"))
        .unwrap();

    // the ref points at the tag object itself
    let tag_oid = repository
        .refs()
        .resolve_ref("refs/tags/v1.0")
        .unwrap()
        .unwrap();
    assert_eq!(
        repository.database().object_type(&tag_oid).unwrap(),
        ObjectType::Tag
    );

    // following peels tag -> commit -> tree
    let peeled = repository
        .refs()
        .find_object(repository.database(), "v1.0", Some(ObjectType::Commit), true)
        .unwrap()
        .unwrap();
    assert_eq!(peeled, commit_oid);

    let tree = repository
        .refs()
        .find_object(repository.database(), "v1.0", Some(ObjectType::Tree), true)
        .unwrap()
        .unwrap();
    let commit = repository
        .database()
        .parse_object_as_commit(&commit_oid)
        .unwrap();
    assert_eq!(tree, commit.tree_oid().unwrap());

    // without follow, a kind mismatch is simply no match
    let unfollowed = repository
        .refs()
        .find_object(
            repository.database(),
            "v1.0",
            Some(ObjectType::Commit),
            false,
        )
        .unwrap();
    assert_eq!(unfollowed, None);
}
