//! Fixture-repo builder shared by the integration tests. Grounded on the
//! `temporary()`/`save()` pattern in
//! `other_examples/4025128d_jeremyBanks-save__src-git2.rs.rs` (init a repo
//! in a `TempDir`, stage via the index, write a tree, commit against HEAD).

use std::fs;
use std::path::PathBuf;

use git2::{Repository, Signature};
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub repo: Repository,
    initial_branch: String,
}

impl Fixture {
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    fn sig(&self) -> Signature<'static> {
        Signature::now("Fixture Author", "author@example.com").unwrap()
    }

    fn write_file(&self, name: &str, contents: impl AsRef<[u8]>) {
        fs::write(self.dir.path().join(name), contents).unwrap();
    }

    fn commit_all(&self, message: &str, parents: &[&git2::Commit]) -> git2::Oid {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let sig = self.sig();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, parents)
            .unwrap()
    }
}

/// Builds a repository with:
/// - an initial (root) commit adding `a.txt`
/// - a second commit modifying `a.txt` and adding `b.txt`
/// - a third commit adding a binary file `blob.bin`
/// - a lightweight tag `v1` and an annotated tag `v2` on HEAD
/// - a branch `feature` diverging from the first commit
/// - a merge commit bringing `feature` back into `main`
pub fn build_fixture_repo() -> Fixture {
    let _ = env_logger::try_init();
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    // `init.defaultBranch` varies by host (`master` vs `main`); read HEAD's
    // symbolic target rather than assuming one, since it resolves even
    // before the first commit is made.
    let initial_branch = repo
        .find_reference("HEAD")
        .unwrap()
        .symbolic_target()
        .unwrap()
        .to_string();
    let fixture = Fixture {
        dir,
        repo,
        initial_branch,
    };

    fixture.write_file("a.txt", "line one\n");
    let root_oid = fixture.commit_all("initial commit", &[]);
    let root_commit = fixture.repo.find_commit(root_oid).unwrap();

    fixture.write_file("a.txt", "line one\nline two\n");
    fixture.write_file("b.txt", "hello\n");
    let second_oid = fixture.commit_all("add b.txt, extend a.txt", &[&root_commit]);
    let second_commit = fixture.repo.find_commit(second_oid).unwrap();

    fixture.write_file("blob.bin", [0u8, 159, 146, 150, 0, 1, 2, 255]);
    let third_oid = fixture.commit_all("add binary blob", &[&second_commit]);
    let third_commit = fixture.repo.find_commit(third_oid).unwrap();

    let head_obj = fixture.repo.head().unwrap().peel(git2::ObjectType::Commit).unwrap();
    fixture
        .repo
        .tag_lightweight("v1", &head_obj, false)
        .unwrap();
    let sig = fixture.sig();
    fixture
        .repo
        .tag("v2", &head_obj, &sig, "release v2", false)
        .unwrap();

    fixture
        .repo
        .branch("feature", &root_commit, false)
        .unwrap();
    fixture
        .repo
        .set_head("refs/heads/feature")
        .unwrap();
    fixture.repo.checkout_head(None).unwrap();
    fixture.write_file("a.txt", "line one\nfeature branch change\n");
    let feature_oid = fixture.commit_all("feature branch commit", &[&root_commit]);
    let feature_commit = fixture.repo.find_commit(feature_oid).unwrap();

    fixture.repo.set_head(&fixture.initial_branch).unwrap();
    fixture.repo.checkout_head(Some(git2::build::CheckoutBuilder::new().force())).unwrap();
    let _merge_oid = fixture.commit_all("merge feature into master", &[&third_commit, &feature_commit]);

    fixture
}
