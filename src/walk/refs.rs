//! Ref/branch/tag walkers (§4.7). All three enumerate the repository's refs
//! once via `Repository::references`; each row type merely projects the same
//! underlying ref differently, matching how the original groups these three
//! tables under one `ensureTables` pass over the same ref list.

use git2::{Reference, Repository};

use crate::error::{Error, Result};
use crate::repo::RepoHandle;

pub struct RawRef {
    pub name: String,
    pub ref_type: &'static str,
    pub target: Option<String>,
}

pub struct Branch {
    pub name: String,
    pub remote: bool,
    pub target: Option<String>,
}

pub struct Tag {
    pub full_name: String,
    pub name: String,
    pub lightweight: bool,
    pub target: Option<String>,
    pub tagger_name: Option<String>,
    pub tagger_email: Option<String>,
    pub message: Option<String>,
    pub target_type: Option<String>,
}

fn ref_target(r: &Reference) -> Option<String> {
    if let Some(oid) = r.target() {
        return Some(oid.to_string());
    }
    r.symbolic_target().map(|s| s.to_string())
}

pub struct RefWalker {
    repo: RepoHandle,
    refs: std::vec::IntoIter<RawRef>,
}

fn load_refs(repo: &RepoHandle) -> Result<Vec<RawRef>> {
    let mut refs = Vec::new();
    for r in repo.inner().references().map_err(Error::WalkError)? {
        let r = r.map_err(Error::WalkError)?;
        let name = r.name().unwrap_or_default().to_string();
        let ref_type = match r.kind() {
            Some(git2::ReferenceType::Direct) => "direct",
            Some(git2::ReferenceType::Symbolic) => "symbolic",
            _ => "unknown",
        };
        let target = ref_target(&r);
        refs.push(RawRef {
            name,
            ref_type,
            target,
        });
    }
    Ok(refs)
}

impl RefWalker {
    pub fn new(repo: RepoHandle) -> Result<Self> {
        let refs = load_refs(&repo)?;
        Ok(Self {
            repo,
            refs: refs.into_iter(),
        })
    }

    /// Re-enumerates the repository's refs, matching the `filter` contract
    /// (§4.2): a cursor reused for a second scan must not return stale rows.
    pub fn reset(&mut self) -> Result<()> {
        let refs = load_refs(&self.repo)?;
        self.refs = refs.into_iter();
        Ok(())
    }

    pub fn next(&mut self) -> Option<RawRef> {
        self.refs.next()
    }
}

pub struct BranchWalker {
    repo: RepoHandle,
    branches: std::vec::IntoIter<Branch>,
}

fn load_branches(repo: &RepoHandle) -> Result<Vec<Branch>> {
    let mut branches = Vec::new();
    for r in repo.inner().references().map_err(Error::WalkError)? {
        let r = r.map_err(Error::WalkError)?;
        let name = r.name().unwrap_or_default().to_string();
        if !name.starts_with("refs/heads/") && !name.starts_with("refs/remotes/") {
            continue;
        }
        let remote = name.starts_with("refs/remotes/");
        let target = ref_target(&r);
        branches.push(Branch {
            name,
            remote,
            target,
        });
    }
    Ok(branches)
}

impl BranchWalker {
    pub fn new(repo: RepoHandle) -> Result<Self> {
        let branches = load_branches(&repo)?;
        Ok(Self {
            repo,
            branches: branches.into_iter(),
        })
    }

    pub fn reset(&mut self) -> Result<()> {
        let branches = load_branches(&self.repo)?;
        self.branches = branches.into_iter();
        Ok(())
    }

    pub fn next(&mut self) -> Option<Branch> {
        self.branches.next()
    }
}

pub struct TagWalker {
    repo: RepoHandle,
    tags: std::vec::IntoIter<Tag>,
}

fn load_tags(repo: &RepoHandle) -> Result<Vec<Tag>> {
    let mut tags = Vec::new();
    for r in repo.inner().references().map_err(Error::WalkError)? {
        let r = r.map_err(Error::WalkError)?;
        let full_name = r.name().unwrap_or_default().to_string();
        if !full_name.starts_with("refs/tags/") {
            continue;
        }
        let name = full_name.trim_start_matches("refs/tags/").to_string();
        tags.push(build_tag_row(repo.inner(), &r, full_name, name)?);
    }
    Ok(tags)
}

impl TagWalker {
    pub fn new(repo: RepoHandle) -> Result<Self> {
        let tags = load_tags(&repo)?;
        Ok(Self {
            repo,
            tags: tags.into_iter(),
        })
    }

    pub fn reset(&mut self) -> Result<()> {
        let tags = load_tags(&self.repo)?;
        self.tags = tags.into_iter();
        Ok(())
    }

    pub fn next(&mut self) -> Option<Tag> {
        self.tags.next()
    }
}

fn build_tag_row(repo: &Repository, r: &Reference, full_name: String, name: String) -> Result<Tag> {
    let target_oid = match r.target() {
        Some(oid) => oid,
        None => {
            return Ok(Tag {
                full_name,
                name,
                lightweight: true,
                target: ref_target(r),
                tagger_name: None,
                tagger_email: None,
                message: None,
                target_type: None,
            })
        }
    };

    match repo.find_tag(target_oid) {
        Ok(tag) => {
            let tagger = tag.tagger();
            Ok(Tag {
                full_name,
                name,
                lightweight: false,
                target: Some(tag.target_id().to_string()),
                tagger_name: tagger.as_ref().and_then(|s| s.name()).map(|s| s.to_string()),
                tagger_email: tagger.as_ref().and_then(|s| s.email()).map(|s| s.to_string()),
                message: tag.message().map(|s| s.to_string()),
                target_type: tag.target_type().map(|t| t.str().to_string()),
            })
        }
        Err(_) => Ok(Tag {
            full_name,
            name,
            lightweight: true,
            target: Some(target_oid.to_string()),
            tagger_name: None,
            tagger_email: None,
            message: None,
            target_type: None,
        }),
    }
}
