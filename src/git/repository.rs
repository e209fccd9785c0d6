use crate::error::{Result, XcHelperError};
use crate::git::highest_tag;
use git2::{Oid, Repository as Git2Repo, Sort};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path.as_ref()).map_err(|e| {
            XcHelperError::Git(git2::Error::from_str(&format!(
                "Not in a git repository ({}): {}",
                path.as_ref().display(),
                e.message()
            )))
        })?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn push_refspecs(&self, remote_name: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|e| {
            XcHelperError::remote(format!("Cannot find remote '{}': {}", remote_name, e))
        })?;

        let config = self.repo.config()?;
        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(remote_callbacks(&config));

        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();
        debug!(remote = remote_name, refspecs = ?refspec_strs, "pushing");

        remote
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| {
                if e.class() == git2::ErrorClass::Net {
                    XcHelperError::remote(format!("Network error during push: {}", e))
                } else {
                    XcHelperError::remote(format!("Push to '{}' failed: {}", remote_name, e))
                }
            })
    }
}

/// Credential and push-status callbacks shared by every push.
///
/// Tries SSH keys from ~/.ssh, then the SSH agent, then git's configured
/// credential helper.
fn remote_callbacks(config: &git2::Config) -> git2::RemoteCallbacks<'_> {
    let mut callbacks = git2::RemoteCallbacks::new();

    callbacks.credentials(move |url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
            if let Ok(cred) = git2::Cred::credential_helper(config, url, username_from_url) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });

    callbacks.push_update_reference(|refname, status| match status {
        Some(status) => Err(git2::Error::from_str(&format!(
            "Could not update reference {}: {}",
            refname, status
        ))),
        None => Ok(()),
    });

    callbacks
}

impl super::Repository for Git2Repository {
    fn location(&self) -> String {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .display()
            .to_string()
    }

    fn head_oid(&self) -> Result<Oid> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(commit.id())
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(XcHelperError::remote("HEAD is detached; cannot push a branch"));
        }
        head.shorthand()
            .map(|s| s.to_string())
            .ok_or_else(|| XcHelperError::remote("Branch name is not valid UTF-8"))
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        let head = self.head_oid()?;

        let mut tags_by_commit: HashMap<Oid, Vec<String>> = HashMap::new();
        for tag_name in self.repo.tag_names(None)?.iter().flatten() {
            let reference = match self.repo.find_reference(&format!("refs/tags/{}", tag_name)) {
                Ok(reference) => reference,
                Err(_) => continue,
            };
            if let Ok(commit) = reference.peel_to_commit() {
                tags_by_commit
                    .entry(commit.id())
                    .or_default()
                    .push(tag_name.to_string());
            }
        }

        if tags_by_commit.is_empty() {
            return Ok(None);
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head)?;

        for oid in revwalk {
            let oid = oid?;
            if let Some(names) = tags_by_commit.get(&oid) {
                return Ok(highest_tag(names).cloned());
            }
        }

        Ok(None)
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let object = self.repo.find_object(oid, None)?;

        self.repo
            .tag_lightweight(name, &object, false)
            .map_err(|e| {
                XcHelperError::Git(git2::Error::from_str(&format!(
                    "Cannot create tag '{}': {}",
                    name,
                    e.message()
                )))
            })?;

        Ok(())
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.push_refspecs(
            remote,
            &[format!("refs/heads/{}:refs/heads/{}", branch, branch)],
        )
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str]) -> Result<()> {
        let refspecs: Vec<String> = tag_names
            .iter()
            .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag))
            .collect();
        self.push_refspecs(remote, &refspecs)
    }
}
