use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a repository target was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("owner must not be empty")]
    EmptyOwner,
    #[error("repository name must not be empty")]
    EmptyRepo,
    #[error("workflow name must not be empty")]
    EmptyWorkflow,
}

/// A repository/workflow pair to monitor.
///
/// The token override is accepted on input but never serialized back out.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryTarget {
    pub owner: String,
    pub repo: String,
    pub workflow: String,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl fmt::Debug for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryTarget")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("workflow", &self.workflow)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RepositoryTarget {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        workflow: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            workflow: workflow.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// `"{owner}/{repo}"`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Token override, with an empty string treated as absent.
    pub fn token_override(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn validate(&self) -> Result<(), TargetError> {
        if self.owner.trim().is_empty() {
            return Err(TargetError::EmptyOwner);
        }
        if self.repo.trim().is_empty() {
            return Err(TargetError::EmptyRepo);
        }
        if self.workflow.trim().is_empty() {
            return Err(TargetError::EmptyWorkflow);
        }
        Ok(())
    }
}

/// Append-only, ordered set of monitored targets for a session.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: Vec<RepositoryTarget>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from seed targets, rejecting the first invalid one.
    pub fn from_seed(seed: Vec<RepositoryTarget>) -> Result<Self, TargetError> {
        let mut set = Self::new();
        for target in seed {
            set.push(target)?;
        }
        Ok(set)
    }

    pub fn push(&mut self, target: RepositoryTarget) -> Result<(), TargetError> {
        target.validate()?;
        self.targets.push(target);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryTarget> {
        self.targets.iter()
    }

    /// Owned copy handed to a batch, so later additions don't affect it.
    pub fn snapshot(&self) -> Vec<RepositoryTarget> {
        self.targets.clone()
    }
}
