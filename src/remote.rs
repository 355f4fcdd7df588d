//! Remote repository URLs and the delete-then-create reset performed before
//! a force push.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use log::{info, warn};
use regex::Regex;
use serde::Serialize;

use crate::error::{InvalidRepositoryUrlError, RemoteRepoError};

static HTTPS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://(?P<host>[^/@\s]+)/(?P<owner>[^/\s]+)/(?P<repo>[^/\s]+?)(?:\.git)?/?$")
        .expect("valid regex")
});

static SSH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^git@(?P<host>[^:/\s]+):(?P<owner>[^/\s]+)/(?P<repo>[^/\s]+?)(?:\.git)?$")
        .expect("valid regex")
});

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Accepts `https://host/owner/repo[.git]` and `git@host:owner/repo[.git]`.
    pub fn parse(url: &str) -> Result<Self, InvalidRepositoryUrlError> {
        let url = url.trim();
        [&*HTTPS_URL, &*SSH_URL]
            .into_iter()
            .find_map(|pattern| pattern.captures(url))
            .map(|caps| Self {
                host: caps["host"].to_string(),
                owner: caps["owner"].to_string(),
                name: caps["repo"].to_string(),
            })
            .ok_or_else(|| InvalidRepositoryUrlError { url: url.to_string() })
    }

    /// REST API root for the repository's host.
    pub fn api_base(&self) -> String {
        if self.host.eq_ignore_ascii_case("github.com") {
            "https://api.github.com".to_string()
        } else {
            format!("https://{}/api/v3", self.host)
        }
    }
}

impl FromStr for RepoRef {
    type Err = InvalidRepositoryUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Delete,
    Post,
}

/// One authenticated API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub token: String,
    /// JSON body, if any.
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Sends API requests. Any status code is a successful response.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, RemoteRepoError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, RemoteRepoError> {
        (**self).send(request)
    }
}

/// Settings for the recreated repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOptions {
    pub private: bool,
    /// Create under `/orgs/{owner}` instead of the authenticated user.
    pub organization: bool,
    pub description: String,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            private: false,
            organization: false,
            description: "Recreated repository".to_string(),
        }
    }
}

#[derive(Serialize)]
struct CreateRepo<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
}

/// What a reset did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recreated {
    /// Whether a repository existed and was deleted.
    pub deleted: bool,
    /// Web URL of the new repository, when the API reported one.
    pub html_url: Option<String>,
}

pub struct RepoManager<T> {
    transport: T,
    token: String,
}

impl<T: Transport> RepoManager<T> {
    pub fn new(transport: T, token: impl Into<String>) -> Self {
        Self {
            transport,
            token: token.into(),
        }
    }

    fn request(
        &self,
        method: Method,
        url: String,
        body: Option<String>,
    ) -> Result<ApiResponse, RemoteRepoError> {
        self.transport.send(&ApiRequest {
            method,
            url,
            token: self.token.clone(),
            body,
        })
    }

    /// Deletes the repository if present, then creates it again.
    pub fn recreate(
        &self,
        repo: &RepoRef,
        options: &RemoteOptions,
    ) -> Result<Recreated, RemoteRepoError> {
        let deleted = self.delete(repo)?;
        let html_url = self.create(repo, options)?;
        Ok(Recreated { deleted, html_url })
    }

    /// Returns whether a repository was deleted; absence is not an error.
    pub fn delete(&self, repo: &RepoRef) -> Result<bool, RemoteRepoError> {
        let url = format!("{}/repos/{}/{}", repo.api_base(), repo.owner, repo.name);
        let response = self.request(Method::Delete, url, None)?;
        match response.status {
            204 => {
                info!("deleted existing repository {repo}");
                Ok(true)
            }
            404 => {
                info!("repository {repo} does not exist");
                Ok(false)
            }
            status => Err(RemoteRepoError::Status {
                action: "delete",
                repo: repo.to_string(),
                status,
                body: response.body,
            }),
        }
    }

    /// Creates the repository and returns its web URL. A repository that
    /// already exists is accepted.
    pub fn create(
        &self,
        repo: &RepoRef,
        options: &RemoteOptions,
    ) -> Result<Option<String>, RemoteRepoError> {
        let url = if options.organization {
            format!("{}/orgs/{}/repos", repo.api_base(), repo.owner)
        } else {
            format!("{}/user/repos", repo.api_base())
        };
        let body = serde_json::to_string(&CreateRepo {
            name: &repo.name,
            description: &options.description,
            private: options.private,
        })?;
        let response = self.request(Method::Post, url, Some(body))?;
        match response.status {
            201 => {
                let html_url = serde_json::from_str::<serde_json::Value>(&response.body)
                    .ok()
                    .and_then(|json| json.get("html_url")?.as_str().map(str::to_string));
                info!("created repository {repo}");
                Ok(html_url)
            }
            422 if response.body.contains("already exists") => {
                warn!("repository {repo} already exists; keeping it");
                Ok(None)
            }
            status => Err(RemoteRepoError::Status {
                action: "create",
                repo: repo.to_string(),
                status,
                body: response.body,
            }),
        }
    }
}
