//! Push payload validation.
//!
//! The only place a `PushEvent` is constructed. Everything the controller
//! and the builder trust about an event is established here.

use serde_json::Value;
use url::Url;

use gitpress_config::ServerConfig;
use gitpress_core::{PushEvent, ValidationError};

/// Validate a push payload against the deployment configuration.
pub fn push_event(payload: &Value, config: &ServerConfig) -> Result<PushEvent, ValidationError> {
    let revision = non_empty_str(payload.get("after")).ok_or(ValidationError::MissingRevision)?;

    non_empty_str(payload.get("ref")).ok_or(ValidationError::MissingRef)?;

    let repository = payload
        .get("repository")
        .filter(|r| r.is_object())
        .ok_or(ValidationError::MissingRepository)?;

    let raw_url =
        non_empty_str(repository.get("url")).ok_or(ValidationError::MissingRepositoryUrl)?;
    let source_url: Url = raw_url
        .parse()
        .map_err(|_| ValidationError::BadRepositoryUrl("unparseable".to_string()))?;

    if source_url.scheme() != "https" {
        return Err(ValidationError::BadRepositoryUrl(
            "wrong protocol".to_string(),
        ));
    }
    if source_url.host_str() != Some(config.git_host.as_str()) {
        return Err(ValidationError::BadRepositoryUrl(
            "wrong hostname".to_string(),
        ));
    }

    let segments: Vec<&str> = source_url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    let (owner, url_name) = match segments.as_slice() {
        [owner, name] => (*owner, *name),
        _ => return Err(ValidationError::BadRepositoryUrl("wrong path".to_string())),
    };
    if owner != config.repo_owner {
        return Err(ValidationError::BadRepositoryUrl("wrong owner".to_string()));
    }

    let name = non_empty_str(repository.get("name")).ok_or(ValidationError::BadRepositoryName)?;
    if name != url_name.trim_end_matches(".git") {
        return Err(ValidationError::BadRepositoryName);
    }

    // Modern payloads spell it default_branch; older ones master_branch.
    non_empty_str(repository.get("master_branch"))
        .or_else(|| non_empty_str(repository.get("default_branch")))
        .ok_or(ValidationError::MissingDefaultBranch)?;

    Ok(PushEvent {
        target_key: name.to_string(),
        revision: revision.to_string(),
        source_url,
        output_dir: config.site_root.join(name),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> ServerConfig {
        ServerConfig::from_vars(|name| match name {
            "GITPRESS_REPO_OWNER" => Some("test".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn valid_push() -> Value {
        json!({
            "after": "asdf",
            "ref": "refs/heads/master",
            "repository": {
                "url": "https://github.com/test/repo",
                "name": "repo",
                "master_branch": "master"
            }
        })
    }

    #[test]
    fn accepts_a_valid_push() {
        let event = push_event(&valid_push(), &test_config()).unwrap();

        assert_eq!(event.target_key, "repo");
        assert_eq!(event.revision, "asdf");
        assert_eq!(event.source_url.as_str(), "https://github.com/test/repo");
        assert!(event.output_dir.ends_with("repo"));
    }

    #[test]
    fn accepts_default_branch_spelling() {
        let mut push = valid_push();
        push["repository"]
            .as_object_mut()
            .unwrap()
            .remove("master_branch");
        push["repository"]["default_branch"] = json!("main");

        assert!(push_event(&push, &test_config()).is_ok());
    }

    #[test]
    fn rejects_missing_after() {
        let mut push = valid_push();
        push.as_object_mut().unwrap().remove("after");

        let err = push_event(&push, &test_config()).unwrap_err();
        assert_eq!(err, ValidationError::MissingRevision);
    }

    #[test]
    fn rejects_missing_ref() {
        let mut push = valid_push();
        push.as_object_mut().unwrap().remove("ref");

        let err = push_event(&push, &test_config()).unwrap_err();
        assert_eq!(err, ValidationError::MissingRef);
    }

    #[test]
    fn rejects_missing_repository() {
        let mut push = valid_push();
        push.as_object_mut().unwrap().remove("repository");

        let err = push_event(&push, &test_config()).unwrap_err();
        assert_eq!(err, ValidationError::MissingRepository);
    }

    #[test]
    fn rejects_missing_repository_url() {
        let mut push = valid_push();
        push["repository"].as_object_mut().unwrap().remove("url");

        let err = push_event(&push, &test_config()).unwrap_err();
        assert_eq!(err, ValidationError::MissingRepositoryUrl);
    }

    #[test]
    fn rejects_missing_repository_name() {
        let mut push = valid_push();
        push["repository"].as_object_mut().unwrap().remove("name");

        let err = push_event(&push, &test_config()).unwrap_err();
        assert_eq!(err, ValidationError::BadRepositoryName);
    }

    #[test]
    fn rejects_mismatched_repository_name() {
        let mut push = valid_push();
        push["repository"]["name"] = json!("not-repo");

        let err = push_event(&push, &test_config()).unwrap_err();
        assert_eq!(err, ValidationError::BadRepositoryName);
    }

    #[test]
    fn rejects_missing_master_branch() {
        let mut push = valid_push();
        push["repository"]
            .as_object_mut()
            .unwrap()
            .remove("master_branch");

        let err = push_event(&push, &test_config()).unwrap_err();
        assert_eq!(err, ValidationError::MissingDefaultBranch);
    }

    #[test]
    fn rejects_bad_repository_url() {
        let config = test_config();

        let mut push = valid_push();
        push["repository"]["url"] = json!("http://github.com/test/repo");
        assert!(matches!(
            push_event(&push, &config).unwrap_err(),
            ValidationError::BadRepositoryUrl(reason) if reason == "wrong protocol"
        ));

        let mut push = valid_push();
        push["repository"]["url"] = json!("https://example.com/test/repo");
        assert!(matches!(
            push_event(&push, &config).unwrap_err(),
            ValidationError::BadRepositoryUrl(reason) if reason == "wrong hostname"
        ));

        let mut push = valid_push();
        push["repository"]["url"] = json!("https://github.com/foo/repo");
        assert!(matches!(
            push_event(&push, &config).unwrap_err(),
            ValidationError::BadRepositoryUrl(reason) if reason == "wrong owner"
        ));
    }

    #[test]
    fn accepts_a_dot_git_url_suffix() {
        let mut push = valid_push();
        push["repository"]["url"] = json!("https://github.com/test/repo.git");

        let event = push_event(&push, &test_config()).unwrap();
        assert_eq!(event.target_key, "repo");
    }
}
