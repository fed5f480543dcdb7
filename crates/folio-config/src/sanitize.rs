use folio_markdown::SanitizePolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the HTML/JSX allow-list applied to post bodies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
  /// Hosts an `<iframe>` may load from. Replaces the built-in list when set.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub iframe_domains: Option<Vec<String>>,

  /// `sandbox` tokens permitted on embeds. Replaces the built-in list when
  /// set.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub iframe_sandbox: Option<Vec<String>>,

  /// Extra tags to allow, typically JSX components such as `Tweet`.
  pub extra_tags: Vec<String>,

  /// Extra attributes to allow on every allowed tag.
  pub extra_attributes: Vec<String>,
}

impl SanitizeConfig {
  /// Build the allow-list this configuration describes.
  #[must_use]
  pub fn policy(&self) -> SanitizePolicy {
    let mut policy = SanitizePolicy::default()
      .with_extra_tags(&self.extra_tags)
      .with_extra_attributes(&self.extra_attributes);

    if let Some(ref domains) = self.iframe_domains {
      policy = policy.with_iframe_domains(domains.clone());
    }
    if let Some(ref tokens) = self.iframe_sandbox {
      policy = policy.with_iframe_sandbox(tokens.clone());
    }

    policy
  }

  /// Merge another sanitizer config into this one. Lists of extra tags and
  /// attributes accumulate; domain and sandbox lists are replaced.
  pub fn merge(&mut self, other: Self) {
    if other.iframe_domains.is_some() {
      self.iframe_domains = other.iframe_domains;
    }
    if other.iframe_sandbox.is_some() {
      self.iframe_sandbox = other.iframe_sandbox;
    }
    self.extra_tags.extend(other.extra_tags);
    self.extra_attributes.extend(other.extra_attributes);
  }
}
