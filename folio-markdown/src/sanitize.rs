//! Allow-list sanitizing of embedded HTML and JSX.
//!
//! Trust is a pure function of a tag: [`SanitizePolicy::check`] looks at the
//! tag name and its attributes and nothing else. [`Sanitizer`] applies that
//! verdict to whole fragments at render time, re-emitting allowed tags in a
//! canonical form and turning everything else into escaped text. Content is
//! never dropped: a rejected tag is still visible to the reader, just inert.
use std::collections::HashSet;

use log::debug;

use crate::{
  assets::{AssetError, BaseContext},
  error::Warning,
  markup::{self, AttrValue, Tag},
  utils::{escape_attr, escape_text},
};

/// Tags allowed by the default policy.
const DEFAULT_TAGS: &[&str] = &[
  "a", "abbr", "article", "aside", "audio", "b", "blockquote", "br",
  "caption", "cite", "code", "col", "colgroup", "dd", "del", "details", "dfn",
  "div", "dl", "dt", "em", "figcaption", "figure", "footer", "h1", "h2", "h3",
  "h4", "h5", "h6", "header", "hr", "i", "iframe", "img", "ins", "kbd", "li",
  "mark", "ol", "p", "picture", "pre", "q", "s", "samp", "section", "small",
  "source", "span", "strong", "sub", "summary", "sup", "table", "tbody", "td",
  "tfoot", "th", "thead", "time", "tr", "track", "u", "ul", "var", "video",
  "wbr",
];

/// Attributes allowed on every allowed tag.
const GLOBAL_ATTRIBUTES: &[&str] = &["id", "class", "title", "lang", "dir"];

/// Attributes allowed per tag, on top of the global ones.
const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
  ("a", &["href", "name", "rel", "target", "hreflang"]),
  ("img", &["src", "alt", "width", "height", "loading", "decoding"]),
  ("iframe", &[
    "src",
    "width",
    "height",
    "allow",
    "allowfullscreen",
    "frameborder",
    "loading",
    "sandbox",
    "referrerpolicy",
  ]),
  ("video", &[
    "src",
    "poster",
    "controls",
    "width",
    "height",
    "autoplay",
    "loop",
    "muted",
    "playsinline",
    "preload",
  ]),
  ("audio", &["src", "controls", "autoplay", "loop", "muted", "preload"]),
  ("source", &["src", "type", "media"]),
  ("track", &["src", "kind", "srclang", "label", "default"]),
  ("th", &["align", "colspan", "rowspan", "scope"]),
  ("td", &["align", "colspan", "rowspan"]),
  ("col", &["span"]),
  ("colgroup", &["span"]),
  ("ol", &["start", "reversed", "type"]),
  ("li", &["value"]),
  ("details", &["open"]),
  ("time", &["datetime"]),
  ("blockquote", &["cite"]),
  ("q", &["cite"]),
  ("del", &["cite", "datetime"]),
  ("ins", &["cite", "datetime"]),
];

/// Attributes whose value is a URL.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "poster", "cite"];

/// Iframe hosts allowed by the default policy.
pub const DEFAULT_IFRAME_DOMAINS: &[&str] = &[
  "youtube.com",
  "www.youtube.com",
  "www.youtube-nocookie.com",
  "player.vimeo.com",
  "codesandbox.io",
  "stackblitz.com",
  "codepen.io",
];

/// Sandbox tokens an iframe may keep.
pub const DEFAULT_SANDBOX_TOKENS: &[&str] = &[
  "allow-scripts",
  "allow-same-origin",
  "allow-popups",
  "allow-presentation",
  "allow-forms",
];

/// Sandbox applied to iframes that do not declare one.
const DEFAULT_SANDBOX: &str = "allow-scripts allow-same-origin allow-presentation";

/// An attribute that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanAttribute {
  /// Canonical (lowercase) attribute name.
  pub name:  String,
  /// `None` for boolean attributes.
  pub value: Option<String>,
}

impl CleanAttribute {
  fn new(name: &str, value: Option<&str>) -> Self {
    Self {
      name:  name.to_string(),
      value: value.map(str::to_string),
    }
  }

  #[must_use]
  pub fn is_url(&self) -> bool {
    URL_ATTRIBUTES.contains(&self.name.as_str())
  }
}

/// Outcome of judging one opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
  Allowed {
    attributes: Vec<CleanAttribute>,
    /// Attributes removed, as written in the source.
    dropped:    Vec<String>,
  },
  Disallowed,
}

/// The allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
  /// Allowed tag names. Lowercase for HTML; components keep their case.
  pub tags:              HashSet<String>,
  /// Attributes allowed on every tag.
  pub global_attributes: HashSet<String>,
  /// Allowed URL schemes for `href`/`src` values.
  pub url_schemes:       Vec<String>,
  /// Hosts an iframe `src` may point at.
  pub iframe_domains:    Vec<String>,
  /// Sandbox tokens an iframe may keep.
  pub iframe_sandbox:    Vec<String>,
}

impl Default for SanitizePolicy {
  fn default() -> Self {
    Self {
      tags:              DEFAULT_TAGS.iter().map(|t| (*t).to_string()).collect(),
      global_attributes: GLOBAL_ATTRIBUTES
        .iter()
        .map(|a| (*a).to_string())
        .collect(),
      url_schemes:       vec![
        "http".to_string(),
        "https".to_string(),
        "mailto".to_string(),
      ],
      iframe_domains:    DEFAULT_IFRAME_DOMAINS
        .iter()
        .map(|d| (*d).to_string())
        .collect(),
      iframe_sandbox:    DEFAULT_SANDBOX_TOKENS
        .iter()
        .map(|t| (*t).to_string())
        .collect(),
    }
  }
}

impl SanitizePolicy {
  /// Allow additional tags, e.g. JSX components the site renders itself.
  #[must_use]
  pub fn with_extra_tags<I, S>(mut self, tags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.tags.extend(tags.into_iter().map(Into::into));
    self
  }

  /// Allow additional attributes on every tag. Event handlers stay blocked.
  #[must_use]
  pub fn with_extra_attributes<I, S>(mut self, attributes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.global_attributes.extend(
      attributes
        .into_iter()
        .map(|a| a.into().to_ascii_lowercase()),
    );
    self
  }

  /// Replace the iframe host allow-list.
  #[must_use]
  pub fn with_iframe_domains(mut self, domains: Vec<String>) -> Self {
    self.iframe_domains = domains;
    self
  }

  /// Replace the allowed iframe sandbox tokens.
  #[must_use]
  pub fn with_iframe_sandbox(mut self, tokens: Vec<String>) -> Self {
    self.iframe_sandbox = tokens;
    self
  }

  /// Whether a tag name is on the allow-list.
  #[must_use]
  pub fn allows_tag(&self, name: &str) -> bool {
    self.tags.contains(name)
  }

  fn allows_attribute(&self, tag: &str, attribute: &str) -> bool {
    if self.global_attributes.contains(attribute)
      || attribute.starts_with("aria-")
      || attribute.starts_with("data-")
    {
      return true;
    }
    TAG_ATTRIBUTES
      .iter()
      .find(|(name, _)| *name == tag)
      .is_some_and(|(_, attrs)| attrs.contains(&attribute))
  }

  /// Whether a URL value may be emitted. Relative references are always
  /// safe; absolute ones need an allowed scheme.
  #[must_use]
  pub fn is_safe_url(&self, value: &str) -> bool {
    // Browsers decode entities and ignore whitespace and control characters
    // inside the scheme, so `java&#115;cript:` and `java\tscript:` must be
    // judged as `javascript:`.
    let decoded = html_escape::decode_html_entities(value);
    let compact: String = decoded
      .chars()
      .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
      .collect();

    let Some(colon) = compact.find(':') else {
      return true;
    };
    let scheme = &compact[..colon];
    // A colon after the first path, query or fragment delimiter is not a
    // scheme separator.
    if scheme.contains(['/', '?', '#']) {
      return true;
    }
    self
      .url_schemes
      .iter()
      .any(|allowed| allowed.eq_ignore_ascii_case(scheme))
  }

  fn iframe_host_allowed(&self, src: &str) -> bool {
    let lower = src.trim().to_ascii_lowercase();
    let Some(rest) = lower
      .strip_prefix("https://")
      .or_else(|| lower.strip_prefix("http://"))
      .or_else(|| lower.strip_prefix("//"))
    else {
      return false;
    };
    let host_end = rest.find(['/', '?', '#', ':']).unwrap_or(rest.len());
    let host = &rest[..host_end];
    self.iframe_domains.iter().any(|d| d.eq_ignore_ascii_case(host))
  }

  fn filter_sandbox(&self, value: Option<&str>) -> String {
    value
      .unwrap_or_default()
      .split_ascii_whitespace()
      .filter(|token| self.iframe_sandbox.iter().any(|t| t == token))
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Judge one opening tag.
  ///
  /// Allowed tags keep the global and per-tag attributes whose values are
  /// safe. Event handlers, JSX spreads and non-literal JSX expressions are
  /// always dropped. An iframe is only allowed when its `src` points at an
  /// allowed host.
  #[must_use]
  pub fn check(&self, tag: &Tag<'_>) -> Verdict {
    let name = tag.normalized_name();
    if !self.allows_tag(&name) {
      return Verdict::Disallowed;
    }

    let mut attributes: Vec<CleanAttribute> = Vec::new();
    let mut dropped = Vec::new();

    for attr in &tag.attrs {
      if attr.is_spread() {
        if let AttrValue::Expression(expr) = attr.value {
          dropped.push(format!("{{{expr}}}"));
        }
        continue;
      }

      let attr_name = canonical_attribute_name(attr.name);
      if attr_name.starts_with("on") || !self.allows_attribute(&name, &attr_name)
      {
        dropped.push(attr.name.to_string());
        continue;
      }

      let value = match attr.value {
        AttrValue::Bare => None,
        AttrValue::Text(value) => Some(value.to_string()),
        AttrValue::Expression(expr) => {
          match literal_expression(expr) {
            Some(literal) => literal,
            None => {
              dropped.push(attr.name.to_string());
              continue;
            },
          }
        },
      };

      let mut clean = CleanAttribute {
        name: attr_name,
        value,
      };
      if clean.is_url() {
        let safe = clean.value.as_deref().is_some_and(|v| self.is_safe_url(v));
        if !safe {
          dropped.push(attr.name.to_string());
          continue;
        }
      }
      if clean.name == "sandbox" {
        clean.value = Some(self.filter_sandbox(clean.value.as_deref()));
      }
      attributes.push(clean);
    }

    let has = |attributes: &[CleanAttribute], key: &str| {
      attributes.iter().any(|a| a.name == key)
    };

    if name == "iframe" {
      let src_allowed = attributes
        .iter()
        .find(|a| a.name == "src")
        .and_then(|a| a.value.as_deref())
        .is_some_and(|src| self.iframe_host_allowed(src));
      if !src_allowed {
        return Verdict::Disallowed;
      }
      if !has(&attributes, "sandbox") {
        attributes.push(CleanAttribute::new("sandbox", Some(DEFAULT_SANDBOX)));
      }
    }

    if name == "a" && has(&attributes, "target") && !has(&attributes, "rel") {
      attributes.push(CleanAttribute::new("rel", Some("noopener noreferrer")));
    }

    Verdict::Allowed {
      attributes,
      dropped,
    }
  }
}

/// Lowercase an attribute name, mapping JSX spellings to HTML.
fn canonical_attribute_name(name: &str) -> String {
  match name {
    "className" => "class".to_string(),
    "htmlFor" => "for".to_string(),
    other => other.to_ascii_lowercase(),
  }
}

/// Value of a JSX expression that is a plain literal: `{560}`, `{"x"}`,
/// `{true}`. `Some(None)` is a boolean attribute.
fn literal_expression(expr: &str) -> Option<Option<String>> {
  let expr = expr.trim();
  if expr == "true" {
    return Some(None);
  }
  if !expr.is_empty()
    && expr
      .chars()
      .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
  {
    return Some(Some(expr.to_string()));
  }
  for quote in ['"', '\''] {
    if let Some(inner) = expr
      .strip_prefix(quote)
      .and_then(|rest| rest.strip_suffix(quote))
    {
      if !inner.contains(quote) {
        return Some(Some(inner.to_string()));
      }
    }
  }
  None
}

/// Output of [`Sanitizer::sanitize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
  pub html:            String,
  /// Whether the fragment's first tag or comment was turned into text.
  pub leading_escaped: bool,
}

/// Applies a [`SanitizePolicy`] to the raw fragments of one document.
///
/// Tracks elements whose opening tag was neutralized so their closing tags
/// are escaped too, even when they appear in a later fragment. Allowed
/// elements are kept balanced: a closing tag only passes through when its
/// element is open in the current scope, and [`Sanitizer::leave_scope`]
/// closes whatever the scope left open.
#[derive(Debug)]
pub struct Sanitizer<'a> {
  policy:      &'a SanitizePolicy,
  context:     &'a BaseContext,
  neutralized: Vec<String>,
  open:        Vec<String>,
  floor:       usize,
}

impl<'a> Sanitizer<'a> {
  #[must_use]
  pub const fn new(policy: &'a SanitizePolicy, context: &'a BaseContext) -> Self {
    Self {
      policy,
      context,
      neutralized: Vec::new(),
      open: Vec::new(),
      floor: 0,
    }
  }

  /// Start a scope for one block or inline run. Closing tags cannot reach
  /// elements opened before it. Returns the value [`Sanitizer::leave_scope`]
  /// restores.
  pub const fn enter_scope(&mut self) -> usize {
    let saved = self.floor;
    self.floor = self.open.len();
    saved
  }

  /// Close the elements still open in the current scope and return to the
  /// enclosing one.
  pub fn leave_scope(&mut self, saved: usize) -> String {
    let closers = self.close_from(self.floor);
    self.floor = saved.min(self.open.len());
    closers
  }

  fn close_from(&mut self, depth: usize) -> String {
    let mut html = String::new();
    while self.open.len() > depth {
      if let Some(name) = self.open.pop() {
        html.push_str("</");
        html.push_str(&name);
        html.push('>');
      }
    }
    html
  }

  /// Sanitize a raw HTML/JSX fragment.
  pub fn sanitize(&mut self, fragment: &str, warnings: &mut Vec<Warning>) -> Sanitized {
    let mut html = String::with_capacity(fragment.len());
    let mut leading_escaped = None;

    for token in markup::tokenize(fragment) {
      let escaped = match token {
        markup::Token::Text(text) => {
          html.push_str(&escape_text(text));
          continue;
        },
        markup::Token::Stray(_) => {
          html.push_str("&lt;");
          true
        },
        markup::Token::Comment(comment) => {
          if is_safe_comment(comment) {
            html.push_str(comment);
            false
          } else {
            html.push_str(&escape_text(comment));
            true
          }
        },
        markup::Token::Tag(tag) if tag.closing => self.closing_tag(&tag, &mut html),
        markup::Token::Tag(tag) => self.opening_tag(&tag, &mut html, warnings),
      };
      leading_escaped.get_or_insert(escaped);
    }

    Sanitized {
      html,
      leading_escaped: leading_escaped.unwrap_or(false),
    }
  }

  fn closing_tag(&mut self, tag: &Tag<'_>, html: &mut String) -> bool {
    let name = tag.normalized_name();
    if let Some(idx) = self.neutralized.iter().rposition(|n| *n == name) {
      self.neutralized.remove(idx);
      html.push_str(&escape_text(tag.raw));
      return true;
    }
    let matched = self
      .open
      .get(self.floor..)
      .unwrap_or_default()
      .iter()
      .rposition(|n| *n == name);
    if let Some(idx) = matched {
      html.push_str(&self.close_from(self.floor + idx));
      false
    } else {
      debug!("Escaping unmatched closing tag </{name}>");
      html.push_str(&escape_text(tag.raw));
      true
    }
  }

  fn opening_tag(
    &mut self,
    tag: &Tag<'_>,
    html: &mut String,
    warnings: &mut Vec<Warning>,
  ) -> bool {
    let name = tag.normalized_name();
    let Verdict::Allowed {
      attributes,
      dropped,
    } = self.policy.check(tag)
    else {
      debug!("Neutralizing disallowed tag <{name}>");
      warnings.push(Warning::DisallowedTag { tag: name.clone() });
      if !tag.is_standalone() {
        self.neutralized.push(name);
      }
      html.push_str(&escape_text(tag.raw));
      return true;
    };

    for attribute in dropped {
      warnings.push(Warning::DroppedAttribute {
        tag: name.clone(),
        attribute,
      });
    }

    html.push('<');
    html.push_str(&name);
    for attribute in attributes {
      let value = match attribute.value.as_deref() {
        Some(value) if attribute.is_url() => {
          match self.context.resolve_str(value) {
            Ok(resolved) => Some(resolved.url),
            Err(AssetError::PathEscape { reference }) => {
              warnings.push(Warning::PathEscape { reference });
              continue;
            },
          }
        },
        other => other.map(str::to_string),
      };

      html.push(' ');
      html.push_str(&attribute.name);
      if let Some(value) = value {
        html.push_str("=\"");
        html.push_str(&escape_attr(&value));
        html.push('"');
      }
    }
    html.push_str(if tag.self_closing { " />" } else { ">" });
    if !tag.is_standalone() {
      self.open.push(name);
    }
    false
  }
}

/// Comments that browsers end early (`--!>`, `<!-->`) are not passed through.
fn is_safe_comment(comment: &str) -> bool {
  let body = comment
    .strip_prefix("<!--")
    .and_then(|c| c.strip_suffix("-->"))
    .unwrap_or_default();
  !body.starts_with('>') && !body.starts_with("->") && !body.contains("--!>")
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;

  fn check(raw: &str) -> Verdict {
    let tag = markup::scan_tag(raw).expect("Failed to scan tag");
    SanitizePolicy::default().check(&tag)
  }

  fn sanitize(fragment: &str) -> (Sanitized, Vec<Warning>) {
    let policy = SanitizePolicy::default();
    let context = BaseContext::new("/content").with_slug("post");
    let mut warnings = Vec::new();
    let out = Sanitizer::new(&policy, &context).sanitize(fragment, &mut warnings);
    (out, warnings)
  }

  #[test]
  fn test_check_filters_attributes() {
    let verdict = check(r#"<a href="https://x.com" onclick="evil()" style="color:red" target="_blank">"#);
    assert_eq!(verdict, Verdict::Allowed {
      attributes: vec![
        CleanAttribute::new("href", Some("https://x.com")),
        CleanAttribute::new("target", Some("_blank")),
        CleanAttribute::new("rel", Some("noopener noreferrer")),
      ],
      dropped:    vec!["onclick".to_string(), "style".to_string()],
    });
  }

  #[test]
  fn test_check_rejects_unknown_tags() {
    assert_eq!(check("<script>"), Verdict::Disallowed);
    assert_eq!(check("<object data=\"x\">"), Verdict::Disallowed);
    assert_eq!(check("<Tweet id=\"1\" />"), Verdict::Disallowed);
  }

  #[test]
  fn test_extra_tags_allow_components() {
    let policy = SanitizePolicy::default().with_extra_tags(["Tweet"]);
    let tag = markup::scan_tag("<Tweet id=\"1\" onLoad={x} />").expect("Failed to scan tag");
    assert_eq!(policy.check(&tag), Verdict::Allowed {
      attributes: vec![CleanAttribute::new("id", Some("1"))],
      dropped:    vec!["onLoad".to_string()],
    });
  }

  #[test]
  fn test_unsafe_urls() {
    let policy = SanitizePolicy::default();
    assert!(policy.is_safe_url("https://example.com"));
    assert!(policy.is_safe_url("mailto:me@example.com"));
    assert!(policy.is_safe_url("./relative.png"));
    assert!(policy.is_safe_url("/path?q=a:b"));
    assert!(!policy.is_safe_url("javascript:alert(1)"));
    assert!(!policy.is_safe_url("JaVaScRiPt:alert(1)"));
    assert!(!policy.is_safe_url("java\tscript:alert(1)"));
    assert!(!policy.is_safe_url("&#106;avascript:alert(1)"));
    assert!(!policy.is_safe_url("data:text/html;base64,xx"));
  }

  #[test]
  fn test_iframe_domains() {
    let allowed = check(r#"<iframe src="https://www.youtube.com/embed/abc" width={560} allowFullScreen>"#);
    assert_eq!(allowed, Verdict::Allowed {
      attributes: vec![
        CleanAttribute::new("src", Some("https://www.youtube.com/embed/abc")),
        CleanAttribute::new("width", Some("560")),
        CleanAttribute::new("allowfullscreen", None),
        CleanAttribute::new("sandbox", Some(DEFAULT_SANDBOX)),
      ],
      dropped:    Vec::new(),
    });
    assert_eq!(check(r#"<iframe src="https://evil.example/x">"#), Verdict::Disallowed);
    assert_eq!(check(r#"<iframe src="https://youtube.com.evil.example/">"#), Verdict::Disallowed);
    assert_eq!(check("<iframe>"), Verdict::Disallowed);
  }

  #[test]
  fn test_iframe_sandbox_filtered() {
    let verdict = check(r#"<iframe src="https://codepen.io/x" sandbox="allow-scripts allow-top-navigation">"#);
    assert!(matches!(
      verdict,
      Verdict::Allowed { ref attributes, .. }
        if attributes[1] == CleanAttribute::new("sandbox", Some("allow-scripts"))
    ));
  }

  #[test]
  fn test_jsx_expressions() {
    let verdict = check(r#"<img src="a.png" alt={"A cat"} width={props.w} {...rest} />"#);
    assert_eq!(verdict, Verdict::Allowed {
      attributes: vec![
        CleanAttribute::new("src", Some("a.png")),
        CleanAttribute::new("alt", Some("A cat")),
      ],
      dropped:    vec!["width".to_string(), "{...rest}".to_string()],
    });
  }

  #[test]
  fn test_sanitize_script_is_escaped() {
    let (out, warnings) = sanitize("<script>alert('<b>hi</b>')</script>");
    assert_eq!(
      out.html,
      "&lt;script&gt;alert('&lt;b&gt;hi&lt;/b&gt;')&lt;/script&gt;"
    );
    assert!(out.leading_escaped);
    assert_eq!(warnings, vec![Warning::DisallowedTag {
      tag: "script".to_string(),
    }]);
  }

  #[test]
  fn test_sanitize_canonicalizes_allowed_tags() {
    let (out, warnings) = sanitize(
      "<DIV CLASS=note onmouseover='x()'>\n  <img src='./a.png' alt=\"A & B\"/>\n</DIV>",
    );
    assert_eq!(
      out.html,
      "<div class=\"note\">\n  <img src=\"/post/a.png\" alt=\"A &amp; B\" />\n</div>"
    );
    assert!(!out.leading_escaped);
    assert_eq!(warnings, vec![Warning::DroppedAttribute {
      tag:       "div".to_string(),
      attribute: "onmouseover".to_string(),
    }]);
  }

  #[test]
  fn test_sanitize_path_escape_drops_attribute() {
    let (out, warnings) = sanitize("<img src=\"../../etc/passwd\" alt=\"x\">");
    assert_eq!(out.html, "<img alt=\"x\">");
    assert_eq!(warnings, vec![Warning::PathEscape {
      reference: "../../etc/passwd".to_string(),
    }]);
  }

  #[test]
  fn test_neutralized_closing_tags_are_escaped() {
    let policy = SanitizePolicy::default();
    let context = BaseContext::default();
    let mut sanitizer = Sanitizer::new(&policy, &context);
    let mut warnings = Vec::new();
    let open = sanitizer.sanitize("<iframe src=\"https://evil.example\">", &mut warnings);
    let close = sanitizer.sanitize("</iframe>", &mut warnings);
    assert_eq!(open.html, "&lt;iframe src=\"https://evil.example\"&gt;");
    assert_eq!(close.html, "&lt;/iframe&gt;");
    assert_eq!(warnings.len(), 1);
  }

  #[test]
  fn test_unmatched_closing_tags_are_escaped() {
    let (out, warnings) = sanitize("Hello </div></div></section> world");
    assert_eq!(
      out.html,
      "Hello &lt;/div&gt;&lt;/div&gt;&lt;/section&gt; world"
    );
    assert!(warnings.is_empty());

    let (out, _) = sanitize("</p>after");
    assert_eq!(out.html, "&lt;/p&gt;after");
    assert!(out.leading_escaped);
  }

  #[test]
  fn test_scopes_keep_elements_balanced() {
    let policy = SanitizePolicy::default();
    let context = BaseContext::default();
    let mut sanitizer = Sanitizer::new(&policy, &context);
    let mut warnings = Vec::new();

    let outer = sanitizer.enter_scope();
    let open = sanitizer.sanitize("<div><span>", &mut warnings);
    assert_eq!(open.html, "<div><span>");

    // An inner scope cannot close the outer div
    let inner = sanitizer.enter_scope();
    let stray = sanitizer.sanitize("</div><em>x", &mut warnings);
    assert_eq!(stray.html, "&lt;/div&gt;<em>x");
    assert_eq!(sanitizer.leave_scope(inner), "</em>");

    // Misnested closers close the elements opened after their element
    let close = sanitizer.sanitize("</div>", &mut warnings);
    assert_eq!(close.html, "</span></div>");
    assert_eq!(sanitizer.leave_scope(outer), "");
  }

  #[test]
  fn test_comments_and_stray_brackets() {
    let (out, _) = sanitize("<!-- keep --> a <3 b");
    assert_eq!(out.html, "<!-- keep --> a &lt;3 b");
    let (out, _) = sanitize("<!-- x --!><script>y</script> -->");
    assert!(out.leading_escaped);
    assert!(!out.html.contains("<script"));
  }

  #[test]
  fn test_sanitize_is_a_fixed_point() {
    let inputs = [
      "<div className=\"a\" data-x=\"1\">x &amp; y</div>",
      "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>",
      "<a href=\"/post/a?x=1&b=2\" target=_blank>l</a>",
      "<iframe src=\"https://www.youtube.com/embed/x\"></iframe>",
    ];
    for input in inputs {
      let (once, _) = sanitize(input);
      let (twice, _) = sanitize(&once.html);
      assert_eq!(once.html, twice.html, "for {input}");
    }
  }
}
