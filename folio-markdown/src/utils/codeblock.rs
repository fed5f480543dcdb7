use std::borrow::Cow;

use log::warn;

use crate::{error::Warning, processor::TabStyle};

/// Apply a [`TabStyle`] to the text of one fenced code block.
///
/// `fence_line` is the source line of the block's opening fence. `Warn`
/// records a single [`Warning::HardTabs`] for the block, `Normalize` replaces
/// each tab with two spaces.
pub fn apply_tab_style<'a>(
  text: &'a str,
  fence_line: usize,
  style: TabStyle,
  warnings: &mut Vec<Warning>,
) -> Cow<'a, str> {
  if !text.contains('\t') {
    return Cow::Borrowed(text);
  }

  match style {
    TabStyle::None => Cow::Borrowed(text),
    TabStyle::Warn => {
      warn!("Hard tabs in code block starting on line {fence_line}");
      warnings.push(Warning::HardTabs { line: fence_line });
      Cow::Borrowed(text)
    },
    TabStyle::Normalize => Cow::Owned(text.replace('\t', "  ")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_style_none_borrows() {
    let mut warnings = Vec::new();
    let out = apply_tab_style("\tx", 1, TabStyle::None, &mut warnings);
    assert!(matches!(out, Cow::Borrowed("\tx")));
    assert!(warnings.is_empty());
  }

  #[test]
  fn test_warn_once_per_block() {
    let mut warnings = Vec::new();
    let out = apply_tab_style("\ta\n\tb", 10, TabStyle::Warn, &mut warnings);
    assert_eq!(out, "\ta\n\tb");
    assert_eq!(warnings, vec![Warning::HardTabs { line: 10 }]);
  }

  #[test]
  fn test_normalize() {
    let mut warnings = Vec::new();
    let out = apply_tab_style("if x:\n\treturn", 1, TabStyle::Normalize, &mut warnings);
    assert_eq!(out, "if x:\n  return");
    assert!(warnings.is_empty());

    let out = apply_tab_style("no tabs", 1, TabStyle::Normalize, &mut warnings);
    assert!(matches!(out, Cow::Borrowed(_)));
  }
}
