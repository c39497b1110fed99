//! Dependency strings as written in `pyproject.toml`
//!
//! Handles the subset of PEP 508 that appears in manifests:
//! `name[extra, ...] specifier, specifier ; marker` and `name @ url ; marker`.

use crate::core::error::{ActionError, ActionResult};
use std::fmt;

/// Comparison operators, declared in canonical rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
  ArbitraryEqual,
  Equal,
  Compatible,
  GreaterEqual,
  Greater,
  LessEqual,
  Less,
  NotEqual,
}

impl Operator {
  /// Longest operators first so that `===` is not read as `==`
  const PARSE_ORDER: [Operator; 8] = [
    Operator::ArbitraryEqual,
    Operator::Equal,
    Operator::Compatible,
    Operator::NotEqual,
    Operator::GreaterEqual,
    Operator::LessEqual,
    Operator::Greater,
    Operator::Less,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Operator::ArbitraryEqual => "===",
      Operator::Equal => "==",
      Operator::Compatible => "~=",
      Operator::GreaterEqual => ">=",
      Operator::Greater => ">",
      Operator::LessEqual => "<=",
      Operator::Less => "<",
      Operator::NotEqual => "!=",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specifier {
  pub op: Operator,
  pub version: String,
}

impl Specifier {
  fn parse(text: &str) -> ActionResult<Self> {
    let text = text.trim();
    for op in Operator::PARSE_ORDER {
      if let Some(version) = text.strip_prefix(op.as_str()) {
        let version = version.trim();
        if version.is_empty() {
          break;
        }
        return Ok(Self {
          op,
          version: version.to_string(),
        });
      }
    }
    Err(ActionError::message(format!("Invalid version specifier '{}'", text)))
  }
}

impl fmt::Display for Specifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.op.as_str(), self.version)
  }
}

/// A parsed dependency string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
  pub name: String,
  pub extras: Vec<String>,
  pub specifiers: Vec<Specifier>,
  pub url: Option<String>,
  pub marker: Option<String>,
}

impl Requirement {
  pub fn parse(text: &str) -> ActionResult<Self> {
    let invalid = |reason: &str| ActionError::message(format!("Invalid requirement '{}': {}", text, reason));

    let (body, marker) = match text.split_once(';') {
      Some((body, marker)) if !marker.trim().is_empty() => (body, Some(marker.trim().to_string())),
      Some(_) => return Err(invalid("empty marker")),
      None => (text, None),
    };
    let body = body.trim();

    let name_end = body
      .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
      .unwrap_or(body.len());
    let name = &body[..name_end];
    if name.is_empty() {
      return Err(invalid("missing name"));
    }
    let mut rest = body[name_end..].trim_start();

    let mut extras = Vec::new();
    if let Some(after) = rest.strip_prefix('[') {
      let close = after.find(']').ok_or_else(|| invalid("unclosed extras"))?;
      extras = after[..close]
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();
      rest = after[close + 1..].trim_start();
    }

    let mut url = None;
    let mut specifiers = Vec::new();
    if let Some(after) = rest.strip_prefix('@') {
      let target = after.trim();
      if target.is_empty() {
        return Err(invalid("missing url"));
      }
      url = Some(target.to_string());
    } else {
      let inner = match rest.strip_prefix('(') {
        Some(after) => after.strip_suffix(')').ok_or_else(|| invalid("unclosed parenthesis"))?,
        None => rest,
      };
      for piece in inner.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        specifiers.push(Specifier::parse(piece)?);
      }
    }

    let mut requirement = Self {
      name: name.to_string(),
      extras,
      specifiers,
      url,
      marker,
    };
    requirement.canonicalize();
    Ok(requirement)
  }

  /// Name normalized for lookups (PEP 503)
  pub fn key(&self) -> String {
    normalize_name(&self.name)
  }

  pub fn get(&self, op: Operator) -> Option<&str> {
    self.specifiers.iter().find(|s| s.op == op).map(|s| s.version.as_str())
  }

  /// Replace every specifier using `op` with a single one
  pub fn set(&mut self, op: Operator, version: impl fmt::Display) {
    self.specifiers.retain(|s| s.op != op);
    self.specifiers.push(Specifier {
      op,
      version: version.to_string(),
    });
    self.canonicalize();
  }

  fn canonicalize(&mut self) {
    self.extras.sort();
    self.extras.dedup();
    self.specifiers.sort();
    self.specifiers.dedup();
  }
}

impl fmt::Display for Requirement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)?;
    if !self.extras.is_empty() {
      write!(f, "[{}]", self.extras.join(","))?;
    }
    if let Some(url) = &self.url {
      write!(f, " @ {}", url)?;
      if let Some(marker) = &self.marker {
        write!(f, " ; {}", marker)?;
      }
      return Ok(());
    }
    if !self.specifiers.is_empty() {
      let joined = self.specifiers.iter().map(Specifier::to_string).collect::<Vec<_>>().join(", ");
      write!(f, " {}", joined)?;
    }
    if let Some(marker) = &self.marker {
      write!(f, "; {}", marker)?;
    }
    Ok(())
  }
}

/// Lowercase, with runs of `-`, `_` and `.` collapsed to `-`
pub fn normalize_name(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  let mut in_separator = false;
  for c in name.chars() {
    if matches!(c, '-' | '_' | '.') {
      in_separator = true;
      continue;
    }
    if in_separator && !out.is_empty() {
      out.push('-');
    }
    in_separator = false;
    out.push(c.to_ascii_lowercase());
  }
  out
}
