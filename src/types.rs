//! Core policy attribute types

use crate::error::AuthzError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attribute operator, in recognized-token order.
///
/// Policy records spell these as the usual token strings (`+=`, `:=`, `==`,
/// ...). Anything outside this set is rejected at parse time rather than
/// silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `+=` append to the attribute
    Add,
    /// `-=` remove from the attribute
    Subtract,
    /// `:=` set, replacing any previous value
    Set,
    /// `=` set if not already present
    Eq,
    /// `!=` not equal
    NotEq,
    /// `<` less than
    Lt,
    /// `>` greater than
    Gt,
    /// `<=` less than or equal
    Le,
    /// `>=` greater than or equal
    Ge,
    /// `==` comparison equality (check items)
    CmpEq,
}

impl Operator {
    /// The token spelling used in policy records.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Add => "+=",
            Operator::Subtract => "-=",
            Operator::Set => ":=",
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::CmpEq => "==",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Operator {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+=" => Ok(Operator::Add),
            "-=" => Ok(Operator::Subtract),
            ":=" => Ok(Operator::Set),
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::Le),
            ">=" => Ok(Operator::Ge),
            "==" => Ok(Operator::CmpEq),
            other => Err(AuthzError::InvalidOperator(other.to_string())),
        }
    }
}

/// One policy attribute: `(name, operator, value)`.
///
/// Ordering is significant; duplicates with the same name are legal and
/// meaningful to the merge semantics downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAttribute {
    pub name: String,
    pub op: Operator,
    pub value: String,
}

impl PolicyAttribute {
    /// Construct an attribute, validating the name.
    ///
    /// Names must be non-empty and use only ASCII alphanumerics, `-`, `_`,
    /// `.` or `/`. A rejected name is the decoder's abort condition.
    pub fn new(
        name: impl Into<String>,
        op: Operator,
        value: impl Into<String>,
    ) -> Result<Self, AuthzError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));
        if !valid {
            return Err(AuthzError::InvalidAttribute(name));
        }
        Ok(Self {
            name,
            op,
            value: value.into(),
        })
    }
}

impl fmt::Display for PolicyAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.op, self.value)
    }
}

/// Ordered, mutable sequence of policy attributes.
///
/// Lists are request-local: produced by the decoder, merged into session
/// state with [`AttributeList::move_into`], and dropped by the end of the
/// authorization pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeList(Vec<PolicyAttribute>);

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attr: PolicyAttribute) {
        self.0.push(attr);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PolicyAttribute> {
        self.0.iter()
    }

    /// First attribute with the given name, if any.
    pub fn find(&self, name: &str) -> Option<&PolicyAttribute> {
        self.0.iter().find(|attr| attr.name == name)
    }

    /// Transfer every attribute into `dest`, preserving order and leaving
    /// this list empty. Ownership moves; there is never a second live copy.
    pub fn move_into(&mut self, dest: &mut AttributeList) {
        dest.0.append(&mut self.0);
    }
}

impl IntoIterator for AttributeList {
    type Item = PolicyAttribute;
    type IntoIter = std::vec::IntoIter<PolicyAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AttributeList {
    type Item = &'a PolicyAttribute;
    type IntoIter = std::slice::Iter<'a, PolicyAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<PolicyAttribute> for AttributeList {
    fn from_iter<T: IntoIterator<Item = PolicyAttribute>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of one authorization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthzOutcome {
    /// A check record matched; merged attributes are usable
    Ok,
    /// The request carried no identity to evaluate
    Noop,
    /// No check record matched anywhere
    NotFound,
    /// Operational failure; the caller must reject the session
    Fail,
}
