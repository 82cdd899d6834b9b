//! Run-time security levels and the flow lattice over them.
//!
//! A [`Level`] is a finite set of [`Principal`]s, or the distinguished
//! [`Level::Top`] element standing for "every principal". Ordering is subset
//! inclusion: data labeled `A` may be observed through a channel labeled `B`
//! exactly when `A ⊆ B`.
//!
//! ```
//! use label_types::Level;
//!
//! let alice: Level = "{alice}".parse().unwrap();
//! let team: Level = "{alice, bob}".parse().unwrap();
//!
//! assert!(alice.can_flow_to(&team));
//! assert!(!team.can_flow_to(&alice));
//! assert_eq!(alice.join(&team), team);
//! assert_eq!(alice.meet(&team), alice);
//! assert!(Level::bot() < alice && team < Level::top());
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::LevelParseError;
use crate::principal::Principal;

/// A security level: a set of principals, or the universal `Top`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    /// A finite set of principals. The empty set is `Bot` (public data).
    Principals(BTreeSet<Principal>),
    /// The universal set: accepts data from any principal.
    Top,
}

impl Level {
    /// The public level, the global minimum
    pub fn bot() -> Self {
        Level::Principals(BTreeSet::new())
    }

    /// The universal level, the global maximum
    pub fn top() -> Self {
        Level::Top
    }

    /// A level naming exactly one principal
    pub fn singleton(principal: impl Into<Principal>) -> Self {
        Level::Principals(BTreeSet::from([principal.into()]))
    }

    /// Build a level from any collection of principals
    pub fn from_principals<I, P>(principals: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Principal>,
    {
        Level::Principals(principals.into_iter().map(Into::into).collect())
    }

    /// `true` for the empty set
    pub fn is_bot(&self) -> bool {
        matches!(self, Level::Principals(set) if set.is_empty())
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Level::Top)
    }

    /// The principals of a finite level; `None` for `Top`
    pub fn principals(&self) -> Option<&BTreeSet<Principal>> {
        match self {
            Level::Principals(set) => Some(set),
            Level::Top => None,
        }
    }

    /// Whether the level includes the named principal
    pub fn contains(&self, principal: &str) -> bool {
        match self {
            Level::Principals(set) => set.contains(principal),
            Level::Top => true,
        }
    }

    /// `A ⊆ B`: data labeled `self` may flow to a channel labeled `other`.
    pub fn can_flow_to(&self, other: &Level) -> bool {
        match (self, other) {
            (_, Level::Top) => true,
            (Level::Top, Level::Principals(_)) => false,
            (Level::Principals(a), Level::Principals(b)) => a.is_subset(b),
        }
    }

    /// Least upper bound (set union)
    pub fn join(&self, other: &Level) -> Level {
        match (self, other) {
            (Level::Top, _) | (_, Level::Top) => Level::Top,
            (Level::Principals(a), Level::Principals(b)) => {
                Level::Principals(a.union(b).cloned().collect())
            }
        }
    }

    /// Greatest lower bound (set intersection)
    pub fn meet(&self, other: &Level) -> Level {
        match (self, other) {
            (Level::Top, x) | (x, Level::Top) => x.clone(),
            (Level::Principals(a), Level::Principals(b)) => {
                Level::Principals(a.intersection(b).cloned().collect())
            }
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::bot()
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.can_flow_to(other), other.can_flow_to(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Top => f.write_str("top"),
            Level::Principals(set) => {
                f.write_str("{")?;
                for (i, p) in set.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_principal(f, p.name())?;
                }
                f.write_str("}")
            }
        }
    }
}

impl FromStr for Level {
    type Err = LevelParseError;

    /// Accepts `top`, `bot`, `{}` and `{alice, bob}` (braces optional).
    /// Names holding whitespace, braces, commas, quotes or backslashes, and
    /// the empty name, are written in double quotes with backslash escapes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "top" => return Ok(Level::Top),
            "bot" | "" => return Ok(Level::bot()),
            _ => {}
        }

        let inner = match (trimmed.strip_prefix('{'), trimmed.strip_suffix('}')) {
            (Some(_), Some(_)) => &trimmed[1..trimmed.len() - 1],
            (None, None) => trimmed,
            _ => return Err(LevelParseError::UnbalancedBraces(trimmed.to_string())),
        };

        if inner.trim().is_empty() {
            return Ok(Level::bot());
        }

        let mut principals = BTreeSet::new();
        let mut rest = inner.trim_start();
        loop {
            let (name, tail) = if let Some(quoted) = rest.strip_prefix('"') {
                read_quoted(quoted, trimmed)?
            } else {
                let end = rest.find(',').unwrap_or(rest.len());
                let name = rest[..end].trim();
                if name.is_empty() {
                    return Err(LevelParseError::EmptyPrincipal(trimmed.to_string()));
                }
                if !is_bare(name) {
                    return Err(LevelParseError::InvalidPrincipal(name.to_string()));
                }
                (name.to_string(), &rest[end..])
            };
            principals.insert(Principal::new(name));

            let tail = tail.trim_start();
            match tail.strip_prefix(',') {
                Some(next) => rest = next.trim_start(),
                None if tail.is_empty() => break,
                None => return Err(LevelParseError::InvalidPrincipal(tail.to_string())),
            }
        }
        Ok(Level::Principals(principals))
    }
}

/// Names that can be written without quotes.
fn is_bare(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(|c: char| {
            c.is_whitespace() || matches!(c, '{' | '}' | ',' | '"' | '\\')
        })
}

fn write_principal(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_bare(name) {
        return f.write_str(name);
    }
    f.write_str("\"")?;
    for c in name.chars() {
        if matches!(c, '"' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

/// Read a quoted name up to its closing quote. `s` starts after the opening
/// quote; returns the unescaped name and the input after the closing quote.
fn read_quoted<'a>(s: &'a str, level: &str) -> Result<(String, &'a str), LevelParseError> {
    let mut name = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((name, &s[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) => name.push(escaped),
                None => break,
            },
            other => name.push(other),
        }
    }
    Err(LevelParseError::UnterminatedQuote(level.to_string()))
}

impl TryFrom<String> for Level {
    type Error = LevelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lvl(s: &str) -> Level {
        s.parse().unwrap()
    }

    #[test]
    fn bot_and_top_bound_everything() {
        let a = lvl("{alice}");
        assert!(Level::bot().can_flow_to(&a));
        assert!(a.can_flow_to(&Level::top()));
        assert!(Level::bot().can_flow_to(&Level::top()));
        assert!(!Level::top().can_flow_to(&a));
    }

    #[test]
    fn incomparable_levels_have_no_order() {
        let a = lvl("{alice}");
        let b = lvl("{bob}");
        assert_eq!(a.partial_cmp(&b), None);
        assert_eq!(a.join(&b), lvl("{alice, bob}"));
        assert!(a.meet(&b).is_bot());
    }

    #[test]
    fn top_absorbs_join_and_is_identity_for_meet() {
        let a = lvl("{alice}");
        assert!(a.join(&Level::top()).is_top());
        assert_eq!(Level::top().meet(&a), a);
    }

    #[test]
    fn display_round_trips() {
        for s in ["{}", "{alice}", "{alice, bob}", "top"] {
            assert_eq!(lvl(s).to_string(), s);
        }
        assert_eq!(lvl("bot"), Level::bot());
        assert_eq!(lvl("carol,alice"), lvl("{alice, carol}"));
    }

    #[test]
    fn parse_rejects_malformed_levels() {
        assert!(matches!(
            "{alice".parse::<Level>(),
            Err(LevelParseError::UnbalancedBraces(_))
        ));
        assert!(matches!(
            "{alice,,bob}".parse::<Level>(),
            Err(LevelParseError::EmptyPrincipal(_))
        ));
        assert!(matches!(
            "{al ice}".parse::<Level>(),
            Err(LevelParseError::InvalidPrincipal(_))
        ));
    }

    #[test]
    fn awkward_principal_names_round_trip() {
        let names = ["a,b", "two words", "{x}", "", "say \"hi\"", "back\\slash", "top"];
        for name in names {
            let level = Level::from_principals([name, "bob"]);
            let text = level.to_string();
            assert_eq!(text.parse::<Level>().unwrap(), level, "via {text}");

            let json = serde_json::to_string(&level).unwrap();
            let back: Level = serde_json::from_str(&json).unwrap();
            assert_eq!(back, level);
        }
        assert_eq!(Level::singleton("a,b").to_string(), "{\"a,b\"}");
        assert_eq!(lvl("{\"a,b\"}").principals().unwrap().len(), 1);
    }

    #[test]
    fn parse_rejects_unterminated_quotes() {
        assert!(matches!(
            "{\"alice}".parse::<Level>(),
            Err(LevelParseError::UnterminatedQuote(_))
        ));
        assert!(matches!(
            "{\"alice\" bob}".parse::<Level>(),
            Err(LevelParseError::InvalidPrincipal(_))
        ));
    }

    #[test]
    fn contains_checks_membership() {
        let team = lvl("{alice, bob}");
        assert!(team.contains("alice"));
        assert!(!team.contains("carol"));
        assert!(Level::top().contains("anyone"));
    }

    #[test]
    fn serde_uses_display_form() {
        let team = lvl("{alice, bob}");
        let json = serde_json::to_string(&team).unwrap();
        assert_eq!(json, "\"{alice, bob}\"");
        let back: Level = serde_json::from_str(&json).unwrap();
        assert_eq!(back, team);
    }
}
