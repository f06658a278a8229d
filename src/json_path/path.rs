use std::fmt::{self, Display};
use std::str::FromStr;

use super::PathError;

/// A navigation step taken before the terminal token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(String),
    Index(usize),
}

/// The final token of a path. Wildcards are only representable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    Key(String),
    Index(usize),
    /// `*key`: member `key` of every object in the current array.
    EachKey(String),
    /// `*[N]`: index `N` of every array in the current array.
    EachIndex(usize),
}

/// A parsed path expression such as `items.[0].*id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    parents: Vec<Step>,
    terminal: Terminal,
}

impl JsonPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::syntax(raw, "path cannot be empty"));
        }

        let tokens: Vec<&str> = raw.split('.').collect();
        let (last, init) = tokens
            .split_last()
            .ok_or_else(|| PathError::syntax(raw, "path cannot be empty"))?;

        let mut parents = Vec::with_capacity(init.len());
        for token in init {
            if token.starts_with('*') {
                return Err(PathError::syntax(
                    raw,
                    "`*` must only be used in the final token of a path",
                ));
            }
            parents.push(parse_step(raw, token)?);
        }

        let terminal = match last.strip_prefix('*') {
            Some("") => return Err(PathError::syntax(raw, "wildcard needs a key or index")),
            Some(rest) if rest.starts_with('[') => Terminal::EachIndex(parse_index(raw, rest)?),
            Some(rest) => Terminal::EachKey(rest.to_string()),
            None => match parse_step(raw, last)? {
                Step::Key(key) => Terminal::Key(key),
                Step::Index(index) => Terminal::Index(index),
            },
        };

        Ok(Self {
            raw: raw.to_string(),
            parents,
            terminal,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parents(&self) -> &[Step] {
        &self.parents
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonPath::parse(s)
    }
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn parse_step(raw: &str, token: &str) -> Result<Step, PathError> {
    if token.starts_with('[') {
        Ok(Step::Index(parse_index(raw, token)?))
    } else {
        Ok(Step::Key(token.to_string()))
    }
}

fn parse_index(raw: &str, token: &str) -> Result<usize, PathError> {
    let inner = token
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| PathError::syntax(raw, format!("malformed index token `{token}`")))?;
    inner
        .parse::<usize>()
        .map_err(|_| PathError::syntax(raw, format!("index must be a non-negative integer: `{token}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_indices() {
        let path = JsonPath::parse("a.[2].b").unwrap();
        assert_eq!(path.parents(), &[Step::Key("a".into()), Step::Index(2)]);
        assert_eq!(path.terminal(), &Terminal::Key("b".into()));
    }

    #[test]
    fn parses_wildcard_terminals() {
        let each_key: JsonPath = "items.*id".parse().unwrap();
        assert_eq!(each_key.terminal(), &Terminal::EachKey("id".into()));

        let each_index: JsonPath = "*[1]".parse().unwrap();
        assert!(each_index.parents().is_empty());
        assert_eq!(each_index.terminal(), &Terminal::EachIndex(1));
    }

    #[test]
    fn rejects_empty_path() {
        assert!(matches!(JsonPath::parse(""), Err(PathError::Syntax { .. })));
    }

    #[test]
    fn rejects_wildcard_before_last_token() {
        let err = JsonPath::parse("missing.*a.b").unwrap_err();
        assert!(matches!(err, PathError::Syntax { .. }));
    }

    #[test]
    fn rejects_bare_wildcard() {
        assert!(matches!(JsonPath::parse("a.*"), Err(PathError::Syntax { .. })));
        assert!(matches!(JsonPath::parse("*"), Err(PathError::Syntax { .. })));
    }

    #[test]
    fn rejects_malformed_index() {
        assert!(JsonPath::parse("[x]").is_err());
        assert!(JsonPath::parse("a.[-1]").is_err());
        assert!(JsonPath::parse("[3").is_err());
        assert!(JsonPath::parse("*[a]").is_err());
    }

    #[test]
    fn display_round_trips_raw_text() {
        let path = JsonPath::parse("z.*[0]").unwrap();
        assert_eq!(path.to_string(), "z.*[0]");
    }
}
