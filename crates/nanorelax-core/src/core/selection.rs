//! Boolean filters over monomers, used to pick the members of filter-based
//! clusters.
//!
//! A filter string is a small expression language:
//!
//! ```text
//! expr   := and ("or" and)*
//! and    := unary ("and" unary)*
//! unary  := "not" unary | "(" expr ")" | atom
//! atom   := "all" | "none"
//!         | "name" NAMES | "strand" NAME | "component" NAME
//!         | "kind" ("dna" | "rna" | "protein" | "nucleic")
//!         | "index" N | "index" N-M
//!         | "terminus" ("5" | "3")
//!         | NAMES
//! ```
//!
//! Keywords are case-insensitive. `NAMES` is a comma separated list of
//! monomer names; a bare word is shorthand for `name <word>`, so `"A"` and
//! `"B or C"` are valid filters.

use crate::core::models::component::Component;
use crate::core::models::ids::MonomerId;
use crate::core::models::monomer::{Monomer, Terminus};
use crate::core::models::strand::{Strand, StrandKind};
use crate::core::models::structure::Structure;
use std::iter::Peekable;
use std::str::FromStr;
use std::vec::IntoIter;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SelectionError {
    #[error("Filter expression is empty")]
    Empty,

    #[error("Unexpected end of filter, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("Unexpected token '{token}', expected {expected}")]
    UnexpectedToken {
        token: String,
        expected: &'static str,
    },

    #[error("Invalid index range '{0}'. Expected 'N' or 'N-M' with N <= M.")]
    InvalidIndex(String),

    #[error("Unknown polymer kind '{0}'. Expected 'dna', 'rna', 'protein' or 'nucleic'.")]
    UnknownKind(String),

    #[error("Invalid terminus '{0}'. Expected '5' or '3'.")]
    InvalidTerminus(String),
}

/// Polymer kinds a filter can test for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Dna,
    Rna,
    Protein,
    Nucleic,
}

/// A parsed monomer filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    None,
    Name(Vec<String>),
    Strand(String),
    Component(String),
    Kind(KindFilter),
    Index { start: usize, end: usize },
    Terminus(Terminus),
    Not(Box<Filter>),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
}

struct MonomerContext<'a> {
    monomer: &'a Monomer,
    strand: &'a Strand,
    component: &'a Component,
}

impl Filter {
    /// Parses a filter expression.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] describing the first syntax problem found.
    pub fn parse(expression: &str) -> Result<Self, SelectionError> {
        let tokens = tokenize(expression);
        if tokens.is_empty() {
            return Err(SelectionError::Empty);
        }
        let mut parser = Parser {
            tokens: tokens.into_iter().peekable(),
        };
        let filter = parser.parse_or()?;
        match parser.tokens.next() {
            Some(token) => Err(SelectionError::UnexpectedToken {
                token,
                expected: "'and', 'or' or end of filter",
            }),
            None => Ok(filter),
        }
    }

    /// Tests the filter against a monomer of `structure`. Monomers that are
    /// not part of the structure never match.
    pub fn matches(&self, structure: &Structure, monomer_id: MonomerId) -> bool {
        let Some(monomer) = structure.monomer(monomer_id) else {
            return false;
        };
        let Some(strand) = structure.strand(monomer.strand_id) else {
            return false;
        };
        let Some(component) = structure.component(strand.component_id) else {
            return false;
        };
        self.evaluate(&MonomerContext {
            monomer,
            strand,
            component,
        })
    }

    fn evaluate(&self, context: &MonomerContext<'_>) -> bool {
        match self {
            Filter::All => true,
            Filter::None => false,
            Filter::Name(names) => names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&context.monomer.name)),
            Filter::Strand(name) => context.strand.name == *name,
            Filter::Component(name) => context.component.name == *name,
            Filter::Kind(kind) => match kind {
                KindFilter::Dna => context.strand.kind == StrandKind::Dna,
                KindFilter::Rna => context.strand.kind == StrandKind::Rna,
                KindFilter::Protein => context.strand.kind == StrandKind::Protein,
                KindFilter::Nucleic => context.strand.kind.is_nucleic(),
            },
            Filter::Index { start, end } => {
                (*start..=*end).contains(&context.monomer.sequence_index)
            }
            Filter::Terminus(terminus) => {
                context.strand.terminus_at(context.monomer.sequence_index) == Some(*terminus)
            }
            Filter::Not(inner) => !inner.evaluate(context),
            Filter::And(left, right) => left.evaluate(context) && right.evaluate(context),
            Filter::Or(left, right) => left.evaluate(context) || right.evaluate(context),
        }
    }
}

impl FromStr for Filter {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::parse(s)
    }
}

fn tokenize(expression: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in expression.chars() {
        if c.is_whitespace() || c == '(' || c == ')' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if c == '(' || c == ')' {
                tokens.push(c.to_string());
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

struct Parser {
    tokens: Peekable<IntoIter<String>>,
}

impl Parser {
    fn peek_keyword(&mut self, keyword: &str) -> bool {
        self.tokens
            .peek()
            .is_some_and(|token| token.eq_ignore_ascii_case(keyword))
    }

    fn expect_value(&mut self, expected: &'static str) -> Result<String, SelectionError> {
        match self.tokens.next() {
            Some(token) if token == "(" || token == ")" => {
                Err(SelectionError::UnexpectedToken { token, expected })
            }
            Some(token) => Ok(token),
            None => Err(SelectionError::UnexpectedEnd { expected }),
        }
    }

    fn parse_or(&mut self) -> Result<Filter, SelectionError> {
        let mut left = self.parse_and()?;
        while self.peek_keyword("or") {
            self.tokens.next();
            let right = self.parse_and()?;
            left = Filter::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Filter, SelectionError> {
        let mut left = self.parse_unary()?;
        while self.peek_keyword("and") {
            self.tokens.next();
            let right = self.parse_unary()?;
            left = Filter::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Filter, SelectionError> {
        if self.peek_keyword("not") {
            self.tokens.next();
            return Ok(Filter::Not(Box::new(self.parse_unary()?)));
        }
        if self.peek_keyword("(") {
            self.tokens.next();
            let inner = self.parse_or()?;
            return match self.tokens.next() {
                Some(token) if token == ")" => Ok(inner),
                Some(token) => Err(SelectionError::UnexpectedToken {
                    token,
                    expected: "')'",
                }),
                None => Err(SelectionError::UnexpectedEnd { expected: "')'" }),
            };
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Filter, SelectionError> {
        let token = self
            .tokens
            .next()
            .ok_or(SelectionError::UnexpectedEnd { expected: "a filter term" })?;

        match token.to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "none" => Ok(Filter::None),
            "name" => Ok(Filter::Name(split_names(&self.expect_value("a monomer name")?))),
            "strand" => Ok(Filter::Strand(self.expect_value("a strand name")?)),
            "component" => Ok(Filter::Component(self.expect_value("a component name")?)),
            "kind" => parse_kind(&self.expect_value("a polymer kind")?).map(Filter::Kind),
            "index" => parse_index(&self.expect_value("an index or index range")?),
            "terminus" => parse_terminus(&self.expect_value("'5' or '3'")?).map(Filter::Terminus),
            "and" | "or" | ")" => Err(SelectionError::UnexpectedToken {
                token,
                expected: "a filter term",
            }),
            _ => Ok(Filter::Name(split_names(&token))),
        }
    }
}

fn split_names(token: &str) -> Vec<String> {
    token
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_kind(value: &str) -> Result<KindFilter, SelectionError> {
    match value.to_ascii_lowercase().as_str() {
        "dna" => Ok(KindFilter::Dna),
        "rna" => Ok(KindFilter::Rna),
        "protein" => Ok(KindFilter::Protein),
        "nucleic" => Ok(KindFilter::Nucleic),
        _ => Err(SelectionError::UnknownKind(value.to_string())),
    }
}

fn parse_index(value: &str) -> Result<Filter, SelectionError> {
    let invalid = || SelectionError::InvalidIndex(value.to_string());
    let (start, end) = match value.split_once('-') {
        Some((start, end)) => (
            start.trim().parse::<usize>().map_err(|_| invalid())?,
            end.trim().parse::<usize>().map_err(|_| invalid())?,
        ),
        None => {
            let index = value.trim().parse::<usize>().map_err(|_| invalid())?;
            (index, index)
        }
    };
    if start > end {
        return Err(invalid());
    }
    Ok(Filter::Index { start, end })
}

fn parse_terminus(value: &str) -> Result<Terminus, SelectionError> {
    match value.to_ascii_lowercase().trim_end_matches('\'') {
        "5" | "five" | "n" => Ok(Terminus::FivePrime),
        "3" | "three" | "c" => Ok(Terminus::ThreePrime),
        _ => Err(SelectionError::InvalidTerminus(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::MonomerId;
    use nalgebra::Point3;

    fn create_test_structure() -> (Structure, Vec<MonomerId>) {
        let mut structure = Structure::new();
        let origami = structure.add_component("origami");
        let scaffold = structure
            .add_strand(origami, "scaffold", StrandKind::Dna, false)
            .unwrap();
        let mut ids = Vec::new();
        for name in ["A", "C", "G", "T"] {
            ids.push(
                structure
                    .add_monomer(scaffold, name, Point3::origin())
                    .unwrap(),
            );
        }
        let binder = structure.add_component("binder");
        let chain = structure
            .add_strand(binder, "P", StrandKind::Protein, false)
            .unwrap();
        ids.push(structure.add_monomer(chain, "ALA", Point3::origin()).unwrap());
        (structure, ids)
    }

    fn matching(filter: &str, structure: &Structure, ids: &[MonomerId]) -> Vec<usize> {
        let filter = Filter::parse(filter).unwrap();
        ids.iter()
            .enumerate()
            .filter(|(_, id)| filter.matches(structure, **id))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn bare_words_are_name_shorthand() {
        assert_eq!(
            Filter::parse("A").unwrap(),
            Filter::Name(vec!["A".to_string()])
        );
        let (structure, ids) = create_test_structure();
        assert_eq!(matching("C or G", &structure, &ids), vec![1, 2]);
        assert_eq!(matching("name a,t", &structure, &ids), vec![0, 3]);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = Filter::parse("A or C and G").unwrap();
        assert_eq!(
            parsed,
            Filter::Or(
                Box::new(Filter::Name(vec!["A".into()])),
                Box::new(Filter::And(
                    Box::new(Filter::Name(vec!["C".into()])),
                    Box::new(Filter::Name(vec!["G".into()])),
                )),
            )
        );
    }

    #[test]
    fn structural_terms_match_expected_monomers() {
        let (structure, ids) = create_test_structure();
        assert_eq!(matching("kind protein", &structure, &ids), vec![4]);
        assert_eq!(matching("kind nucleic", &structure, &ids), vec![0, 1, 2, 3]);
        assert_eq!(matching("component binder", &structure, &ids), vec![4]);
        assert_eq!(matching("strand scaffold and index 1-2", &structure, &ids), vec![1, 2]);
        assert_eq!(matching("terminus 3 and kind dna", &structure, &ids), vec![3]);
        assert_eq!(matching("not (kind dna or ALA)", &structure, &ids), Vec::<usize>::new());
        assert_eq!(matching("all", &structure, &ids).len(), 5);
        assert!(matching("none", &structure, &ids).is_empty());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let (structure, ids) = create_test_structure();
        assert_eq!(matching("KIND DNA AND NOT Index 0", &structure, &ids), vec![1, 2, 3]);
    }

    #[test]
    fn parse_errors_are_reported() {
        assert_eq!(Filter::parse("   "), Err(SelectionError::Empty));
        assert!(matches!(
            Filter::parse("kind lipid"),
            Err(SelectionError::UnknownKind(_))
        ));
        assert!(matches!(
            Filter::parse("index 5-2"),
            Err(SelectionError::InvalidIndex(_))
        ));
        assert!(matches!(
            Filter::parse("(A or C"),
            Err(SelectionError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            Filter::parse("A C"),
            Err(SelectionError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Filter::parse("A or"),
            Err(SelectionError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            Filter::parse("terminus 4"),
            Err(SelectionError::InvalidTerminus(_))
        ));
    }

    #[test]
    fn unknown_monomer_never_matches() {
        let (structure, _) = create_test_structure();
        assert!(!Filter::All.matches(&structure, MonomerId::default()));
    }
}
