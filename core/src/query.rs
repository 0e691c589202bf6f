use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet};

use crate::index::Postings;
use crate::DocId;

/// One term of a boolean expression; `!term` negates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub term: String,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    And,
    Or,
}

/// A parsed expression: operands and binary operators strictly alternating,
/// starting and ending on an operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    operands: Vec<Operand>,
    operators: Vec<BinOp>,
}

impl Query {
    /// Parses a whitespace-delimited expression such as `web & !archive | news`.
    /// Malformed input is rejected outright, never evaluated partially.
    pub fn parse(input: &str) -> Result<Self> {
        let mut operands: Vec<Operand> = Vec::new();
        let mut operators: Vec<BinOp> = Vec::new();
        for word in input.split_whitespace() {
            match word {
                "&" | "|" => {
                    if operators.len() + 1 != operands.len() {
                        bail!("operator `{word}` must follow an operand");
                    }
                    operators.push(if word == "&" { BinOp::And } else { BinOp::Or });
                }
                _ => {
                    if operands.len() != operators.len() {
                        bail!("operand `{word}` must follow an operator");
                    }
                    let (term, negated) = match word.strip_prefix('!') {
                        Some(rest) => (rest, true),
                        None => (word, false),
                    };
                    if term.is_empty() {
                        bail!("`!` must prefix a term");
                    }
                    operands.push(Operand {
                        term: term.to_string(),
                        negated,
                    });
                }
            }
        }
        if operands.is_empty() {
            bail!("empty query expression");
        }
        if operands.len() != operators.len() + 1 {
            bail!("expression must end on an operand");
        }
        Ok(Self {
            operands,
            operators,
        })
    }

    /// Evaluates with AND binding tighter than OR, in one left-to-right pass:
    /// the running AND-group is intersected on `&` and flushed into the union
    /// on `|`, so a completed group is never overwritten.
    pub fn eval(
        &self,
        postings: &Postings,
        manifest: &BTreeMap<DocId, String>,
    ) -> BTreeSet<DocId> {
        let universe: BTreeSet<DocId> = manifest.keys().copied().collect();
        let mut result = BTreeSet::new();
        let mut group = self.operand_docs(0, postings, &universe);
        for (i, op) in self.operators.iter().enumerate() {
            let next = self.operand_docs(i + 1, postings, &universe);
            match op {
                BinOp::And => group = group.intersection(&next).copied().collect(),
                BinOp::Or => {
                    result.extend(group);
                    group = next;
                }
            }
        }
        result.extend(group);
        result
    }

    fn operand_docs(
        &self,
        idx: usize,
        postings: &Postings,
        universe: &BTreeSet<DocId>,
    ) -> BTreeSet<DocId> {
        let operand = &self.operands[idx];
        let matched = postings.get(&operand.term);
        if operand.negated {
            // Negating a term absent from the index matches every document.
            match matched {
                Some(ids) => universe.difference(ids).copied().collect(),
                None => universe.clone(),
            }
        } else {
            matched.cloned().unwrap_or_default()
        }
    }
}
