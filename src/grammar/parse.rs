use std::collections::HashSet;

use log::debug;

use super::{ARROWS, END_MARK, EPSILON, EPSILON_ALIAS};
use crate::{AnalysisError, Grammar};

fn is_epsilon(s: &str) -> bool {
    s == EPSILON || s == EPSILON_ALIAS
}

/// Splits a rule line at its arrow. `→` is looked for before `->`.
fn split_arrow(line: &str) -> Option<(&str, &str)> {
    ARROWS
        .iter()
        .find_map(|arrow| line.find(arrow).map(|pos| (pos, arrow.len())))
        .map(|(pos, len)| (&line[..pos], &line[pos + len..]))
}

impl Grammar {
    /// Loads a grammar from `LHS -> alt | alt` lines.
    ///
    /// Lines without an arrow are skipped. The left side of the first rule
    /// line is the start symbol. Every body symbol that never appears as a
    /// left side is a terminal.
    pub fn parse(grammar: &str) -> Result<Self, AnalysisError> {
        let mut g = Self::new();

        let mut raw_productions: Vec<(usize, &str)> = Vec::new();

        for (i, line) in grammar.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((left_str, rights)) = split_arrow(line) else {
                continue;
            };
            if split_arrow(rights).is_some() {
                return Err(AnalysisError::TooManyArrows { line: i + 1 });
            }

            let left_str = left_str.trim();
            if left_str.is_empty() {
                return Err(AnalysisError::MissingHead { line: i + 1 });
            } else if left_str.split_whitespace().count() != 1 {
                return Err(AnalysisError::HeadContainsWhitespace { line: i + 1 });
            } else if is_epsilon(left_str) || left_str == END_MARK {
                return Err(AnalysisError::ReservedHead {
                    line: i + 1,
                    name: left_str.to_string(),
                });
            }

            let left = match g.get_symbol_index(left_str) {
                Some(idx) => idx,
                None => g.add_non_terminal(left_str),
            };
            raw_productions.push((left, rights.trim()));
        }

        let Some(&(start_symbol, _)) = raw_productions.first() else {
            return Err(AnalysisError::EmptyGrammar);
        };

        // every left side is known by now, so anything else is a terminal
        for (left, rights) in raw_productions {
            for right in rights.split('|') {
                let right = right.trim();
                if right.is_empty() {
                    continue;
                }
                let symbols: Vec<usize> = right
                    .split_whitespace()
                    .filter(|s| !is_epsilon(s))
                    .map(|s| match g.get_symbol_index(s) {
                        Some(idx) => idx,
                        None => g.add_terminal(s.to_string()),
                    })
                    .collect();
                let production = if symbols.is_empty() {
                    vec![g.epsilon]
                } else {
                    symbols
                };
                g.add_production(left, production);
            }
        }

        g.add_end_mark();
        g.start_symbol = start_symbol;
        g.order = g.canonical_order();

        debug!(
            "loaded grammar: start {}, order [{}], {} terminals",
            g.get_symbol_name(g.start_symbol),
            g.production_to_vec_str(&g.order).join(", "),
            g.terminal_iter().count(),
        );

        Ok(g)
    }

    /// Depth-first order over nonterminals reachable from the start symbol,
    /// visiting the references of each body left to right. Unreachable
    /// nonterminals follow in declaration order.
    fn canonical_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = Vec::new();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut stack: Vec<usize> = vec![self.start_symbol];

        while let Some(nt) = stack.pop() {
            if !visited.insert(nt) {
                continue;
            }
            order.push(nt);

            let mut referenced: Vec<usize> = Vec::new();
            for production in self.productions_of(nt) {
                for &s in production {
                    if self.is_non_terminal(s)
                        && !visited.contains(&s)
                        && !stack.contains(&s)
                        && !referenced.contains(&s)
                    {
                        referenced.push(s);
                    }
                }
            }
            stack.extend(referenced.into_iter().rev());
        }

        for (idx, symbol) in self.symbols.iter().enumerate() {
            if symbol.non_terminal().is_some() && !visited.contains(&idx) {
                order.push(idx);
            }
        }

        order
    }
}
