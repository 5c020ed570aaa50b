use std::collections::BTreeSet;

use log::debug;

use super::{grammar::Symbol, Grammar};

/// FIRST and FOLLOW sets indexed by symbol index.
///
/// FIRST is defined for every symbol; FOLLOW is empty for anything that is
/// not a nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFollow {
    pub first: Vec<BTreeSet<usize>>,
    pub follow: Vec<BTreeSet<usize>>,
}

impl FirstFollow {
    pub fn first(&self, symbol: usize) -> &BTreeSet<usize> {
        &self.first[symbol]
    }

    pub fn follow(&self, symbol: usize) -> &BTreeSet<usize> {
        &self.follow[symbol]
    }
}

/// Adds `b` to `a` and reports whether `a` grew.
fn extend_changed(a: &mut BTreeSet<usize>, b: impl IntoIterator<Item = usize>) -> bool {
    let len = a.len();
    a.extend(b);
    a.len() != len
}

impl Grammar {
    pub fn calculate_first_follow(&self) -> FirstFollow {
        let first = self.calculate_first();
        let follow = self.calculate_follow(&first);
        FirstFollow { first, follow }
    }

    /// FIRST of a body scanned left to right, stopping at the first symbol
    /// whose FIRST lacks epsilon. Returns the terminals found and whether the
    /// whole body can derive epsilon.
    pub fn calculate_first_for_production(
        &self,
        first: &[BTreeSet<usize>],
        production: &[usize],
    ) -> (BTreeSet<usize>, bool) {
        let mut result: BTreeSet<usize> = BTreeSet::new();
        for &s in production {
            result.extend(first[s].iter().filter(|&&t| t != self.epsilon));
            if !first[s].contains(&self.epsilon) {
                return (result, false);
            }
        }
        (result, true)
    }

    pub fn calculate_first(&self) -> Vec<BTreeSet<usize>> {
        let mut first: Vec<BTreeSet<usize>> = self
            .symbols
            .iter()
            .enumerate()
            .map(|(i, s)| match s {
                Symbol::NonTerminal(_) => BTreeSet::new(),
                _ => BTreeSet::from([i]),
            })
            .collect();

        let mut passes = 0;
        let mut changed = true;
        while changed {
            changed = false;
            passes += 1;
            for &left in &self.order {
                for production in self.productions_of(left) {
                    let (mut found, nullable) = if self.is_epsilon_production(production) {
                        (BTreeSet::new(), true)
                    } else {
                        self.calculate_first_for_production(&first, production)
                    };
                    if nullable {
                        found.insert(self.epsilon);
                    }
                    changed |= extend_changed(&mut first[left], found);
                }
            }
        }
        debug!("FIRST converged after {} passes", passes);

        first
    }

    pub fn calculate_follow(&self, first: &[BTreeSet<usize>]) -> Vec<BTreeSet<usize>> {
        let mut follow: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.symbols.len()];
        follow[self.start_symbol].insert(self.end_mark);

        let mut passes = 0;
        let mut changed = true;
        while changed {
            changed = false;
            passes += 1;
            for &left in &self.order {
                for production in self.productions_of(left) {
                    for (i, &s) in production.iter().enumerate() {
                        if !self.is_non_terminal(s) {
                            continue;
                        }
                        let mut found: BTreeSet<usize> = BTreeSet::new();
                        match production.get(i + 1) {
                            Some(&next) => {
                                found.extend(first[next].iter().filter(|&&t| t != self.epsilon));
                                if first[next].contains(&self.epsilon) {
                                    found.extend(follow[left].iter().cloned());
                                }
                            }
                            None => found.extend(follow[left].iter().cloned()),
                        }
                        changed |= extend_changed(&mut follow[s], found);
                    }
                }
            }
        }
        debug!("FOLLOW converged after {} passes", passes);

        follow
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::EXPRESSION_GRAMMAR;
    use crate::Grammar;

    #[test]
    fn expression_grammar_first() {
        let g = Grammar::parse(EXPRESSION_GRAMMAR).unwrap();
        let sets = g.calculate_first_follow();
        let first = |n: &str| g.set_to_vec_str(sets.first(g.get_symbol_index(n).unwrap()));

        assert_eq!(first("E"), vec!["id", "("]);
        assert_eq!(first("T"), vec!["id", "("]);
        assert_eq!(first("F"), vec!["id", "("]);
        assert_eq!(first("E'"), vec!["+", "ε"]);
        assert_eq!(first("T'"), vec!["*", "ε"]);
        assert_eq!(first("+"), vec!["+"]);
    }

    #[test]
    fn expression_grammar_follow() {
        let g = Grammar::parse(EXPRESSION_GRAMMAR).unwrap();
        let sets = g.calculate_first_follow();
        let follow = |n: &str| g.set_to_vec_str(sets.follow(g.get_symbol_index(n).unwrap()));

        assert_eq!(follow("E"), vec![")", "$"]);
        assert_eq!(follow("E'"), vec![")", "$"]);
        assert_eq!(follow("T"), vec!["+", ")", "$"]);
        assert_eq!(follow("T'"), vec!["+", ")", "$"]);
        assert_eq!(follow("F"), vec!["+", "*", ")", "$"]);
    }

    #[test]
    fn nullable_chain_adds_epsilon() {
        let g = Grammar::parse("S -> A B\nA -> a | ε\nB -> ε").unwrap();
        let sets = g.calculate_first_follow();
        let s = g.get_symbol_index("S").unwrap();
        assert_eq!(g.set_to_vec_str(sets.first(s)), vec!["a", "ε"]);
    }

    #[test]
    fn sets_stay_within_alphabet() {
        let g = Grammar::parse("S -> A S b | ε\nA -> a A | c | ε\nU -> u").unwrap();
        let sets = g.calculate_first_follow();
        for (idx, symbol) in g.symbols.iter().enumerate() {
            if symbol.non_terminal().is_none() && !symbol.is_terminal() {
                continue;
            }
            assert!(sets
                .first(idx)
                .iter()
                .all(|&t| g.is_terminal(t) || t == g.epsilon));
            assert!(sets.follow(idx).iter().all(|&t| g.is_terminal(t)));
        }
        assert!(sets.follow(g.start_symbol).contains(&g.end_mark));
    }

    #[test]
    fn solving_twice_gives_identical_sets() {
        let g = Grammar::parse(EXPRESSION_GRAMMAR).unwrap();
        let before = g.clone();
        assert_eq!(g.calculate_first_follow(), g.calculate_first_follow());
        assert_eq!(g, before);
    }
}
