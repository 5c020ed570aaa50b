use std::collections::HashMap;

use super::{END_MARK, EPSILON};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonTerminal {
    pub index: usize,
    pub name: String,
    pub productions: Vec<Vec<usize>>,
}

impl NonTerminal {
    pub fn new(index: usize, name: String) -> Self {
        Self {
            index,
            name,
            productions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Epsilon,
    NonTerminal(NonTerminal),
    Terminal(String),
}

impl Symbol {
    pub fn non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            _ => None,
        }
    }

    pub fn mut_non_terminal(&mut self) -> Option<&mut NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

/// A context-free grammar stored as an arena of symbols.
///
/// Symbols are referred to by their index in `symbols`. Index order is
/// declaration order: epsilon first, then nonterminals in the order their
/// rules were first seen, then terminals in the order they first appear in a
/// body. `order` holds the canonical nonterminal iteration order used by every
/// downstream pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub symbols: Vec<Symbol>,
    pub symbol_table: HashMap<String, usize>,
    pub start_symbol: usize,
    pub order: Vec<usize>,
    pub epsilon: usize,
    pub end_mark: usize,
}

impl Grammar {
    /// An empty grammar holding only the epsilon marker.
    ///
    /// The end marker is added by [`Grammar::add_end_mark`] once every body
    /// symbol is known, so that it sorts after the user's terminals.
    pub(crate) fn new() -> Self {
        let mut g = Self {
            symbols: Vec::new(),
            symbol_table: HashMap::new(),
            start_symbol: 0,
            order: Vec::new(),
            epsilon: 0,
            end_mark: 0,
        };

        g.symbols.push(Symbol::Epsilon);
        g.symbol_table.insert(EPSILON.to_string(), 0);

        g
    }

    pub(crate) fn add_end_mark(&mut self) {
        self.end_mark = match self.get_symbol_index(END_MARK) {
            Some(idx) => idx,
            None => self.add_terminal(END_MARK.to_string()),
        };
    }

    pub fn terminal_iter(&self) -> impl Iterator<Item = (usize, &String)> {
        self.symbols.iter().enumerate().filter_map(|(i, s)| {
            if let Symbol::Terminal(name) = s {
                Some((i, name))
            } else {
                None
            }
        })
    }

    /// Nonterminals in canonical order.
    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &NonTerminal> {
        self.order
            .iter()
            .filter_map(move |&idx| self.symbols[idx].non_terminal())
    }

    pub fn get_symbol_index(&self, name: &str) -> Option<usize> {
        self.symbol_table.get(name).cloned()
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        self.symbols[index].is_terminal()
    }

    pub fn is_non_terminal(&self, index: usize) -> bool {
        self.symbols[index].non_terminal().is_some()
    }

    pub fn add_non_terminal(&mut self, name: &str) -> usize {
        let idx = self.symbols.len();
        self.symbols
            .push(Symbol::NonTerminal(NonTerminal::new(idx, name.to_string())));
        self.symbol_table.insert(name.to_string(), idx);
        idx
    }

    pub fn add_terminal(&mut self, name: String) -> usize {
        let idx = self.symbols.len();
        self.symbols.push(Symbol::Terminal(name.clone()));
        self.symbol_table.insert(name, idx);
        idx
    }

    /// Appends a production to `left`. Does nothing if `left` is not a
    /// nonterminal.
    pub fn add_production(&mut self, left: usize, right: Vec<usize>) {
        if let Some(nt) = self.symbols[left].mut_non_terminal() {
            nt.productions.push(right);
        }
    }

    pub fn productions_of(&self, left: usize) -> &[Vec<usize>] {
        self.symbols[left]
            .non_terminal()
            .map(|nt| nt.productions.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_epsilon_production(&self, production: &[usize]) -> bool {
        production == [self.epsilon]
    }

    pub fn get_symbol_name(&self, index: usize) -> &str {
        match &self.symbols[index] {
            Symbol::Epsilon => EPSILON,
            Symbol::NonTerminal(e) => e.name.as_str(),
            Symbol::Terminal(e) => e.as_str(),
        }
    }

    pub fn production_to_vec_str(&self, production: &[usize]) -> Vec<&str> {
        production
            .iter()
            .map(|idx| self.get_symbol_name(*idx))
            .collect()
    }

    /// `A -> x y z`, the label used for table cells and trace actions.
    pub fn production_to_string(&self, left: usize, production: &[usize]) -> String {
        format!(
            "{} -> {}",
            self.get_symbol_name(left),
            self.production_to_vec_str(production).join(" ")
        )
    }
}
