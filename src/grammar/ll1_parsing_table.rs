use crowbook_text_processing::escape::tex as escape_tex;
use log::debug;
use serde::{ser::SerializeMap, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::Grammar;

use super::{first_follow::FirstFollow, pretty_print::ProductionOutput};

/// A production identified by its head and its position among the head's
/// alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionId {
    pub left: usize,
    pub alternative: usize,
}

/// Predictive parse table: (nonterminal, terminal) to the production to apply.
///
/// Each cell holds at most one production. When several productions compete
/// for a cell, the first one reached in canonical order keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PredictiveTable {
    cells: HashMap<(usize, usize), ProductionId>,
}

impl PredictiveTable {
    pub fn get(&self, non_terminal: usize, terminal: usize) -> Option<ProductionId> {
        self.cells.get(&(non_terminal, terminal)).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Grammar {
    pub fn production(&self, id: ProductionId) -> &[usize] {
        &self.productions_of(id.left)[id.alternative]
    }

    /// Terminals that select `production` of `left`: FOLLOW(left) for an
    /// epsilon body, otherwise FIRST of the body plus FOLLOW(left) when the
    /// whole body is nullable.
    pub fn lead_set(
        &self,
        sets: &FirstFollow,
        left: usize,
        production: &[usize],
    ) -> BTreeSet<usize> {
        if self.is_epsilon_production(production) {
            return sets.follow(left).clone();
        }
        let (mut lead, nullable) = self.calculate_first_for_production(&sets.first, production);
        if nullable {
            lead.extend(sets.follow(left).iter().cloned());
        }
        lead
    }

    pub fn build_predictive_table(&self, sets: &FirstFollow) -> PredictiveTable {
        let mut table = PredictiveTable::default();
        for &left in &self.order {
            for (alternative, production) in self.productions_of(left).iter().enumerate() {
                for terminal in self.lead_set(sets, left, production) {
                    table
                        .cells
                        .entry((left, terminal))
                        .or_insert(ProductionId { left, alternative });
                }
            }
        }
        debug!("predictive table has {} entries", table.len());
        table
    }

    pub fn generate_ll1_parsing_table<'a>(
        &'a self,
        table: &PredictiveTable,
    ) -> LL1ParsingTable<'a> {
        let terminals: Vec<(usize, &str)> = self
            .terminal_iter()
            .map(|(idx, t)| (idx, t.as_str()))
            .collect();

        let mut rows: Vec<(&str, Vec<ProductionOutput>)> = Vec::new();
        for nt in self.non_terminal_iter() {
            let left = nt.name.as_str();
            let row = terminals
                .iter()
                .map(|&(t, _)| ProductionOutput {
                    left,
                    rights: table
                        .get(nt.index, t)
                        .map(|id| vec![self.production_to_vec_str(self.production(id))])
                        .unwrap_or_default(),
                })
                .collect();
            rows.push((left, row));
        }

        LL1ParsingTable {
            terminals: terminals.into_iter().map(|(_, t)| t).collect(),
            rows,
        }
    }
}

/// Rendering view of a [`PredictiveTable`]: one row per nonterminal in
/// canonical order, one column per terminal.
pub struct LL1ParsingTable<'a> {
    terminals: Vec<&'a str>,
    rows: Vec<(&'a str, Vec<ProductionOutput<'a>>)>,
}

impl Serialize for LL1ParsingTable<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Row<'r, 'a>(&'r [&'a str], &'r [ProductionOutput<'a>]);

        impl Serialize for Row<'_, '_> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(None)?;
                for (terminal, cell) in self.0.iter().zip(self.1) {
                    if !cell.rights.is_empty() {
                        map.serialize_entry(terminal, &cell.to_plaintext(0, false))?;
                    }
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (left, row) in &self.rows {
            map.serialize_entry(left, &Row(&self.terminals, row))?;
        }
        map.end()
    }
}

impl LL1ParsingTable<'_> {
    pub fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|&t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![left.to_string()];
            line.extend(
                row.iter()
                    .map(|productions| productions.to_plaintext(left.len(), false)),
            );
            output.push(line);
        }

        super::pretty_print::align_columns(&output)
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|&t| format!("\\text{{{}}}", escape_tex(t))),
        );
        let header = header.join(" & ");

        let mut output: Vec<String> = Vec::new();
        let terminal_set: HashSet<&str> = self.terminals.iter().cloned().collect();
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![format!("{}", escape_tex(*left))];
            line.extend(
                row.iter()
                    .map(|productions| productions.to_latex(false, &terminal_set)),
            );
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::EXPRESSION_GRAMMAR;
    use crate::Grammar;

    fn cell(g: &Grammar, table: &super::PredictiveTable, nt: &str, t: &str) -> Option<String> {
        let left = g.get_symbol_index(nt).unwrap();
        table
            .get(left, g.get_symbol_index(t).unwrap())
            .map(|id| g.production_to_string(left, g.production(id)))
    }

    #[test]
    fn expression_grammar_table() {
        let g = Grammar::parse(EXPRESSION_GRAMMAR).unwrap();
        let table = g.build_predictive_table(&g.calculate_first_follow());

        assert_eq!(cell(&g, &table, "E", "id").as_deref(), Some("E -> T E'"));
        assert_eq!(cell(&g, &table, "E", "("), Some("E -> T E'".to_string()));
        assert_eq!(cell(&g, &table, "E'", "+").as_deref(), Some("E' -> + T E'"));
        assert_eq!(cell(&g, &table, "E'", ")").as_deref(), Some("E' -> ε"));
        assert_eq!(cell(&g, &table, "E'", "$").as_deref(), Some("E' -> ε"));
        assert_eq!(cell(&g, &table, "T'", "+").as_deref(), Some("T' -> ε"));
        assert_eq!(cell(&g, &table, "T'", "*").as_deref(), Some("T' -> * F T'"));
        assert_eq!(cell(&g, &table, "F", "(").as_deref(), Some("F -> ( E )"));
        assert_eq!(cell(&g, &table, "F", "+"), None);
        assert_eq!(cell(&g, &table, "E", "$"), None);
        assert_eq!(table.len(), 13);
    }

    #[test]
    fn conflicting_cell_keeps_first_production() {
        let g = Grammar::parse("S -> a b | a c").unwrap();
        let table = g.build_predictive_table(&g.calculate_first_follow());
        assert_eq!(cell(&g, &table, "S", "a").as_deref(), Some("S -> a b"));
    }

    #[test]
    fn conflict_with_nullable_alternative_keeps_first() {
        // FOLLOW(A) holds a, so the epsilon alternative competes with A -> a
        let g = Grammar::parse("S -> A a\nA -> a | ε").unwrap();
        let table = g.build_predictive_table(&g.calculate_first_follow());
        assert_eq!(cell(&g, &table, "A", "a").as_deref(), Some("A -> a"));
    }

    #[test]
    fn nullable_body_uses_follow() {
        let g = Grammar::parse("S -> A B c\nA -> a | ε\nB -> b | ε").unwrap();
        let table = g.build_predictive_table(&g.calculate_first_follow());
        assert_eq!(cell(&g, &table, "S", "c").as_deref(), Some("S -> A B c"));
        // FOLLOW(A) only sees the next symbol B, whose FIRST holds ε, so it
        // takes FOLLOW(S) instead of c
        assert_eq!(cell(&g, &table, "A", "b").as_deref(), Some("A -> ε"));
        assert_eq!(cell(&g, &table, "A", "$").as_deref(), Some("A -> ε"));
        assert_eq!(cell(&g, &table, "B", "c").as_deref(), Some("B -> ε"));
    }

    #[test]
    fn building_twice_gives_identical_tables() {
        let g = Grammar::parse(EXPRESSION_GRAMMAR).unwrap();
        let sets = g.calculate_first_follow();
        assert_eq!(g.build_predictive_table(&sets), g.build_predictive_table(&sets));
    }

    #[test]
    fn plaintext_has_header_and_rows() {
        let g = Grammar::parse("S -> a S | ε").unwrap();
        let table = g.build_predictive_table(&g.calculate_first_follow());
        let text = g.generate_ll1_parsing_table(&table).to_plaintext();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains('a') && lines[0].contains('$'));
        assert!(lines[1].contains("S -> a S"));
        assert!(lines[1].contains("S -> ε"));
    }

    #[test]
    fn json_skips_empty_cells() {
        let g = Grammar::parse("S -> a").unwrap();
        let table = g.build_predictive_table(&g.calculate_first_follow());
        let json = serde_json::to_string(&g.generate_ll1_parsing_table(&table)).unwrap();
        assert_eq!(json, r#"{"S":{"a":"S -> a"}}"#);
    }
}
