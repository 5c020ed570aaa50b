use std::collections::{BTreeSet, HashSet};

use crowbook_text_processing::escape;
use serde::Serialize;

use super::{first_follow::FirstFollow, trace::Trace, Grammar, EPSILON};
use crate::AnalysisError;

/// Right-aligns every column and joins cells with ` | `.
pub(crate) fn align_columns(output: &[Vec<String>]) -> String {
    let columns = output.iter().map(|line| line.len()).max().unwrap_or(0);
    let width: Vec<usize> = (0..columns)
        .map(|j| {
            output
                .iter()
                .filter_map(|line| line.get(j))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    output
        .iter()
        .map(|line| {
            line.iter()
                .enumerate()
                .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput<'a> {
    pub left: &'a str,
    pub rights: Vec<Vec<&'a str>>,
}

impl ProductionOutput<'_> {
    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .map(|right| right.join(" "))
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                } else {
                    format!(" | {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool, terminal_set: &HashSet<&str>) -> String {
        if self.rights.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow &", escape::tex(self.left))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left))
        };
        let right = self
            .rights
            .iter()
            .map(|right| {
                right
                    .iter()
                    .map(|&s| {
                        if s == EPSILON {
                            "\\epsilon".to_string()
                        } else if terminal_set.contains(s) {
                            format!("\\text{{{}}}", escape::tex(s))
                        } else {
                            escape::tex(s).to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" \\ ")
            })
            .collect::<Vec<_>>()
            .join(" \\mid ");

        left + &right
    }
}

#[derive(Serialize)]
pub struct ProductionOutputVec<'a> {
    productions: Vec<ProductionOutput<'a>>,
    #[serde(skip)]
    terminals: HashSet<&'a str>,
}

impl ProductionOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| p.left.chars().count())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(
                self.productions
                    .iter()
                    .map(|s| s.to_latex(true, &self.terminals)),
            )
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }
}

impl Grammar {
    /// Names of the symbols in `set`, in declaration order with epsilon last.
    pub fn set_to_vec_str(&self, set: &BTreeSet<usize>) -> Vec<&str> {
        let mut names: Vec<&str> = set
            .iter()
            .filter(|&&idx| idx != self.epsilon)
            .map(|&idx| self.get_symbol_name(idx))
            .collect();
        if set.contains(&self.epsilon) {
            names.push(EPSILON);
        }
        names
    }

    pub(crate) fn terminal_name_set(&self) -> HashSet<&str> {
        self.terminal_iter().map(|(_, t)| t.as_str()).collect()
    }

    /// The productions in canonical order, one entry per nonterminal.
    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        let productions = self
            .non_terminal_iter()
            .map(|nt| ProductionOutput {
                left: nt.name.as_str(),
                rights: nt
                    .productions
                    .iter()
                    .map(|production| self.production_to_vec_str(production))
                    .collect(),
            })
            .collect();
        ProductionOutputVec {
            productions,
            terminals: self.terminal_name_set(),
        }
    }
}

#[derive(Serialize)]
struct FirstFollowRow<'a> {
    name: &'a str,
    nullable: bool,
    first: Vec<&'a str>,
    follow: Vec<&'a str>,
}

impl FirstFollowRow<'_> {
    fn to_plaintext(&self) -> Vec<String> {
        vec![
            self.name.to_string(),
            self.nullable.to_string(),
            self.first.join(", "),
            self.follow.join(", "),
        ]
    }

    fn to_latex(&self) -> String {
        fn f(a: &[&str]) -> String {
            a.iter()
                .map(|&s| {
                    if s == EPSILON {
                        "$\\epsilon$".to_string()
                    } else {
                        escape::tex(s).to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(r"\ ")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

/// FIRST/FOLLOW rows for every nonterminal in canonical order.
#[derive(Serialize)]
pub struct FirstFollowOutputVec<'a> {
    data: Vec<FirstFollowRow<'a>>,
}

impl FirstFollowOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let header = ["Symbol", "Nullable", "First", "Follow"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output: Vec<Vec<String>> = std::iter::once(header)
            .chain(self.data.iter().map(|row| row.to_plaintext()))
            .collect();
        align_columns(&output)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        crate::to_json(self)
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

impl Grammar {
    pub fn to_first_follow_output_vec<'a>(
        &'a self,
        sets: &FirstFollow,
    ) -> FirstFollowOutputVec<'a> {
        let data = self
            .non_terminal_iter()
            .map(|nt| FirstFollowRow {
                name: nt.name.as_str(),
                nullable: sets.first(nt.index).contains(&self.epsilon),
                first: self.set_to_vec_str(sets.first(nt.index)),
                follow: self.set_to_vec_str(sets.follow(nt.index)),
            })
            .collect();
        FirstFollowOutputVec { data }
    }
}

impl Trace {
    /// Stack / input / action table with a header row.
    pub fn to_plaintext(&self) -> String {
        let header = ["Stack", "Input", "Action"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output: Vec<Vec<String>> = std::iter::once(header)
            .chain(self.steps.iter().map(|step| {
                vec![
                    step.stack.join(" "),
                    step.input.join(" "),
                    step.action.to_string(),
                ]
            }))
            .collect();
        align_columns(&output)
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .steps
            .iter()
            .map(|step| {
                format!(
                    "{} & {} & {}",
                    escape::tex(step.stack.join(" ")),
                    escape::tex(step.input.join(" ")),
                    escape::tex(step.action.to_string()).replace(EPSILON, "$\\epsilon$")
                )
            })
            .collect::<Vec<_>>()
            .join("\\\\\n");

        "\\begin{tabular}{l|l|l}\n".to_string()
            + "Stack & Input & Action\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}
