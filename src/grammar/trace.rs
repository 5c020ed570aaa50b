use std::collections::VecDeque;
use std::fmt;

use log::trace;
use serde::Serialize;

use super::{
    first_follow::FirstFollow, grammar::Symbol, ll1_parsing_table::PredictiveTable, Grammar,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// The stack ran out while input remained.
    UnexpectedEnd,
    /// Both stack and input were exhausted, but only after recovering from
    /// errors.
    RecoveredErrors { count: usize },
}

/// What the driver did at one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
    Initialize,
    Accept,
    Reject { reason: RejectReason },
    Match { terminal: String },
    Apply { production: String },
    Mismatch { expected: String, found: String },
    DiscardInput { token: String },
    DiscardExpected { terminal: String },
    NoProduction { non_terminal: String, lookahead: String },
    FollowDiagnostic { non_terminal: String, follow: Vec<String> },
    DiscardNonTerminal { non_terminal: String },
    SkipInput { token: String },
    Synchronized { token: String, non_terminal: String },
    NoSynchronization { non_terminal: String },
    UnrecognizedSymbol { symbol: String },
}

impl StepAction {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StepAction::Mismatch { .. }
                | StepAction::NoProduction { .. }
                | StepAction::NoSynchronization { .. }
                | StepAction::UnrecognizedSymbol { .. }
        )
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Initialize => write!(f, "Initialization"),
            StepAction::Accept => write!(f, "Accepted"),
            StepAction::Reject {
                reason: RejectReason::UnexpectedEnd,
            } => write!(f, "Rejected: unexpected end"),
            StepAction::Reject {
                reason: RejectReason::RecoveredErrors { count },
            } => write!(f, "Rejected: recovered from {} error(s)", count),
            StepAction::Match { terminal } => write!(f, "Match: {}", terminal),
            StepAction::Apply { production } => write!(f, "{}", production),
            StepAction::Mismatch { expected, found } => {
                write!(f, "Error: expected '{}', found '{}'", expected, found)
            }
            StepAction::DiscardInput { token } => {
                write!(f, "Discarding unexpected terminal '{}'", token)
            }
            StepAction::DiscardExpected { terminal } => {
                write!(f, "Discarding expected terminal '{}' from the stack", terminal)
            }
            StepAction::NoProduction {
                non_terminal,
                lookahead,
            } => write!(
                f,
                "Error: no production for '{}' with '{}'",
                non_terminal, lookahead
            ),
            StepAction::FollowDiagnostic {
                non_terminal,
                follow,
            } => write!(f, "FOLLOW({}) = {{{}}}", non_terminal, follow.join(", ")),
            StepAction::DiscardNonTerminal { non_terminal } => {
                write!(f, "Discarding nonterminal '{}' from the stack", non_terminal)
            }
            StepAction::SkipInput { token } => {
                write!(f, "Discarding '{}' from the input", token)
            }
            StepAction::Synchronized {
                token,
                non_terminal,
            } => write!(f, "Symbol '{}' found in FOLLOW({})", token, non_terminal),
            StepAction::NoSynchronization { non_terminal } => write!(
                f,
                "Error: no synchronization symbol in FOLLOW({})",
                non_terminal
            ),
            StepAction::UnrecognizedSymbol { symbol } => {
                write!(f, "Error: symbol '{}' not recognized", symbol)
            }
        }
    }
}

/// Snapshot of the driver before `action` takes effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivationStep {
    /// Bottom to top.
    pub stack: Vec<String>,
    pub input: Vec<String>,
    pub action: StepAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Accepted,
    Rejected,
    /// Halted by an unrecoverable error.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trace {
    pub steps: Vec<DerivationStep>,
    pub outcome: Outcome,
}

impl Trace {
    pub fn accepted(&self) -> bool {
        self.outcome == Outcome::Accepted
    }

    pub fn last_action(&self) -> Option<&StepAction> {
        self.steps.last().map(|s| &s.action)
    }

    pub fn error_count(&self) -> usize {
        self.steps.iter().filter(|s| s.action.is_error()).count()
    }
}

struct Driver<'g> {
    grammar: &'g Grammar,
    stack: Vec<usize>,
    input: VecDeque<usize>,
    steps: Vec<DerivationStep>,
    errors: usize,
}

impl<'g> Driver<'g> {
    fn names<'a>(&self, symbols: impl Iterator<Item = &'a usize>) -> Vec<String> {
        symbols
            .map(|&s| self.grammar.get_symbol_name(s).to_string())
            .collect()
    }

    fn name(&self, symbol: usize) -> String {
        self.grammar.get_symbol_name(symbol).to_string()
    }

    fn record(&mut self, action: StepAction) {
        if action.is_error() {
            self.errors += 1;
        }
        let step = DerivationStep {
            stack: self.names(self.stack.iter()),
            input: self.names(self.input.iter()),
            action,
        };
        trace!(
            "{} | {} | {}",
            step.stack.join(" "),
            step.input.join(" "),
            step.action
        );
        self.steps.push(step);
    }

    fn finish(self, outcome: Outcome) -> Trace {
        Trace {
            steps: self.steps,
            outcome,
        }
    }
}

impl Grammar {
    /// Drives the predictive parser over `tokens`, recording every step.
    ///
    /// Errors are recovered in panic mode: an unexpected terminal is dropped
    /// from the input, and a nonterminal without a table entry is dropped from
    /// the stack before input is skipped up to a token in its FOLLOW set.
    pub fn trace_derivation(
        &self,
        sets: &FirstFollow,
        table: &PredictiveTable,
        tokens: &[usize],
    ) -> Trace {
        let mut d = Driver {
            grammar: self,
            stack: vec![self.end_mark, self.start_symbol],
            input: tokens.iter().cloned().chain([self.end_mark]).collect(),
            steps: Vec::new(),
            errors: 0,
        };
        d.record(StepAction::Initialize);

        loop {
            let (top, current) = match (d.stack.last(), d.input.front()) {
                (Some(&top), Some(&current)) => (top, current),
                // the end marker is never popped nor dequeued before halting
                _ => return d.finish(Outcome::Aborted),
            };

            if top == self.end_mark {
                if current != self.end_mark {
                    d.record(StepAction::Reject {
                        reason: RejectReason::UnexpectedEnd,
                    });
                    return d.finish(Outcome::Rejected);
                } else if d.errors > 0 {
                    let count = d.errors;
                    d.record(StepAction::Reject {
                        reason: RejectReason::RecoveredErrors { count },
                    });
                    return d.finish(Outcome::Rejected);
                }
                d.record(StepAction::Accept);
                return d.finish(Outcome::Accepted);
            }

            match &self.symbols[top] {
                Symbol::Terminal(_) if top == current => {
                    d.record(StepAction::Match {
                        terminal: d.name(top),
                    });
                    d.stack.pop();
                    d.input.pop_front();
                }
                Symbol::Terminal(_) => {
                    d.record(StepAction::Mismatch {
                        expected: d.name(top),
                        found: d.name(current),
                    });
                    if current == self.end_mark {
                        d.record(StepAction::DiscardExpected {
                            terminal: d.name(top),
                        });
                        d.stack.pop();
                    } else {
                        d.record(StepAction::DiscardInput {
                            token: d.name(current),
                        });
                        d.input.pop_front();
                    }
                }
                Symbol::NonTerminal(nt) => match table.get(top, current) {
                    Some(id) => {
                        let production = self.production(id);
                        d.record(StepAction::Apply {
                            production: self.production_to_string(top, production),
                        });
                        d.stack.pop();
                        if !self.is_epsilon_production(production) {
                            d.stack.extend(production.iter().rev());
                        }
                    }
                    None => {
                        let follow = sets.follow(top);
                        d.record(StepAction::NoProduction {
                            non_terminal: nt.name.clone(),
                            lookahead: d.name(current),
                        });
                        d.record(StepAction::FollowDiagnostic {
                            non_terminal: nt.name.clone(),
                            follow: self
                                .set_to_vec_str(follow)
                                .into_iter()
                                .map(String::from)
                                .collect(),
                        });
                        d.record(StepAction::DiscardNonTerminal {
                            non_terminal: nt.name.clone(),
                        });
                        d.stack.pop();

                        loop {
                            match d.input.front() {
                                Some(&token) if follow.contains(&token) => {
                                    d.record(StepAction::Synchronized {
                                        token: d.name(token),
                                        non_terminal: nt.name.clone(),
                                    });
                                    break;
                                }
                                Some(&token) => {
                                    d.record(StepAction::SkipInput {
                                        token: d.name(token),
                                    });
                                    d.input.pop_front();
                                }
                                None => {
                                    d.record(StepAction::NoSynchronization {
                                        non_terminal: nt.name.clone(),
                                    });
                                    return d.finish(Outcome::Aborted);
                                }
                            }
                        }
                    }
                },
                Symbol::Epsilon => {
                    d.record(StepAction::UnrecognizedSymbol {
                        symbol: d.name(top),
                    });
                    return d.finish(Outcome::Aborted);
                }
            }
        }
    }
}
