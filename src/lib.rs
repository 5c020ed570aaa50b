extern crate wasm_bindgen;

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;
use wasm_bindgen::prelude::*;

mod error;
pub mod grammar;

pub use error::AnalysisError;
pub use grammar::{
    first_follow::FirstFollow,
    ll1_parsing_table::{LL1ParsingTable, PredictiveTable, ProductionId},
    trace::{DerivationStep, Outcome, RejectReason, StepAction, Trace},
    Grammar,
};

/// Everything one analysis request produces. Nothing is shared between
/// requests.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub grammar: Grammar,
    pub sets: FirstFollow,
    pub table: PredictiveTable,
    pub trace: Trace,
}

/// Loads `grammar`, tokenizes `input` against it, and drives the LL(1)
/// parser over the tokens.
///
/// Fails on a structural grammar error or on input that does not tokenize,
/// including input with no token at all. Parse errors are recorded in the
/// returned trace instead.
pub fn analyze(grammar: &str, input: &str) -> Result<Analysis, AnalysisError> {
    let grammar = Grammar::parse(grammar)?;
    let sets = grammar.calculate_first_follow();
    let tokens = grammar.tokenize(input)?;
    let table = grammar.build_predictive_table(&sets);
    let trace = grammar.trace_derivation(&sets, &table, &tokens);

    debug!(
        "analysis finished: {} tokens, {} steps, {:?}",
        tokens.len(),
        trace.steps.len(),
        trace.outcome
    );

    Ok(Analysis {
        grammar,
        sets,
        table,
        trace,
    })
}

#[derive(Serialize)]
struct StepOutput<'a> {
    stack: &'a [String],
    input: &'a [String],
    action: &'a StepAction,
    label: String,
}

/// Serializable view of an [`Analysis`]: the trace, FIRST and FOLLOW keyed by
/// symbol name, and the parse table keyed by nonterminal then terminal.
#[derive(Serialize)]
pub struct AnalysisOutput<'a> {
    outcome: Outcome,
    trace: Vec<StepOutput<'a>>,
    first: BTreeMap<&'a str, Vec<&'a str>>,
    follow: BTreeMap<&'a str, Vec<&'a str>>,
    table: LL1ParsingTable<'a>,
}

impl AnalysisOutput<'_> {
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        to_json(self)
    }
}

/// Serializes any output view to a JSON string.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AnalysisError> {
    Ok(serde_json::to_string(value)?)
}

impl Analysis {
    pub fn to_output(&self) -> AnalysisOutput<'_> {
        let g = &self.grammar;
        let first = g
            .non_terminal_iter()
            .map(|nt| nt.index)
            .chain(g.terminal_iter().map(|(idx, _)| idx))
            .map(|idx| (g.get_symbol_name(idx), g.set_to_vec_str(self.sets.first(idx))))
            .collect();
        let follow = g
            .non_terminal_iter()
            .map(|nt| (nt.name.as_str(), g.set_to_vec_str(self.sets.follow(nt.index))))
            .collect();
        let trace = self
            .trace
            .steps
            .iter()
            .map(|step| StepOutput {
                stack: &step.stack,
                input: &step.input,
                action: &step.action,
                label: step.action.to_string(),
            })
            .collect();

        AnalysisOutput {
            outcome: self.trace.outcome,
            trace,
            first,
            follow,
            table: g.generate_ll1_parsing_table(&self.table),
        }
    }
}

fn error_to_json(e: AnalysisError) -> String {
    serde_json::json!({ "error": e.to_string() }).to_string()
}

#[wasm_bindgen]
pub fn analyze_to_json(grammar: &str, input: &str) -> String {
    analyze(grammar, input)
        .and_then(|analysis| analysis.to_output().to_json())
        .unwrap_or_else(error_to_json)
}

#[wasm_bindgen]
pub fn first_follow_to_json(grammar: &str) -> String {
    Grammar::parse(grammar)
        .and_then(|g| {
            let sets = g.calculate_first_follow();
            g.to_first_follow_output_vec(&sets).to_json()
        })
        .unwrap_or_else(error_to_json)
}

#[wasm_bindgen]
pub fn ll1_table_to_json(grammar: &str) -> String {
    Grammar::parse(grammar)
        .and_then(|g| {
            let table = g.build_predictive_table(&g.calculate_first_follow());
            to_json(&g.generate_ll1_parsing_table(&table))
        })
        .unwrap_or_else(error_to_json)
}


#[cfg(test)]
mod analysis_tests {
    use crate::grammar::EXPRESSION_GRAMMAR;
    use crate::{analyze, analyze_to_json, first_follow_to_json, ll1_table_to_json, to_json};
    use crate::{error_to_json, AnalysisError, Outcome, StepAction};

    #[test]
    fn accepted_input() {
        let analysis = analyze(EXPRESSION_GRAMMAR, "id + id").unwrap();
        assert_eq!(analysis.trace.last_action(), Some(&StepAction::Accept));
        let last = analysis.trace.steps.last().unwrap();
        assert_eq!(last.stack, vec!["$"]);
        assert_eq!(last.input, vec!["$"]);
    }

    #[test]
    fn recoverable_mismatch_ends_in_reject() {
        let analysis = analyze(EXPRESSION_GRAMMAR, "id +").unwrap();
        let actions: Vec<&StepAction> = analysis.trace.steps.iter().map(|s| &s.action).collect();
        let error = actions
            .iter()
            .position(|a| {
                matches!(
                    a,
                    StepAction::Mismatch { .. } | StepAction::NoProduction { .. }
                )
            })
            .unwrap();
        assert!(matches!(
            actions[error + 1],
            StepAction::FollowDiagnostic { .. } | StepAction::DiscardInput { .. }
        ));
        assert!(matches!(actions.last(), Some(StepAction::Reject { .. })));
        assert_eq!(analysis.trace.outcome, Outcome::Rejected);
    }

    #[test]
    fn empty_grammar_fails_before_tokenizing() {
        // the input would not tokenize either, the grammar error wins
        assert_eq!(
            analyze("", "???").unwrap_err(),
            AnalysisError::EmptyGrammar
        );
    }

    #[test]
    fn empty_input_is_an_input_error() {
        // a nullable start symbol does not make empty input valid
        for grammar in ["S -> a S | ε", "S -> a"] {
            for input in ["", "   ", "\n\t"] {
                assert_eq!(analyze(grammar, input).unwrap_err(), AnalysisError::EmptyInput);
            }
        }

        let json: serde_json::Value =
            serde_json::from_str(&analyze_to_json("S -> a S | ε", "")).unwrap();
        assert_eq!(json["error"], "input contains errors: no tokens");
    }

    #[test]
    fn unknown_input_produces_no_trace() {
        assert_eq!(
            analyze(EXPRESSION_GRAMMAR, "id + @").unwrap_err(),
            AnalysisError::InputContainsErrors {
                fragment: "@".to_string()
            }
        );
    }

    #[test]
    fn repeated_analysis_is_identical() {
        let a = analyze(EXPRESSION_GRAMMAR, "( id * id )").unwrap();
        let b = analyze(EXPRESSION_GRAMMAR, "( id * id )").unwrap();
        assert_eq!(a.sets, b.sets);
        assert_eq!(a.table, b.table);
        assert_eq!(a.trace, b.trace);
        assert_eq!(a.to_output().to_json().unwrap(), b.to_output().to_json().unwrap());
    }

    #[test]
    fn output_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&analyze_to_json("S -> a S | ε", "a")).unwrap();

        assert_eq!(json["outcome"], "accepted");
        assert_eq!(json["first"]["S"], serde_json::json!(["a", "ε"]));
        assert_eq!(json["first"]["a"], serde_json::json!(["a"]));
        assert_eq!(json["follow"]["S"], serde_json::json!(["$"]));
        assert_eq!(json["table"]["S"]["a"], "S -> a S");
        assert_eq!(json["table"]["S"]["$"], "S -> ε");

        let steps = json["trace"].as_array().unwrap();
        assert_eq!(steps[0]["label"], "Initialization");
        assert_eq!(steps[0]["stack"], serde_json::json!(["$", "S"]));
        assert_eq!(steps[1]["action"]["kind"], "apply");
        assert_eq!(steps.last().unwrap()["action"]["kind"], "accept");
    }

    #[test]
    fn error_json() {
        let json: serde_json::Value =
            serde_json::from_str(&analyze_to_json("S -> a", "b")).unwrap();
        assert_eq!(
            json["error"],
            "input contains errors: unrecognized token \"b\""
        );

        let json: serde_json::Value = serde_json::from_str(&first_follow_to_json("")).unwrap();
        assert_eq!(json["error"], "invalid or empty grammar");
    }

    #[test]
    fn serialization_failure_is_reported() {
        struct Broken;

        impl serde::Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("broken view"))
            }
        }

        let e = to_json(&Broken).unwrap_err();
        assert_eq!(e, AnalysisError::Serialization("broken view".to_string()));

        let json: serde_json::Value = serde_json::from_str(&error_to_json(e)).unwrap();
        assert_eq!(json["error"], "serialization failed: broken view");
    }

    #[test]
    fn table_json() {
        let json: serde_json::Value =
            serde_json::from_str(&ll1_table_to_json(EXPRESSION_GRAMMAR)).unwrap();
        assert_eq!(json["F"]["("], "F -> ( E )");
        assert_eq!(json["T'"]["$"], "T' -> ε");
        assert!(json["F"].get("+").is_none());
    }
}
