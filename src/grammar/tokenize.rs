use crate::{AnalysisError, Grammar};

impl Grammar {
    /// Index of the terminal spelled `s`. The end marker is never matched,
    /// the caller does not supply it.
    fn input_terminal(&self, s: &str) -> Option<usize> {
        self.get_symbol_index(s)
            .filter(|&idx| self.is_terminal(idx) && idx != self.end_mark)
    }

    fn is_terminal_prefix(&self, s: &str) -> bool {
        self.terminal_iter()
            .any(|(idx, t)| idx != self.end_mark && t.len() > s.len() && t.starts_with(s))
    }

    /// Splits `input` into terminal indices with a single greedy pass.
    ///
    /// Characters accumulate until the buffer spells a terminal. Whitespace
    /// only ends a token if the buffer cannot grow into a terminal, in which
    /// case the input is rejected. Input holding no token at all is rejected
    /// as well.
    pub fn tokenize(&self, input: &str) -> Result<Vec<usize>, AnalysisError> {
        let mut tokens: Vec<usize> = Vec::new();
        let mut current = String::new();

        for c in input.chars() {
            if c.is_whitespace() {
                if current.is_empty() {
                    continue;
                }
                if let Some(idx) = self.input_terminal(&current) {
                    tokens.push(idx);
                    current.clear();
                } else if !self.is_terminal_prefix(&current) {
                    return Err(AnalysisError::InputContainsErrors { fragment: current });
                }
            } else {
                current.push(c);
                if let Some(idx) = self.input_terminal(&current) {
                    tokens.push(idx);
                    current.clear();
                }
            }
        }

        if !current.is_empty() {
            match self.input_terminal(&current) {
                Some(idx) => tokens.push(idx),
                None => return Err(AnalysisError::InputContainsErrors { fragment: current }),
            }
        }

        if tokens.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::grammar::EXPRESSION_GRAMMAR;
    use crate::{AnalysisError, Grammar};

    fn tokenize(input: &str) -> Result<Vec<String>, AnalysisError> {
        let g = Grammar::parse(EXPRESSION_GRAMMAR).unwrap();
        g.tokenize(input).map(|tokens| {
            tokens
                .into_iter()
                .map(|t| g.get_symbol_name(t).to_string())
                .collect()
        })
    }

    #[rstest]
    #[case("id + id", &["id", "+", "id"])]
    #[case("id+id*id", &["id", "+", "id", "*", "id"])]
    #[case("  ( id )  ", &["(", "id", ")"])]
    #[case("i d", &["id"])]
    fn accepted_inputs(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(tokenize(input).unwrap(), expected);
    }

    #[rstest]
    #[case("id + x", "x")]
    #[case("id + i", "i")]
    #[case("id $", "$")]
    #[case("idx", "x")]
    fn rejected_inputs(#[case] input: &str, #[case] fragment: &str) {
        assert_eq!(
            tokenize(input),
            Err(AnalysisError::InputContainsErrors {
                fragment: fragment.to_string()
            })
        );
    }

    #[rstest]
    #[case("")]
    #[case(" \t\n ")]
    fn input_without_tokens_is_rejected(#[case] input: &str) {
        assert_eq!(tokenize(input), Err(AnalysisError::EmptyInput));
    }

    #[test]
    fn space_joined_terminals_round_trip() {
        let g = Grammar::parse("S -> begin S end | x ; | ε").unwrap();
        let sequence = ["begin", "x", ";", "begin", "end", "end"];
        let tokens = g.tokenize(&sequence.join(" ")).unwrap();
        let names: Vec<&str> = tokens.iter().map(|&t| g.get_symbol_name(t)).collect();
        assert_eq!(names, sequence);
    }
}
