//! Revenue maturity diagnostic: a three-question quiz scored 10 / 5 / 0 per
//! answer and mapped to a maturity tier.
//!
//! Answers are recorded one at a time in question order. The tier is derived
//! from the running score, so it is available before the quiz is finished.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::round_whole;
use crate::calculations::{Calculator, CalculatorInput, Classification, Outcome, OutcomeOf, Row};
use crate::input::{FieldSpec, InputError};
use crate::models::{CalculatorId, FormId};

const ANSWER: FieldSpec = FieldSpec::new("answer", "Answer (option 0-2)", dec!(2));

const FIELDS: &[FieldSpec] = &[ANSWER];

/// One multiple-choice question. Options are ordered best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub text: &'static str,
    pub options: [(&'static str, u32); 3],
}

pub const QUESTIONS: [Question; 3] = [
    Question {
        text: "How accurate is your revenue forecast week-to-week?",
        options: [
            ("Within 5% variance", 10),
            ("It swings 10-20%", 5),
            ("We mostly guess", 0),
        ],
    },
    Question {
        text: "When sales misses a target, what happens?",
        options: [
            ("We analyze the root cause systemically", 10),
            ("We increase activity metrics (calls/emails)", 5),
            ("We blame the leads / marketing", 0),
        ],
    },
    Question {
        text: "Is your GTM strategy documented and aligned?",
        options: [
            ("Yes, fully clearly defined", 10),
            ("Sort of, it's in a few decks", 5),
            ("No, it's mostly in people's heads", 0),
        ],
    },
];

/// Highest attainable score.
pub const MAX_SCORE: u32 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaturityInput {
    /// Selected option index per answered question, in question order.
    pub answers: Vec<u8>,
}

fn option_points(
    question: usize,
    option: u8,
) -> Option<u32> {
    QUESTIONS
        .get(question)
        .and_then(|q| q.options.get(usize::from(option)))
        .map(|(_, points)| *points)
}

impl CalculatorInput for MaturityInput {
    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn sanitized(self) -> Self {
        // Answers are positional, so everything after the first invalid one
        // would be attributed to the wrong question.
        let answers = self
            .answers
            .into_iter()
            .enumerate()
            .take_while(|(question, option)| option_points(*question, *option).is_some())
            .map(|(_, option)| option)
            .collect();
        Self { answers }
    }

    /// Records the next answer. Entries after the last question, or outside
    /// the option range, are ignored.
    fn set_field(
        &mut self,
        key: &str,
        raw: &str,
    ) -> Result<(), InputError> {
        if key != ANSWER.key {
            return Err(InputError::UnknownField(key.to_string()));
        }
        let question = self.answers.len();
        if question >= QUESTIONS.len() {
            warn!(raw, "diagnostic already finished, ignoring answer");
            return Ok(());
        }
        match raw.trim().parse::<u8>() {
            Ok(option) if option_points(question, option).is_some() => self.answers.push(option),
            _ => warn!(raw, question, "invalid answer, ignoring"),
        }
        Ok(())
    }

    fn rows(&self) -> Vec<Row> {
        QUESTIONS
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let answer = self
                    .answers
                    .get(index)
                    .and_then(|option| question.options.get(usize::from(*option)))
                    .map_or("", |(text, _)| *text);
                (question.text, answer.to_string())
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaturityMetrics {
    pub score: u32,
    pub answered: usize,
    /// Share of questions answered, whole percent.
    pub progress_pct: Decimal,
    pub finished: bool,
    /// Text of the next unanswered question.
    pub next_question: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityTier {
    Elite,
    Constrained,
    Chaotic,
}

impl MaturityTier {
    pub fn from_score(score: u32) -> Self {
        match score {
            25.. => Self::Elite,
            15.. => Self::Constrained,
            _ => Self::Chaotic,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Elite => "Your engine is tuned. You likely just need optimization.",
            Self::Constrained => "You have potential, but friction is slowing you down.",
            Self::Chaotic => "Your growth is accidental, not engineered. You are at risk.",
        }
    }
}

impl Classification for MaturityTier {
    fn label(&self) -> &'static str {
        match self {
            Self::Elite => "Elite System",
            Self::Constrained => "Constrained System",
            Self::Chaotic => "Chaotic System",
        }
    }
}

/// Revenue maturity diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaturityCalculator;

impl Calculator for MaturityCalculator {
    type Input = MaturityInput;
    type Metrics = MaturityMetrics;
    type Classification = MaturityTier;

    fn id(&self) -> CalculatorId {
        CalculatorId::RevenueMaturity
    }

    fn compute(
        &self,
        input: &MaturityInput,
    ) -> OutcomeOf<Self> {
        let score: u32 = input
            .answers
            .iter()
            .enumerate()
            .filter_map(|(question, option)| option_points(question, *option))
            .sum();
        let answered = input.answers.len().min(QUESTIONS.len());
        let progress_pct =
            round_whole(Decimal::from(answered) * dec!(100) / Decimal::from(QUESTIONS.len()));

        Outcome {
            metrics: MaturityMetrics {
                score,
                answered,
                progress_pct,
                finished: answered == QUESTIONS.len(),
                next_question: QUESTIONS.get(answered).map(|q| q.text),
            },
            classification: MaturityTier::from_score(score),
        }
    }

    fn summary(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> String {
        format!(
            "Revenue Maturity: {} ({}/{MAX_SCORE})",
            outcome.classification.label(),
            outcome.metrics.score
        )
    }

    fn metric_rows(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> Vec<Row> {
        let metrics = &outcome.metrics;
        vec![
            ("Score", format!("{}/{MAX_SCORE}", metrics.score)),
            ("Progress", format!("{}%", metrics.progress_pct)),
            ("Tier", outcome.classification.label().to_string()),
            ("Diagnosis", outcome.classification.message().to_string()),
        ]
    }

    fn form_id(&self) -> Option<FormId> {
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn answered(options: &[u8]) -> MaturityInput {
        MaturityInput {
            answers: options.to_vec(),
        }
    }

    #[test]
    fn compute_empty_quiz() {
        let outcome = MaturityCalculator.compute(&MaturityInput::default());

        assert_eq!(outcome.metrics.score, 0);
        assert_eq!(outcome.metrics.progress_pct, dec!(0));
        assert!(!outcome.metrics.finished);
        assert_eq!(outcome.metrics.next_question, Some(QUESTIONS[0].text));
    }

    #[test]
    fn compute_partial_progress_rounds() {
        let outcome = MaturityCalculator.compute(&answered(&[0, 1]));

        assert_eq!(outcome.metrics.score, 15);
        assert_eq!(outcome.metrics.progress_pct, dec!(67));
        assert_eq!(outcome.metrics.next_question, Some(QUESTIONS[2].text));
    }

    #[test]
    fn compute_tiers() {
        assert_eq!(
            MaturityCalculator.compute(&answered(&[0, 0, 1])).classification,
            MaturityTier::Elite
        );
        assert_eq!(
            MaturityCalculator.compute(&answered(&[0, 1, 2])).classification,
            MaturityTier::Constrained
        );
        assert_eq!(
            MaturityCalculator.compute(&answered(&[1, 2, 2])).classification,
            MaturityTier::Chaotic
        );
    }

    #[test]
    fn compute_finished_quiz_has_no_next_question() {
        let outcome = MaturityCalculator.compute(&answered(&[2, 2, 2]));

        assert!(outcome.metrics.finished);
        assert_eq!(outcome.metrics.progress_pct, dec!(100));
        assert_eq!(outcome.metrics.next_question, None);
    }

    #[test]
    fn set_field_appends_answers_in_order() {
        let mut input = MaturityInput::default();

        input.set_field("answer", "1").unwrap();
        input.set_field("answer", "0").unwrap();

        assert_eq!(input.answers, vec![1, 0]);
    }

    #[test]
    fn set_field_ignores_out_of_range_and_extra_answers() {
        let mut input = answered(&[0, 0]);

        input.set_field("answer", "3").unwrap();
        input.set_field("answer", "2").unwrap();
        input.set_field("answer", "1").unwrap();

        assert_eq!(input.answers, vec![0, 0, 2]);
    }

    #[test]
    fn sanitized_drops_surplus_answers() {
        let input = answered(&[0, 1, 2, 0]).sanitized();

        assert_eq!(input.answers, vec![0, 1, 2]);
    }

    #[test]
    fn sanitized_truncates_at_first_invalid_answer() {
        let input = answered(&[0, 9, 1]).sanitized();

        assert_eq!(input.answers, vec![0]);
    }

    #[test]
    fn summary_reports_tier_and_score() {
        let outcome = MaturityCalculator.compute(&answered(&[0, 1, 2]));

        assert_eq!(
            MaturityCalculator.summary(&outcome),
            "Revenue Maturity: Constrained System (15/30)"
        );
    }
}
