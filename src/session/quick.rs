use time::OffsetDateTime;

use crate::{
    record::build_quick_record,
    scorer::{EmotionResult, EmotionScorer},
    session::{
        error::{SessionError, ValidationError},
        machine::SessionRules,
        settings::EmptyResultPolicy,
        state::FieldKey,
    },
    store::{AppendReceipt, RemoteLogStore},
};

#[derive(Debug, Clone, PartialEq)]
pub enum QuickOutcome {
    Saved {
        result: EmotionResult,
        receipt: AppendReceipt,
    },
    /// Nothing cleared the threshold and the policy blocks persistence.
    NoSignal,
}

/// Single-sentence flow: score, show, and log one row per sentence.
#[derive(Debug, Clone, Default)]
pub struct QuickAnalysis {
    rules: SessionRules,
}

impl QuickAnalysis {
    pub fn new(rules: SessionRules) -> Self {
        Self { rules }
    }

    pub async fn analyze(
        &self,
        text: &str,
        scorer: &dyn EmotionScorer,
        store: &RemoteLogStore,
        at: OffsetDateTime,
    ) -> Result<QuickOutcome, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }
        if text.chars().count() < self.rules.min_text_chars {
            return Err(ValidationError::TextTooShort {
                field: FieldKey::InputText,
                min: self.rules.min_text_chars,
            }
            .into());
        }

        let result = EmotionResult::from_label_scores(scorer.score(text).await?, self.rules.threshold);
        if result.is_empty() && self.rules.empty_result_policy == EmptyResultPolicy::Block {
            tracing::info!(target: "session.quick", "quick_no_signal");
            return Ok(QuickOutcome::NoSignal);
        }

        let record = build_quick_record(text, &result, at)?;
        let receipt = store.append(&record).await?;
        tracing::info!(
            target: "session.quick",
            labels = result.len(),
            rows = receipt.row_count,
            "quick_result_saved"
        );
        Ok(QuickOutcome::Saved { result, receipt })
    }
}
