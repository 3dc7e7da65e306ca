use std::sync::Arc;

use time::macros::datetime;

use kote_survey::{
    record::columns,
    scorer::adapters::FixedScorer,
    session::{
        EmptyResultPolicy, FlowKind, QuickAnalysis, QuickOutcome, SessionError, SessionRules,
        SurveySettings, ValidationError,
    },
    store::{RemoteLogStore, Table, adapters::InMemoryBlobTransport},
};

use crate::scores;

const LOG_PATH: &str = "/quick_logs.csv";

fn quick_rules(policy: Option<EmptyResultPolicy>) -> SessionRules {
    let settings = SurveySettings {
        flow: FlowKind::Quick,
        empty_result_policy: policy,
        ..SurveySettings::default()
    };
    SessionRules::from_settings(&settings, 0.3)
}

#[tokio::test]
async fn given_sentence_with_signal_when_analyze_then_row_is_saved() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    let store = RemoteLogStore::new(Arc::clone(&memory) as _, LOG_PATH);
    let scorer = FixedScorer::new(scores(&[("기쁨", 0.9), ("슬픔", 0.35), ("분노", 0.1)]));

    let outcome = QuickAnalysis::new(quick_rules(None))
        .analyze("  시험에 합격했다  ", &scorer, &store, datetime!(2026-10-19 09:30 UTC))
        .await
        .expect("analysis succeeds");

    let QuickOutcome::Saved { result, receipt } = outcome else {
        panic!("expected a saved outcome");
    };
    assert_eq!(result.render(), "기쁨(0.9), 슬픔(0.35)");
    assert_eq!(receipt.row_count, 1);

    let object = memory.get(LOG_PATH).await.expect("log written");
    let table = Table::decode(&object.bytes).expect("decode");
    assert_eq!(
        table.columns(),
        &[
            columns::TIMESTAMP.to_string(),
            columns::INPUT_TEXT.to_string(),
            columns::TOP_EMOTIONS.to_string()
        ]
    );
    assert_eq!(
        table.column_values(columns::INPUT_TEXT).expect("column"),
        vec!["시험에 합격했다"]
    );
    assert_eq!(
        table.column_values(columns::TIMESTAMP).expect("column"),
        vec!["2026-10-19T09:30:00+00:00"]
    );
}

#[tokio::test]
async fn given_no_signal_when_analyze_quick_flow_then_nothing_is_persisted() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    let store = RemoteLogStore::new(Arc::clone(&memory) as _, LOG_PATH);
    let scorer = FixedScorer::new(scores(&[("기쁨", 0.3), ("슬픔", 0.2)]));

    let outcome = QuickAnalysis::new(quick_rules(None))
        .analyze("음", &scorer, &store, datetime!(2026-10-19 09:30 UTC))
        .await
        .expect("no signal is not an error");

    assert_eq!(outcome, QuickOutcome::NoSignal);
    assert_eq!(memory.download_count(), 0);
    assert_eq!(memory.upload_count(), 0);
}

#[tokio::test]
async fn given_omit_override_when_no_signal_then_empty_cell_is_saved() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    let store = RemoteLogStore::new(Arc::clone(&memory) as _, LOG_PATH);
    let scorer = FixedScorer::new(scores(&[("기쁨", 0.1)]));

    let outcome = QuickAnalysis::new(quick_rules(Some(EmptyResultPolicy::Omit)))
        .analyze("음", &scorer, &store, datetime!(2026-10-19 09:30 UTC))
        .await
        .expect("saved");

    assert!(matches!(outcome, QuickOutcome::Saved { ref result, .. } if result.is_empty()));
    let object = memory.get(LOG_PATH).await.expect("log written");
    let table = Table::decode(&object.bytes).expect("decode");
    assert_eq!(
        table.column_values(columns::TOP_EMOTIONS).expect("column"),
        vec![""]
    );
}

#[tokio::test]
async fn given_blank_sentence_when_analyze_then_empty_input_and_no_calls() {
    let memory = Arc::new(InMemoryBlobTransport::new());
    let store = RemoteLogStore::new(Arc::clone(&memory) as _, LOG_PATH);
    let scorer = FixedScorer::default();

    let err = QuickAnalysis::new(quick_rules(None))
        .analyze(" \n", &scorer, &store, datetime!(2026-10-19 09:30 UTC))
        .await
        .expect_err("blank input is rejected");

    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmptyInput)
    ));
    assert_eq!(err.user_message(), "문장을 입력해주세요!");
    assert_eq!(scorer.calls(), 0);
    assert_eq!(memory.download_count(), 0);
}
