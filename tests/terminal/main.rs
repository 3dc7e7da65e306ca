use std::sync::Arc;

use time::{OffsetDateTime, macros::datetime};

use kote_survey::{
    record::columns,
    scorer::{LabelScore, adapters::FixedScorer},
    session::{FlowKind, SessionRules, SurveySettings},
    store::{RemoteLogStore, Table, adapters::InMemoryBlobTransport},
    terminal::TerminalApp,
};

const LOG_PATH: &str = "/sentiment_logs.csv";

fn fixed_clock() -> OffsetDateTime {
    datetime!(2026-10-19 21:15 +9)
}

fn app(flow: FlowKind) -> (Arc<InMemoryBlobTransport>, TerminalApp) {
    let memory = Arc::new(InMemoryBlobTransport::new());
    let store = RemoteLogStore::new(Arc::clone(&memory) as _, LOG_PATH);
    let scorer = FixedScorer::new(vec![LabelScore::new("무덤덤", 0.1)])
        .with_text(
            "오늘 정말 행복했다",
            vec![LabelScore::new("기쁨", 0.81), LabelScore::new("슬픔", 0.42)],
        )
        .with_text("친구가 울었다", vec![LabelScore::new("슬픔", 0.77)]);
    let settings = SurveySettings {
        flow,
        ..SurveySettings::default()
    };
    let app = TerminalApp::new(
        Arc::new(scorer),
        store,
        SessionRules::from_settings(&settings, 0.3),
    )
    .with_clock(fixed_clock);
    (memory, app)
}

async fn run(app: &TerminalApp, flow: FlowKind, input: &str) -> String {
    let mut output = Vec::new();
    app.run(flow, input.as_bytes(), &mut output)
        .await
        .expect("terminal run succeeds");
    String::from_utf8(output).expect("utf-8 output")
}

async fn logged(memory: &InMemoryBlobTransport) -> Table {
    let object = memory.get(LOG_PATH).await.expect("log written");
    Table::decode(&object.bytes).expect("decode")
}

#[tokio::test]
async fn given_complete_answers_when_survey_runs_then_one_row_is_logged() {
    let (memory, app) = app(FlowKind::Survey);
    let input = "25\n여성\n오늘 정말 행복했다\n친구가 울었다\n4\nn\n";

    let output = run(&app, FlowKind::Survey, input).await;

    assert!(output.contains("기쁨"), "result page lists emotions: {output}");
    assert!(output.contains("응답이 저장되었습니다"), "{output}");
    let table = logged(&memory).await;
    assert_eq!(table.len(), 1);
    assert_eq!(
        table.column_values(columns::TIMESTAMP).expect("column"),
        vec!["2026-10-19T21:15:00+09:00"]
    );
    assert_eq!(
        table.column_values(columns::OTHER_EMOTIONS).expect("column"),
        vec!["슬픔(0.77)"]
    );
}

#[tokio::test]
async fn given_invalid_age_when_survey_runs_then_message_is_shown_and_intro_repeats() {
    let (memory, app) = app(FlowKind::Survey);
    let input = "스물\n여성\n25\n남성\n오늘 정말 행복했다\n친구가 울었다\n5\ny\n";

    let output = run(&app, FlowKind::Survey, input).await;

    assert!(output.contains("나이는 1 이상의 정수로 입력해주세요."), "{output}");
    assert_eq!(
        output.matches("나이: ").count(),
        2,
        "blank age prompt at the start and after the restart"
    );
    assert_eq!(
        output.matches("나이 [스물]: ").count(),
        1,
        "intro asks again after the error with the rejected draft shown"
    );
    let table = logged(&memory).await;
    assert_eq!(table.column_values(columns::GENDER).expect("column"), vec!["남성"]);
}

#[tokio::test]
async fn given_back_command_on_result_page_when_texts_change_then_new_texts_are_logged() {
    let (memory, app) = app(FlowKind::Survey);
    let input = "30\n2\n그냥 그랬다\n친구가 울었다\n:back\n오늘 정말 행복했다\n친구가 울었다\n3\n";

    run(&app, FlowKind::Survey, input).await;

    let table = logged(&memory).await;
    assert_eq!(
        table.column_values(columns::OWN_TEXT).expect("column"),
        vec!["오늘 정말 행복했다"]
    );
}

#[tokio::test]
async fn given_back_command_when_answers_are_left_blank_then_drafts_are_kept() {
    let (memory, app) = app(FlowKind::Survey);
    let input = "25\n여성\n:back\n\n\n오늘 정말 행복했다\n친구가 울었다\n4\n";

    let output = run(&app, FlowKind::Survey, input).await;

    assert!(output.contains("나이 [25]: "), "{output}");
    assert!(output.contains("[여성]: "), "{output}");
    let table = logged(&memory).await;
    assert_eq!(table.column_values(columns::AGE).expect("column"), vec!["25"]);
    assert_eq!(table.column_values(columns::GENDER).expect("column"), vec!["여성"]);
}

#[tokio::test]
async fn given_back_from_result_page_when_texts_are_left_blank_then_previous_texts_are_logged() {
    let (memory, app) = app(FlowKind::Survey);
    let input = "30\n2\n오늘 정말 행복했다\n친구가 울었다\n:back\n\n\n3\n";

    let output = run(&app, FlowKind::Survey, input).await;

    assert!(output.contains("[오늘 정말 행복했다]: "), "{output}");
    let table = logged(&memory).await;
    assert_eq!(
        table.column_values(columns::OWN_TEXT).expect("column"),
        vec!["오늘 정말 행복했다"]
    );
    assert_eq!(
        table.column_values(columns::OTHER_TEXT).expect("column"),
        vec!["친구가 울었다"]
    );
}

#[tokio::test]
async fn given_quit_command_when_survey_runs_then_nothing_is_logged() {
    let (memory, app) = app(FlowKind::Survey);

    run(&app, FlowKind::Survey, "25\n:quit\n").await;

    assert_eq!(memory.upload_count(), 0);
}

#[tokio::test]
async fn given_sentences_when_quick_flow_runs_then_each_signal_is_logged() {
    let (memory, app) = app(FlowKind::Quick);
    let input = "오늘 정말 행복했다\n\n그냥 그랬다\n친구가 울었다\n";

    let output = run(&app, FlowKind::Quick, input).await;

    assert!(output.contains("문장을 입력해주세요!"), "{output}");
    assert!(output.contains("뚜렷한 감정이 감지되지 않았습니다."), "{output}");
    let table = logged(&memory).await;
    assert_eq!(
        table.column_values(columns::INPUT_TEXT).expect("column"),
        vec!["오늘 정말 행복했다", "친구가 울었다"]
    );
}
