use std::sync::Arc;

use anyhow::{Context, Result};
use time::OffsetDateTime;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::{
    record::now_local,
    scorer::{EmotionResult, EmotionScorer},
    session::{
        FieldKey, FlowKind, Gender, Notice, NoticeKind, QuickAnalysis, QuickOutcome, SessionRules,
        SurveySession, SurveyStep, TrustRating, machine::NO_SIGNAL_MESSAGE,
    },
    store::RemoteLogStore,
};

pub const BACK_COMMAND: &str = ":back";
pub const QUIT_COMMAND: &str = ":quit";

const BAR_WIDTH: usize = 20;

/// What the terminal needs to run either flow.
#[derive(Clone)]
pub struct TerminalApp {
    scorer: Arc<dyn EmotionScorer>,
    store: RemoteLogStore,
    rules: SessionRules,
    clock: fn() -> OffsetDateTime,
}

impl TerminalApp {
    pub fn new(scorer: Arc<dyn EmotionScorer>, store: RemoteLogStore, rules: SessionRules) -> Self {
        Self {
            scorer,
            store,
            rules,
            clock: now_local,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub async fn run<R, W>(&self, flow: FlowKind, input: R, output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut io = Console {
            lines: input.lines(),
            out: output,
        };
        match flow {
            FlowKind::Survey => self.run_survey(&mut io).await,
            FlowKind::Quick => self.run_quick(&mut io).await,
        }
    }

    async fn run_survey<R, W>(&self, io: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut session = SurveySession::new(self.rules.clone());
        tracing::info!(target: "terminal", session_id = %session.id(), "survey_started");
        io.say("== 감정 인식 설문 ==").await?;
        io.say(&format!(
            "'{BACK_COMMAND}' 이전 단계, '{QUIT_COMMAND}' 종료"
        ))
        .await?;

        loop {
            let keep_going = match session.step() {
                SurveyStep::Intro => self.intro_page(io, &mut session).await?,
                SurveyStep::Survey => self.survey_page(io, &mut session).await?,
                SurveyStep::Result => self.result_page(io, &mut session).await?,
                SurveyStep::Submitted => self.submitted_page(io, &mut session).await?,
            };
            if !keep_going {
                return Ok(());
            }
        }
    }

    async fn intro_page<R, W>(
        &self,
        io: &mut Console<R, W>,
        session: &mut SurveySession,
    ) -> Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Some(age) = io.ask_draft("나이", session.draft(FieldKey::Age)).await? else {
            return Ok(false);
        };
        session.set_field(FieldKey::Age, age);

        let genders = Gender::ALL
            .iter()
            .enumerate()
            .map(|(index, gender)| format!("{}) {}", index + 1, gender.label()))
            .collect::<Vec<_>>()
            .join("  ");
        let Some(gender) = io
            .ask_draft(&format!("성별 ({genders})"), session.draft(FieldKey::Gender))
            .await?
        else {
            return Ok(false);
        };
        session.set_field(FieldKey::Gender, gender);

        if session.advance().is_err() {
            io.notice(session.notice()).await?;
        }
        Ok(true)
    }

    async fn survey_page<R, W>(
        &self,
        io: &mut Console<R, W>,
        session: &mut SurveySession,
    ) -> Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let prompts = [
            (FieldKey::OwnText, "나의 최근 경험을 한 문장으로 적어주세요"),
            (FieldKey::OtherText, "다른 사람의 이야기를 한 문장으로 적어주세요"),
        ];
        for (key, label) in prompts {
            let Some(text) = io.ask_draft(label, session.draft(key)).await? else {
                return Ok(false);
            };
            if text.trim() == BACK_COMMAND {
                session.back()?;
                return Ok(true);
            }
            session.set_field(key, text);
        }

        io.say("분석 중...").await?;
        let submitted = session.submit_texts(self.scorer.as_ref()).await;
        // On success the result page shows any notice itself.
        if submitted.is_err() || session.step() == SurveyStep::Survey {
            io.notice(session.notice()).await?;
        }
        Ok(true)
    }

    async fn result_page<R, W>(
        &self,
        io: &mut Console<R, W>,
        session: &mut SurveySession,
    ) -> Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        io.notice(session.notice()).await?;
        if let Some(scored) = session.scored() {
            io.say("[나의 이야기]").await?;
            io.emotions(&scored.own).await?;
            io.say("[다른 사람의 이야기]").await?;
            io.emotions(&scored.other).await?;
        }

        let prompt = format!(
            "이 분석 결과를 얼마나 신뢰하나요? ({}~{}): ",
            TrustRating::MIN,
            TrustRating::MAX
        );
        let Some(rating) = io.ask(&prompt).await? else {
            return Ok(false);
        };
        if rating.trim() == BACK_COMMAND {
            session.back()?;
            return Ok(true);
        }
        session.set_field(FieldKey::TrustRating, rating);

        // The notice is shown when the result page renders again.
        if let Err(err) = session.submit_rating(&self.store, (self.clock)()).await {
            tracing::debug!(target: "terminal", error = %err, "rating_not_submitted");
        }
        Ok(true)
    }

    async fn submitted_page<R, W>(
        &self,
        io: &mut Console<R, W>,
        session: &mut SurveySession,
    ) -> Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        io.notice(session.notice()).await?;
        let Some(answer) = io.ask("새 응답을 시작할까요? (y/N): ").await? else {
            return Ok(false);
        };
        if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "네" | "예") {
            session.reset();
            return Ok(true);
        }
        Ok(false)
    }

    async fn run_quick<R, W>(&self, io: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let analysis = QuickAnalysis::new(self.rules.clone());
        io.say("== 문장 감정 분석 ==").await?;

        while let Some(text) = io.ask("문장: ").await? {
            match analysis
                .analyze(&text, self.scorer.as_ref(), &self.store, (self.clock)())
                .await
            {
                Ok(QuickOutcome::Saved { result, .. }) => {
                    io.emotions(&result).await?;
                    io.say("결과가 저장되었습니다.").await?;
                }
                Ok(QuickOutcome::NoSignal) => {
                    io.say(NO_SIGNAL_MESSAGE).await?;
                }
                Err(err) => {
                    if !err.is_validation() {
                        tracing::warn!(target: "terminal", error = %err, "quick_analysis_failed");
                    }
                    io.say(&err.user_message()).await?;
                }
            }
        }
        Ok(())
    }
}

struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn say(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await.context("failed to flush terminal output")
    }

    /// `None` on end of input or the quit command.
    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.flush().await?;
        let line = self
            .lines
            .next_line()
            .await
            .context("failed to read terminal input")?;
        Ok(line.filter(|line| line.trim() != QUIT_COMMAND))
    }

    /// Shows a kept draft as `label [draft]: ` and returns it for an empty line.
    async fn ask_draft(&mut self, label: &str, draft: Option<&str>) -> Result<Option<String>> {
        let draft = draft.filter(|draft| !draft.trim().is_empty());
        let prompt = match draft {
            Some(draft) => format!("{label} [{draft}]: "),
            None => format!("{label}: "),
        };
        let answer = self.ask(&prompt).await?;
        Ok(answer.map(|answer| match draft {
            Some(draft) if answer.trim().is_empty() => draft.to_string(),
            _ => answer,
        }))
    }

    async fn notice(&mut self, notice: Option<&Notice>) -> Result<()> {
        let Some(notice) = notice else {
            return Ok(());
        };
        let marker = match notice.kind {
            NoticeKind::Validation => "!",
            NoticeKind::Info => "i",
            NoticeKind::Failure => "x",
        };
        self.say(&format!("[{marker}] {}", notice.message)).await
    }

    async fn emotions(&mut self, result: &EmotionResult) -> Result<()> {
        if result.is_empty() {
            return self.say(NO_SIGNAL_MESSAGE).await;
        }
        for score in result.scores() {
            let filled = (score.confidence.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
            self.say(&format!(
                "  {:<10} {:.3} {}",
                score.label,
                score.rounded(),
                "█".repeat(filled)
            ))
            .await?;
        }
        Ok(())
    }
}
