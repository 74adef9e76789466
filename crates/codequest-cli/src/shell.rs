//! The interactive loop: home dashboard, track selection and level play.
//!
//! The shell is a single task. Each turn it waits for whichever comes
//! first, the next input line or the active session's celebration
//! deadline. Leaving a track drops its [`Session`] and with it any pending
//! advance.

use std::time::Instant;

use chrono::Local;
use codequest_catalog::Catalog;
use codequest_engine::{AppConfig, LiteralChecker, Phase, Session, SubmitOutcome};
use codequest_progress::{ProgressBook, ProgressStore, Rival, XpCurve};
use codequest_types::{LevelId, Technology};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::CliError;
use crate::render;

/// Whether the loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// A `:`-prefixed command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Meta<'a> {
    Hint,
    Concept,
    Reset,
    Levels,
    Level(Option<u32>),
    Learn(Option<&'a str>),
    Back,
    Quit,
    Unknown(&'a str),
}

impl<'a> Meta<'a> {
    /// `None` when `line` is not a meta command.
    fn parse(line: &'a str) -> Option<Self> {
        let rest = line.trim().strip_prefix(':')?;
        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default();
        let arg = words.next();
        Some(match name {
            "hint" => Self::Hint,
            "concept" => Self::Concept,
            "reset" => Self::Reset,
            "levels" => Self::Levels,
            "level" => Self::Level(arg.and_then(|a| a.parse().ok())),
            "learn" => Self::Learn(arg),
            "back" | "home" => Self::Back,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(name),
        })
    }
}

/// The running application.
pub struct Shell {
    config: AppConfig,
    catalog: Catalog,
    store: Box<dyn ProgressStore>,
    book: ProgressBook,
    rivals: Vec<Rival>,
    session: Option<Session>,
}

impl Shell {
    /// Load progress from `store` and prepare the home screen.
    ///
    /// A profile with no progress yet takes its name and avatar from the
    /// configuration.
    pub fn new(config: AppConfig, catalog: Catalog, store: Box<dyn ProgressStore>) -> Self {
        let curve = XpCurve::new(
            config.progression.base_level_xp,
            config.progression.level_xp_step,
        );
        let mut book = ProgressBook::new(store.load(), curve);
        if book.is_fresh() {
            book.set_identity(&config.profile.name, &config.profile.avatar);
        }
        let rivals = config
            .leaderboard
            .rivals
            .iter()
            .map(|r| Rival {
                name: r.name.clone(),
                avatar: r.avatar.clone(),
                total_xp: r.total_xp,
            })
            .collect();
        info!(
            completed = book.record().total_completed(),
            total_xp = book.record().profile.total_xp,
            "progress loaded"
        );
        Self {
            config,
            catalog,
            store,
            book,
            rivals,
            session: None,
        }
    }

    /// Run until `:quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] if reading input or writing output fails.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        emit(&mut output, &self.home()).await?;

        loop {
            let deadline = self.session.as_ref().and_then(Session::deadline);
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("end of input");
                        break;
                    };
                    let mut out = String::new();
                    let flow = self.handle(&line, now(), &mut out);
                    emit(&mut output, &out).await?;
                    if flow == Flow::Quit {
                        break;
                    }
                }
                () = wait_for(deadline) => {
                    let mut out = String::new();
                    self.tick(now(), &mut out);
                    emit(&mut output, &out).await?;
                }
            }
        }

        info!("shell stopped");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn handle(&mut self, line: &str, now: Instant, out: &mut String) -> Flow {
        if self.session.is_some() {
            self.handle_game(line, now, out)
        } else {
            self.handle_home(line, out)
        }
    }

    fn handle_home(&mut self, line: &str, out: &mut String) -> Flow {
        let choice = line.trim();
        match Meta::parse(choice) {
            Some(Meta::Quit) => return Flow::Quit,
            Some(Meta::Learn(Some(name))) => match name.parse::<Technology>() {
                Ok(technology) => self.show_materials(technology, out),
                Err(e) => push(out, &format!("{e}\n{}", render::learn_usage())),
            },
            Some(Meta::Learn(None)) => push(out, &render::learn_usage()),
            Some(_) => push(out, "Pick a track first."),
            None if choice.is_empty() => push(out, &self.home()),
            None => match pick_technology(choice) {
                Some(technology) => self.enter(technology, out),
                None => push(out, &format!("No track called {choice:?}.")),
            },
        }
        Flow::Continue
    }

    fn handle_game(&mut self, line: &str, now: Instant, out: &mut String) -> Flow {
        let Some(session) = self.session.as_mut() else {
            return Flow::Continue;
        };

        match Meta::parse(line) {
            Some(Meta::Quit) => return Flow::Quit,
            Some(Meta::Back) => {
                info!(technology = %session.technology(), "leaving track");
                self.session = None;
                push(out, &self.home());
            }
            Some(Meta::Hint) => {
                session.toggle_hint();
                push(out, &render::level(session));
            }
            Some(Meta::Concept) => {
                session.toggle_concept();
                push(out, &render::level(session));
            }
            Some(Meta::Reset) => {
                session.reset();
                push(out, &render::level(session));
            }
            Some(Meta::Levels) => push(out, &render::level_grid(session)),
            Some(Meta::Level(Some(n))) => match session.select_level(LevelId(n)) {
                Ok(()) => push(out, &render::level(session)),
                Err(e) => push(out, &e.to_string()),
            },
            Some(Meta::Level(None)) => push(out, "Usage: :level <n>"),
            Some(Meta::Learn(_)) => push(out, &render::materials(session.track())),
            Some(Meta::Unknown(name)) => push(out, &format!("Unknown command :{name}")),
            None => self.submit(line, now, out),
        }
        Flow::Continue
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    fn enter(&mut self, technology: Technology, out: &mut String) {
        let track = match self.catalog.track(technology) {
            Ok(track) => track.clone(),
            Err(e) => return push(out, &e.to_string()),
        };
        match Session::new(
            track,
            self.book.completed(technology),
            Box::new(LiteralChecker),
            &self.config.session,
        ) {
            Ok(session) => {
                info!(technology = %technology, level = %session.level().id, "entering track");
                push(out, &render::level(&session));
                self.session = Some(session);
            }
            Err(e) => push(out, &e.to_string()),
        }
    }

    fn submit(&mut self, line: &str, now: Instant, out: &mut String) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.set_input(line);
        let outcome = session.submit(now);
        push(
            out,
            &render::submission(session.transcript().last(), session.feedback()),
        );

        match outcome {
            SubmitOutcome::Accepted { award: Some(award) } => {
                let report = self.book.apply(award, session.track(), Local::now());
                push(out, &render::report(&report));
                self.persist(out);
            }
            SubmitOutcome::Accepted { award: None } => {}
            SubmitOutcome::Rejected => {
                let technology = session.technology();
                let level = session.level().id;
                self.book.record_rejection(technology, level, Local::now());
                self.persist(out);
            }
            SubmitOutcome::Ignored => push(out, "Hold on, the next level is on its way."),
        }
    }

    /// Advance the session once its celebration deadline has passed.
    fn tick(&mut self, now: Instant, out: &mut String) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.poll(now) {
            return;
        }
        match session.phase() {
            Phase::Complete => push(out, &render::track_complete(session)),
            Phase::Presenting(_) | Phase::Celebrating { .. } => {
                push(out, &render::level(session));
            }
        }
    }

    fn show_materials(&self, technology: Technology, out: &mut String) {
        match self.catalog.track(technology) {
            Ok(track) => push(out, &render::materials(track)),
            Err(e) => push(out, &e.to_string()),
        }
    }

    fn persist(&self, out: &mut String) {
        if let Err(e) = self.store.save(self.book.record()) {
            warn!(error = %e, "failed to save progress");
            push(out, &format!("⚠️  Progress could not be saved: {e}"));
        }
    }

    fn home(&self) -> String {
        render::home(self.book.record(), &self.catalog, &self.rivals)
    }
}

/// A track by key (`sql`) or by its 1-based position on the home screen.
fn pick_technology(choice: &str) -> Option<Technology> {
    if let Ok(n) = choice.parse::<usize>() {
        return Technology::ALL.get(n.checked_sub(1)?).copied();
    }
    choice.parse().ok()
}

fn push(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str(text);
    out.push('\n');
}

async fn emit<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), CliError> {
    if text.is_empty() {
        return Ok(());
    }
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

/// The current instant on the runtime's clock.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Resolve at `deadline`, or never.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}
