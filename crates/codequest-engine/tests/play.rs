//! End-to-end play through the builtin catalog: sessions driving the
//! simulators, awards flowing into the progress book, and progress
//! surviving a restart.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::missing_panics_doc,
    clippy::arithmetic_side_effects
)]

use std::time::{Duration, Instant};

use chrono::Local;
use codequest_catalog::{Catalog, Track};
use codequest_engine::config::SessionConfig;
use codequest_engine::{LiteralChecker, Phase, Session, SubmitOutcome};
use codequest_progress::{JsonFileStore, ProgressBook, ProgressStore, XpCurve};
use codequest_types::{
    CompletionRecord, ContainerStatus, EnvironmentSnapshot, LevelId, ProgressRecord, Technology,
};

fn track(technology: Technology) -> Track {
    Catalog::builtin()
        .unwrap()
        .track(technology)
        .unwrap()
        .clone()
}

fn start(technology: Technology, completed: CompletionRecord) -> Session {
    Session::new(
        track(technology),
        completed,
        Box::new(LiteralChecker),
        &SessionConfig {
            celebration_delay_ms: 2000,
        },
    )
    .unwrap()
}

/// Submit `answer` and wait out the celebration.
fn solve(session: &mut Session, answer: &str, now: Instant) -> SubmitOutcome {
    session.set_input(answer);
    let outcome = session.submit(now);
    session.poll(now + Duration::from_secs(3));
    outcome
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn sql_first_level_prints_the_table_and_advances() {
    let mut session = start(Technology::Sql, CompletionRecord::new());
    assert_eq!(session.phase(), Phase::Presenting(LevelId(1)));

    let now = Instant::now();
    session.set_input("select * from employees");
    let outcome = session.submit(now);
    let SubmitOutcome::Accepted { award: Some(award) } = outcome else {
        panic!("expected a first-time award, got {outcome:?}");
    };
    assert_eq!(award.level_id, LevelId(1));
    assert_eq!(award.xp_reward, 100);

    let printed = &session.transcript()[0].output.display;
    assert!(printed.contains("Alice Johnson"));
    assert!(printed.contains("(3 rows)"));
    assert_eq!(
        session.feedback().unwrap().message(),
        "🎉 Perfect! +100 XP"
    );

    assert!(!session.poll(now + Duration::from_millis(1999)));
    assert!(session.poll(now + Duration::from_millis(2000)));
    assert_eq!(session.phase(), Phase::Presenting(LevelId(2)));
    assert!(session.transcript().is_empty());
}

#[test]
fn docker_run_starts_a_named_container() {
    let completed = [LevelId(1)].into_iter().collect();
    let mut session = start(Technology::Docker, completed);
    assert_eq!(session.level().id, LevelId(2));

    session.set_input("docker run -d --name web -p 8080:80 nginx");
    let outcome = session.submit(Instant::now());
    assert!(matches!(outcome, SubmitOutcome::Accepted { award: Some(_) }));

    let EnvironmentSnapshot::Registry(registry) = session.environment() else {
        panic!("docker levels use a registry");
    };
    let web = registry.containers.iter().find(|c| c.name == "web").unwrap();
    assert_eq!(web.status, ContainerStatus::Running);
    assert_eq!(web.image, "nginx:latest");
    assert_eq!(web.ports, "8080:80");
}

#[test]
fn wrong_answer_still_runs_the_simulator() {
    let mut session = start(Technology::Linux, CompletionRecord::new());
    session.set_input("definitely-not-a-command");
    assert_eq!(session.submit(Instant::now()), SubmitOutcome::Rejected);
    assert_eq!(
        session.transcript()[0].output.display,
        "definitely-not-a-command: command not found"
    );
    assert!(!session.feedback().unwrap().is_success());
    assert_eq!(session.phase(), Phase::Presenting(LevelId(1)));
}

#[test]
fn css_progress_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("progress.json"));
    let css = track(Technology::Css);

    {
        let mut book = ProgressBook::new(store.load(), XpCurve::default());
        let mut session = start(Technology::Css, book.completed(Technology::Css));
        let now = Instant::now();
        for id in [1, 2] {
            let answer = css.level(LevelId(id)).unwrap().solutions[0].clone();
            if let SubmitOutcome::Accepted { award: Some(award) } =
                solve(&mut session, &answer, now)
            {
                book.apply(award, &css, Local::now());
                store.save(book.record()).unwrap();
            }
        }
        assert_eq!(session.phase(), Phase::Presenting(LevelId(3)));
    }

    let reloaded = store.load();
    let completed = reloaded.completed(Technology::Css);
    assert_eq!(completed.iter().collect::<Vec<_>>(), vec![LevelId(1), LevelId(2)]);

    let resumed = start(Technology::Css, completed);
    assert_eq!(resumed.phase(), Phase::Presenting(LevelId(3)));
}

// ---------------------------------------------------------------------------
// Properties over the whole catalog
// ---------------------------------------------------------------------------

#[test]
fn every_listed_solution_is_accepted() {
    let catalog = Catalog::builtin().unwrap();
    for technology in catalog.technologies() {
        let track = catalog.track(technology).unwrap();
        for level in track.levels() {
            for solution in &level.solutions {
                let mut session = start(technology, CompletionRecord::new());
                session.select_level(level.id).unwrap();
                session.set_input(solution.to_uppercase());
                assert!(
                    matches!(session.submit(Instant::now()), SubmitOutcome::Accepted { .. }),
                    "{technology} level {} rejected {solution:?}",
                    level.id
                );
            }
        }
    }
}

#[test]
fn full_playthrough_completes_and_never_double_counts() {
    for technology in Technology::ALL {
        let track = track(technology);
        let mut book = ProgressBook::new(ProgressRecord::default(), XpCurve::default());
        let mut session = start(technology, CompletionRecord::new());
        let now = Instant::now();

        let mut previous = 0;
        while let Phase::Presenting(id) = session.phase() {
            let answer = session.level().solutions[0].clone();
            if let SubmitOutcome::Accepted { award: Some(award) } =
                solve(&mut session, &answer, now)
            {
                book.apply(award, &track, Local::now());
            }
            let done = book.completed(technology).len();
            assert!(done > previous, "{technology} level {id} did not grow the record");
            previous = done;
        }
        assert!(session.is_complete());
        assert_eq!(previous, track.count());

        // Replaying the first level grants nothing new.
        let xp = book.record().profile.total_xp;
        let mut replay = start(technology, book.completed(technology));
        let answer = replay.level().solutions[0].clone();
        let outcome = solve(&mut replay, &answer, now);
        assert_eq!(outcome, SubmitOutcome::Accepted { award: None });
        assert_eq!(book.record().profile.total_xp, xp);
    }
}
