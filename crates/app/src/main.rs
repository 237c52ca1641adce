mod args;
mod commands;
mod render;

use exam_core::IntentError;
use services::{AttemptUpdate, Clock, ExamAttempt, ExamError, ExamLoopService};
use storage::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use args::{Args, print_usage};
use commands::{Command, HELP, answer_value, parse_command};
use render::{render_snapshot, render_submission};

/// What the input loop should do after handling a line.
enum Flow {
    Continue,
    Finished,
    Quit,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EXAM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report_rejection(err: &IntentError) {
    println!("! {err} ({})", err.reason());
}

async fn handle_command(
    svc: &ExamLoopService,
    attempt: &mut ExamAttempt,
    command: Command,
) -> Result<Flow, ExamError> {
    let outcome = match command {
        Command::Next => attempt.next().map(|_| ()),
        Command::Previous => attempt.previous().map(|_| ()),
        Command::GoTo(index) => attempt.go_to(index).map(|_| ()),
        Command::Answer(raw) => {
            let session = attempt.session();
            let Some(index) = session.current_index() else {
                return Ok(Flow::Continue);
            };
            let Some(kind) = session.question(index).map(|q| q.kind()) else {
                return Ok(Flow::Continue);
            };
            attempt.select_answer(index, answer_value(kind, &raw))
        }
        Command::Bookmark => {
            let index = attempt.session().current_index().unwrap_or(0);
            attempt.toggle_bookmark(index).map(|_| ())
        }
        Command::Submit => match svc.submit(attempt).await {
            Ok(_) => return Ok(Flow::Finished),
            Err(ExamError::Intent(err)) => Err(err),
            Err(ExamError::Storage(err)) => {
                eprintln!("could not save submission: {err}");
                return Ok(Flow::Finished);
            }
            Err(err) => return Err(err),
        },
        Command::Show => Ok(()),
        Command::Help => {
            println!("{HELP}");
            return Ok(Flow::Continue);
        }
        Command::Quit => return Ok(Flow::Quit),
    };

    match outcome {
        Ok(()) => println!("{}", render_snapshot(&attempt.snapshot())),
        Err(err) => report_rejection(&err),
    }
    Ok(Flow::Continue)
}

fn announce_remaining(update: &AttemptUpdate, last_shown: &mut u64) {
    let remaining = update.remaining_seconds;
    if remaining == *last_shown {
        return;
    }
    *last_shown = remaining;
    if remaining > 0 && (remaining <= 10 || remaining % 300 == 0) {
        println!("… {} left", render::format_remaining(remaining));
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let Some(parsed) = Args::parse(&mut argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    init_tracing();
    tracing::debug!(
        exam_file = %parsed.exam_file.display(),
        exam_id = %parsed.exam_id,
        tick = ?parsed.tick,
        "configuration loaded"
    );

    let storage = Storage::json(&parsed.exam_file, parsed.out.clone());
    let svc = ExamLoopService::from_storage(Clock::system(), &storage);

    let mut attempt = match svc.start_exam(parsed.exam_id).await {
        Ok(attempt) => attempt,
        Err(ExamError::Empty) => {
            eprintln!("exam {} has no questions", parsed.exam_id);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    println!("{}", render_snapshot(&attempt.snapshot()));
    println!("(h for help)");

    let mut ticker = tokio::time::interval(parsed.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_shown = attempt.session().remaining_seconds();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match svc.tick(&mut attempt).await {
                    Ok(update) if update.is_complete() => {
                        println!("\nTime is up.");
                        break;
                    }
                    Ok(update) => announce_remaining(&update, &mut last_shown),
                    Err(ExamError::Storage(err)) => {
                        eprintln!("could not save submission: {err}");
                        println!("\nTime is up.");
                        break;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed: treat like quit.
                    return Ok(());
                };
                let flow = match parse_command(&line) {
                    Ok(command) => handle_command(&svc, &mut attempt, command).await?,
                    Err(err) => {
                        println!("! {err}");
                        Flow::Continue
                    }
                };
                match flow {
                    Flow::Continue => {}
                    Flow::Finished => break,
                    Flow::Quit => {
                        println!("attempt discarded");
                        return Ok(());
                    }
                }
            }
        }
    }

    if let Some(submission) = attempt.session().submission() {
        println!("{}", render_submission(submission));
        println!("{}", serde_json::to_string_pretty(submission)?);
    }
    // One retry if the first delivery failed.
    match svc.finalize_submission(&mut attempt).await {
        Ok(id) => println!("saved as submission #{id}"),
        Err(err) => eprintln!("submission not saved: {err}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
