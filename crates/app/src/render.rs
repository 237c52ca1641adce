use exam_core::model::Answer;
use exam_core::{SessionSnapshot, Submission};

/// `m:ss`, or `h:mm:ss` past an hour.
#[must_use]
pub fn format_remaining(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

fn format_answer(answer: Option<&Answer>) -> String {
    match answer {
        None => "-".to_string(),
        Some(Answer::Single(id)) => id.to_string(),
        Some(Answer::Multiple(ids)) => ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Answer::Text(text)) => text.clone(),
    }
}

/// Header line plus the current question.
#[must_use]
pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = format!(
        "{} · {} · {} left · {}",
        snapshot.exam_name,
        snapshot.module_name,
        format_remaining(snapshot.remaining_seconds),
        snapshot.status
    );

    let (Some(index), Some(question)) = (snapshot.current_index, snapshot.current()) else {
        return out;
    };
    let marker = if question.bookmarked { " [bookmarked]" } else { "" };
    out.push_str(&format!(
        "\n\nQuestion {} of {} ({}){marker}\n{}\n",
        index + 1,
        snapshot.questions.len(),
        question.kind,
        question.prompt
    ));
    if let Some(options) = &question.options {
        for option in options {
            out.push_str(&format!("  {}) {}\n", option.id, option.label));
        }
    }
    out.push_str(&format!(
        "answer: {}",
        format_answer(question.selected.as_ref())
    ));
    out
}

/// One line per question: answered/bookmarked markers, then the totals.
#[must_use]
pub fn render_submission(submission: &Submission) -> String {
    let mut out = format!(
        "{} after {} · {}/{} correct · {} answered\n",
        submission.status,
        format_remaining(submission.elapsed_seconds),
        submission.correct_count(),
        submission.answers.len(),
        submission.answered_count()
    );
    for (i, answer) in submission.answers.iter().enumerate() {
        out.push_str(&format!(
            "  {:>2}. {:<10} {} {}{}\n",
            i + 1,
            answer.question_id.as_str(),
            if answer.correct { "✓" } else { "✗" },
            format_answer(answer.selected.as_ref()),
            if answer.bookmarked { " (bookmarked)" } else { "" }
        ));
    }
    out
}
