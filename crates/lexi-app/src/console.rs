use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use lexi_core::state::AppState;
use lexi_core::validation::{can_add_translation, remaining_languages};
use lexi_types::{
    AppEvent, DraftTranslation, Language, QuizMode, QuizQuestion, SortOrder, Word, WordDraft,
    WordQuery,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const HELP: &str = "\
Commands:
  register <email> <password> <name>
  login <email> <password>
  logout
  add <word> <lang> [<lang>=<translation> ...]
  edit <id> <word> <lang> [<lang>=<translation> ...]
  delete <id>
  list [search] [--lang <code>] [--desc]
  quiz | hard
  choose <number|option>    answer <text>
  reveal | skip | next | leave
  score
  quit";

/// Split a line on whitespace, keeping "double quoted" runs together
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }

    args
}

fn parse_draft(args: &[String]) -> Result<WordDraft, String> {
    let Some((text, rest)) = args.split_first() else {
        return Err("Usage: add <word> <lang> [<lang>=<translation> ...]".to_string());
    };

    let mut draft = WordDraft {
        text: text.clone(),
        ..Default::default()
    };

    let mut rest = rest.iter().peekable();
    if let Some(primary) = rest.next_if(|a| !a.contains('=')) {
        draft.primary_language = Some(primary.clone());
    }

    for arg in rest {
        let Some((language, translation)) = arg.split_once('=') else {
            return Err(format!("Expected <lang>=<translation>, got \"{arg}\""));
        };
        if !can_add_translation(draft.translations.len()) {
            return Err(format!(
                "A word can have at most {} translations.",
                Language::max_translations()
            ));
        }

        if !language.is_empty() {
            let open = remaining_languages(
                draft.primary_language.as_deref(),
                &draft.translations,
                None,
            );
            if !open.iter().any(|l| l.code == language) {
                let codes: Vec<&str> = open.iter().map(|l| l.code).collect();
                return Err(format!(
                    "Cannot translate into \"{language}\" here. Choose one of: {}",
                    codes.join(", ")
                ));
            }
        }

        draft.translations.push(DraftTranslation {
            language: Some(language.to_string()).filter(|l| !l.is_empty()),
            text: translation.to_string(),
        });
    }

    Ok(draft)
}

fn parse_query(args: &[String]) -> Result<WordQuery, String> {
    let mut query = WordQuery::default();
    let mut search = Vec::new();
    let mut args = args.iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--desc" => query.order = SortOrder::Desc,
            "--asc" => query.order = SortOrder::Asc,
            "--lang" => {
                let code = args.next().ok_or("--lang needs a language code")?;
                query.language = Some(code.clone());
            }
            _ => search.push(arg.as_str()),
        }
    }

    query.search = search.join(" ");
    Ok(query)
}

/// Turn a typed line into a command for the app
///
/// `options` are the choices of the question on screen, so `choose 2` can refer
/// to them by position.
pub fn parse_command(line: &str, options: &[String]) -> Result<Option<AppEvent>, String> {
    let args = split_args(line);
    let Some((command, rest)) = args.split_first() else {
        return Ok(None);
    };

    let event = match (command.as_str(), rest) {
        ("register", [email, password, name @ ..]) if !name.is_empty() => AppEvent::Register {
            email: email.clone(),
            password: password.clone(),
            name: name.join(" "),
        },
        ("register", _) => return Err("Usage: register <email> <password> <name>".to_string()),
        ("login", [email, password]) => AppEvent::Login {
            email: email.clone(),
            password: password.clone(),
        },
        ("login", _) => return Err("Usage: login <email> <password>".to_string()),
        ("logout", []) => AppEvent::Logout,
        ("add", args) => AppEvent::AddWord(parse_draft(args)?),
        ("edit", [id, args @ ..]) => AppEvent::UpdateWord {
            id: id.clone(),
            draft: parse_draft(args)?,
        },
        ("edit", []) => return Err("Usage: edit <id> <word> <lang> [<lang>=<translation> ...]".to_string()),
        ("delete", [id]) => AppEvent::DeleteWord(id.clone()),
        ("delete", _) => return Err("Usage: delete <id>".to_string()),
        ("list", args) => AppEvent::ListWords(parse_query(args)?),
        ("quiz", []) => AppEvent::StartQuiz(QuizMode::MultipleChoice),
        ("hard", []) => AppEvent::StartQuiz(QuizMode::FreeText),
        ("choose", args) => {
            let choice = args.join(" ");
            let selected = match choice.parse::<usize>() {
                Ok(n) if n >= 1 && n <= options.len() => options[n - 1].clone(),
                _ => choice,
            };
            AppEvent::Answer(selected)
        }
        ("answer", args) => AppEvent::Answer(args.join(" ")),
        ("reveal", []) => AppEvent::RevealAnswer,
        ("skip", []) => AppEvent::SkipQuestion,
        ("next", []) => AppEvent::NextQuestion,
        ("leave", []) => AppEvent::LeaveQuiz,
        ("score", []) => AppEvent::ShowScore,
        ("quit" | "exit", []) => AppEvent::Quit,
        ("help", _) => return Err(HELP.to_string()),
        (other, _) => return Err(format!("Unknown command \"{other}\". Type `help` for a list.")),
    };

    Ok(Some(event))
}

fn describe_word(word: &Word) -> String {
    let flag = Language::find(&word.primary_language)
        .map(|l| l.flag)
        .unwrap_or("??");
    let translations: Vec<String> = word
        .translations
        .iter()
        .map(|t| format!("{}: {}", Language::label(&t.language), t.text))
        .collect();

    format!(
        "  {}  [{flag}] {}  ->  {}",
        word.id,
        word.text,
        translations.join(", ")
    )
}

fn describe_question(mode: QuizMode, question: &QuizQuestion) -> Vec<String> {
    let from = Language::label(&question.prompt_language);
    let to = Language::label(&question.target_language);

    match mode {
        QuizMode::MultipleChoice => {
            let mut lines = vec![format!(
                "What is the translation of \"{}\" (in {from}) in {to}?",
                question.prompt
            )];
            lines.extend(
                question
                    .options
                    .iter()
                    .enumerate()
                    .map(|(i, option)| format!("  {}. {option}", i + 1)),
            );
            lines
        }
        QuizMode::FreeText => vec![format!(
            "How do you say \"{}\" (which is in {from}) in {to}?",
            question.prompt
        )],
    }
}

/// Lines to print for an app event, and how long they stay before being cleared
pub fn render(event: &AppEvent, ui: &lexi_config::ui::UiConfig) -> (Vec<String>, Option<Duration>) {
    let notice = Some(Duration::from_millis(ui.notice_timeout_ms));

    match event {
        AppEvent::SignedIn { name } => (vec![format!("Welcome, {name}!")], None),
        AppEvent::SignedOut => (vec!["Signed out.".to_string()], None),
        AppEvent::AuthFailed(message) => (vec![format!("Error: {message}")], None),
        AppEvent::ValidationFailed(kinds) => (
            kinds.iter().map(|k| format!("! {k}")).collect(),
            Some(Duration::from_millis(ui.message_timeout_ms)),
        ),
        AppEvent::WordSaved { id, text } => {
            (vec![format!("Word \"{text}\" saved ({id}).")], notice)
        }
        AppEvent::WordDeleted(id) => (vec![format!("Word {id} deleted.")], notice),
        AppEvent::ShowWords { words, count } => {
            let mut lines = vec![format!("{count} word(s)")];
            lines.extend(words.iter().map(describe_word));
            (lines, None)
        }
        AppEvent::ShowQuestion { mode, question } => (describe_question(*mode, question), None),
        AppEvent::QuizFeedback(message) => (vec![message.clone()], None),
        AppEvent::QuizBlocked(message) => (
            vec![
                message.clone(),
                "Use `add <word> <lang> <lang>=<translation>` to add words.".to_string(),
            ],
            None,
        ),
        AppEvent::ScoreChanged(score) => (vec![format!("Score: {score}")], None),
        AppEvent::Notice(message) => (vec![message.clone()], notice),
        AppEvent::Failure(message) => (vec![format!("Error: {message}")], None),
        _ => (Vec::new(), None),
    }
}

/// Keep the choices of the question on screen for `choose <number>`
fn track_options(options: &mut Vec<String>, event: &AppEvent) {
    match event {
        AppEvent::ShowQuestion { question, .. } => *options = question.options.clone(),
        AppEvent::QuizBlocked(_) | AppEvent::LeaveQuiz | AppEvent::SignedOut => options.clear(),
        _ => {}
    }
}

/// Last transient block printed, erased when it expires if nothing followed it
struct Transient {
    lines: usize,
    deadline: Instant,
}

async fn expire(transient: &Option<Transient>) {
    match transient {
        Some(t) => tokio::time::sleep_until(t.deadline).await,
        None => std::future::pending().await,
    }
}

fn prompt(enabled: bool) {
    if enabled {
        print!("> ");
        let _ = std::io::stdout().flush();
    }
}

/// Line-oriented view: reads commands from stdin and prints app events
pub async fn console_loop(
    state: Arc<AppState>,
    app_to_ui_rx: AsyncReceiver<AppEvent>,
    ui_to_app_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let ui = state.config.read().await.ui.clone();
    let interactive = atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout);
    let show_prompt = ui.prompt && interactive;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut options: Vec<String> = Vec::new();
    let mut transient: Option<Transient> = None;

    println!("Type `help` for a list of commands.");
    prompt(show_prompt);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            _ = expire(&transient) => {
                if let Some(t) = transient.take() {
                    // Cursor sits on the prompt line below the block
                    print!("\r\x1b[{}A\x1b[J", t.lines);
                    prompt(show_prompt);
                }
            }

            line = lines.next_line() => {
                transient = None;
                let Some(line) = line? else {
                    tracing::info!("stdin closed");
                    ui_to_app_tx.send(AppEvent::Quit).await?;
                    break;
                };

                match parse_command(&line, &options) {
                    Ok(Some(AppEvent::Quit)) => {
                        ui_to_app_tx.send(AppEvent::Quit).await?;
                        break;
                    }
                    Ok(Some(event)) => {
                        track_options(&mut options, &event);
                        ui_to_app_tx.send(event).await?;
                    }
                    Ok(None) => prompt(show_prompt),
                    Err(message) => {
                        println!("{message}");
                        prompt(show_prompt);
                    }
                }
            }

            event = app_to_ui_rx.recv() => {
                let event = event?;
                track_options(&mut options, &event);

                let (output, linger) = render(&event, &ui);
                if output.is_empty() {
                    continue;
                }

                if show_prompt {
                    print!("\r\x1b[K");
                }
                for line in &output {
                    println!("{line}");
                }
                prompt(show_prompt);

                transient = match linger {
                    Some(after) if interactive => Some(Transient {
                        lines: output.len(),
                        deadline: Instant::now() + after,
                    }),
                    _ => None,
                };
            }
        }
    }

    Ok(())
}
