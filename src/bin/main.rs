use financial_literacy_coach::{
    catalog,
    chat::ERROR_REPLY,
    contract::{AdvisoryPayload, AdvisoryRequest},
    AdvisoryResult, AppContext, CoachConfig, Cohort,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "Commands: /fact, /quiz <topic>, /expense <amount> <description>, /badges, /quit. Anything else is sent to the coach.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = CoachConfig::from_env()?;

    let cohort = std::env::var("COACH_COHORT")
        .ok()
        .and_then(|c| Cohort::parse(&c))
        .unwrap_or(Cohort::Teen);

    let mut app = AppContext::with_gemini(config)?;
    app.init_profile(cohort);

    let profile = catalog::cohort_profile(cohort);
    info!(%cohort, "Financial literacy coach starting");

    println!("=== {} ({}) ===", profile.title, profile.range);
    for message in app.chat().transcript() {
        println!("coach> {}", message.text);
    }
    println!("{}", HELP);

    let mut expenses = app.expense_tracker();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
            ("/quit", _) => break,
            ("", _) => continue,
            ("/fact", _) => match app.submit(&AdvisoryRequest::FinancialFact).await {
                AdvisoryResult::Success(AdvisoryPayload::FinancialFact(fact)) => {
                    println!("coach> {}", fact.fact)
                }
                other => println!("coach> (no fact right now: {:?})", other),
            },
            ("/badges", _) => {
                for badge in app.ledger().earned_badges() {
                    println!("  {} - {}", badge.name, badge.description);
                }
                println!("  {} earned", app.ledger().len());
            }
            ("/quiz", topic) => run_quiz(&mut app, &mut lines, topic).await?,
            ("/expense", rest) => {
                let (amount, description) = rest.split_once(' ').unwrap_or((rest, ""));
                expenses.set_description(description).await;
                // give the suggestion a chance to settle before committing
                tokio::time::sleep(app.config().suggestion_debounce * 3).await;
                match expenses.commit(description, amount.parse().unwrap_or(f64::NAN)).await {
                    Ok(tx) => println!("coach> Recorded ₹{} under {} ({})", tx.amount, tx.category, tx.status),
                    Err(e) => println!("coach> {}", e),
                }
            }
            _ => {
                let reply = match app.chat_mut().send(line).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!(error = %e, "chat send failed");
                        println!("coach> {}", ERROR_REPLY);
                        continue;
                    }
                };

                print!("coach> ");
                let outcome = app
                    .chat_mut()
                    .drive_reply(reply, |delta| {
                        print!("{}", delta);
                        let _ = std::io::stdout().flush();
                    })
                    .await;
                if outcome.is_err() {
                    print!("\n{}", ERROR_REPLY);
                }
                println!();
            }
        }
    }

    app.reset_profile();
    Ok(())
}

async fn run_quiz(
    app: &mut AppContext,
    stdin: &mut Lines<BufReader<Stdin>>,
    topic: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let topic = if topic.is_empty() { catalog::QUIZ_TOPICS[0] } else { topic };
    let mut quiz = app.quiz_runner();

    if quiz.start(topic, app.gateway()).await.is_err() {
        println!("coach> {}", quiz.error().unwrap_or_default());
        return Ok(());
    }

    while let Some(question) = quiz.current_question().cloned() {
        println!("\n{}", question.question);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        print!("answer> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };
        let picked = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| question.options.get(n.wrapping_sub(1)));
        let Some(option) = picked else {
            println!("Pick a number between 1 and {}", question.options.len());
            continue;
        };

        quiz.select_answer(option)?;
        quiz.next(app.ledger_mut())?;
    }

    if let Some(report) = quiz.report() {
        println!("\nScore: {}% ({} of {})", report.display_score(), report.correct, report.total);
        for result in &report.breakdown {
            let mark = if result.correct { "✔" } else { "✘" };
            println!("  {} {} (answer: {})", mark, result.question, result.answer);
        }
        if report.passed {
            println!("Badge unlocked: Quiz Whiz!");
        }
    }
    Ok(())
}
