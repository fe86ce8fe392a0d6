mod config;

use std::error::Error;

use lesson_core::advisory::NextLessonAdvisory;
use lesson_core::availability::NavigationDecision;
use services::{AppServices, Clock, CountdownTicker, load_catalog, load_lesson_document};
use tracing_subscriber::EnvFilter;

use config::{Args, ArgsError, Command, prepare_sqlite_file};

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  course schedule  [--course <id>] [--lesson <current>]");
    eprintln!("  course progress  --lesson <id> --content <lesson.json> [--course <id>]");
    eprintln!("                   [--start] [--complete <section>]... [--exercise <section> <text>]");
    eprintln!("                   [--quiz <question>=<option>]...");
    eprintln!("  course countdown --lesson <id> [--course <id>] [--once]");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --db <sqlite_url>   default {}", config::DEFAULT_DB_URL);
    eprintln!("  --catalog <path>    default {}", config::DEFAULT_CATALOG);
    eprintln!("  --learner <uuid>    default: the learner stored for this device");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COURSE_DB_URL, COURSE_CATALOG, COURSE_LEARNER_ID, COURSE_LOG (or RUST_LOG)");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("COURSE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => Command::Schedule,
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            ArgsError::UnknownArg(first)
        })?,
    };

    let parsed = Args::parse(cmd, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog = load_catalog(&parsed.catalog).await?;

    // Open + migrate SQLite at startup; the library crates never touch the filesystem layout.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), catalog, parsed.learner)
            .await?;
    tracing::debug!(learner = %services.learner(), db = %parsed.db_url, "services ready");

    match cmd {
        Command::Schedule => show_schedule(&services, &parsed),
        Command::Progress => record_progress(&services, &parsed).await,
        Command::Countdown => run_countdown(&services, &parsed).await,
    }
}

fn show_schedule(services: &AppServices, args: &Args) -> Result<(), Box<dyn Error>> {
    let schedule = services.schedule();
    let modules = schedule.modules(&args.course)?;
    let mut current_module = None;
    for entry in schedule.schedule(&args.course, args.lesson)? {
        if entry.module.is_some() && entry.module != current_module {
            current_module = entry.module;
            if let Some(module) = modules.iter().find(|m| Some(m.id) == entry.module) {
                println!("{}", module.title);
            }
        }
        let marker = if entry.is_current {
            ">"
        } else if entry.is_past {
            "✓"
        } else {
            " "
        };
        println!(
            "{marker} {:>3}  {:<6}  {}  ({})  {}",
            entry.id,
            entry.status.as_str(),
            entry.title,
            entry.duration,
            entry.link.as_deref().unwrap_or(&entry.release_label),
        );
    }

    let Some(current) = args.lesson else {
        return Ok(());
    };
    match schedule.navigate(&args.course, current)? {
        NavigationDecision::Open { path } => println!("\nAula {current}: {path}"),
        NavigationDecision::Locked { release_label } => {
            println!("\nAula {current} disponível em {release_label}");
        }
        NavigationDecision::RequiresEnrollment => {
            println!("\nAula {current} exclusiva para alunos inscritos");
        }
    }
    match schedule.next_lesson(&args.course, current)? {
        Some(NextLessonAdvisory::GoNow { title, path, .. }) => {
            println!("Próxima aula: {title} (Disponível Agora: {path})");
        }
        Some(NextLessonAdvisory::Reminder {
            title,
            release_label,
            ..
        }) => println!("Próxima aula: {title} ({release_label})"),
        None => println!("Esta é a última aula do curso"),
    }
    Ok(())
}

async fn record_progress(services: &AppServices, args: &Args) -> Result<(), Box<dyn Error>> {
    let (Some(lesson), Some(content)) = (args.lesson, args.content.as_ref()) else {
        return Err(ArgsError::MissingFlag { flag: "--lesson" }.into());
    };
    let document = load_lesson_document(content).await?;
    let mut tracker = services.open_lesson(&args.course, lesson, &document).await?;

    if args.start {
        tracker.start_study().await;
    }
    for section in &args.complete {
        tracker.complete_section(section.clone()).await;
    }
    if let Some((section, text)) = &args.exercise {
        tracker.submit_exercise(section.clone(), text.clone()).await;
    }
    for choice in &args.quiz {
        match tracker
            .answer_quiz_choice(&document, choice.question, choice.option)
            .await
        {
            Some(true) => println!("quiz {}: correta", choice.question + 1),
            Some(false) => println!("quiz {}: incorreta", choice.question + 1),
            None => tracing::warn!(question = choice.question, "lesson has no such quiz question"),
        }
    }

    let snapshot = tracker.snapshot();
    println!(
        "{}: {}% ({}/{} seções) - {}",
        document.metadata.title,
        snapshot.percentage,
        snapshot.completed_required,
        snapshot.total_required,
        snapshot.badge.display_label(),
    );
    for outline in services.sections().outline(&document, tracker.record()) {
        println!("  {} [{}]", outline.title, outline.kind.as_str());
        for item in outline.items {
            let check = if item.completed { "x" } else { " " };
            println!("    [{check}] {}", item.label);
        }
    }
    if let Some(notice) = tracker.persistence_notice() {
        eprintln!("aviso: progresso não salvo ({})", notice.message);
    }
    Ok(())
}

async fn run_countdown(services: &AppServices, args: &Args) -> Result<(), Box<dyn Error>> {
    let Some(lesson) = args.lesson else {
        return Err(ArgsError::MissingFlag { flag: "--lesson" }.into());
    };
    let schedule = services.schedule();
    let (_, descriptor) = schedule.resolve(&args.course, lesson)?;

    let Some(release_at) = descriptor.release_at else {
        println!("Aula {lesson} não tem data de liberação");
        return Ok(());
    };
    let Some(countdown) = schedule.countdown(&args.course, lesson)? else {
        return Ok(());
    };
    if countdown.is_finished() {
        println!("Aula {lesson} disponível agora");
        return Ok(());
    }

    println!(
        "Aula {lesson} libera em {}",
        schedule.release_label(&args.course, lesson)?
    );
    if let Some(reminder) = schedule.reminder(&args.course, lesson)? {
        println!("Adicionar ao calendário: {}", reminder.google_calendar_url()?);
    }
    println!("{countdown}");
    if args.once {
        return Ok(());
    }

    let mut handle = CountdownTicker::new(services.clock()).start(release_at);
    while let Some(remaining) = handle.changed().await {
        println!("{remaining}");
    }
    println!("Aula {lesson} disponível agora");
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
