use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use futures::executor::block_on;

use stepstory::core::{load_engine_config, EngineConfig, StatReset, StoryEngine, StorySnapshot};
use stepstory::data::load_story_catalog;
use stepstory::persistence::{CheckpointStore, SqliteStore};
use stepstory::systems::{sync_steps, FixedStepSource};

struct Paths {
    story: PathBuf,
    db: PathBuf,
    config: Option<PathBuf>,
}

fn main() {
    println!("Initializing StepStory (Engine Debug)...");
    let paths = parse_paths(env::args().collect());

    let catalog = match load_story_catalog(&paths.story) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("Failed to load story: {}", err);
            std::process::exit(1);
        }
    };

    let config = match &paths.config {
        Some(path) => match load_engine_config(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Failed to load config, using defaults: {}", err);
                EngineConfig::default()
            }
        },
        None => EngineConfig::default(),
    };

    if let Some(parent) = paths.db.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            eprintln!("Failed to create {}: {}", parent.display(), err);
        }
    }
    let checkpoints = match SqliteStore::open(&paths.db) {
        Ok(db) => CheckpointStore::new(db),
        Err(err) => {
            eprintln!(
                "Failed to open checkpoint DB at {}, progress will not be saved: {}",
                paths.db.display(),
                err
            );
            CheckpointStore::in_memory()
        }
    };

    let mut engine = match StoryEngine::new(&catalog, checkpoints, config) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Story content is unusable: {}", err);
            std::process::exit(1);
        }
    };

    let transition = engine.start();
    if !transition.persisted {
        println!("(checkpoint could not be written)");
    }
    print_snapshot(&engine.snapshot());

    let mut pedometer = FixedStepSource::default();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" => break,
            "help" => {
                println!("Commands: <n> choose decision | walk <steps> | credit [goal] | reset [restore] | resume | status | log | quit");
            }
            "status" => print_snapshot(&engine.snapshot()),
            "log" => {
                for line in engine.transition_log() {
                    println!("  {}", line);
                }
            }
            "walk" => match parts.next().map(str::parse::<i64>) {
                Some(Ok(steps)) => {
                    pedometer.push(steps);
                    match block_on(sync_steps(&mut pedometer, &mut engine)) {
                        Ok(synced) => println!(
                            "Walked {} steps ({} pending).",
                            synced,
                            engine.pending_steps()
                        ),
                        Err(err) => println!("Step sync failed: {}", err),
                    }
                }
                _ => println!("Usage: walk <steps>"),
            },
            "credit" => {
                let goal = match parts.next() {
                    Some(raw) => match raw.parse::<i64>() {
                        Ok(goal) => goal,
                        Err(_) => {
                            println!("Invalid goal: {}", raw);
                            continue;
                        }
                    },
                    None => engine.config().daily_steps_goal,
                };
                let credit = engine.credit_pending_steps(goal);
                println!("Earned {} energy (now {}).", credit.earned, credit.energy);
            }
            "reset" => {
                let transition = match parts.next() {
                    Some("restore") => engine.reset_story(StatReset::Restore),
                    Some("preserve") => engine.reset_story(StatReset::Preserve),
                    _ => engine.reset_story_with_config(),
                };
                println!("Attempt #{} begins.", engine.attempt_count());
                if !transition.persisted {
                    println!("(checkpoint could not be written)");
                }
                print_snapshot(&engine.snapshot());
            }
            "resume" => match engine.resume_story() {
                Ok(_) => print_snapshot(&engine.snapshot()),
                Err(err) => println!("Cannot resume: {}", err),
            },
            other => match other.parse::<usize>() {
                Ok(choice) if choice > 0 => match engine.choose(choice - 1) {
                    Ok(transition) => {
                        if !transition.persisted {
                            println!("(checkpoint could not be written)");
                        }
                        print_snapshot(&engine.snapshot());
                    }
                    Err(err) => println!("{}", err),
                },
                _ => println!("Unknown command: {} (try help)", other),
            },
        }
    }
}

fn parse_paths(args: Vec<String>) -> Paths {
    let mut iter = args.iter();
    let mut paths = Paths {
        story: PathBuf::from("./assets/data/story.json"),
        db: PathBuf::from("./assets/db/checkpoint.db"),
        config: None,
    };
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--story" => {
                if let Some(value) = iter.next() {
                    paths.story = PathBuf::from(value);
                }
            }
            "--db" => {
                if let Some(value) = iter.next() {
                    paths.db = PathBuf::from(value);
                }
            }
            "--config" => {
                if let Some(value) = iter.next() {
                    paths.config = Some(PathBuf::from(value));
                }
            }
            _ => {}
        }
    }
    paths
}

fn print_snapshot(snapshot: &StorySnapshot) {
    println!();
    match snapshot.day_label() {
        Some(day) => println!("== {} ({}) ==", snapshot.title, day),
        None => println!("== {} ==", snapshot.title),
    }
    if !snapshot.narrative_text.is_empty() {
        println!("{}", snapshot.narrative_text);
    }
    println!(
        "Health {}/10  Energy {}/10  Complete {}%  Attempts {}  Pending steps {}",
        snapshot.health,
        snapshot.energy,
        snapshot.completion_percentage,
        snapshot.attempts,
        snapshot.pending_steps
    );
    if snapshot.is_terminal {
        if snapshot.survived {
            println!("You survived. Type `reset` to walk it again.");
        } else {
            println!("The story has ended here. Type `reset` to try again.");
        }
        return;
    }
    for decision in &snapshot.decisions {
        let marker = if decision.enabled { "" } else { " (too tired)" };
        println!("  {}. {}{}", decision.index + 1, decision.text, marker);
    }
}
