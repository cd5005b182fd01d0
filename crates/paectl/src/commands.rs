//! paectl command implementations.
//!
//! Commands run against the local progress file; the daemon is not required.
//! Interactive loops take their input and output as parameters.

use crate::display::{self, THIN_SEP};
use anyhow::{bail, Context as _, Result};
use owo_colors::OwoColorize;
use pae_common::achievements::format_unlock;
use pae_common::config::{check_grid_size, GameDefaults};
use pae_common::protein::available_map_types;
use pae_common::question_client::Generated;
use pae_common::session::AnswerOutcome;
use pae_common::{
    project, select_matrix, Audience, Difficulty, GameConfig, GameMode, GameSession,
    HttpQuestionClient, JsonFileStore, MapType, ProgressEngine, ProteinCatalog, QuestionOrigin,
    QuestionSource,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Everything a command needs, built once from configuration
pub struct Context {
    pub config: GameConfig,
    pub proteins: Arc<ProteinCatalog>,
    pub engine: ProgressEngine,
    pub questions: Option<Box<dyn QuestionSource>>,
    pub color: bool,
}

impl Context {
    pub fn from_config(config: GameConfig, color: bool) -> Result<Self> {
        let proteins = Arc::new(config.protein_catalog()?);
        let store = Arc::new(JsonFileStore::new(&config.data_dir()?));
        debug!("Progress file: {}", store.path().display());
        let engine = ProgressEngine::new(config.achievement_catalog()?, store);

        let questions: Option<Box<dyn QuestionSource>> = if config.question_service.enabled {
            let client = HttpQuestionClient::new(config.question_service.clone())?;
            Some(Box::new(client))
        } else {
            None
        };

        Ok(Self {
            config,
            proteins,
            engine,
            questions,
            color,
        })
    }

    fn source(&self) -> Option<&dyn QuestionSource> {
        self.questions.as_deref()
    }
}

/// Overrides for the configured game defaults
#[derive(Debug, Default, Clone)]
pub struct GameOptions {
    pub protein: Option<String>,
    pub map: Option<MapType>,
    pub size: Option<usize>,
    pub difficulty: Option<Difficulty>,
    pub audience: Option<Audience>,
    pub mode: Option<GameMode>,
}

impl GameOptions {
    /// Overlay the options on `base`; fails on an out-of-range grid size
    pub fn apply(&self, base: &GameDefaults) -> Result<GameDefaults> {
        let grid_size = self.size.unwrap_or(base.grid_size);
        check_grid_size(grid_size)?;
        Ok(GameDefaults {
            protein: self.protein.clone().unwrap_or_else(|| base.protein.clone()),
            map_type: self.map.unwrap_or(base.map_type),
            grid_size,
            difficulty: self.difficulty.unwrap_or(base.difficulty),
            audience: self.audience.unwrap_or(base.audience),
            game_mode: self.mode.unwrap_or(base.game_mode),
        })
    }
}

fn new_session(ctx: &Context, options: &GameOptions) -> Result<GameSession> {
    let defaults = options.apply(&ctx.config.game)?;
    let tracker = ctx.engine.load_or_default()?;
    Ok(GameSession::new(ctx.proteins.clone(), &defaults, tracker)?)
}

// ============================================================================
// Browsing
// ============================================================================

pub fn proteins(ctx: &Context) -> Result<()> {
    println!();
    println!("{}", "  Proteins".bold());
    println!("{}", THIN_SEP);
    for protein in ctx.proteins.iter() {
        let maps: Vec<String> = available_map_types(protein)
            .iter()
            .map(|m| m.to_string())
            .collect();
        println!("{}", display::render_protein_summary(protein, &maps));
    }
    println!();
    Ok(())
}

pub fn show(ctx: &Context, id: &str, audience: Option<Audience>) -> Result<()> {
    let Some(protein) = ctx.proteins.get(id) else {
        bail!("Unknown protein '{}'. Use 'paectl proteins' to list them", id);
    };
    let audience = audience.unwrap_or(ctx.config.game.audience);

    println!();
    println!("  {} ({})", protein.name.bold(), protein.id);
    println!("{}", THIN_SEP);
    if let Some(species) = &protein.species {
        println!("  Species:    {}", species);
    }
    if let Some(pdb) = &protein.pdb_id {
        println!("  PDB:        {}", pdb);
    }
    println!("  AlphaFold:  {}", protein.alphafold_link);
    println!();
    println!("{}", "[DESCRIPTION]".cyan());
    println!("  {}", protein.description.for_audience(audience));
    println!();
    println!("{}", "[FUNCTION]".cyan());
    println!("  {}", protein.function.for_audience(audience));
    if let Some(disease) = &protein.disease {
        println!();
        println!("{}", "[DISEASE]".cyan());
        println!("  {}", disease.for_audience(audience));
    }
    if !protein.domains.is_empty() {
        println!();
        println!("{}", "[DOMAINS]".cyan());
        for d in &protein.domains {
            println!("  {:>2}-{:<2} {}: {}", d.start, d.end, d.name, d.description);
        }
    }
    if !protein.literature.is_empty() {
        println!();
        println!("{}", "[LITERATURE]".cyan());
        for url in &protein.literature {
            println!("  {}", url);
        }
    }
    println!();
    println!("{}", "[READING THE MAP]".cyan());
    println!("  {}", protein.confidence_guide);
    println!();
    Ok(())
}

pub fn grid(ctx: &Context, options: &GameOptions) -> Result<()> {
    let defaults = options.apply(&ctx.config.game)?;
    let protein = ctx.proteins.get_or_first(&defaults.protein);
    let grid = project(select_matrix(protein, defaults.map_type), defaults.grid_size)
        .context("Cannot project grid")?;

    println!();
    println!(
        "  {} - {} map, {}x{}",
        protein.name.bold(),
        defaults.map_type,
        grid.size,
        grid.size
    );
    println!();
    print!("{}", display::render_grid(&grid, ctx.color));
    println!();
    println!("{}", display::render_legend(&grid.band_counts(), ctx.color));
    println!();
    Ok(())
}

pub fn progress(ctx: &Context) -> Result<()> {
    let tracker = ctx.engine.load_or_default()?;
    println!();
    println!("{}", "  Progress".bold());
    println!("{}", THIN_SEP);
    println!("{}", display::render_progress(&tracker, ctx.color));
    println!();
    Ok(())
}

pub fn achievements(ctx: &Context) -> Result<()> {
    let tracker = ctx.engine.load_or_default()?;
    let catalog = ctx.engine.catalog();
    println!();
    println!(
        "  {} ({}/{})",
        "Achievements".bold(),
        tracker.unlocked_achievement_ids.len(),
        catalog.len()
    );
    println!("{}", THIN_SEP);
    println!("{}", display::render_achievements(catalog, &tracker, ctx.color));
    println!();
    Ok(())
}

pub fn reset(ctx: &Context, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to reset progress without --yes");
    }
    ctx.engine.reset()?;
    println!("  Progress reset to level 1.");
    Ok(())
}

// ============================================================================
// Interactive play
// ============================================================================

/// Read one trimmed line; `None` at end of input
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Parse "row col" or "row,col"
pub fn parse_cell(text: &str) -> Option<(usize, usize)> {
    let mut parts = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());
    let row = parts.next()?.parse().ok()?;
    let col = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((row, col))
}

/// Resolve a typed answer: an option number (1-based) or the option text
pub fn resolve_choice(text: &str, options: &[String]) -> String {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 && n <= options.len() => options[n - 1].clone(),
        _ => text.to_string(),
    }
}

fn print_options<W: Write>(out: &mut W, options: &[String]) -> Result<()> {
    for (i, option) in options.iter().enumerate() {
        writeln!(out, "    {}. {}", i + 1, option)?;
    }
    Ok(())
}

fn print_outcome<W: Write>(out: &mut W, outcome: &AnswerOutcome) -> Result<()> {
    if outcome.correct {
        writeln!(out, "  Correct! +{} points", outcome.points)?;
    } else {
        writeln!(out, "  Not quite. The answer was: {}", outcome.correct_answer)?;
    }
    for rule in &outcome.unlocked {
        writeln!(out, "  {}", format_unlock(rule))?;
    }
    if outcome.leveled_up {
        writeln!(out, "  Level up! You are now level {}", outcome.level)?;
    }
    Ok(())
}

/// Play up to `rounds` questions. Stops early on "q" or end of input.
///
/// Returns the number of answered questions.
pub fn play_rounds<R: BufRead, W: Write>(
    session: &mut GameSession,
    engine: &ProgressEngine,
    source: Option<&dyn QuestionSource>,
    rounds: usize,
    color: bool,
    input: &mut R,
    out: &mut W,
) -> Result<usize> {
    let mut answered = 0;

    while answered < rounds {
        writeln!(out)?;
        write!(out, "{}", display::render_grid(session.grid(), color))?;
        write!(out, "  Pick a cell (row col), or q to quit: ")?;
        out.flush()?;

        let Some(line) = read_line(input)? else { break };
        if line.eq_ignore_ascii_case("q") {
            break;
        }
        let Some((row, col)) = parse_cell(&line) else {
            writeln!(out, "  Enter two numbers, e.g. 2 3")?;
            continue;
        };

        let Generated {
            content: question,
            origin,
        } = match session.ask(row, col, source) {
            Ok(generated) => generated,
            Err(e) => {
                writeln!(out, "  {}", e)?;
                continue;
            }
        };
        if origin == QuestionOrigin::Fallback && source.is_some() {
            writeln!(out, "  (question service unavailable, using a built-in question)")?;
        }

        writeln!(out)?;
        writeln!(out, "  {}", question.question)?;
        print_options(out, &question.options)?;
        write!(out, "  Your answer: ")?;
        out.flush()?;

        let Some(reply) = read_line(input)? else { break };
        let outcome = session.answer(&resolve_choice(&reply, &question.options), engine)?;
        print_outcome(out, &outcome)?;
        answered += 1;
    }

    let board = session.scoreboard();
    writeln!(out)?;
    writeln!(
        out,
        "  Score {}  |  {}/{} correct ({}%)",
        board.score,
        board.correct,
        board.attempts,
        board.accuracy_percent()
    )?;
    Ok(answered)
}

pub fn play(ctx: &Context, options: &GameOptions, rounds: usize) -> Result<()> {
    let mut session = new_session(ctx, options)?;
    println!();
    println!(
        "  {} - {} ({}), {} map",
        "PAE Quest".bold(),
        session.protein().name,
        session.difficulty,
        session.map_type()
    );
    println!("  {}", session.protein().confidence_guide);

    let started = Instant::now();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    play_rounds(
        &mut session,
        &ctx.engine,
        ctx.source(),
        rounds,
        ctx.color,
        &mut input,
        &mut out,
    )?;
    finish_session(&mut session, &ctx.engine, started.elapsed(), &mut out)
}

/// Add the session's elapsed time to the player's total and announce unlocks
pub fn finish_session<W: Write>(
    session: &mut GameSession,
    engine: &ProgressEngine,
    elapsed: Duration,
    out: &mut W,
) -> Result<()> {
    let update = session.record_play_time(elapsed.as_secs(), engine)?;
    for rule in &update.unlocked {
        writeln!(out, "  {}", format_unlock(rule))?;
    }
    if update.leveled_up() {
        writeln!(out, "  Level up! You are now level {}", update.tracker.level)?;
    }
    Ok(())
}

/// Run a quiz interactively; returns (correct, total)
pub fn quiz_rounds<R: BufRead, W: Write>(
    session: &mut GameSession,
    engine: &ProgressEngine,
    source: Option<&dyn QuestionSource>,
    count: usize,
    input: &mut R,
    out: &mut W,
) -> Result<(usize, usize)> {
    let quiz = session.quiz(source, count).content;
    let mut correct = 0;

    for (i, q) in quiz.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "  Q{}. {}", i + 1, q.question)?;
        print_options(out, &q.options)?;
        write!(out, "  Your answer: ")?;
        out.flush()?;

        let Some(reply) = read_line(input)? else {
            writeln!(out, "  Quiz abandoned.")?;
            return Ok((correct, quiz.len()));
        };
        if q.is_correct(&resolve_choice(&reply, &q.options)) {
            correct += 1;
            writeln!(out, "  Correct!")?;
        } else {
            writeln!(out, "  The answer was: {}", q.correct_answer)?;
        }
        if !q.explanation.is_empty() {
            writeln!(out, "  {}", q.explanation)?;
        }
    }

    let update = session.complete_quiz(engine)?;
    writeln!(out)?;
    writeln!(out, "  Quiz complete: {}/{} correct", correct, quiz.len())?;
    for rule in &update.unlocked {
        writeln!(out, "  {}", format_unlock(rule))?;
    }
    Ok((correct, quiz.len()))
}

pub fn quiz(ctx: &Context, options: &GameOptions) -> Result<()> {
    let mut session = new_session(ctx, options)?;
    println!();
    println!("  {} quiz: {}", "PAE Quest".bold(), session.protein().name);

    let started = Instant::now();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    quiz_rounds(
        &mut session,
        &ctx.engine,
        ctx.source(),
        ctx.config.question_service.quiz_length,
        &mut input,
        &mut out,
    )?;
    finish_session(&mut session, &ctx.engine, started.elapsed(), &mut out)
}
