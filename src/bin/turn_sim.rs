//! Headless Turn Simulator
//!
//! Plays out a skirmish on an in-memory roster and reports the interleaved
//! turn order of every turn. Casualties, defections and reinforcements are
//! random but seeded, so a run is reproducible.

use bws_turn::core::config::{default_config_path, SchedulerConfig};
use bws_turn::core::error::Result;
use bws_turn::core::types::UnitId;
use bws_turn::turn_order::{
    Faction, FactionCounts, NewTurn, Roster, RosterEvent, TurnController,
};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;

/// Headless Turn Simulator - watch factions interleave turn by turn
#[derive(Parser, Debug)]
#[command(name = "turn_sim")]
#[command(about = "Simulate a skirmish and print each turn's faction order")]
struct Args {
    /// Starting player units
    #[arg(long, default_value_t = 6)]
    players: u32,

    /// Starting enemy units
    #[arg(long, default_value_t = 9)]
    enemies: u32,

    /// Starting allied units
    #[arg(long, default_value_t = 2)]
    allies: u32,

    /// Maximum turns before the skirmish is called a draw
    #[arg(long, default_value_t = 30)]
    max_turns: u32,

    /// Chance that an action kills an opposing unit
    #[arg(long, default_value_t = 0.25, value_parser = parse_chance)]
    kill_chance: f64,

    /// Chance per enemy action that an enemy defects to the allies
    #[arg(long, default_value_t = 0.02, value_parser = parse_chance)]
    defect_chance: f64,

    /// Chance per turn boundary that an enemy reinforcement arrives
    #[arg(long, default_value_t = 0.3, value_parser = parse_chance)]
    reinforce_chance: f64,

    /// Chance that the player ends their turn early instead of acting
    #[arg(long, default_value_t = 0.05, value_parser = parse_chance)]
    end_turn_chance: f64,

    /// Chance per turn boundary that a player unit goes berserk for the turn
    #[arg(long, default_value_t = 0.05, value_parser = parse_chance)]
    berserk_chance: f64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Scheduler config file (defaults to data/turn_order.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

/// Probability argument in [0, 1]
fn parse_chance(s: &str) -> std::result::Result<f64, String> {
    let chance: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&chance) {
        Ok(chance)
    } else {
        Err(format!("{} is not a probability between 0 and 1", chance))
    }
}

/// One turn of the skirmish
#[derive(Serialize)]
struct TurnRecord {
    turn: u32,
    order: String,
    survivors: FactionCounts,
}

/// JSON output structure
#[derive(Serialize)]
struct SimReport {
    seed: u64,
    outcome: String,
    turns: Vec<TurnRecord>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let config = match &args.config {
        Some(path) => SchedulerConfig::load(path)?,
        None => SchedulerConfig::load(default_config_path()).unwrap_or_else(|e| {
            tracing::warn!("Using default scheduler config: {}", e);
            SchedulerConfig::default()
        }),
    };

    let mut roster = Roster::with_counts(&FactionCounts::new(
        args.players,
        args.enemies,
        args.allies,
    ));
    let mut controller = TurnController::new(config);
    let mut turns = Vec::new();

    let outcome = loop {
        if let Some(outcome) = decided(&roster) {
            break outcome;
        }
        if controller.turn() >= args.max_turns {
            break "Draw".to_string();
        }

        roster.begin_turn();
        if rng.gen_bool(args.reinforce_chance) {
            roster.spawn(Faction::Enemy);
        }
        let players: Vec<_> = roster.units_of(Faction::Player).map(|u| u.id).collect();
        for id in players {
            roster.set_auto_controlled(id, rng.gen_bool(args.berserk_chance))?;
        }
        if controller.on_new_turn(&roster) == NewTurn::NoEligibleUnits {
            break "Stalemate".to_string();
        }

        let mut order = play_turn(&mut controller, &mut roster, &mut rng, &args)?;
        if controller.auto_phase(&roster).is_some() {
            order.push('*');
            order.push_str(&play_auto_phase(&mut controller, &mut roster, &mut rng, &args)?);
        }
        turns.push(TurnRecord {
            turn: controller.turn(),
            order,
            survivors: survivors(&roster),
        });
    };

    let report = SimReport {
        seed,
        outcome,
        turns,
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_text(&report),
        _ => {
            eprintln!("Unknown format '{}', defaulting to text", args.format);
            print_text(&report);
        }
    }
    Ok(())
}

/// Resolve every slot of the current turn; returns the order actually played
fn play_turn(
    controller: &mut TurnController,
    roster: &mut Roster,
    rng: &mut StdRng,
    args: &Args,
) -> Result<String> {
    let mut played = String::new();

    while let Some(faction) = controller.peek_next() {
        if faction == Faction::Player && rng.gen_bool(args.end_turn_chance) {
            roster.end_faction_turn(Faction::Player);
            controller.notify(RosterEvent::FactionTurnEnded { faction }, &*roster);
            played.push('|');
            continue;
        }

        let Some(actor) = roster.next_ready(faction) else {
            tracing::error!("{} slot has no ready unit; queue out of sync", faction);
            controller.advance();
            controller.reconcile(&*roster);
            continue;
        };
        played.push(faction.symbol());

        let casualty = if rng.gen_bool(args.kill_chance) {
            pick_target(roster, faction, rng)
        } else {
            None
        };
        let fallen = match casualty {
            Some(target) => Some(roster.kill(target)?),
            None => None,
        };

        roster.mark_acted(actor)?;
        controller.notify(RosterEvent::ActionResolved { faction }, &*roster);

        if let Some(faction) = fallen {
            controller.notify(RosterEvent::UnitRemoved { faction }, &*roster);
        }

        if faction == Faction::Enemy && rng.gen_bool(args.defect_chance) {
            let defectors: Vec<_> = roster.units_of(Faction::Enemy).map(|u| u.id).collect();
            if let Some(&defector) = defectors.choose(rng) {
                let from = roster.set_affiliation(defector, Faction::Ally)?;
                controller.notify(
                    RosterEvent::AffiliationChanged {
                        from,
                        to: Faction::Ally,
                    },
                    &*roster,
                );
            }
        }
    }

    Ok(played)
}

/// Let every auto-controlled unit act once the queue is spent; lowercase symbols
fn play_auto_phase(
    controller: &mut TurnController,
    roster: &mut Roster,
    rng: &mut StdRng,
    args: &Args,
) -> Result<String> {
    let mut played = String::new();

    for actor in roster.auto_actors() {
        // An earlier auto actor may have struck this one down
        let Some(faction) = roster
            .get(actor)
            .filter(|u| u.awaits_auto_phase())
            .map(|u| u.faction)
        else {
            continue;
        };
        played.push(faction.symbol().to_ascii_lowercase());

        if rng.gen_bool(args.kill_chance) {
            if let Some(target) = pick_target(roster, faction, rng) {
                let fallen = roster.kill(target)?;
                controller.notify(RosterEvent::UnitRemoved { faction: fallen }, &*roster);
            }
        }
        roster.mark_acted(actor)?;
    }

    Ok(played)
}

/// Factions an acting unit may strike
fn opponents(faction: Faction) -> &'static [Faction] {
    match faction {
        Faction::Player | Faction::Ally => &[Faction::Enemy],
        Faction::Enemy => &[Faction::Player, Faction::Ally],
    }
}

fn pick_target(roster: &Roster, faction: Faction, rng: &mut StdRng) -> Option<UnitId> {
    let targets: Vec<_> = opponents(faction)
        .iter()
        .flat_map(|&f| roster.units_of(f))
        .map(|u| u.id)
        .collect();
    targets.choose(rng).copied()
}

fn survivors(roster: &Roster) -> FactionCounts {
    let mut counts = FactionCounts::default();
    for faction in Faction::PRIORITY {
        counts[faction] = roster.alive_count(faction) as u32;
    }
    counts
}

fn decided(roster: &Roster) -> Option<String> {
    let players = roster.alive_count(Faction::Player);
    let enemies = roster.alive_count(Faction::Enemy);
    match (players, enemies) {
        (0, 0) => Some("Mutual destruction".to_string()),
        (0, _) => Some("Defeat".to_string()),
        (_, 0) => Some("Victory".to_string()),
        _ => None,
    }
}

fn print_text(report: &SimReport) {
    println!("Turn Order Simulation");
    println!("=====================");
    for record in &report.turns {
        println!(
            "Turn {:>3}: {:<40} survivors {}",
            record.turn, record.order, record.survivors
        );
    }
    println!();
    println!("Outcome: {}", report.outcome);
    println!("Seed: {}", report.seed);
}
