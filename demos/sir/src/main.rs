//! sir — an SIR epidemic with births and deaths, driving the cohort engine.
//!
//! The disease logic here is deliberately plain; the point is the storage
//! pattern: modules declare their columns up front, read and write them by
//! uid and mask, and hand all births and deaths to the population
//! coordinator.  Swap `POP_SIZE` up to millions to stress the growth and
//! compaction paths.

use anyhow::Result;
use rand::Rng;
use rand::distributions::Uniform;

use cohort_core::{StreamRng, Uid};
use cohort_store::{ColumnSpec, Fill, LaneColumnSpec, Population};

// ── Constants ─────────────────────────────────────────────────────────────────

const POP_SIZE:        usize = 10_000;
const SEED:            u64   = 42;
const DAYS:            u64   = 365;
const SEED_INFECTIONS: usize = 20;
const BETA:            f64   = 0.30;  // infection pressure per infectious contact-day
const RECOVERY_DAYS:   f64   = 14.0;
const DAILY_DEATH_P:   f64   = 0.000_04;
const DAILY_BIRTH_P:   f64   = 0.000_06;
const STRAINS:         usize = 2;
const REPORT_EVERY:    u64   = 30;

// Disease states stored in the `state` column.
const S: u8 = 0;
const I: u8 = 1;
const R: u8 = 2;

fn main() -> Result<()> {
    let mut people = Population::new(SEED);

    let state = people.add_column(ColumnSpec::new("state", Fill::Const(S)))?;
    let days_infected = people.add_column(ColumnSpec::new("days_infected", Fill::Const(0.0_f64)))?;
    let age = people.add_column(ColumnSpec::new("age", Fill::dist(Uniform::new(0.0_f64, 80.0))))?;
    let immunity = people.add_lane_column(LaneColumnSpec::new(
        "immunity",
        STRAINS,
        Fill::dist(Uniform::new(0.0_f32, 0.2)),
    ))?;

    let uids = people.initialize(POP_SIZE)?;
    state.set_many(&uids[..SEED_INFECTIONS], &[I].repeat(SEED_INFECTIONS))?;

    let mut rng = StreamRng::new(SEED).derive("sir-loop").rng();

    for day in 1..=DAYS {
        // ── Transmission ──────────────────────────────────────────────────
        let n = people.count() as f64;
        let infectious = state.equals(I)?;
        let pressure = BETA * infectious.count() as f64 / n;

        let susceptible = state.read(&(..).into())?.uids_where(|s| *s == S);
        let newly_infected: Vec<Uid> = susceptible
            .into_iter()
            .filter(|uid| {
                let shield = immunity.get_agent(*uid).map(|lanes| lanes[0] as f64).unwrap_or(0.0);
                rng.gen_bool((pressure * (1.0 - shield)).clamp(0.0, 1.0))
            })
            .collect();
        state.apply_many(&newly_infected, |s| *s = I)?;
        days_infected.apply_many(&newly_infected, |d| *d = 0.0)?;

        // ── Progression and recovery ──────────────────────────────────────
        days_infected.apply_mask(&infectious, |d| *d += 1.0)?;
        let recovered = days_infected
            .read(&(..).into())?
            .uids_where(|d| *d >= RECOVERY_DAYS);
        let recovered: Vec<Uid> = recovered
            .into_iter()
            .filter(|uid| state.get(*uid).map(|s| s == I).unwrap_or(false))
            .collect();
        state.apply_many(&recovered, |s| *s = R)?;
        days_infected.apply_many(&recovered, |d| *d = 0.0)?;

        // ── Vital dynamics ────────────────────────────────────────────────
        age.apply(|a| *a += 1.0 / 365.0)?;

        let deaths: Vec<Uid> = people
            .live_uids()
            .into_iter()
            .filter(|uid| {
                let years = age.get(*uid).unwrap_or(0.0);
                rng.gen_bool((DAILY_DEATH_P * (1.0 + years / 40.0)).clamp(0.0, 1.0))
            })
            .collect();
        people.remove(&deaths)?;

        let births = (0..people.count())
            .filter(|_| rng.gen_bool(DAILY_BIRTH_P))
            .count();
        let newborns = people.grow(births)?;
        age.set_many(&newborns, &vec![0.0; newborns.len()])?;

        // ── Reporting ─────────────────────────────────────────────────────
        if day % REPORT_EVERY == 0 || day == DAYS {
            let s = state.equals(S)?.count();
            let i = state.equals(I)?.count();
            let r = state.equals(R)?.count();
            println!(
                "day {day:>3}  pop {:>6}  S {s:>6}  I {i:>5}  R {r:>6}  mean age {:>5.1}",
                people.count(),
                age.mean()?,
            );
        }
    }

    println!(
        "final: {} alive, {} ever infected, attack rate {:.1}%",
        people.count(),
        state.equals(R)?.count() + state.equals(I)?.count(),
        100.0 * (state.not_equals(S)?.count() as f64) / people.count() as f64,
    );
    Ok(())
}
