//! plan-runner: headless staffing planner.
//!
//! Usage:
//!   plan-runner --date 2024-06-14 --days 7 --db plans.db
//!   plan-runner --date 2024-06-14 --role server
//!   plan-runner --ipc-mode --db plans.db

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate};
use staffplan_core::{
    clock::parse_boundary,
    config::PlannerConfig,
    engine::PlanEngine,
    kpi_stage::PlanKpi,
    profile::ForecastBook,
    shift_synthesis_stage::ShiftSummary,
    stage::PlanOutcome,
    store::{PlanStore, StoredShift},
    types::Role,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Optimize {
        date: NaiveDate,
        role: Role,
    },
    GetPlan {
        date: NaiveDate,
        role: Role,
    },
    AddManualShift {
        date:  NaiveDate,
        role:  Role,
        start: String,
        end:   String,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct PlanState {
    date:    NaiveDate,
    role:    Role,
    summary: ShiftSummary,
    kpi:     Option<PlanKpi>,
    shifts:  Vec<StoredShift>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let days = parse_arg(&args, "--days", 1u32);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");

    let config = PlannerConfig::load(data_dir)?;
    let forecasts = ForecastBook::load(data_dir)?;

    let start_date = match str_arg(&args, "--date") {
        Some(d) => d
            .parse::<NaiveDate>()
            .with_context(|| format!("--date {d} is not YYYY-MM-DD"))?,
        None => forecasts
            .dates()
            .next()
            .ok_or_else(|| anyhow!("no --date given and no forecasts in {data_dir}"))?,
    };
    let roles: Vec<Role> = match str_arg(&args, "--role") {
        Some(r) => vec![r.to_string()],
        None => config.roles.keys().cloned().collect(),
    };

    if !ipc_mode {
        println!("Staffing planner: plan-runner");
        println!("  date:      {start_date}");
        println!("  days:      {days}");
        println!("  roles:     {}", roles.join(", "));
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let store = PlanStore::open(db)?;
    store.migrate()?;

    let run_id = PlanEngine::new_run_id();
    let engine = PlanEngine::build(run_id, config, Box::new(forecasts), store)?;
    engine.start_run(env!("CARGO_PKG_VERSION"))?;

    if ipc_mode {
        run_ipc_loop(&engine)?;
    } else {
        let dates: Vec<NaiveDate> = (0..days)
            .map(|i| start_date + Duration::days(i64::from(i)))
            .collect();
        let results = engine.optimize_all(&dates, &roles)?;
        print_summary(&engine, &dates, &roles, &results)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &PlanEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        let state = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Optimize { date, role } => engine
                .optimize(date, &role)
                .map_err(anyhow::Error::from)
                .and_then(|_| build_plan_state(engine, date, &role)),
            IpcCommand::GetPlan { date, role } => build_plan_state(engine, date, &role),
            IpcCommand::AddManualShift {
                date,
                role,
                start,
                end,
            } => add_manual_shift(engine, date, &role, &start, &end)
                .and_then(|_| build_plan_state(engine, date, &role)),
        };

        match state {
            Ok(state) => writeln!(stdout, "{}", serde_json::to_string(&state)?)?,
            Err(e) => write_error(&mut stdout, &format!("{e:#}"))?,
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(out, "{}", err_json)?;
    out.flush()?;
    Ok(())
}

fn add_manual_shift(
    engine: &PlanEngine,
    date: NaiveDate,
    role: &str,
    start: &str,
    end: &str,
) -> Result<()> {
    let start_slot = parse_boundary(start)?;
    let end_slot = parse_boundary(end)?;
    let id = engine
        .store
        .insert_manual_shift(date, role, start_slot, end_slot)?;
    log::info!("{date} {role}: manual shift #{id} {start}-{end}");
    Ok(())
}

fn build_plan_state(engine: &PlanEngine, date: NaiveDate, role: &str) -> Result<PlanState> {
    Ok(PlanState {
        date,
        role: role.to_string(),
        summary: engine.shift_summary(date, role)?,
        kpi: engine.store.plan_kpi(date, role)?,
        shifts: engine.store.shifts_for(date, role)?,
    })
}

fn print_summary(
    engine: &PlanEngine,
    dates: &[NaiveDate],
    roles: &[Role],
    results: &[staffplan_core::error::PlanResult<PlanOutcome>],
) -> Result<()> {
    let planned = results.iter().filter(|r| r.is_ok()).count();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", engine.run_id);
    println!("  days:           {}", dates.len());
    println!("  roles:          {}", roles.len());
    println!("  plans written:  {planned}");
    println!("  rejected:       {}", results.len() - planned);

    for result in results {
        println!();
        match result {
            Err(e) => println!("  REJECTED: {e}"),
            Ok(outcome) => print_plan(outcome),
        }
    }
    Ok(())
}

fn print_plan(outcome: &PlanOutcome) {
    let kpi = &outcome.kpi;
    println!(
        "=== {} {} ({}) ===",
        outcome.date, outcome.role, outcome.demand.window
    );
    println!(
        "  revenue:        {}",
        kpi.forecast_revenue
            .map_or_else(|| "n/a".to_string(), |r| format!("${r:.0}"))
    );
    println!("  target hours:   {:.2}", kpi.target_hours);
    println!("  planned hours:  {:.2}", kpi.planned_hours);
    println!("  planned cost:   ${:.2}", kpi.planned_cost);
    println!(
        "  labor cost %:   {}",
        kpi.planned_cost_pct
            .map_or_else(|| "n/a".to_string(), |p| format!("{p:.1}%"))
    );
    println!("  overcapacity:   {} slot-head(s)", kpi.overcapacity_units);

    if outcome.shifts.is_empty() {
        println!("  (no shifts)");
        return;
    }
    for (i, shift) in outcome.shifts.iter().enumerate() {
        println!(
            "  #{:<3} {}-{}  {:>5.2}h{}",
            i + 1,
            shift.start_label(),
            shift.end_label(),
            shift.duration_hours(),
            if shift.clamped_at_day_end { "  (clamped)" } else { "" }
        );
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
