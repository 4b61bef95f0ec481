use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use herd_core::config::DataConfig;
use herd_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "herdbook")]
#[command(about = "Calf treatment scheduling and weekly job lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the jobs due in a calendar week (default: this week)
    Jobs {
        /// ISO week number
        #[arg(long)]
        week: Option<u32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List every calf with its treatment dates
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Register a newborn calf
    Add {
        /// Ear tag (defaults to the next free tag for the category)
        #[arg(long)]
        ear_tag: Option<EarTag>,

        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth: NaiveDate,

        /// Sex (m or w)
        #[arg(long)]
        sex: Sex,

        /// breeding or fattening
        #[arg(long)]
        category: Category,

        /// The calf does not need dehorning
        #[arg(long)]
        no_dehorning: bool,
    },

    /// Remove calves from the herd
    Remove {
        #[arg(required = true)]
        ear_tags: Vec<EarTag>,
    },

    /// Change a calf's ear tag
    Rename { old: EarTag, new: EarTag },

    /// Correct a calf's sex
    SetSex { ear_tag: EarTag, sex: Sex },

    /// Record the date a treatment was done
    Edit {
        ear_tag: EarTag,

        /// Treatment, e.g. birth, first_vaccination, dehorning, sale
        kind: TreatmentKind,

        /// Date (YYYY-MM-DD)
        date: NaiveDate,

        /// With `dehorning`: the calf no longer needs dehorning
        #[arg(long)]
        no_dehorning: bool,
    },

    /// Move a calf to the other category
    Convert { ear_tag: EarTag, category: Category },

    /// Log a weighing
    Weigh {
        ear_tag: EarTag,
        kg: u32,

        /// Date of the weighing (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show the weight history of a calf
    Weights { ear_tag: EarTag },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    herd_core::logging::init(cli.verbose);

    let config = Config::load()?;
    let paths = match cli.data_dir {
        Some(data_dir) => DataConfig { data_dir },
        None => config.data.clone(),
    };

    match cli.command {
        Some(Commands::Jobs { week, json }) => cmd_jobs(&paths, &config, week, json),
        Some(Commands::List { json }) => cmd_list(&paths, &config, json),
        Some(Commands::Add {
            ear_tag,
            birth,
            sex,
            category,
            no_dehorning,
        }) => cmd_add(&paths, &config, ear_tag, birth, sex, category, !no_dehorning),
        Some(Commands::Remove { ear_tags }) => with_herd(&paths, &config, |herd| {
            let removed = herd.remove_many(&ear_tags)?;
            println!("✓ Removed {} calves", removed.len());
            Ok(())
        }),
        Some(Commands::Rename { old, new }) => with_herd(&paths, &config, |herd| {
            herd.rename(old, new)?;
            println!("✓ Calf {} is now {}", old, new);
            Ok(())
        }),
        Some(Commands::SetSex { ear_tag, sex }) => with_herd(&paths, &config, |herd| {
            herd.set_sex(ear_tag, sex)?;
            println!("✓ Calf {} recorded as {}", ear_tag, sex);
            Ok(())
        }),
        Some(Commands::Edit {
            ear_tag,
            kind,
            date,
            no_dehorning,
        }) => with_herd(&paths, &config, |herd| {
            herd.edit_treatment(ear_tag, kind, date, !no_dehorning)?;
            print!("{}", herd.get(ear_tag)?);
            Ok(())
        }),
        Some(Commands::Convert { ear_tag, category }) => with_herd(&paths, &config, |herd| {
            herd.convert(ear_tag, category)?;
            print!("{}", herd.get(ear_tag)?);
            Ok(())
        }),
        Some(Commands::Weigh { ear_tag, kg, date }) => cmd_weigh(&paths, &config, ear_tag, kg, date),
        Some(Commands::Weights { ear_tag }) => cmd_weights(&paths, ear_tag),
        None => {
            // Default to this week's jobs
            cmd_jobs(&paths, &config, None, false)
        }
    }
}

fn load_herd(paths: &DataConfig, config: &Config) -> Result<HerdRegistry> {
    let store = CsvStore::new(paths.herd_path());
    HerdRegistry::from_records(store.load_all()?, config.schedule.min_batch_size)
}

/// Load the herd, apply one mutation, and save the whole herd back
fn with_herd<F>(paths: &DataConfig, config: &Config, f: F) -> Result<()>
where
    F: FnOnce(&mut HerdRegistry) -> Result<()>,
{
    let mut herd = load_herd(paths, config)?;
    f(&mut herd)?;

    let calves: Vec<CalfRecord> = herd.calves().cloned().collect();
    CsvStore::new(paths.herd_path()).save_all(&calves)?;
    tracing::debug!("{}", herd);
    Ok(())
}

fn cmd_add(
    paths: &DataConfig,
    config: &Config,
    ear_tag: Option<EarTag>,
    birth: NaiveDate,
    sex: Sex,
    category: Category,
    dehorning_required: bool,
) -> Result<()> {
    with_herd(paths, config, |herd| {
        let ear_tag = match ear_tag {
            Some(ear_tag) => ear_tag,
            None => herd.suggest_ear_tag(category)?,
        };
        herd.add(CalfRecord::new(ear_tag, category, birth, sex, dehorning_required))?;

        println!("✓ Added {} calf {}", category, ear_tag);
        print!("{}", herd.get(ear_tag)?);
        Ok(())
    })
}

fn cmd_jobs(paths: &DataConfig, config: &Config, week: Option<u32>, json: bool) -> Result<()> {
    let herd = load_herd(paths, config)?;
    let week = week.unwrap_or_else(|| Local::now().date_naive().iso_week().week());
    let jobs = herd.jobs_for_week(week);

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  Jobs in calendar week {:<17}│", week);
    println!("╰─────────────────────────────────────────╯");
    if jobs.is_empty() {
        println!("\n  Nothing to do this week.");
    }
    for job in &jobs {
        println!(
            "  {:>6}  {:<20} {}",
            job.ear_tag,
            job.kind.as_str(),
            job.date.format("%a %d.%m.%Y")
        );
    }
    println!();
    Ok(())
}

fn cmd_list(paths: &DataConfig, config: &Config, json: bool) -> Result<()> {
    let herd = load_herd(paths, config)?;
    let rows = herd.as_rows();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{}", herd);
    println!(
        "{:>6} {:<9} {:<10} {:<3} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10}",
        "tag", "category", "birth", "sex", "vacc1", "dehorn", "restock", "sale", "vacc2", "deworm1",
        "deworm2"
    );
    for row in &rows {
        println!(
            "{:>6} {:<9} {:<10} {:<3} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10}",
            row.ear_tag,
            row.category.as_str(),
            row.birth.to_string(),
            row.sex.as_str(),
            row.first_vaccination.to_string(),
            show(row.dehorning),
            row.restocking.to_string(),
            show(row.sale),
            show(row.second_vaccination),
            show(row.deworming1),
            show(row.deworming2),
        );
    }
    Ok(())
}

fn show(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

fn cmd_weigh(
    paths: &DataConfig,
    config: &Config,
    ear_tag: EarTag,
    kg: u32,
    date: Option<NaiveDate>,
) -> Result<()> {
    // Only weigh calves we know about
    load_herd(paths, config)?.get(ear_tag)?;

    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let entry = WeightEntry::new(ear_tag, date, kg)?;
    append_weights(&paths.weights_path(), &[entry])?;
    println!("✓ Calf {} weighed {} kg on {}", ear_tag, kg, date);
    Ok(())
}

fn cmd_weights(paths: &DataConfig, ear_tag: EarTag) -> Result<()> {
    let weights = read_weights(&paths.weights_path(), ear_tag)?;
    if weights.is_empty() {
        println!("No weighings recorded for calf {}.", ear_tag);
        return Ok(());
    }

    println!("Weighings of calf {}:", ear_tag);
    for entry in weights {
        println!("  {}  {:>4} kg", entry.date, entry.kg);
    }
    Ok(())
}
