mod render;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use datefinder_core::config::GlobalConfig;
use datefinder_core::event::{toggle, EventData};
use datefinder_core::identity::Outcome;
use datefinder_core::protocol::{CreateEvent, GetEvent, ReplaceParticipantDates};
use datefinder_core::{
    ensure_selectable, DateFinderError, DateWindow, IdentityReconciler, LocalIdentity, Store,
};
use dialoguer::Confirm;

#[derive(Parser)]
#[command(name = "datefinder")]
#[command(about = "Find a common date: create a poll, mark the days that work for you, see the best dates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new event and share its id
    New {
        /// Event name
        name: String,

        /// First selectable date (YYYY-MM-DD)
        #[arg(long, requires = "to", conflicts_with = "month")]
        from: Option<NaiveDate>,

        /// Last selectable date (YYYY-MM-DD)
        #[arg(long, requires = "from", conflicts_with = "month")]
        to: Option<NaiveDate>,

        /// Offer a whole month instead (YYYY-MM)
        #[arg(long)]
        month: Option<String>,

        /// Your display name (defaults to the stored identity)
        #[arg(long)]
        r#as: Option<String>,
    },
    /// Join an event under a display name
    Join {
        /// Event id
        event_id: String,

        /// Your display name
        #[arg(long)]
        r#as: String,
    },
    /// Mark or unmark dates that work for you
    Toggle {
        /// Event id
        event_id: String,

        /// Dates to flip (YYYY-MM-DD)
        #[arg(required = true)]
        dates: Vec<NaiveDate>,
    },
    /// Show the calendar heatmap for an event
    Show {
        /// Event id
        event_id: String,
    },
    /// Show the ranked best dates for an event
    Results {
        /// Event id
        event_id: String,
    },
    /// Follow an event live, re-rendering on every change
    Watch {
        /// Event id
        event_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = open_store()?;

    match cli.command {
        Commands::New {
            name,
            from,
            to,
            month,
            r#as,
        } => cmd_new(&store, &name, from, to, month.as_deref(), r#as.as_deref()).await,
        Commands::Join { event_id, r#as } => cmd_join(&store, &event_id, &r#as).await,
        Commands::Toggle { event_id, dates } => cmd_toggle(&store, &event_id, &dates).await,
        Commands::Show { event_id } => cmd_show(&store, &event_id).await,
        Commands::Results { event_id } => cmd_results(&store, &event_id).await,
        Commands::Watch { event_id } => cmd_watch(&store, &event_id).await,
    }
}

fn open_store() -> Result<Store> {
    let config = GlobalConfig::load().context("Failed to load configuration")?;
    Ok(Store::from_name(&config.store))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Fetch one snapshot; a missing event is a terminal NotFound.
async fn fetch_event(store: &Store, event_id: &str) -> Result<EventData> {
    let snapshot = store
        .call(GetEvent {
            event_id: event_id.to_string(),
        })
        .await?;

    snapshot.ok_or_else(|| DateFinderError::NotFound(event_id.to_string()).into())
}

async fn cmd_new(
    store: &Store,
    name: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    month: Option<&str>,
    creator_name: Option<&str>,
) -> Result<()> {
    let window = match (from, to, month) {
        (Some(from), Some(to), None) => DateWindow::new(from, to)?,
        (None, None, Some(month)) => parse_month_window(month)?,
        _ => bail!("Specify either --from and --to, or --month"),
    };

    let stored = LocalIdentity::load()?;
    let creator_name = creator_name
        .map(str::to_string)
        .or_else(|| stored.as_ref().map(|identity| identity.name.clone()))
        .context("No stored identity; pass --as <your name>")?;

    // Reuse the device id so the creator stays the same person across events
    let mut reconciler = IdentityReconciler::new();
    let outcome = reconciler.propose(
        &creator_name,
        stored.as_ref().map(|identity| identity.id.as_str()),
        &Default::default(),
    )?;
    let Outcome::Accept(identity) = outcome else {
        unreachable!("an empty participant mapping cannot collide");
    };

    let event = EventData::new(name, window, &identity.name, &identity.id);
    let event_id = store.call(CreateEvent { event }).await?;

    LocalIdentity {
        id: identity.id,
        name: identity.name,
    }
    .save()?;

    println!("Created event '{name}' ({window})");
    println!();
    println!("Share this id with the others:");
    println!("  {event_id}");
    println!();
    println!("They join with:");
    println!("  datefinder join {event_id} --as <their name>");

    Ok(())
}

fn parse_month_window(month: &str) -> Result<DateWindow> {
    let (year, month) = month
        .split_once('-')
        .context("Expected --month as YYYY-MM")?;
    let year: i32 = year.parse().context("Expected --month as YYYY-MM")?;
    let month: u32 = month.parse().context("Expected --month as YYYY-MM")?;
    Ok(DateWindow::month(year, month)?)
}

async fn cmd_join(store: &Store, event_id: &str, name: &str) -> Result<()> {
    let event = fetch_event(store, event_id).await?;
    let stored = LocalIdentity::load()?;

    let mut reconciler = IdentityReconciler::new();
    let outcome = reconciler.propose(
        name,
        stored.as_ref().map(|identity| identity.id.as_str()),
        &event.participants,
    )?;

    let identity = match outcome {
        Outcome::Accept(identity) => {
            // Register (or rename) ourselves; an existing date set survives
            let dates = event.participant_dates(&identity.id);
            store
                .call(ReplaceParticipantDates {
                    event_id: event_id.to_string(),
                    participant_id: identity.id.clone(),
                    participant_name: identity.name.clone(),
                    dates,
                })
                .await
                .context("Joining failed; nothing was saved")?;
            identity
        }
        Outcome::NeedsConfirmation {
            matched_id: _,
            matched_name,
        } => {
            let adopt = Confirm::new()
                .with_prompt(format!(
                    "A participant named '{matched_name}' already exists. Is that you?"
                ))
                .default(false)
                .interact()?;

            if adopt {
                reconciler.confirm()?
            } else {
                reconciler.deny()?;
                bail!("The name '{matched_name}' is taken. Join again with a different name.");
            }
        }
    };

    LocalIdentity {
        id: identity.id,
        name: identity.name.clone(),
    }
    .save()?;

    println!("Joined '{}' as '{}'.", event.name, identity.name);
    println!("Mark dates with:");
    println!("  datefinder toggle {event_id} <YYYY-MM-DD>...");

    Ok(())
}

async fn cmd_toggle(store: &Store, event_id: &str, dates: &[NaiveDate]) -> Result<()> {
    let Some(identity) = LocalIdentity::load()? else {
        bail!("No identity on this device. Run `datefinder join {event_id} --as <your name>` first.");
    };

    let event = fetch_event(store, event_id).await?;
    if !event.participants.contains_key(&identity.id) {
        bail!(
            "You have not joined this event yet. Run `datefinder join {event_id} --as '{}'`.",
            identity.name
        );
    }

    let window = event.window.resolve()?;
    let today = today();

    // Validate everything before changing anything
    for &date in dates {
        ensure_selectable(date, window, today)?;
    }

    let mut selection = event.participant_dates(&identity.id);
    for &date in dates {
        if toggle(&mut selection, date) {
            println!("+ {date}");
        } else {
            println!("- {date}");
        }
    }

    store
        .call(ReplaceParticipantDates {
            event_id: event_id.to_string(),
            participant_id: identity.id.clone(),
            participant_name: identity.name.clone(),
            dates: selection.clone(),
        })
        .await
        .context("Your marks were NOT saved; retry the toggle")?;

    println!(
        "{} date{} marked.",
        selection.len(),
        if selection.len() == 1 { "" } else { "s" }
    );

    Ok(())
}

async fn cmd_show(store: &Store, event_id: &str) -> Result<()> {
    let event = fetch_event(store, event_id).await?;
    let window = event.window.resolve()?;
    let viewer = LocalIdentity::load()?;

    println!(
        "{}",
        render::render_calendar(
            &event,
            window,
            viewer.as_ref().map(|identity| identity.id.as_str()),
            today(),
        )
    );
    Ok(())
}

async fn cmd_results(store: &Store, event_id: &str) -> Result<()> {
    let event = fetch_event(store, event_id).await?;
    println!("{}", render::render_results(&event));
    Ok(())
}

async fn cmd_watch(store: &Store, event_id: &str) -> Result<()> {
    let viewer = LocalIdentity::load()?;
    let mut subscription = store.subscribe(event_id).await?;

    loop {
        let Some(event) = subscription.next().await? else {
            bail!("Event not found: {event_id}");
        };
        let window = event.window.resolve()?;

        // Clear the screen between snapshots
        print!("\x1B[2J\x1B[1;1H");
        println!(
            "{}",
            render::render_calendar(
                &event,
                window,
                viewer.as_ref().map(|identity| identity.id.as_str()),
                today(),
            )
        );
        println!();
        println!("{}", render::render_results(&event));
        println!();
        println!("Watching for changes... (Ctrl-C to stop)");
    }
}
