mod browse;
mod catalog;
mod client;
mod config;
mod error;
mod export;
mod fallback;
mod image_url;
mod parse;
mod record;
mod routes;
mod seed;
mod server;
mod service;
mod sightings;
mod state;
mod view;

use crate::client::{CatalogApi, CatalogClient};
use crate::config::Config;
use crate::export::export_birds;
use crate::parse::{Args, Command, RemoteArgs};
use crate::record::BirdWithSeenStatus;
use crate::view::{Settled, ViewState};
use clap::Parser;
use env_logger::Env;
use futures::future::join_all;
use log::{debug, warn};
use tokio::io::BufReader;

pub fn format_bird_line(entry: &BirdWithSeenStatus) -> String {
    let marker = if entry.seen { "[x]" } else { "[ ]" };
    format!(
        "{} {:>3}  {} ({}) - {}",
        marker, entry.bird.id, entry.bird.name, entry.bird.scientific_name, entry.bird.category
    )
}

pub fn print_details(entry: &BirdWithSeenStatus) {
    let bird = &entry.bird;
    println!("\n{}", format_bird_line(entry));

    let fields = [
        ("Family", &bird.family),
        ("Habitat", &bird.habitat),
        ("Diet", &bird.diet),
        ("Conservation status", &bird.conservation_status),
        ("Description", &bird.description),
        ("Wikipedia", &bird.wikipedia_url),
        ("Image", &bird.image_url),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
}

pub fn print_summary<A: CatalogApi>(view: &ViewState<A>) {
    let counts = view.counts();
    if counts.total == 0 {
        println!("The catalog is empty");
        return;
    }

    println!("\nSummary:");
    println!("Seen: {} of {} birds", counts.seen, counts.total);
    println!("Still to find: {}", view.unseen_birds().len());
}

async fn connect(
    config: &Config,
    remote: RemoteArgs,
) -> Result<ViewState<CatalogClient>, Box<dyn std::error::Error>> {
    let base_url = remote.url.unwrap_or_else(|| config.base_url.clone());
    let user_id = remote.user.unwrap_or(config.user_id);
    debug!("Connecting to {} as user {}", base_url, user_id);

    let client = CatalogClient::new(&base_url)?
        .with_delay(remote.delay)
        .with_max_retries(remote.retries);

    let mut view = ViewState::new(client, user_id);
    view.refresh().await?;
    Ok(view)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::try_parse()?;
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let mut config = Config::load();

    match args.command {
        Command::Serve { port, seed } => {
            if let Some(port) = port {
                config.port = port;
            }
            if seed.is_some() {
                config.seed_path = seed;
            }
            server::start_server(config).await?;
        }
        Command::List {
            remote,
            search,
            category,
            seen,
        } => {
            let mut view = connect(&config, remote).await?;
            if let Some(search) = search {
                view.set_search(&search);
            }
            view.set_category(category);
            view.set_seen_filter(seen);

            for entry in view.visible() {
                println!("{}", format_bird_line(entry));
            }
            print_summary(&view);
        }
        Command::Show { ids, remote } => {
            let view = connect(&config, remote).await?;
            let api = view.api();
            let birds = join_all(ids.iter().map(|&id| api.bird(id))).await;

            for (id, bird) in ids.iter().zip(birds) {
                match bird? {
                    Some(bird) => {
                        let seen = view.bird(bird.id).is_some_and(|b| b.seen);
                        print_details(&BirdWithSeenStatus { bird, seen });
                    }
                    None => println!("No bird with id {id}"),
                }
            }
        }
        Command::Toggle { ids, remote } => {
            let mut view = connect(&config, remote).await?;
            let mut tickets = Vec::new();
            for id in ids {
                match view.begin_toggle(id) {
                    Ok(ticket) => tickets.push(ticket),
                    Err(e) => warn!("Skipping toggle: {}", e),
                }
            }

            let api = view.api();
            let outcomes = join_all(tickets.into_iter().map(|ticket| ticket.execute(api))).await;

            for outcome in outcomes {
                let bird_id = outcome.ticket.bird_id;
                match view.settle(outcome) {
                    Ok(Settled::Applied) => debug!("Applied toggle of bird {}", bird_id),
                    Ok(settled) => debug!("Toggle of bird {} settled as {:?}", bird_id, settled),
                    Err(e) => println!("Could not toggle bird {bird_id}: {e}"),
                }
            }

            for entry in view.birds() {
                println!("{}", format_bird_line(entry));
            }
            print_summary(&view);
        }
        Command::Export {
            output,
            select,
            remote,
        } => {
            let mut view = connect(&config, remote).await?;
            for id in select {
                if view.bird(id).is_none() {
                    warn!("Bird {} is not in the catalog, skipping", id);
                    continue;
                }
                view.toggle_selection(id);
            }

            let selected = view.selected_birds();
            let birds = if selected.is_empty() {
                view.seen_birds()
            } else {
                selected
            };
            let count = export_birds(&birds, &output)?;
            println!("Wrote {} birds to {}", count, output.display());
        }
        Command::Browse { remote } => {
            let mut view = connect(&config, remote).await?;
            browse::run(&mut view, BufReader::new(tokio::io::stdin())).await?;
        }
    }

    Ok(())
}
