use crate::client::CatalogApi;
use crate::export::export_birds;
use crate::view::{CategoryFilter, SeenFilter, Settled, ViewState};
use crate::{format_bird_line, print_details, print_summary};
use clap::ValueEnum;
use log::{debug, warn};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "\
Commands:
  list                 show the birds passing the current filters
  search <text>        filter by common or scientific name (empty clears)
  category <filter>    all, common, rare or endangered
  seen <filter>        all, seen or unseen
  toggle <id>          flip the seen status of a bird
  expand <id>          show full details for a bird
  collapse             hide the expanded bird
  select <id>          add or remove a bird from the export selection
  select-all           select every listed bird, or clear if all are selected
  clear                empty the export selection
  export [file]        write the selection, or the seen list, to CSV
  refresh              fetch the list again
  help                 show this text
  quit                 leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BrowseCommand {
    List,
    Search(String),
    Category(CategoryFilter),
    Seen(SeenFilter),
    Toggle(u64),
    Expand(u64),
    Collapse,
    Select(u64),
    SelectAll,
    Clear,
    Export(PathBuf),
    Refresh,
    Help,
    Quit,
}

fn parse_bird_id(arg: &str) -> Result<u64, String> {
    arg.parse()
        .map_err(|_| format!("expected a bird id, got {arg:?}"))
}

pub(crate) fn parse_command(line: &str) -> Result<BrowseCommand, String> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "list" | "ls" => BrowseCommand::List,
        "search" => BrowseCommand::Search(arg.to_string()),
        "category" => BrowseCommand::Category(CategoryFilter::from_str(arg, true)?),
        "seen" => BrowseCommand::Seen(SeenFilter::from_str(arg, true)?),
        "toggle" => BrowseCommand::Toggle(parse_bird_id(arg)?),
        "expand" => BrowseCommand::Expand(parse_bird_id(arg)?),
        "collapse" => BrowseCommand::Collapse,
        "select" => BrowseCommand::Select(parse_bird_id(arg)?),
        "select-all" => BrowseCommand::SelectAll,
        "clear" => BrowseCommand::Clear,
        "export" if arg.is_empty() => BrowseCommand::Export(PathBuf::from("seen_birds.csv")),
        "export" => BrowseCommand::Export(PathBuf::from(arg)),
        "refresh" => BrowseCommand::Refresh,
        "help" | "?" => BrowseCommand::Help,
        "quit" | "exit" | "q" => BrowseCommand::Quit,
        other => return Err(format!("unknown command {other:?}, try help")),
    };
    Ok(command)
}

/// Reads commands line by line until `quit` or end of input.
pub(crate) async fn run<A, R>(view: &mut ViewState<A>, input: R) -> Result<(), std::io::Error>
where
    A: CatalogApi,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    print_summary(view);
    println!("{HELP}");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        debug!("Browse command: {:?}", command);

        if command == BrowseCommand::Quit {
            break;
        }
        apply(view, command).await;
    }

    Ok(())
}

async fn apply<A: CatalogApi>(view: &mut ViewState<A>, command: BrowseCommand) {
    match command {
        BrowseCommand::List => print_visible(view),
        BrowseCommand::Search(term) => {
            view.set_search(&term);
            print_visible(view);
        }
        BrowseCommand::Category(filter) => {
            view.set_category(filter);
            print_visible(view);
        }
        BrowseCommand::Seen(filter) => {
            view.set_seen_filter(filter);
            print_visible(view);
        }
        BrowseCommand::Toggle(bird_id) => match view.toggle_seen(bird_id).await {
            Ok(Settled::Applied) => {
                if let Some(bird) = view.bird(bird_id) {
                    println!("{}", format_bird_line(bird));
                }
                print_summary(view);
            }
            Ok(settled) => debug!("Toggle of bird {} settled as {:?}", bird_id, settled),
            Err(e) => println!("Could not toggle bird {bird_id}: {e}"),
        },
        BrowseCommand::Expand(bird_id) => match view.expand(bird_id) {
            Ok(()) => {
                if let Some(bird) = view.expanded() {
                    print_details(bird);
                }
            }
            Err(e) => println!("{e}"),
        },
        BrowseCommand::Collapse => view.collapse(),
        BrowseCommand::Select(bird_id) => {
            view.toggle_selection(bird_id);
            println!("{} selected", view.selected_birds().len());
        }
        BrowseCommand::SelectAll => {
            view.toggle_select_all();
            println!("{} selected", view.selected_birds().len());
        }
        BrowseCommand::Clear => view.clear_selection(),
        BrowseCommand::Export(path) => {
            let selected = view.selected_birds();
            let birds = if selected.is_empty() {
                view.seen_birds()
            } else {
                selected
            };
            match export_birds(&birds, &path) {
                Ok(count) => println!("Wrote {} birds to {}", count, path.display()),
                Err(e) => warn!("Export to {} failed: {}", path.display(), e),
            }
        }
        BrowseCommand::Refresh => match view.refresh().await {
            Ok(_) => print_summary(view),
            Err(e) => println!("Could not refresh: {e}"),
        },
        BrowseCommand::Help => println!("{HELP}"),
        BrowseCommand::Quit => {}
    }
}

fn print_visible<A: CatalogApi>(view: &ViewState<A>) {
    let visible = view.visible();
    if visible.is_empty() {
        println!("No birds match the current filters");
        return;
    }
    for bird in visible {
        println!("{}", format_bird_line(bird));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("list"), Ok(BrowseCommand::List));
        assert_eq!(parse_command("  toggle 3 "), Ok(BrowseCommand::Toggle(3)));
        assert_eq!(
            parse_command("search golden eagle"),
            Ok(BrowseCommand::Search("golden eagle".to_string()))
        );
        assert_eq!(parse_command("search"), Ok(BrowseCommand::Search(String::new())));
        assert_eq!(
            parse_command("Category RARE"),
            Ok(BrowseCommand::Category(CategoryFilter::Rare))
        );
        assert_eq!(parse_command("seen unseen"), Ok(BrowseCommand::Seen(SeenFilter::Unseen)));
        assert_eq!(
            parse_command("export"),
            Ok(BrowseCommand::Export(PathBuf::from("seen_birds.csv")))
        );
        assert_eq!(
            parse_command("export mine.csv"),
            Ok(BrowseCommand::Export(PathBuf::from("mine.csv")))
        );
        assert_eq!(parse_command("q"), Ok(BrowseCommand::Quit));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command("toggle").is_err());
        assert!(parse_command("expand eagle").is_err());
        assert!(parse_command("category legendary").is_err());
        assert!(parse_command("fly").is_err());
    }
}
