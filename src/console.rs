use actix::{Actor, Addr, MailboxError};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::{
    actors::{
        dictionary_store::{GetStatus, LoadDictionary, StoreState, StoreStatus},
        query_engine::{DatasetSelectorChanged, PrefixChanged, ReloadDictionary, WordCommitted},
        DictionaryStoreActor, QueryEngineActor,
    },
    config::Config,
    dictionary::{DictionarySelector, FileSource},
    Error,
};

const HELP: &str = "\
Type a word to check it, or:
  ?<prefix>    list suggestions for a prefix
  :use <name>  switch to another dataset
  :reload      fetch the current dataset again
  :status      show the dictionary state
  :help        show this message
  :quit        exit";

/// One line of console input
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Suggest(String),
    Commit(String),
    Use(String),
    Reload,
    Status,
    Help,
    Quit,
    Nothing,
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(prefix) = line.strip_prefix('?') {
            return Command::Suggest(prefix.to_string());
        }

        if let Some(rest) = line.trim_start().strip_prefix(':') {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or("");
            let arg = parts.next().map(str::trim).unwrap_or("");
            return match name {
                "use" if !arg.is_empty() => Command::Use(arg.to_string()),
                "reload" => Command::Reload,
                "status" => Command::Status,
                "quit" | "q" => Command::Quit,
                _ => Command::Help,
            };
        }

        if line.trim().is_empty() {
            Command::Nothing
        } else {
            Command::Commit(line.to_string())
        }
    }
}

fn actor_error(e: MailboxError) -> Error {
    Error::Actor(e.to_string())
}

fn describe(status: &StoreStatus) -> String {
    match (status.state, &status.last_error) {
        (StoreState::Ready, _) => format!("'{}' ready, {} words", status.selector, status.words),
        (StoreState::Loading, _) => format!("'{}' loading", status.selector),
        (StoreState::Empty, Some(e)) => format!("'{}' failed to load: {}", status.selector, e),
        (StoreState::Empty, None) => format!("'{}' not loaded yet", status.selector),
    }
}

/// Queries are refused while the active dataset is known to be broken, so a
/// failed load never looks like "no such word".
async fn dictionary_usable(store: &Addr<DictionaryStoreActor>) -> miette::Result<bool> {
    let status = store.send(GetStatus).await.map_err(actor_error)?;
    if status.state != StoreState::Ready && status.last_error.is_some() {
        println!("Dictionary unavailable: {}", describe(&status));
        println!("Use :reload or :use <name> to try again.");
        return Ok(false);
    }
    Ok(true)
}

async fn warm_up(store: &Addr<DictionaryStoreActor>) -> miette::Result<()> {
    match store.send(LoadDictionary).await.map_err(actor_error)? {
        Ok(dataset) => println!("Loaded {} words.", dataset.len()),
        Err(e) => {
            warn!("Initial dictionary load failed: {}", e);
            println!("Dictionary failed to load: {}", e);
        }
    }
    Ok(())
}

pub async fn run(config: Config) -> miette::Result<()> {
    info!(
        "Starting console with dictionary '{}' from {}",
        config.dictionary_name,
        config.dictionary_dir.display()
    );

    let source = Arc::new(FileSource::new(&config.dictionary_dir));
    let store = DictionaryStoreActor::new(
        source,
        DictionarySelector::new(&config.dictionary_name),
        config.fetch_timeout,
    )
    .start();
    let engine = QueryEngineActor::new(store.clone(), config.suggestion_limit).start();

    println!("{HELP}");
    warm_up(&store).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(Error::Io)? {
        match Command::parse(&line) {
            Command::Nothing => {}
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Status => {
                let status = store.send(GetStatus).await.map_err(actor_error)?;
                println!("{}", describe(&status));
            }
            Command::Use(name) => {
                engine
                    .send(DatasetSelectorChanged { name })
                    .await
                    .map_err(actor_error)?;
                warm_up(&store).await?;
            }
            Command::Reload => {
                engine.send(ReloadDictionary).await.map_err(actor_error)?;
                warm_up(&store).await?;
            }
            Command::Suggest(text) => {
                if !dictionary_usable(&store).await? {
                    continue;
                }
                let suggestions = engine
                    .send(PrefixChanged { text })
                    .await
                    .map_err(actor_error)?;
                if suggestions.is_empty() {
                    println!("(no suggestions)");
                }
                for word in suggestions {
                    println!("  {word}");
                }
            }
            Command::Commit(word) => {
                if !dictionary_usable(&store).await? {
                    continue;
                }
                match engine
                    .send(WordCommitted { word: word.clone() })
                    .await
                    .map_err(actor_error)?
                {
                    Ok(Some(result)) => {
                        let unit = if result.score == 1 { "point" } else { "points" };
                        println!("{} ({} {})", result.word, result.score, unit);
                        println!("  {}", result.definition);
                    }
                    Ok(None) => println!("'{}' is not a valid word", word.trim()),
                    Err(e) => println!("Dictionary unavailable: {}", e),
                }
            }
        }
    }

    info!("Console input closed");
    Ok(())
}
