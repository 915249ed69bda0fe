//! Flashcard study mode. Cards the user does not know gain weight each
//! round and are drawn more often; a known card drops back to weight 1.

use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use rand::distr::weighted::WeightedIndex;
use rand::prelude::*;

use crate::entry::VocabEntry;
use crate::persist::Storage;
use crate::prefs::{ContentMode, Favorites};

pub struct StudySession {
    items: Vec<VocabEntry>,
    weights: Vec<u32>,
    dist: Option<WeightedIndex<u32>>,
    rng: ThreadRng,
}

impl StudySession {
    pub fn new(items: Vec<VocabEntry>) -> Result<Self> {
        let weights = vec![1; items.len()];
        let dist = if !weights.is_empty() {
            Some(
                WeightedIndex::new(&weights)
                    .context("Failed to create weighted index for study cards")?,
            )
        } else {
            None
        };

        Ok(Self {
            items,
            weights,
            dist,
            rng: rand::rng(),
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    fn sync_dist(&mut self) -> Result<()> {
        if !self.weights.is_empty() {
            self.dist =
                Some(WeightedIndex::new(&self.weights).context("Failed to sync weighted index")?);
        }
        Ok(())
    }

    /// Every card becomes a little more likely after each round.
    pub fn increment(&mut self) -> Result<()> {
        self.weights.iter_mut().for_each(|w| *w += 1);
        self.sync_dist()
    }

    pub fn reset(&mut self, index: usize) -> Result<()> {
        if index < self.weights.len() {
            self.weights[index] = 1;
            self.sync_dist()?;
        }
        Ok(())
    }

    pub fn sample(&mut self) -> Option<(usize, VocabEntry)> {
        let dist = self.dist.as_ref()?;
        let index = dist.sample(&mut self.rng);
        self.items.get(index).map(|item| (index, item.clone()))
    }
}

enum Command {
    Reply(String),
    Help,
    Weights,
    Favorite,
    Quit,
}

impl Command {
    fn help(out: &mut impl Write) -> Result<()> {
        writeln!(out, "Available commands:")?;
        writeln!(out, "  \\h      - Show this help message")?;
        writeln!(out, "  \\w      - Show weights for the current deck")?;
        writeln!(out, "  \\f      - Toggle favorite on the current card")?;
        writeln!(out, "  \\q      - Quit the study session")?;
        writeln!(out, "  y       - After flipping: I knew this card")?;
        writeln!(out, "  <enter> - Flip the card / I did not know it")?;
        Ok(())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "\\h" => Ok(Command::Help),
            "\\w" => Ok(Command::Weights),
            "\\f" => Ok(Command::Favorite),
            "\\q" => Ok(Command::Quit),
            _ if s.starts_with('\\') => Err("Unknown command".to_string()),
            _ => Ok(Command::Reply(s.to_string())),
        }
    }
}

fn prompt(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush().context("Failed to flush output")?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("Failed to read line from input")?;
    Ok((read > 0).then(|| line.trim().to_string()))
}

/// Runs the flip-card loop until `\q` or end of input. Returns the number of
/// cards answered.
pub fn run_session(
    session: &mut StudySession,
    input: &mut impl BufRead,
    out: &mut impl Write,
    mode: ContentMode,
    favorites: &mut Favorites,
    storage: &dyn Storage,
) -> Result<usize> {
    let mut answered = 0;

    loop {
        let Some((index, card)) = session.sample() else {
            writeln!(out, "No cards available for study. Exiting session.")?;
            return Ok(answered);
        };

        let star = if favorites.is_favorite(&card) { "★ " } else { "" };
        writeln!(out, "\n{star}{}", mode.title(&card))?;

        let mut flipped = false;
        loop {
            let label = if flipped { "known? [y/N] |> " } else { "|> " };
            let Some(line) = prompt(input, out, label)? else {
                return Ok(answered);
            };

            match Command::from_str(&line) {
                Ok(Command::Help) => Command::help(out)?,
                Ok(Command::Weights) => {
                    let mut weighted: Vec<_> = session
                        .weights
                        .iter()
                        .zip(session.items.iter())
                        .map(|(&w, item)| (w, mode.title(item)))
                        .collect();
                    weighted.sort_by(|a, b| b.0.cmp(&a.0));
                    for (weight, title) in weighted {
                        writeln!(out, "{:<3} {}", weight, title)?;
                    }
                }
                Ok(Command::Favorite) => {
                    let now = favorites.toggle(&card.id);
                    if let Err(e) = favorites.save(storage) {
                        tracing::warn!(error = %e, "could not save favorites");
                    }
                    writeln!(out, "{}", if now { "Favorited." } else { "Unfavorited." })?;
                }
                Ok(Command::Quit) => {
                    writeln!(out, "Quitting...")?;
                    return Ok(answered);
                }
                Ok(Command::Reply(_)) if !flipped => {
                    writeln!(out, "{}", mode.definition(&card))?;
                    if let Some(example) = &card.example {
                        writeln!(out, "  e.g. {example}")?;
                    }
                    flipped = true;
                }
                Ok(Command::Reply(reply)) => {
                    if reply.eq_ignore_ascii_case("y") {
                        session.reset(index)?;
                    }
                    answered += 1;
                    break;
                }
                Err(e) => writeln!(out, "Invalid command: {}. Type \\q to quit.", e)?,
            }
        }

        session.increment()?;
    }
}
