use anyhow::Result;
use daybook_core::clock::Clock;
use daybook_core::notes::{NoteQuery, Notebook, demo_notes};
use owo_colors::OwoColorize;

use crate::render::note_block;
use crate::services::Services;

pub fn run(services: &Services, search: Option<String>, tags: Vec<String>) -> Result<()> {
    let notebook = Notebook::new(demo_notes(services.clock.now()));
    let query = NoteQuery {
        search: search.unwrap_or_default(),
        tags,
    };

    println!("{} {}", "Notes".bold(), "(sample data)".dimmed());

    let notes = notebook.visible(&query);
    if notes.is_empty() {
        println!("{}", "No notes match".dimmed());
        return Ok(());
    }

    for note in notes {
        println!();
        for line in note_block(note, &services.tz) {
            println!("{}", line);
        }
    }

    let tags = notebook.all_tags();
    if !tags.is_empty() {
        println!();
        println!("{} {}", "Tags:".dimmed(), tags.join(", "));
    }
    Ok(())
}
