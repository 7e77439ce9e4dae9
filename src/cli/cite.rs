//! Citation subcommands for editing an item's citations.
//!
//! - `add`: resolve a text selection in a document and cite it
//! - `remove`: drop a citation by its 1-based label

use anyhow::Result;
use clap::Subcommand;

use crate::citation::citation_color;
use crate::review::ReviewSession;

/// Citation-related subcommands
#[derive(Subcommand, Debug)]
pub enum CiteCommands {
    /// Cite text selected from a knowledge-base document
    Add {
        /// Item index
        index: usize,

        /// Document ID (file stem in the knowledge base)
        #[arg(long)]
        doc: String,

        /// Selected text; whitespace differences are tolerated
        text: String,
    },

    /// Remove a citation
    Remove {
        /// Item index
        index: usize,

        /// Citation label as shown by `show` (1-based)
        citation: usize,
    },
}

pub async fn execute(session: &mut ReviewSession, command: CiteCommands) -> Result<()> {
    match command {
        CiteCommands::Add { index, doc, text } => {
            let item = session.add_citation_from_selection(index, &doc, &text).await?;
            let position = item.citations.len() - 1;
            let citation = &item.citations[position];

            println!(
                "Added citation [{}] ({}) to item {}",
                position + 1,
                citation_color(position).name,
                index
            );
            println!("  {} {}-{}", citation.doc_id, citation.span_start, citation.span_end);
            println!("  \"{}\"", citation.citation_text);
        }
        CiteCommands::Remove { index, citation } => {
            if citation == 0 {
                anyhow::bail!("Citation labels start at 1");
            }
            let item = session.remove_citation(index, citation - 1).await?;
            println!(
                "Removed citation [{}] from item {} ({} left)",
                citation,
                index,
                item.citations.len()
            );
        }
    }

    Ok(())
}
