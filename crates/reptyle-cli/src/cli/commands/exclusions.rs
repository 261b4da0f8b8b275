//! `reptyle exclusions` – show or edit the actor exclusion list.

use anyhow::{Context, Result};
use reptyle_core::exclusions::{ExclusionList, JsonFileStore};

use crate::cli::ExclusionsAction;

pub fn run_exclusions(action: ExclusionsAction) -> Result<()> {
    let store = JsonFileStore::open_default().context("locate storage file")?;
    let mut list = ExclusionList::load(&store)
        .with_context(|| format!("load exclusions from {}", store.path().display()))?;

    match action {
        ExclusionsAction::List => {
            if list.is_empty() {
                println!("No excluded actors.");
            }
            for name in list.names() {
                println!("{name}");
            }
        }
        ExclusionsAction::Add { name } => {
            let name = name.trim();
            if list.add(name) {
                list.save(&store)?;
                println!("Added \"{name}\" to the exclude list.");
            } else {
                println!("\"{name}\" is already excluded.");
            }
        }
        ExclusionsAction::Remove { name } => {
            let name = name.trim();
            if list.remove(name) {
                list.save(&store)?;
                println!("Removed \"{name}\" from the exclude list.");
            } else {
                println!("\"{name}\" was not excluded.");
            }
        }
        ExclusionsAction::Reset => {
            ExclusionList::with_defaults().save(&store)?;
            println!("Exclude list reset to defaults.");
        }
    }
    Ok(())
}
