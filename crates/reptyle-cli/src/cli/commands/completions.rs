//! `reptyle completions <shell>` – print shell completions.

use clap::CommandFactory;

use crate::cli::Cli;

pub fn run_completions(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "reptyle", &mut std::io::stdout());
}
