//! `reptyle filename` – print the filename for some metadata.

use reptyle_core::filename::build_filename;

pub fn run_filename(network: &str, title: &str, date: &str, actors: &[String]) {
    println!("{}", build_filename(network, title, &actors.join(" "), date));
}
