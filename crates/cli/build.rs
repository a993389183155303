use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("clearly")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Clearly Contributors")
        .about("Extract the readable article from HTML documents")
        .arg(clap::arg!([INPUT] "Local HTML file, or '-' for stdin (the default)").default_value("-"))
        .arg(clap::arg!(-u --url <URL> "URL the page was loaded from, used for relative links and site rules"))
        .arg(
            clap::arg!(-s --site_config <FILE> "Site configuration JSON file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, html, text)")
                .value_name("FORMAT")
                .default_value("json")
                .value_parser(["json", "html", "text"]),
        )
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--char_threshold <NUM> "Characters of text needed to accept an extraction attempt")
                .default_value("500"),
        )
        .arg(clap::arg!(--nb_top_candidates <NUM> "Number of top candidates to track").default_value("5"))
        .arg(clap::arg!(--max_elems <NUM> "Maximum number of elements to parse (0 = unlimited)").default_value("0"))
        .arg(clap::arg!(--keep_class <CLASS> "Class to keep in the output HTML (repeatable)").action(clap::ArgAction::Append))
        .arg(clap::arg!(--locale <LOCALE> "Language assumed when detection finds nothing").default_value("en"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "clearly", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "clearly", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "clearly", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "clearly", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
