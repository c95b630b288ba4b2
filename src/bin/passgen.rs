use clap::Parser;

use riftcam::passwords;

/// Generate random passwords from letters, digits and punctuation.
#[derive(Parser, Debug)]
#[command(name = "passgen", version, about)]
struct Args {
    /// Password length in characters (at least 1).
    length: usize,

    /// How many passwords to print.
    #[arg(short, long, default_value_t = 1)]
    count: usize,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    for _ in 0..args.count {
        match passwords::generate_default(args.length) {
            Ok(password) => println!("{password}"),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        }
    }
}
