/// This file contains all of the logic necessary to formulate a coherent
/// Config data structure from the command line. We use the `clap` crate and
/// parse args here
use clap::{Arg, ArgMatches, Command};

use crate::err::FuzzErr;
use crate::rng::DEFAULT_SEED;
use crate::stats::DEFAULT_CRUMB_INTERVAL;

/// Default number of candidates we submit before calling it a day
pub const DEFAULT_ITERATIONS: u64 = 2_000_000_000;

// Struct that contains all of the configurable information for a campaign
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub seed: u64,
    pub iterations: u64,
    pub crumb_interval: u64,
    pub inject_fault: Option<u64>,
    pub replay: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed: DEFAULT_SEED,
            iterations: DEFAULT_ITERATIONS,
            crumb_interval: DEFAULT_CRUMB_INTERVAL,
            inject_fault: None,
            replay: None,
        }
    }
}

fn command() -> Command {
    Command::new("decfuzz")
    .version("0.0.1")
    .about("Biased random-instruction fuzzer for x86 decoders")
    .arg(Arg::new("seed")
        .long("seed")
        .value_name("SEED")
        .help("Seed for the pRNG, a (seed, iteration) pair replays a candidate (u64, 0 default)"))
    .arg(Arg::new("iterations")
        .long("iterations")
        .value_name("COUNT")
        .help("Number of candidates to submit before exiting (2000000000 default)"))
    .arg(Arg::new("crumb-interval")
        .long("crumb-interval")
        .value_name("INTERVAL")
        .help("Submissions per progress dot, a count line every 10 dots (1000000 default)"))
    .arg(Arg::new("inject-fault")
        .long("inject-fault")
        .value_name("SUBMISSION")
        .help("Raise SIGSEGV on this submission (1-based) to exercise the crash report"))
    .arg(Arg::new("replay")
        .long("replay")
        .value_name("ITERATION")
        .help("Regenerate the sequence and submit only this iteration (1-based)"))
}

// Parse an optional u64 argument, zero is rejected when it has no meaning
fn parse_u64(matches: &ArgMatches, name: &str, allow_zero: bool) -> Result<Option<u64>, FuzzErr> {
    let Some(str_repr) = matches.get_one::<String>(name) else {
        return Ok(None);
    };

    let Ok(val) = str_repr.parse::<u64>() else {
        return Err(FuzzErr::from(&format!("Invalid --{} value '{}'", name, str_repr)));
    };

    if val == 0 && !allow_zero {
        return Err(FuzzErr::from(&format!("--{} must be non-zero", name)));
    }

    Ok(Some(val))
}

fn config_from_matches(matches: &ArgMatches) -> Result<Config, FuzzErr> {
    let defaults = Config::default();

    Ok(Config {
        seed: parse_u64(matches, "seed", true)?.unwrap_or(defaults.seed),
        iterations: parse_u64(matches, "iterations", true)?.unwrap_or(defaults.iterations),
        crumb_interval: parse_u64(matches, "crumb-interval", false)?
            .unwrap_or(defaults.crumb_interval),
        inject_fault: parse_u64(matches, "inject-fault", false)?,
        replay: parse_u64(matches, "replay", false)?,
    })
}

pub fn parse_args() -> Result<Config, FuzzErr> {
    let matches = command().get_matches();
    config_from_matches(&matches)
}

/// Same as `parse_args` but from an explicit argument list
pub fn parse_from<I, T>(args: I) -> Result<Config, FuzzErr>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = command()
        .try_get_matches_from(args)
        .map_err(|e| FuzzErr::from(&e.to_string()))?;
    config_from_matches(&matches)
}
