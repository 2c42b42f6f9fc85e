/// This file contains the fuzzing loop driver and the state it carries around:
/// the pRNG, the decoder under test, session stats and the memento that the
/// fault handler reports from
use std::io::Write;

use crate::config::Config;
use crate::decoder::{DecodeError, InstructionDecoder};
use crate::encoder::{generate_rand_instr, Candidate, CANDIDATE_LEN};
use crate::err::FuzzErr;
use crate::machine::DecodeConfig;
use crate::memento::CrashMemento;
use crate::misc::hex_string;
use crate::prompt;
use crate::rng::Rng;
use crate::stats::Stats;

/// One generated candidate plus the configuration it's decoded under
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fuzzcase {
    pub config: &'static DecodeConfig,
    pub bytes: Candidate,
}

/// Draw a configuration and generate a candidate for it. This is the only
/// place the driver consumes randomness, so replaying N calls from a fresh
/// `Rng` reproduces the Nth submission exactly
pub fn generate_fuzzcase(rng: &mut Rng) -> Fuzzcase {
    let config = DecodeConfig::select(rng.rand());

    let mut bytes = [0u8; CANDIDATE_LEN];
    generate_rand_instr(rng, &mut bytes, config.is_64bit());

    Fuzzcase { config, bytes }
}

/// Regenerate the fuzzcase submitted on `iteration` (1-based) for `seed`
pub fn replay_fuzzcase(seed: u64, iteration: u64) -> Fuzzcase {
    let mut rng = Rng::new(seed);
    for _ in 1..iteration {
        generate_fuzzcase(&mut rng);
    }

    generate_fuzzcase(&mut rng)
}

// Execution context for a campaign
pub struct FuzzContext<D: InstructionDecoder> {
    pub rng: Rng,                       // Campaign-wide pRNG
    pub decoder: D,                     // Decoder under test
    pub stats: Stats,                   // Iteration count and breadcrumbs
    pub memento: &'static CrashMemento, // Where submissions get recorded
    pub config: Config,                 // Configuration based on user options
}

impl<D: InstructionDecoder> FuzzContext<D> {
    pub fn new(config: &Config, decoder: D, memento: &'static CrashMemento) -> Self {
        FuzzContext {
            rng: Rng::new(config.seed),
            decoder,
            stats: Stats::new(config.crumb_interval),
            memento,
            config: config.clone(),
        }
    }

    /// Record then decode. The memento has to be current before the decoder
    /// sees the bytes, a fault inside `decode` reports whatever is recorded
    #[inline]
    pub fn submit(&mut self, fuzzcase: &Fuzzcase) -> Result<(), DecodeError> {
        self.memento.record(fuzzcase.config, &fuzzcase.bytes);
        self.decoder
            .decode(fuzzcase.config, &fuzzcase.bytes)
            .map(|_| ())
    }

    // Run one iteration: generate, record, submit, count
    pub fn fuzz_one<W: Write>(&mut self, out: &mut W) -> Result<(), FuzzErr> {
        let fuzzcase = generate_fuzzcase(&mut self.rng);

        // Only a fault matters, decode errors are expected for most inputs
        let _ = self.submit(&fuzzcase);

        let crumb = self.stats.update();
        self.stats.report(out, crumb)
    }

    /// Submit candidates until the iteration budget runs out. The only other
    /// way out of here is the fault handler
    pub fn fuzz_loop<W: Write>(&mut self, out: &mut W) -> Result<(), FuzzErr> {
        self.stats.start_session();
        prompt!("Session started {}", self.stats.start_str);

        for _ in 0..self.config.iterations {
            self.fuzz_one(out)?;
        }

        writeln!(out)?;
        out.flush()?;
        Ok(())
    }

    /// Reproduce a single iteration: skip ahead without decoding, print the
    /// candidate, then submit only that one
    pub fn replay(&mut self, iteration: u64) -> Result<Result<(), DecodeError>, FuzzErr> {
        if iteration == 0 {
            return Err(FuzzErr::from("Replay iterations are 1-based"));
        }

        for _ in 1..iteration {
            generate_fuzzcase(&mut self.rng);
        }
        let fuzzcase = generate_fuzzcase(&mut self.rng);

        prompt!(
            "Replaying iteration {} of seed {}",
            iteration,
            self.config.seed
        );
        prompt!("Machine mode: {}", fuzzcase.config);
        prompt!("Candidate: {}", hex_string(&fuzzcase.bytes));
        std::io::stdout().flush()?;

        let result = self.submit(&fuzzcase);
        self.stats.update();
        Ok(result)
    }
}
