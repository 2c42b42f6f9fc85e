/// This file contains the `main` program logic which parses the campaign
/// options, arms the crash handler and starts throwing candidates at the
/// decoder
use decfuzz::config::{parse_args, Config};
use decfuzz::context::FuzzContext;
use decfuzz::decoder::{FaultInjector, IcedDecoder, InstructionDecoder};
use decfuzz::fault::install_crash_handler;
use decfuzz::machine::DECODE_CONFIGS;
use decfuzz::memento::MEMENTO;
use decfuzz::{fatal, prompt, prompt_warn};

// Run the campaign, or a single replay, with whatever decoder we ended up with
fn campaign<D: InstructionDecoder>(config: &Config, decoder: D) {
    let mut context = FuzzContext::new(config, decoder, &MEMENTO);

    if let Some(iteration) = config.replay {
        match context.replay(iteration) {
            Ok(Ok(())) => prompt!("Replay decoded without faulting"),
            Ok(Err(e)) => prompt!("Replay finished without faulting, decoder returned {:?}", e),
            Err(error) => fatal!(error),
        }
        return;
    }

    prompt!("Starting fuzzer...");
    let mut stdout = std::io::stdout();
    context.fuzz_loop(&mut stdout).unwrap_or_else(|error| {
        fatal!(error);
    });

    prompt!(
        "Campaign finished: {} tests passed in {} (started {})",
        context.stats.session_iters,
        context.stats.uptime(),
        context.stats.start_str
    );
}

fn main() {
    let config = parse_args().unwrap_or_else(|error| {
        fatal!(error);
    });

    // Arm this before anything touches the decoder
    install_crash_handler().unwrap_or_else(|error| {
        fatal!(error);
    });

    prompt!("Seed: {}", config.seed);
    prompt!("Iteration budget: {}", config.iterations);
    for decode_config in DECODE_CONFIGS.iter() {
        prompt!(
            "Decoder config {}: {}-bit, {:?} branches",
            decode_config,
            decode_config.mode.bitness(),
            decode_config.branches
        );
    }

    match config.inject_fault {
        Some(submission) => {
            prompt_warn!("Injecting SIGSEGV on submission {}", submission);
            campaign(&config, FaultInjector::new(IcedDecoder::new(), submission));
        }
        None => campaign(&config, IcedDecoder::new()),
    }
}
