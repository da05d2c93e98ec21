//! Entrypoint for CLI
mod clock;
mod error;

use std::{env, error::Error, fs, time::Instant};

use chip8::{constants::*, prelude::*, Hz, IMPL_VERSION};
use log::{error, info};

use self::{clock::Clock, error::CliError};

static USAGE: &str = r#"
usage: chip8 CMD FILE [OPTIONS]

commands:
    run     Run the target ROM file without a window
    dis     Disassemble the target ROM into readable assembly

run options:
    --hz N        instructions per second (default 700)
    --frames N    stop after N frames at 60Hz (default 600)
    --key K       hold down key K, 0 to F, for the whole run
    --seed N      seed for the random number generator

examples:
    chip8 run maze.ch8 --frames 120
    chip8 run pong.ch8 --key 1 --seed 42
    chip8 dis maze.ch8
"#;

/// Instructions per second when `--hz` is not given.
const DEFAULT_HZ: u64 = 700;

/// Ten seconds of run time.
const DEFAULT_FRAMES: u64 = 600;

fn read_rom(filepath: &str) -> Result<Vec<u8>, LoadError> {
    Ok(fs::read(filepath)?)
}

fn run_bytecode(filepath: &str, opts: &RunOpts) -> Result<(), CliError> {
    info!("running {filepath} at {}Hz", opts.hz.0);

    let bytecode = read_rom(filepath)?;
    let conf = Chip8Conf {
        rng_seed: opts.seed,
    };
    let mut vm = Chip8Vm::load(&bytecode, conf)?;

    let mut clock = Clock::new(Hz(DELAY_FREQUENCY));
    // Instruction budget carried over between frames, so clock speeds
    // that are not a multiple of the frame rate are still honoured.
    let mut budget = 0;
    let mut buzzing = false;
    let mut result = Ok(());

    let start = Instant::now();
    for frame in 0..opts.frames {
        budget += opts.hz.0;
        let step_count = (budget / DELAY_FREQUENCY) as usize;
        budget %= DELAY_FREQUENCY;

        match vm.run_steps(step_count, opts.key) {
            Ok(ExecutionStatus::Halted) => break,
            Ok(_) => {}
            Err(fault) => {
                error!("machine stopped at frame {frame}");
                result = Err(fault);
                break;
            }
        }

        let sound = vm.tick();
        if sound != buzzing {
            info!("sound {}", if sound { "on" } else { "off" });
            buzzing = sound;
        }

        clock.wait();
    }
    let end = Instant::now();

    println!(
        "time taken: {}ms",
        end.duration_since(start).as_nanos() as f64 / 1000000.0
    ); // to millis
    println!("{}", vm.dump_display()?);

    if result.is_err() {
        println!("{}", vm.dump_registers()?);
    }

    result?;

    Ok(())
}

fn run_disassembler(filepath: &str) -> Result<(), CliError> {
    let bytecode = read_rom(filepath)?;
    print!("{}", Disassembler::new(&bytecode).listing()?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    let cmd = match parse_args(env::args().skip(1)) {
        Ok(cmd) => cmd,
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    };

    match cmd {
        Cmd::Run { filepath, opts } => run_bytecode(&filepath, &opts)?,
        Cmd::Dis { filepath } => run_disassembler(&filepath)?,
    }

    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Cmd, CliError> {
    let cmd = args.next().ok_or_else(|| usage("missing command"))?;
    let filepath = args.next().ok_or_else(|| usage("missing file"))?;

    match cmd.as_str() {
        "run" => Ok(Cmd::Run {
            filepath,
            opts: parse_run_opts(args)?,
        }),
        "dis" => match args.next() {
            Some(arg) => Err(usage(format!("unexpected argument {arg}"))),
            None => Ok(Cmd::Dis { filepath }),
        },
        _ => Err(usage(format!("unknown command {cmd}"))),
    }
}

fn parse_run_opts(mut args: impl Iterator<Item = String>) -> Result<RunOpts, CliError> {
    let mut opts = RunOpts::default();

    while let Some(flag) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| usage(format!("{flag} expects a value")))?;

        match flag.as_str() {
            "--hz" => opts.hz = Hz(parse_number(&flag, &value)?),
            "--frames" => opts.frames = parse_number(&flag, &value)?,
            "--key" => {
                let key = value
                    .parse::<KeyCode>()
                    .map_err(|err| usage(format!("{flag} {value}: {err}")))?;
                opts.key = Some(key);
            }
            "--seed" => opts.seed = Some(parse_number(&flag, &value)?),
            _ => return Err(usage(format!("unknown option {flag}"))),
        }
    }

    if opts.hz.0 == 0 {
        return Err(usage("--hz must be greater than zero"));
    }

    Ok(opts)
}

fn parse_number(flag: &str, value: &str) -> Result<u64, CliError> {
    value
        .parse()
        .map_err(|_| usage(format!("{flag} expects a number, got {value}")))
}

fn usage(msg: impl ToString) -> CliError {
    CliError::Usage(msg.to_string())
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

#[derive(Debug, PartialEq)]
enum Cmd {
    /// Run file
    Run { filepath: String, opts: RunOpts },
    /// Disassemble
    Dis { filepath: String },
}

#[derive(Debug, PartialEq)]
struct RunOpts {
    hz: Hz,
    frames: u64,
    /// Key held down for the whole run.
    key: Option<KeyCode>,
    seed: Option<u64>,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            hz: Hz(DEFAULT_HZ),
            frames: DEFAULT_FRAMES,
            key: None,
            seed: None,
        }
    }
}
