use std::{
  fs::{self, File},
  io::{self, BufWriter, Read, Write},
  path::{Path, PathBuf},
  process::exit,
};

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use log::{debug, info};
use prettytable::{Cell, Row, Table};

use vtp::accumulator::TABLE_DISPLAY_FORMAT;
use vtp::bytecode::{
  decode_instructions, disassemble_words, encode_instruction, parse_assembly,
  read_instruction_words, validate_instruction, write_instruction_words, AssemblyLines
};
use vtp::{fold, fold_until, Accumulator, Instruction, Sampler};

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
  #[command(subcommand)]
  command: Command
}

#[derive(Subcommand)]
enum Command {
  /// Assembles VTP assembly code into its binary representation.
  Assemble {
    /// The file from which the assembly code is read (default: stdin)
    input: Option<PathBuf>,

    /// The file to which the binary code is written (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output comma-separated C-style hexadecimal numbers instead of binary
    #[arg(short = 'c', long = "c-array")]
    c_array: bool,
  },

  /// Disassembles VTP binary code into its assembly representation.
  Disassemble {
    /// The file from which the binary code is read (default: stdin)
    input: Option<PathBuf>,

    /// The file to which the assembly code is written (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Replays a program and prints the resulting display state.
  Fold {
    /// The file from which the program is read (default: stdin)
    input: Option<PathBuf>,

    /// Number of channels of the display
    #[arg(short = 'n', long)]
    channels: u8,

    /// Stop before the first instruction that would move the clock past this time (ms)
    #[arg(short, long)]
    until: Option<u64>,

    /// Print the display state every STEP milliseconds instead of only at the end
    #[arg(short, long)]
    step: Option<u64>,

    /// Read assembly code instead of binary code
    #[arg(short, long)]
    assembly: bool,
  },
}

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

  let args = Args::parse();

  let result = match args.command {
    Command::Assemble { input, output, c_array } => {
      assemble(input.as_deref(), output.as_deref(), c_array)
    }
    Command::Disassemble { input, output } => {
      disassemble(input.as_deref(), output.as_deref()).map(|_| true)
    }
    Command::Fold { input, channels, until, step, assembly } => {
      fold_program(input.as_deref(), channels, until, step, assembly).map(|_| true)
    }
  };

  match result {
    Ok(true)  => {}
    Ok(false) => exit(1),
    Err(e)    => {
      eprintln!("{:#}", e);
      exit(1);
    }
  }
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
  match input {
    Some(path) => {
      fs::read(path).with_context(|| format!("Could not open input file: {}", path.display()))
    }
    None => {
      let mut bytes = Vec::new();
      io::stdin().read_to_end(&mut bytes).context("Could not read stdin")?;
      Ok(bytes)
    }
  }
}

fn read_text(input: Option<&Path>) -> Result<String> {
  String::from_utf8(read_input(input)?).context("Input is not valid UTF-8")
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
  match output {
    Some(path) => {
      let file = File::create(path)
        .with_context(|| format!("Could not open output file: {}", path.display()))?;
      Ok(Box::new(BufWriter::new(file)))
    }
    None => Ok(Box::new(BufWriter::new(io::stdout())))
  }
}

/**
  Parses and validates every line. A parse error aborts; a validation error is reported and
  stops output, but the remaining lines are still checked. Returns whether every instruction
  was valid.
*/
fn assemble(input: Option<&Path>, output: Option<&Path>, c_array: bool) -> Result<bool> {
  let text = read_text(input)?;
  let mut out = open_output(output)?;
  let mut valid = true;
  let mut n_instructions = 0usize;

  for result in AssemblyLines::new(text.lines()) {
    let (line, instruction) = result?;
    n_instructions += 1;

    if let Err(e) = validate_instruction(&instruction) {
      eprintln!("{} at line {}", e, line);
      valid = false;
    }
    if !valid {
      continue;
    }

    let word = encode_instruction(&instruction);
    match c_array {
      true => {
        if n_instructions > 1 {
          write!(out, ", ")?;
        }
        write!(out, "0x{:08x}", word)?;
      }
      false => out.write_all(&write_instruction_words(&[word]))?
    }
  }

  if c_array && valid && n_instructions > 0 {
    writeln!(out)?;
  }
  out.flush().context("I/O error writing to output file")?;

  info!("Assembled {} instructions.", n_instructions);
  Ok(valid)
}

fn disassemble(input: Option<&Path>, output: Option<&Path>) -> Result<()> {
  let words = read_instruction_words(&read_input(input)?)?;
  let text = disassemble_words(&words)?;

  let mut out = open_output(output)?;
  out.write_all(text.as_bytes())?;
  out.flush().context("I/O error writing to output file")?;

  info!("Disassembled {} instructions.", words.len());
  Ok(())
}

fn load_program(input: Option<&Path>, assembly: bool) -> Result<Vec<Instruction>> {
  let instructions = match assembly {
    true  => parse_assembly(&read_text(input)?)?,
    false => decode_instructions(&read_instruction_words(&read_input(input)?)?)?
  };
  debug!("Loaded {} instructions.", instructions.len());
  Ok(instructions)
}

fn fold_program(
  input    : Option<&Path>,
  channels : u8,
  until    : Option<u64>,
  step     : Option<u64>,
  assembly : bool
) -> Result<()> {
  let instructions = load_program(input, assembly)?;
  let mut accumulator = Accumulator::new(channels);

  if let Some(step_ms) = step {
    println!("{}", make_sample_table(accumulator, &instructions, step_ms, until)?);
    return Ok(());
  }

  match until {
    Some(until_ms) => {
      let applied = fold_until(&mut accumulator, &instructions, until_ms)?;
      println!("Applied {} of {} instructions.", applied, instructions.len());
    }
    None => fold(&mut accumulator, &instructions)?
  }

  println!("{}", accumulator);
  Ok(())
}

/// One row per sample: the time, the elapsed time, then amplitude and frequency per channel.
fn make_sample_table(
  accumulator  : Accumulator,
  instructions : &[Instruction],
  step_ms      : u64,
  until        : Option<u64>
) -> Result<Table> {
  let mut table = Table::new();
  table.set_format(*TABLE_DISPLAY_FORMAT);

  let mut titles = vec![Cell::new("Time"), Cell::new("Elapsed")];
  for channel in 1..=accumulator.n_channels() {
    titles.push(Cell::new(&format!("ch{} amp", channel)));
    titles.push(Cell::new(&format!("ch{} freq", channel)));
  }
  table.set_titles(Row::new(titles));

  for sample in Sampler::new(accumulator, instructions, step_ms) {
    let sample = sample?;
    if until.map_or(false, |until_ms| sample.milliseconds > until_ms) {
      break;
    }

    let state = &sample.accumulator;
    let mut cells = vec![
      Cell::new(&sample.milliseconds.to_string()),
      Cell::new(&state.milliseconds_elapsed().to_string())
    ];
    for (amplitude, frequency) in state.amplitudes().iter().zip(state.frequencies()) {
      cells.push(Cell::new(&amplitude.to_string()));
      cells.push(Cell::new(&frequency.to_string()));
    }
    table.add_row(Row::new(cells));
  }

  Ok(table)
}
