use std::fs;
use std::io::Cursor;
use std::process::ExitCode;

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::Level;

use iab::process::parse::Parser;
use iab::process::validate::Validator;
use iab::utils::errors::ParseError;
use iab::validate::ConstraintSet;

use super::command::{Cli, ValidateArgs};
use crate::input::InputReader;
use crate::report::build_report;

/// Exit status when the input cannot be read.
pub const EXIT_IO_ERROR: u8 = 5;
/// Exit status when the issue cap stopped validation.
pub const EXIT_ISSUE_CAP: u8 = 4;
/// Exit status when the validator requested termination.
pub const EXIT_VALIDATOR_STOPPED: u8 = 3;
/// Exit status when a frame failed to parse.
pub const EXIT_PARSE_ERROR: u8 = 2;

pub fn cmd_validate(
    args: &ValidateArgs,
    cli: &Cli,
    multi: Option<&MultiProgress>,
) -> Result<ExitCode> {
    let input_name = args.input.display().to_string();
    log::info!("Validating IAB stream: {input_name}");

    let data = match InputReader::new(&args.input).and_then(|mut r| r.read_all()) {
        Ok(data) => data,
        Err(e) => {
            log::error!("Failed to read {input_name}: {e:#}");
            return Ok(ExitCode::from(EXIT_IO_ERROR));
        }
    };

    let mut parser = Parser::new_streaming(Cursor::new(data))?;
    if cli.strict {
        parser.set_fail_level(Level::Warn);
    }

    let mut validator = Validator::new();
    let selected = args.constraint_set.to_set();

    let progress = multi.map(|m| {
        let bar = m.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template("{spinner} {pos} frames validated")
                .expect("static template"),
        );
        bar
    });

    let mut frames_parsed: u32 = 0;
    let mut parse_error = None;
    let mut issue_cap_exceeded = false;
    let mut validator_stopped = false;

    loop {
        match parser.parse_frame() {
            Ok(()) => {}
            Err(ParseError::EndOfStream) => break,
            Err(e) => {
                log::error!("Frame {frames_parsed}: {e}");
                parse_error = Some(e.to_string());
                break;
            }
        }

        let frame = parser.get_frame()?;
        if validator.validate_frame(frame, frames_parsed).is_err() {
            log::error!("Validator requested termination at frame {frames_parsed}");
            validator_stopped = true;
            break;
        }

        frames_parsed += 1;
        if let Some(bar) = &progress {
            bar.inc(1);
        }

        if let Some(cap) = args.max_issues
            && validator.issues(selected).len() > cap
        {
            log::warn!(
                "Issue cap of {cap} exceeded for {selected} at frame {}",
                frames_parsed - 1
            );
            issue_cap_exceeded = true;
            break;
        }
    }

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    let report = build_report(
        &mut validator,
        input_name,
        frames_parsed,
        parse_error.clone(),
        issue_cap_exceeded,
        selected,
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{json}"),
    }

    for summary in &report.summary {
        log::info!(
            "{}: {} ({} errors, {} warnings)",
            summary.constraint_set,
            summary.result,
            summary.error_count,
            summary.warning_count
        );
    }

    print_chain_result(&mut validator, selected);

    let code = if validator_stopped {
        ExitCode::from(EXIT_VALIDATOR_STOPPED)
    } else if parse_error.is_some() {
        ExitCode::from(EXIT_PARSE_ERROR)
    } else if issue_cap_exceeded {
        ExitCode::from(EXIT_ISSUE_CAP)
    } else {
        ExitCode::SUCCESS
    };

    Ok(code)
}

fn print_chain_result(validator: &mut Validator, selected: ConstraintSet) {
    let result = validator.result(selected);
    let issue_count = validator.issues(selected).len();
    println!("{selected}: {result} ({issue_count} issues along the dependency chain)");
}
