use std::io::Cursor;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::Level;

use iab::process::parse::Parser;
use iab::structs::element::Element;
use iab::utils::errors::ParseError;

use super::command::{Cli, InfoArgs};
use crate::input::InputReader;

#[derive(Debug, Default)]
struct StreamStats {
    frames: u32,
    beds: u32,
    objects: u32,
    dlc_elements: u32,
    pcm_elements: u32,
    authoring_tool_infos: u32,
    user_data_elements: u32,
    max_rendered: u32,
}

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing IAB stream: {}", args.input.display());

    let data = InputReader::new(&args.input)?.read_all()?;
    let total_bytes = data.len();

    let mut parser = Parser::new_streaming(Cursor::new(data))?;
    if cli.strict {
        parser.set_fail_level(Level::Warn);
    }

    let progress = multi.map(|m| {
        let bar = m.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template("{spinner} {pos} frames scanned").expect("static template"),
        );
        bar
    });

    let mut stats = StreamStats::default();
    let mut first_frame_header = None;

    loop {
        match parser.parse_frame() {
            Ok(()) => {}
            Err(ParseError::EndOfStream) => break,
            Err(e) => {
                log::error!("Frame {}: {e}", stats.frames);
                break;
            }
        }

        let frame = parser.get_frame()?;

        if first_frame_header.is_none() {
            first_frame_header = Some((
                frame.version,
                frame.sample_rate,
                frame.bit_depth,
                frame.frame_rate,
                frame.frame_sample_count(),
            ));
        }

        stats.frames += 1;
        stats.max_rendered = stats.max_rendered.max(frame.max_rendered);

        for element in frame.sub_elements() {
            match element {
                Element::BedDefinition(_) => stats.beds += 1,
                Element::ObjectDefinition(_) => stats.objects += 1,
                Element::AudioDataDlc(_) => stats.dlc_elements += 1,
                Element::AudioDataPcm(_) => stats.pcm_elements += 1,
                Element::AuthoringToolInfo(_) => stats.authoring_tool_infos += 1,
                Element::UserData(_) => stats.user_data_elements += 1,
                _ => {}
            }
        }

        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    let Some((version, sample_rate, bit_depth, frame_rate, samples)) = first_frame_header else {
        println!("No IAB frame found in the file.");
        println!("This doesn't appear to be a valid IAB stream.");
        return Ok(());
    };

    println!("Stream: {}", args.input.display());
    println!("  Size:            {total_bytes} bytes");
    println!("  Frames:          {}", stats.frames);
    println!("  Version:         {version}");
    println!("  Sample rate:     {} Hz", sample_rate.hertz());
    println!("  Bit depth:       {} bit", bit_depth.bits());
    println!("  Frame rate:      {frame_rate}");
    println!("  Samples/frame:   {samples}");
    println!("  Max rendered:    {}", stats.max_rendered);
    println!();
    println!("Elements across all frames:");
    println!("  BedDefinition:      {}", stats.beds);
    println!("  ObjectDefinition:   {}", stats.objects);
    println!("  AudioDataDLC:       {}", stats.dlc_elements);
    println!("  AudioDataPCM:       {}", stats.pcm_elements);
    println!("  AuthoringToolInfo:  {}", stats.authoring_tool_infos);
    println!("  UserData:           {}", stats.user_data_elements);
    println!(
        "  Skipped (undefined or unallowed): {}",
        parser.unallowed_sub_element_count()
    );

    Ok(())
}
