use kl_reading::AssembledContext;

use super::{OutputFormat, ReadingRequest};

pub fn run(req: &ReadingRequest, format: OutputFormat) -> Result<(), String> {
    let context = super::assemble_reading(req)?;
    print_context(&context, format)
}

pub(super) fn print_context(context: &AssembledContext, format: OutputFormat) -> Result<(), String> {
    match format {
        OutputFormat::Text => print!("{}", context.transcript()),
        OutputFormat::Json => println!("{}", context.to_json().map_err(|e| e.to_string())?),
        OutputFormat::Markdown => print!("{}", context.to_markdown()),
    }
    Ok(())
}
