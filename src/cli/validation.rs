use crate::cli::args::CliArgs;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if args.base_url.is_some() && args.snapshot.is_some() {
        return Err("use either --base-url or --snapshot, not both".to_string());
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --format '{raw}', expected text, json or html"
            ));
        }
    }
    if let Some(raw) = args.base_url.as_deref() {
        reqwest::Url::parse(raw.trim()).map_err(|e| format!("invalid --base-url '{raw}': {e}"))?;
    }
    if let Some(out) = args.output.as_deref() {
        if out.trim().is_empty() {
            return Err("invalid --output, expected a file path".to_string());
        }
    }
    Ok(())
}
