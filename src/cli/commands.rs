use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::app::App;
use crate::config::AppConfig;
use crate::options::{self, Configuration, RangeKey, SizeKey};
use crate::stepper::{Clock, FixedClock, SystemClock};
use crate::window::{DequeStore, WindowEngine};

#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Range option key (defaults to the configured range)
    #[arg(long, value_parser = RangeKey::parse)]
    pub range: Option<RangeKey>,
    /// Size option key (defaults to the configured size)
    #[arg(long, value_parser = SizeKey::parse)]
    pub size: Option<SizeKey>,
    /// RFC 3339 instant to anchor on instead of now
    #[arg(long)]
    pub anchor: Option<String>,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn print_window(config: Arc<AppConfig>, args: WindowArgs) -> Result<()> {
    let clock: Box<dyn Clock> = match args.anchor.as_deref() {
        Some(raw) => {
            let anchor = OffsetDateTime::parse(raw.trim(), &Rfc3339)
                .with_context(|| format!("parsing anchor `{raw}` as RFC 3339"))?;
            Box::new(FixedClock(anchor))
        }
        None => Box::new(SystemClock),
    };
    let configuration = Configuration::new(
        args.range.unwrap_or_else(|| config.range_key()),
        args.size.unwrap_or_else(|| config.size_key()),
    );
    let engine = WindowEngine::with_store(
        DequeStore::default(),
        configuration,
        config.engine_options(),
        clock,
    );
    print!("{}", format_window(&engine));
    Ok(())
}

pub fn print_options() -> Result<()> {
    print!("{}", format_options());
    Ok(())
}

fn format_window(engine: &WindowEngine) -> String {
    let configuration = engine.configuration();
    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        "range: {} | size: {}",
        configuration.range().title,
        configuration.size().title
    );
    let selected = engine.selected_index().unwrap_or(0) as i64;
    for (idx, item) in engine.items().enumerate() {
        let offset = idx as i64 - selected;
        let marker = if item.is_selected { " <" } else { "" };
        let _ = writeln!(&mut out, "{offset:+} {}{marker}", item.label);
    }
    out
}

fn format_options() -> String {
    let mut out = String::from("Ranges:\n");
    for range in options::ranges() {
        let _ = writeln!(
            &mut out,
            "  {:<10} {:<10} step {} {:?}",
            range.key.as_ref(),
            range.title,
            range.step,
            range.unit
        );
    }
    out.push_str("Sizes:\n");
    for size in options::sizes() {
        let _ = writeln!(&mut out, "  {:<10} {}", size.key.as_ref(), size.title);
    }
    out
}
