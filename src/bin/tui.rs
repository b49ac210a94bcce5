use anyhow::Result;
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    let fixture = env::args().nth(1).map(PathBuf::from);
    timeline_filter::tui::run(fixture.as_deref())
}
