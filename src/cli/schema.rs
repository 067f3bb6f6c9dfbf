//! `pagecap schema`

use anyhow::Result;

pub fn run() -> Result<()> {
    let definition = pagecap_tools::capture::tool_definition();
    println!("{}", serde_json::to_string_pretty(&definition)?);
    Ok(())
}
