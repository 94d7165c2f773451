//! `tokendiff lights`

use tokendiff_tools::LightStore;

pub fn run() -> anyhow::Result<()> {
    let lights = LightStore::new().list();
    println!("{}", serde_json::to_string_pretty(&lights)?);
    Ok(())
}
