use otdr_core::batch::TableBuild;
use otdr_core::error::OtdrError;

pub fn print(build: &TableBuild) -> Result<(), OtdrError> {
    let json = serde_json::to_string_pretty(build)?;
    println!("{json}");
    Ok(())
}
